//! Blobs read from the filesystem
//!
//! Each path is either a blob file or a directory whose regular files are
//! taken in name order. Hex input may contain arbitrary whitespace.

use super::{BlobSource, InputFormat};
use crate::{Error, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct FileSource {
    paths: Vec<PathBuf>,
    format: InputFormat,
}

impl FileSource {
    pub fn new(paths: Vec<PathBuf>, format: InputFormat) -> Self {
        Self { paths, format }
    }

    async fn expand_dir(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to list directory {}", dir.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to list directory {}", dir.display()))?
        {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Decode hex text, skipping whitespace
pub fn decode_hex(text: &str, file: &Path) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact).map_err(|source| Error::Hex {
        file: file.to_path_buf(),
        source,
    })
}

#[async_trait]
impl BlobSource for FileSource {
    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for path in &self.paths {
            let metadata = fs::metadata(path)
                .await
                .with_context(|| format!("Failed to stat {}", path.display()))?;
            if metadata.is_dir() {
                let files = Self::expand_dir(path).await?;
                tracing::debug!("Expanded {} into {} files", path.display(), files.len());
                names.extend(files.iter().map(|f| f.display().to_string()));
            } else {
                names.push(path.display().to_string());
            }
        }
        Ok(names)
    }

    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let path = Path::new(name);
        let bytes = match self.format {
            InputFormat::Raw => fs::read(path).await?,
            InputFormat::Hex => {
                let text = fs::read_to_string(path).await?;
                decode_hex(&text, path)?
            }
        };
        tracing::debug!("Read {} bytes from {}", bytes.len(), name);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sheng-viz-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_decode_hex_ignores_whitespace() {
        let bytes = decode_hex("de ad\n be\tef\n", Path::new("x.hex")).unwrap();
        assert_eq!(bytes, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_decode_hex_reports_file() {
        let err = decode_hex("zz", Path::new("bad.hex")).unwrap_err();
        match err {
            Error::Hex { file, .. } => assert_eq!(file, PathBuf::from("bad.hex")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_directory_entries_sorted() {
        let dir = scratch_dir("sorted");
        std::fs::write(dir.join("b.bin"), [2u8]).unwrap();
        std::fs::write(dir.join("a.bin"), [1u8]).unwrap();

        let source = FileSource::new(vec![dir.clone()], InputFormat::Raw);
        let names = source.list().await.unwrap();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("a.bin"));
        assert!(names[1].ends_with("b.bin"));
        assert_eq!(source.fetch(&names[1]).await.unwrap(), vec![2]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_fetch_hex_file() {
        let dir = scratch_dir("hex");
        let path = dir.join("blob.hex");
        std::fs::write(&path, "0102\n0304\n").unwrap();

        let source = FileSource::new(vec![path.clone()], InputFormat::Hex);
        let names = source.list().await.unwrap();
        assert_eq!(source.fetch(&names[0]).await.unwrap(), vec![1, 2, 3, 4]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_path_fails() {
        let source = FileSource::new(
            vec![PathBuf::from("/nonexistent/sheng-viz/blob.bin")],
            InputFormat::Raw,
        );
        assert!(source.list().await.is_err());
    }
}
