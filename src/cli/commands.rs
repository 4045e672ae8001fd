//! CLI command implementations
//!
//! This module contains the implementation for each CLI command. Every
//! command runs a batch: blobs are fetched and processed concurrently, with
//! the CPU-bound decoding on the blocking pool, and results are reported in
//! input order.

use crate::source::BlobSource;
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-blob work: blob name and bytes in, rendered output out
pub type Job = Arc<dyn Fn(&str, &[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// Outcome of one blob in a batch
pub struct BlobOutcome {
    pub name: String,
    pub result: Result<Vec<u8>>,
}

/// Fetch and process every blob of `source`, preserving listing order
pub async fn run_batch(source: Arc<dyn BlobSource>, job: Job) -> Result<Vec<BlobOutcome>> {
    let names = source.list().await?;
    tracing::info!("Processing {} blobs", names.len());

    let handles: Vec<_> = names
        .into_iter()
        .map(|name| {
            let source = Arc::clone(&source);
            let job = Arc::clone(&job);
            let task = tokio::spawn(process_one(source, job, name.clone()));
            (name, task)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, task) in handles {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(Error::Other(anyhow::Error::new(e))),
        };
        outcomes.push(BlobOutcome { name, result });
    }
    Ok(outcomes)
}

async fn process_one(source: Arc<dyn BlobSource>, job: Job, name: String) -> Result<Vec<u8>> {
    let blob = source.fetch(&name).await?;
    tracing::debug!("Fetched {} ({} bytes)", name, blob.len());

    tokio::task::spawn_blocking(move || job(&name, &blob))
        .await
        .map_err(|e| Error::Other(anyhow::Error::new(e)))?
}

/// Log a failed blob on both the tracing stream and stderr
///
/// Bad blob contents are expected in a batch; anything else (unreadable
/// file, bad hex, join failure) is logged as an error.
fn report_failure(name: &str, err: &Error) {
    if err.is_blob_error() {
        tracing::warn!(blob = name, kind = err.kind(), "{}", err);
    } else {
        tracing::error!(blob = name, kind = err.kind(), "{}", err);
    }
    eprintln!("{}: {}: {}", name, err.kind(), err);
}

/// Turn the failure count into the batch result
fn finish(failures: usize, total: usize) -> Result<()> {
    if failures == 0 {
        tracing::info!("All {} blobs processed", total);
        Ok(())
    } else {
        Err(Error::custom(format!(
            "{} of {} blobs failed",
            failures, total
        )))
    }
}

/// Path of the output file for `name` inside `dir`
fn output_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    let stem = Path::new(name)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    dir.join(format!("{}.{}", stem, extension))
}

/// Write rendered outcomes to stdout or `out_dir`, returning the failure count
async fn emit(
    outcomes: Vec<BlobOutcome>,
    out_dir: Option<&Path>,
    extension: &str,
) -> Result<usize> {
    if let Some(dir) = out_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut failures = 0;
    for outcome in outcomes {
        match outcome.result {
            Ok(bytes) => match out_dir {
                Some(dir) => {
                    let path = output_path(dir, &outcome.name, extension);
                    tokio::fs::write(&path, &bytes).await?;
                    tracing::info!("Wrote {:?}", path);
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&bytes)?;
                    stdout.flush()?;
                }
            },
            Err(e) => {
                report_failure(&outcome.name, &e);
                failures += 1;
            }
        }
    }
    Ok(failures)
}

/// Inspect command implementation
pub mod inspect {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::cli::output::render_blob;
    use crate::source::{InputFormat, SourceKind, create_blob_source};
    use crate::Config;

    /// Execute the inspect command
    pub async fn execute(
        paths: Vec<PathBuf>,
        input: InputFormat,
        output: OutputFormat,
        out_dir: Option<PathBuf>,
        config: &Config,
    ) -> Result<()> {
        tracing::info!("Inspecting {} paths as {:?}", paths.len(), input);

        let source: Arc<dyn BlobSource> = Arc::from(create_blob_source(SourceKind::Files {
            paths,
            format: input,
        }));
        let render = config.render.clone();
        let job: Job = Arc::new(move |name: &str, blob: &[u8]| {
            render_blob(name, blob, output, &render)
        });

        let outcomes = run_batch(source, job).await?;
        let total = outcomes.len();
        let failures = emit(outcomes, out_dir.as_deref(), output.extension()).await?;
        finish(failures, total)
    }
}

/// Demo command implementation
pub mod demo {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::cli::output::render_blob;
    use crate::source::{SourceKind, create_blob_source};
    use crate::Config;

    /// Execute the demo command
    pub async fn execute(output: OutputFormat, config: &Config) -> Result<()> {
        let source: Arc<dyn BlobSource> = Arc::from(create_blob_source(SourceKind::Mock));
        let render = config.render.clone();
        let job: Job = Arc::new(move |name: &str, blob: &[u8]| {
            let mut buf = match output {
                OutputFormat::Json => Vec::new(),
                _ => format!("== {} ==\n", name).into_bytes(),
            };
            buf.extend(render_blob(name, blob, output, &render)?);
            Ok(buf)
        });

        let outcomes = run_batch(source, job).await?;
        let total = outcomes.len();
        let failures = emit(outcomes, None, output.extension()).await?;
        finish(failures, total)
    }
}

/// Validate command implementation
pub mod validate {
    use super::*;
    use crate::program::Program;
    use crate::source::{InputFormat, SourceKind, create_blob_source};

    /// One status line for a blob that opened cleanly
    pub fn check(name: &str, blob: &[u8]) -> Result<Vec<u8>> {
        let program = Program::open(blob, blob.len())?;
        Ok(format!(
            "{}: OK ({} states, {} bytes)\n",
            name,
            program.state_count(),
            program.len()
        )
        .into_bytes())
    }

    /// Execute the validate command
    pub async fn execute(paths: Vec<PathBuf>, input: InputFormat) -> Result<()> {
        tracing::info!("Validating {} paths", paths.len());

        let source: Arc<dyn BlobSource> = Arc::from(create_blob_source(SourceKind::Files {
            paths,
            format: input,
        }));
        let job: Job = Arc::new(check);

        let outcomes = run_batch(source, job).await?;
        let total = outcomes.len();
        let failures = emit(outcomes, None, "txt").await?;
        finish(failures, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;
    use async_trait::async_trait;

    /// Serves a valid blob and a truncated copy of it
    struct MixedSource;

    #[async_trait]
    impl BlobSource for MixedSource {
        async fn list(&self) -> Result<Vec<String>> {
            Ok(vec!["good".to_string(), "bad".to_string(), "also-good".to_string()])
        }

        async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
            let blob = crate::program::BlobBuilder::new(2).build();
            Ok(match name {
                "bad" => blob[..64].to_vec(),
                _ => blob,
            })
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_continues() {
        let job: Job = Arc::new(validate::check);
        let outcomes = run_batch(Arc::new(MixedSource), job).await.unwrap();

        let names: Vec<_> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["good", "bad", "also-good"]);
        assert!(outcomes[0].result.is_ok());
        assert_eq!(
            outcomes[1].result.as_ref().unwrap_err().kind(),
            "MalformedHeader"
        );
        assert!(outcomes[1].result.as_ref().unwrap_err().is_blob_error());
        assert!(outcomes[2].result.is_ok());
    }

    #[tokio::test]
    async fn test_failures_counted() {
        let job: Job = Arc::new(validate::check);
        let outcomes = run_batch(Arc::new(MixedSource), job).await.unwrap();
        let dir = std::env::temp_dir().join(format!("sheng-viz-emit-{}", std::process::id()));

        let failures = emit(outcomes, Some(&dir), "txt").await.unwrap();
        assert_eq!(failures, 1);
        assert!(dir.join("good.txt").exists());
        assert!(!dir.join("bad.txt").exists());
        assert!(finish(failures, 3).is_err());
        assert!(finish(0, 3).is_ok());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_demo_programs_validate() {
        let job: Job = Arc::new(validate::check);
        let outcomes = run_batch(Arc::new(MockSource::new()), job).await.unwrap();
        assert_eq!(outcomes.len(), 4);
        for outcome in outcomes {
            let line = String::from_utf8(outcome.result.unwrap()).unwrap();
            assert!(line.contains(": OK ("), "{}", line);
        }
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("out"), "blobs/a.bin", "dot");
        assert_eq!(path, PathBuf::from("out/a.bin.dot"));
    }
}
