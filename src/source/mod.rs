//! Source module - Abstraction for fetching program blobs
//!
//! Blobs come either from disk (raw or hex-encoded files) or from the
//! built-in demo programs.

use crate::Result;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod file;
pub mod mock;

pub use file::FileSource;
pub use mock::MockSource;

/// How blob bytes are encoded on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Bytes exactly as serialized
    Raw,
    /// Hex text, whitespace ignored
    Hex,
}

/// Blob source trait
///
/// Names returned by [`BlobSource::list`] are stable and ordered; callers
/// report results in that order.
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// Names of every blob this source provides
    async fn list(&self) -> Result<Vec<String>>;

    /// Bytes of a single blob
    async fn fetch(&self, name: &str) -> Result<Vec<u8>>;
}

/// Where blobs are read from
#[derive(Debug, Clone)]
pub enum SourceKind {
    Files {
        paths: Vec<PathBuf>,
        format: InputFormat,
    },
    Mock,
}

/// Create a blob source for the given kind
pub fn create_blob_source(kind: SourceKind) -> Box<dyn BlobSource> {
    match kind {
        SourceKind::Files { paths, format } => Box::new(FileSource::new(paths, format)),
        SourceKind::Mock => Box::new(MockSource::new()),
    }
}
