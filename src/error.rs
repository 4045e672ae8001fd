//! This module defines all error types used throughout the application.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// A header field or section offset disagrees with the declared blob length
    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    /// The outer container does not hold a sheng engine
    #[error("Unsupported engine variant: {name} (tag {tag:#04x})")]
    UnsupportedVariant { tag: u8, name: &'static str },

    /// A decoded state id does not name a live state
    #[error("State {state} out of range in {context} (state count {state_count})")]
    OutOfRangeState {
        state: u8,
        state_count: u8,
        context: String,
    },

    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Hex-encoded input could not be decoded
    #[error("Hex decoding error in {file:?}: {source}")]
    Hex {
        file: PathBuf,
        #[source]
        source: hex::FromHexError,
    },

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),

    /// Wrapped anyhow errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a malformed header error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }

    /// Create an unsupported variant error for a container type tag
    pub fn unsupported(tag: u8) -> Self {
        Self::UnsupportedVariant {
            tag,
            name: crate::program::EngineType::describe_tag(tag),
        }
    }

    /// Create an out-of-range state error
    pub fn out_of_range(state: u8, state_count: u8, context: impl Into<String>) -> Self {
        Self::OutOfRangeState {
            state,
            state_count,
            context: context.into(),
        }
    }

    /// Stable name of the error kind, used in batch reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedHeader { .. } => "MalformedHeader",
            Error::UnsupportedVariant { .. } => "UnsupportedVariant",
            Error::OutOfRangeState { .. } => "OutOfRangeState",
            Error::Io(_) => "Io",
            Error::Hex { .. } => "Hex",
            Error::Json(_) => "Json",
            Error::Config(_) => "Config",
            Error::Custom(_) | Error::Other(_) => "Other",
        }
    }

    /// Whether the error comes from interpreting blob contents
    pub fn is_blob_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedHeader { .. }
                | Error::UnsupportedVariant { .. }
                | Error::OutOfRangeState { .. }
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
