//! Sheng DFA program inspector
//!
//! Reads compiled sheng automata (small DFAs of at most 16 states whose
//! transitions run as a single byte shuffle) and renders them for humans.
//!
//! This library provides functionality for:
//! - Validating program blobs and decoding transitions, reports and acceleration info
//! - Dumping programs as line-oriented text
//! - Building transition graphs and exporting them to Graphviz DOT
//! - Summarizing programs as JSON
//! - Reading blobs from files, directories or built-in demo programs

pub mod cli;
pub mod config;
pub mod describe;
pub mod error;
pub mod program;
pub mod render;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
