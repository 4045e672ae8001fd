//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::source::InputFormat;
use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Sheng DFA program inspector
#[derive(Parser, Debug)]
#[command(name = "sheng-viz")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render program blobs as text dumps, DOT graphs or JSON summaries
    Inspect {
        /// Blob files or directories of blob files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Input encoding (overrides config)
        #[arg(short, long, value_enum)]
        input: Option<InputFormat>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Write one file per blob into this directory instead of stdout
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Render the built-in demo programs
    Demo {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Check that blobs open cleanly
    Validate {
        /// Blob files or directories of blob files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Input encoding (overrides config)
        #[arg(short, long, value_enum)]
        input: Option<InputFormat>,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Line-oriented dump
    Text,
    /// DOT format (Graphviz)
    Dot,
    /// JSON summary
    Json,
}

impl OutputFormat {
    /// File extension used with `--out-dir`
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Dot => "dot",
            OutputFormat::Json => "json",
        }
    }
}

/// Execute the CLI command
pub async fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Inspect {
            paths,
            input,
            output,
            out_dir,
        } => {
            let format = input.unwrap_or(config.input.format);
            commands::inspect::execute(paths, format, output, out_dir, &config).await
        }
        Commands::Demo { output } => commands::demo::execute(output, &config).await,
        Commands::Validate { paths, input } => {
            let format = input.unwrap_or(config.input.format);
            commands::validate::execute(paths, format).await
        }
    }
}
