//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Environment variables
//! - Configuration files (TOML)
//! - Defaults

use crate::describe::charclass::DEFAULT_MAX_RANGES;
use crate::error::{Error, Result};
use crate::render::graph::DEFAULT_GRAPH_NAME;
use crate::source::InputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Ranges printed in a character class before it is cut short
    #[serde(default = "default_class_max_ranges")]
    pub class_max_ranges: usize,

    /// Name of the emitted DOT graph
    #[serde(default = "default_graph_name")]
    pub graph_name: String,
}

/// Input options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// How blob files are encoded on disk
    #[serde(default = "default_input_format")]
    pub format: InputFormat,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_class_max_ranges() -> usize {
    DEFAULT_MAX_RANGES
}

fn default_graph_name() -> String {
    DEFAULT_GRAPH_NAME.to_string()
}

fn default_input_format() -> InputFormat {
    InputFormat::Raw
}

fn default_log_level() -> String {
    "warn".to_string()
}

// Default implementations

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            class_max_ranges: default_class_max_ranges(),
            graph_name: default_graph_name(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            format: default_input_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        if config.render.class_max_ranges == 0 {
            return Err(Error::Config(format!(
                "render.class_max_ranges in {:?} must be at least 1",
                path
            )));
        }

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./sheng-viz.toml
    /// 2. ~/.sheng-viz/config.toml
    /// 3. /etc/sheng-viz/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("sheng-viz.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".sheng-viz").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/sheng-viz/config.toml"));

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Config::default())
    }
}
