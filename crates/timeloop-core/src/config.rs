//! Configuration loading and typed config structures.
//!
//! The configuration lives in `timeloop-config.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure and a loader that
//! reads it, applies environment overrides, and validates the result.

use std::path::Path;

use serde::Deserialize;
use timeloop_types::{DEFAULT_LOOP_DURATION_SECONDS, EventDefinition};

use crate::engine::LoopEngine;
use crate::error::LoopError;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config: {source}")]
    Invalid {
        /// The rejected engine parameter.
        #[from]
        source: LoopError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoopConfig {
    /// Loop timing.
    #[serde(default, rename = "loop")]
    pub timing: LoopSettings,

    /// Update driver settings.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Events bound at startup.
    #[serde(default)]
    pub events: Vec<EventDefinition>,
}

impl LoopConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `TIMELOOP_LOOP_DURATION` overrides `loop.duration_seconds`
    /// - `TIMELOOP_TIME_SCALE` overrides `loop.time_scale`
    /// - `TIMELOOP_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a timing value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a timing value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override values from `TIMELOOP_*` environment variables.
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(duration) = env_f64("TIMELOOP_LOOP_DURATION") {
            self.timing.duration_seconds = duration;
        }
        if let Some(scale) = env_f64("TIMELOOP_TIME_SCALE") {
            self.timing.time_scale = scale;
        }
        if let Ok(level) = std::env::var("TIMELOOP_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Check timing values against the engine's rules.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError`] for a non-positive duration or a negative or
    /// non-finite time scale.
    pub fn validate(&self) -> Result<(), LoopError> {
        LoopEngine::<()>::new(self.timing.duration_seconds, self.timing.time_scale).map(|_| ())
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Loop timing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoopSettings {
    /// Length of one loop iteration, in simulated seconds.
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: f64,

    /// Initial time scale.
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Whether the engine starts running immediately.
    #[serde(default = "default_start_running")]
    pub start_running: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            duration_seconds: default_duration_seconds(),
            time_scale: default_time_scale(),
            start_running: default_start_running(),
        }
    }
}

/// Settings for the update driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverConfig {
    /// Caller time passed to each update, in seconds.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,

    /// Number of updates to run.
    #[serde(default = "default_ticks")]
    pub ticks: u32,

    /// Store slot used for the save/restore cycle.
    #[serde(default = "default_save_slot")]
    pub save_slot: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            ticks: default_ticks(),
            save_slot: default_save_slot(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_duration_seconds() -> f64 {
    DEFAULT_LOOP_DURATION_SECONDS
}

const fn default_time_scale() -> f64 {
    1.0
}

const fn default_start_running() -> bool {
    true
}

const fn default_tick_seconds() -> f64 {
    1.0 / 60.0
}

const fn default_ticks() -> u32 {
    600
}

fn default_save_slot() -> String {
    "autosave".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}
