//! Configuration type definitions and defaults

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::{WindowSize, DEFAULT_MAX_CHUNK};
use crate::render::{ErrorPolicy, PollBackoff};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Check that every value is usable.
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<(), String> {
        self.capture.validate()?;
        self.render.validate()
    }
}

/// Capturer defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Largest single read from the PTY, stdin or the input FIFO
    #[serde(default = "default_max_chunk")]
    pub max_chunk: usize,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Window size used when stdin is not a terminal
    #[serde(default = "default_cols")]
    pub default_cols: u16,
    #[serde(default = "default_rows")]
    pub default_rows: u16,
}

pub fn default_max_chunk() -> usize {
    DEFAULT_MAX_CHUNK
}

pub fn default_poll_timeout_ms() -> u64 {
    50
}

pub fn default_cols() -> u16 {
    80
}

pub fn default_rows() -> u16 {
    24
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_chunk: default_max_chunk(),
            poll_timeout_ms: default_poll_timeout_ms(),
            default_cols: default_cols(),
            default_rows: default_rows(),
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk == 0 {
            return Err("capture.max_chunk must be > 0".to_string());
        }
        if self.poll_timeout_ms == 0 {
            return Err("capture.poll_timeout_ms must be > 0".to_string());
        }
        if self.default_cols == 0 || self.default_rows == 0 {
            return Err("capture.default_cols and capture.default_rows must be > 0".to_string());
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn default_size(&self) -> WindowSize {
        WindowSize {
            cols: self.default_cols,
            rows: self.default_rows,
        }
    }
}

/// Renderer defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub on_error: ErrorPolicy,
    #[serde(default = "default_follow_poll_min_ms")]
    pub follow_poll_min_ms: u64,
    #[serde(default = "default_follow_poll_max_ms")]
    pub follow_poll_max_ms: u64,
}

pub fn default_follow_poll_min_ms() -> u64 {
    10
}

pub fn default_follow_poll_max_ms() -> u64 {
    250
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            on_error: ErrorPolicy::default(),
            follow_poll_min_ms: default_follow_poll_min_ms(),
            follow_poll_max_ms: default_follow_poll_max_ms(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.follow_poll_min_ms == 0 {
            return Err("render.follow_poll_min_ms must be > 0".to_string());
        }
        if self.follow_poll_min_ms > self.follow_poll_max_ms {
            return Err(format!(
                "render.follow_poll_min_ms ({}) exceeds render.follow_poll_max_ms ({})",
                self.follow_poll_min_ms, self.follow_poll_max_ms
            ));
        }
        Ok(())
    }

    pub fn backoff(&self) -> PollBackoff {
        PollBackoff {
            min: Duration::from_millis(self.follow_poll_min_ms),
            max: Duration::from_millis(self.follow_poll_max_ms),
        }
    }
}

/// Diagnostic logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
}

pub fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}
