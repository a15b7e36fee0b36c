//! Shared configuration for the conch REPL server.
//!
//! Values are layered by [`ortho_config`]: built-in defaults first, then an
//! optional TOML file (`--config-path` or `CONCH_CONFIG_PATH`), then
//! `CONCH_*` environment variables, and finally command-line flags.

mod defaults;
mod endpoint;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_MAX_COMMAND_BYTES, DEFAULT_PORT, DEFAULT_PROMPT,
    DEFAULT_READ_CHUNK_SIZE, DEFAULT_TICK_INTERVAL_MS, default_listen_endpoint,
    default_log_filter, default_log_filter_string, default_log_format, default_prompt,
};
pub use endpoint::{EndpointParseError, ListenEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CONCH")]
pub struct Config {
    /// Endpoint the single listening socket binds.
    #[ortho_config(default = default_listen_endpoint())]
    pub listen: ListenEndpoint,
    /// Delay between the end of one tick and the start of the next.
    #[ortho_config(default = DEFAULT_TICK_INTERVAL_MS)]
    pub tick_interval_ms: u64,
    /// Maximum bytes read from one client per tick.
    #[ortho_config(default = DEFAULT_READ_CHUNK_SIZE)]
    pub read_chunk_size: usize,
    /// Largest unterminated command a client may buffer before it is dropped.
    #[ortho_config(default = DEFAULT_MAX_COMMAND_BYTES)]
    pub max_command_bytes: usize,
    /// Prompt sent on connect and after each evaluated command.
    #[ortho_config(default = default_prompt())]
    pub prompt: String,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen_endpoint(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_command_bytes: DEFAULT_MAX_COMMAND_BYTES,
            prompt: default_prompt(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint the listener binds.
    #[must_use]
    pub fn listen(&self) -> &ListenEndpoint {
        &self.listen
    }

    /// Scheduling quantum between ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Maximum bytes read from one client per tick.
    #[must_use]
    pub fn read_chunk_size(&self) -> usize {
        self.read_chunk_size
    }

    /// Input-buffer cap per client.
    #[must_use]
    pub fn max_command_bytes(&self) -> usize {
        self.max_command_bytes
    }

    /// Prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Rejects values that would stall or break the server loop.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "tick_interval_ms",
            });
        }
        if self.read_chunk_size == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "read_chunk_size",
            });
        }
        if self.max_command_bytes == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "max_command_bytes",
            });
        }
        Ok(())
    }
}

/// Errors raised by [`Config::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A field that must be positive was zero.
    #[error("configuration field '{field}' must be greater than zero")]
    ZeroValue {
        /// Name of the offending field.
        field: &'static str,
    },
}
