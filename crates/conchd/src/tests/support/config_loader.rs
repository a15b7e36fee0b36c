//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};

use conch_config::{Config, ListenEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port and ticks every millisecond.
#[derive(Debug, Default, Clone)]
pub struct TestConfigLoader {
    port: u16,
    tick_interval_ms: Option<u64>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the listener to `port` instead of an ephemeral one.
    #[must_use]
    pub fn on_port(port: u16) -> Self {
        Self {
            port,
            tick_interval_ms: None,
        }
    }

    /// Overrides the tick interval, including with values that fail validation.
    #[must_use]
    pub fn with_tick_interval_ms(mut self, tick_interval_ms: u64) -> Self {
        self.tick_interval_ms = Some(tick_interval_ms);
        self
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen: ListenEndpoint::tcp("127.0.0.1", self.port),
            tick_interval_ms: self.tick_interval_ms.unwrap_or(1),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("conchd"),
            OsString::from("--listen"),
            OsString::from("unix:///tmp/conch.sock"),
        ];
        Config::load_from_iter(args)
    }
}
