//! Test harness utilities shared by the unit and behavioural suites.

mod client;
mod config_loader;
mod reporter;
mod shutdown;
mod world;

pub use client::{
    TestClient, expression_server, listening_server, loopback_settings, tick_until,
};
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use shutdown::ScriptedShutdown;
pub use world::{SessionWorld, world};
