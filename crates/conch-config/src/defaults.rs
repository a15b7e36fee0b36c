use crate::endpoint::ListenEndpoint;
use crate::logging::LogFormat;

/// Default host the server binds.
pub const DEFAULT_HOST: &str = "localhost";

/// Default TCP port for the REPL listener.
pub const DEFAULT_PORT: u16 = 13254;

/// Default scheduling quantum between ticks, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Default number of bytes read from a client per tick.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Default cap on a client's buffered, not yet terminated command text.
pub const DEFAULT_MAX_COMMAND_BYTES: usize = 1024 * 1024;

/// Prompt written on connect and after every evaluated command.
pub const DEFAULT_PROMPT: &str = ">>> ";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Owned prompt value.
pub fn default_prompt() -> String {
    DEFAULT_PROMPT.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Endpoint the server binds when nothing else is configured.
pub fn default_listen_endpoint() -> ListenEndpoint {
    ListenEndpoint::tcp(DEFAULT_HOST, DEFAULT_PORT)
}
