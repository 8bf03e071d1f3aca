//! Compiled-in configuration defaults.

use crate::logging::LogFormat;

/// Loopback address the server binds to unless configured otherwise.
pub const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";

/// Default TCP port for the server.
pub const DEFAULT_LISTEN_PORT: u16 = 9779;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

