//! Shared configuration for the Courier server and client.
//!
//! Configuration is layered by `ortho_config`: compiled defaults first, then a
//! TOML file named by `--config-path` or `COURIER_CONFIG_PATH`, then
//! `COURIER_*` environment variables, and finally command-line flags.

mod defaults;
mod endpoint;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT, DEFAULT_LOG_FILTER, default_log_filter,
    default_log_format,
};
pub use endpoint::ListenEndpoint;
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration shared by `courierd` and the `courier` client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "COURIER")]
pub struct Config {
    /// Host name or address the server binds to.
    #[ortho_config(default = DEFAULT_LISTEN_HOST.to_owned())]
    pub listen_host: String,
    /// TCP port the server binds to. Zero requests an ephemeral port.
    #[ortho_config(default = DEFAULT_LISTEN_PORT)]
    pub listen_port: u16,
    /// `tracing` filter expression applied to the log output.
    #[ortho_config(default = DEFAULT_LOG_FILTER.to_owned())]
    pub log_filter: String,
    /// Output format for log records.
    #[ortho_config(default = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_host: DEFAULT_LISTEN_HOST.to_owned(),
            listen_port: DEFAULT_LISTEN_PORT,
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint assembled from the configured host and port.
    #[must_use]
    pub fn listen_endpoint(&self) -> ListenEndpoint {
        ListenEndpoint::new(self.listen_host.clone(), self.listen_port)
    }

    /// Filter expression for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Selected log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
