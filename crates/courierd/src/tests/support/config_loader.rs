//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};

use courier_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port.
#[derive(Debug, Default)]
pub struct TestConfigLoader {
    port: u16,
}

impl TestConfigLoader {
    #[must_use]
    pub const fn new() -> Self {
        Self { port: 0 }
    }

    /// Loader that asks for a specific port.
    #[must_use]
    pub const fn with_port(port: u16) -> Self {
        Self { port }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen_host: "127.0.0.1".to_owned(),
            listen_port: self.port,
            log_filter: "warn".to_owned(),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing an invalid CLI argument.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("courierd"),
            OsString::from("--listen-port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
