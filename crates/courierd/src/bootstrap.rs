//! Server bootstrap orchestration.

use std::net::SocketAddr;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::debug;

use courier_config::Config;

use crate::dispatch::Dispatcher;
use crate::health::HealthReporter;
use crate::server::{Server, ServerHandle, StopHandle};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::ServerError;

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Binding the listen endpoint failed.
    #[error("failed to bind server: {source}")]
    Server {
        /// Underlying server error.
        #[source]
        source: ServerError,
    },
}

/// A configured server whose listener is bound but not yet serving.
pub struct Daemon {
    config: Config,
    server: Server,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Starts the reactor thread.
    ///
    /// # Errors
    ///
    /// Returns an error when the reactor thread cannot be spawned.
    pub fn start(self) -> Result<RunningDaemon, ServerError> {
        let handle = self.server.start()?;
        self.reporter.server_listening(handle.local_addr());
        Ok(RunningDaemon {
            handle,
            reporter: self.reporter,
        })
    }
}

/// A daemon whose reactor thread is serving connections.
pub struct RunningDaemon {
    handle: ServerHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl RunningDaemon {
    /// Address the server accepts connections on.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// Handle that can stop the server from another thread.
    #[must_use]
    pub fn stopper(&self) -> StopHandle {
        self.handle.stopper()
    }

    /// Stops the server, waits for the reactor thread, and reports it.
    ///
    /// # Errors
    ///
    /// Returns an error when the reactor thread panicked.
    pub fn shutdown(self) -> Result<(), ServerError> {
        let addr = self.handle.local_addr();
        self.handle.shutdown()?;
        self.reporter.server_stopped(addr);
        Ok(())
    }
}

/// Loads configuration, initialises telemetry, and binds `dispatcher`.
///
/// # Errors
///
/// Returns the first failing stage. Every failure is also passed to the
/// reporter.
pub fn bootstrap_with<T: Send + 'static>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    dispatcher: Dispatcher<T>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    for signature in dispatcher.signatures() {
        debug!(
            target: BOOTSTRAP_TARGET,
            signature = %signature,
            "method registered"
        );
    }

    let server = match Server::bind(&config.listen_endpoint(), dispatcher) {
        Ok(server) => server,
        Err(source) => {
            let error = BootstrapError::Server { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        server,
        telemetry,
        reporter,
    })
}
