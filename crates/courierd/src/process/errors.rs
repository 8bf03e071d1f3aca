//! Defines the unified error surface for launching the server process.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::dispatch::RegistryError;
use crate::transport::ServerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the server process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The service's method table could not be built.
    #[error("failed to build method table: {source}")]
    Registry {
        /// Underlying registration error.
        #[source]
        source: RegistryError,
    },
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Starting or stopping the reactor failed.
    #[error("server failure: {source}")]
    Server {
        /// Underlying server error.
        #[source]
        source: ServerError,
    },
    /// Waiting for a termination signal failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

impl From<RegistryError> for LaunchError {
    fn from(source: RegistryError) -> Self {
        Self::Registry { source }
    }
}

impl From<ServerError> for LaunchError {
    fn from(source: ServerError) -> Self {
        Self::Server { source }
    }
}
