//! Supervises server launch sequencing and shutdown.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::service::echo_dispatcher;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the server using the production collaborators.
///
/// # Errors
///
/// Returns an error when bootstrap fails, the reactor cannot be started or
/// joined, or signal handling cannot be installed.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal::new(),
    )
}

/// Runs the server with injected collaborators.
///
/// Blocks in `shutdown` once the server is accepting connections, then stops
/// and joins the reactor thread.
///
/// # Errors
///
/// See [`run_daemon`].
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let dispatcher = echo_dispatcher()?;
    let daemon = bootstrap_with(loader, reporter, dispatcher)?;
    info!(
        target: PROCESS_TARGET,
        endpoint = %daemon.config().listen_endpoint(),
        "starting server runtime"
    );
    let running = daemon.start()?;
    let waited = shutdown.wait();
    running.shutdown()?;
    waited?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
