//! Single-threaded remote-invocation server.
//!
//! `courierd` binds one TCP listener and serves every connection from a single
//! reactor thread. Each connection sends JSON lines requests naming a method,
//! its declared parameter types, and its arguments; the reactor resolves the
//! method against one bound target, invokes it, and writes the response before
//! reading the next request from that connection.
//!
//! The crate is layered as follows:
//!
//! - [`dispatch`] holds the explicit method table and the [`Dispatcher`] that
//!   turns requests into responses without ever failing itself.
//! - The transport layer drives non-blocking sockets with `mio`; a connection
//!   is either awaiting a request or writing one response, never both.
//! - [`Server`] and [`ServerHandle`] own the reactor thread and its
//!   start/stop/join lifecycle.
//! - The bootstrap and process modules load configuration, initialise
//!   structured telemetry, and wait for termination signals.
//!
//! Because dispatch runs on the reactor thread, a slow target method delays
//! every connection. Targets keep their state behind interior mutability and
//! never see concurrent calls.

mod bootstrap;
pub mod dispatch;
mod health;
mod process;
mod server;
mod service;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, RunningDaemon, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use dispatch::{Access, Dispatcher, Invoker, MethodTable, Signature};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon, run_daemon_with,
};
pub use server::{Server, ServerHandle, StopHandle};
pub use service::{EchoService, ServiceError, echo_dispatcher};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ServerError;

#[cfg(test)]
mod tests;
