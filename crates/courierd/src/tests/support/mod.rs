//! Shared doubles and worlds for the behavioural suites.

mod config_loader;
mod reporter;
mod server_world;
mod targets;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use server_world::{ServerWorld, echo_request, is_server_close, parse_failure};
pub use targets::{FaultyService, faulty_dispatcher};
