//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use courier_wire::{ClientError, UnknownValueType};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("argument `{argument}` must be written as type:value")]
    MissingTypePrefix { argument: String },
    #[error("argument `{argument}`: {source}")]
    UnknownType {
        argument: String,
        source: UnknownValueType,
    },
    #[error("argument `{argument}` is not valid JSON: {source}")]
    InvalidValue {
        argument: String,
        source: serde_json::Error,
    },
    #[error("failed to reach server at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: ClientError,
    },
    #[error("request failed: {0}")]
    Call(ClientError),
    #[error("failed to serialise response: {0}")]
    SerialiseResponse(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
