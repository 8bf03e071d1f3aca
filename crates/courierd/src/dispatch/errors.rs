//! Error types for method registration and invocation.

use thiserror::Error;

use super::table::Signature;

/// Errors raised while assembling a [`MethodTable`](super::MethodTable).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two registrations share a name and parameter list.
    #[error("method {signature} is registered more than once")]
    DuplicateMethod {
        /// The conflicting signature.
        signature: Signature,
    },
    /// A method name is empty or only whitespace.
    #[error("method names must not be empty")]
    EmptyName,
}

/// Boxed error returned by a target method.
pub type MethodError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while running a resolved method.
///
/// These never reach the client: the dispatcher logs them and answers with
/// [`Failure::InvocationFailed`](courier_wire::Failure::InvocationFailed).
#[derive(Debug, Error)]
pub enum InvocationError {
    /// An argument position had no value.
    #[error("argument {index} is missing")]
    MissingArgument {
        /// Zero-based argument position.
        index: usize,
    },
    /// An argument value did not convert to the parameter type.
    #[error("argument {index} does not match its declared type: {source}")]
    Argument {
        /// Zero-based argument position.
        index: usize,
        /// Conversion failure.
        #[source]
        source: serde_json::Error,
    },
    /// The method's return value could not be serialized.
    #[error("failed to serialize result: {0}")]
    Result(#[source] serde_json::Error),
    /// The method reported an error.
    #[error("method failed: {0}")]
    Method(#[source] MethodError),
    /// The method panicked.
    #[error("method panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl InvocationError {
    /// Wraps an error reported by a target method.
    pub fn method(error: impl Into<MethodError>) -> Self {
        Self::Method(error.into())
    }
}
