//! Demonstration target served by the `courierd` binary.

use std::cell::Cell;
use std::convert::Infallible;

use thiserror::Error;
use tracing::info;

use crate::dispatch::{Dispatcher, MethodTable, RegistryError};

const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::service");

/// Errors reported by [`EchoService`] arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The divisor was zero.
    #[error("division by zero")]
    DivisionByZero,
    /// The result does not fit in a 64-bit signed integer.
    #[error("integer overflow")]
    Overflow,
}

/// Small stateful service used to exercise the server end to end.
///
/// State lives in a [`Cell`]: every call runs on the reactor thread, one at a
/// time.
#[derive(Debug, Default)]
pub struct EchoService {
    completed: Cell<u64>,
}

impl EchoService {
    /// Creates a service with a zeroed call counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `text` unchanged.
    pub fn echo(&self, text: String) -> String {
        self.record();
        text
    }

    /// Adds two integers.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Overflow`] when the sum does not fit.
    pub fn add(&self, left: i64, right: i64) -> Result<i64, ServiceError> {
        let sum = left.checked_add(right).ok_or(ServiceError::Overflow)?;
        self.record();
        Ok(sum)
    }

    /// Joins `parts` without a separator.
    pub fn concat(&self, parts: Vec<String>) -> String {
        self.record();
        parts.concat()
    }

    /// Integer division truncating towards zero.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DivisionByZero`] for a zero divisor and
    /// [`ServiceError::Overflow`] for `i64::MIN / -1`.
    pub fn divide(&self, dividend: i64, divisor: i64) -> Result<i64, ServiceError> {
        if divisor == 0 {
            return Err(ServiceError::DivisionByZero);
        }
        let quotient = dividend
            .checked_div(divisor)
            .ok_or(ServiceError::Overflow)?;
        self.record();
        Ok(quotient)
    }

    /// Number of successful calls since creation or the last reset.
    pub fn count(&self) -> u64 {
        self.completed.get()
    }

    /// Zeroes the call counter.
    pub fn reset(&self) {
        self.completed.set(0);
    }

    /// Hook for in-process shutdown coordination; not callable remotely.
    pub fn shutdown_hook(&self) {
        info!(
            target: SERVICE_TARGET,
            completed = self.count(),
            "shutdown hook invoked"
        );
    }

    fn record(&self) {
        self.completed.set(self.completed.get().saturating_add(1));
    }

    /// Dispatch table exposing every operation of the service.
    ///
    /// # Errors
    ///
    /// Returns an error if two registrations collide.
    pub fn methods() -> Result<MethodTable<Self>, RegistryError> {
        MethodTable::builder()
            .method1("echo", |service: &Self, text: String| {
                Ok::<_, Infallible>(service.echo(text))
            })
            .method2("add", Self::add)
            .method1("concat", |service: &Self, parts: Vec<String>| {
                Ok::<_, Infallible>(service.concat(parts))
            })
            .method2("divide", Self::divide)
            .method0("count", |service: &Self| Ok::<_, Infallible>(service.count()))
            .method0("reset", |service: &Self| {
                service.reset();
                Ok::<_, Infallible>(())
            })
            .internal0("shutdown_hook", |service: &Self| {
                service.shutdown_hook();
                Ok::<_, Infallible>(())
            })
            .build()
    }
}

/// Builds a dispatcher bound to a fresh [`EchoService`].
///
/// # Errors
///
/// Returns an error if the method table cannot be built.
pub fn echo_dispatcher() -> Result<Dispatcher<EchoService>, RegistryError> {
    Ok(Dispatcher::new(EchoService::new(), EchoService::methods()?))
}
