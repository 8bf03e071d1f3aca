//! Resolves requests against the bound target and captures every failure as a
//! response value.

use std::panic::{self, AssertUnwindSafe};

use courier_wire::{Failure, Request, Response, Value};
use tracing::{debug, warn};

use super::DISPATCH_TARGET;
use super::errors::InvocationError;
use super::table::{Access, MethodTable, Signature};

/// Turns a decoded request into a response.
///
/// The reactor only sees this trait, so it stays independent of the target
/// type. Implementations run on the reactor thread and must not panic.
pub trait Invoker: Send + 'static {
    /// Produces the response for `request`.
    fn invoke(&self, request: &Request) -> Response;
}

/// Dispatcher bound to a single target instance.
///
/// The target is owned here and only ever borrowed immutably, one call at a
/// time, on the reactor thread. Targets that keep state use interior
/// mutability.
pub struct Dispatcher<T> {
    target: T,
    methods: MethodTable<T>,
}

impl<T> Dispatcher<T> {
    /// Binds `methods` to `target`.
    pub const fn new(target: T, methods: MethodTable<T>) -> Self {
        Self { target, methods }
    }

    /// Borrow of the bound target.
    pub const fn target(&self) -> &T {
        &self.target
    }

    /// The dispatch table.
    pub const fn methods(&self) -> &MethodTable<T> {
        &self.methods
    }

    /// Registered signatures in sorted order.
    #[must_use]
    pub fn signatures(&self) -> Vec<&Signature> {
        self.methods.signatures()
    }

    /// Resolves and runs `request`.
    ///
    /// Never panics and never returns an error: unresolved methods, refused
    /// methods, and failing methods all become [`Response::Failure`].
    pub fn dispatch(&self, request: &Request) -> Response {
        let signature = Signature::new(request.method.as_str(), request.param_types.clone());
        let Some(registration) = self.methods.resolve(&signature) else {
            debug!(
                target: DISPATCH_TARGET,
                signature = %signature,
                "no method matches request"
            );
            return Response::failure(Failure::MethodNotFound);
        };

        if registration.access == Access::Internal {
            warn!(
                target: DISPATCH_TARGET,
                signature = %signature,
                "refused call to internal method"
            );
            return Response::failure(Failure::AccessDenied);
        }

        match run_guarded(|| (registration.handler)(&self.target, &request.params)) {
            Ok(value) => {
                debug!(
                    target: DISPATCH_TARGET,
                    signature = %signature,
                    "method completed"
                );
                Response::success(value)
            }
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    signature = %signature,
                    error = %error,
                    "method invocation failed"
                );
                Response::failure(Failure::InvocationFailed)
            }
        }
    }
}

impl<T: Send + 'static> Invoker for Dispatcher<T> {
    fn invoke(&self, request: &Request) -> Response {
        self.dispatch(request)
    }
}

fn run_guarded<F>(call: F) -> Result<Value, InvocationError>
where
    F: FnOnce() -> Result<Value, InvocationError>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(InvocationError::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
