//! Method resolution and invocation for incoming requests.
//!
//! A [`Dispatcher`] owns one target instance and a [`MethodTable`] describing
//! the operations callers may reach on it. Methods are identified by their
//! name together with the ordered list of declared parameter types, so
//! overloads are distinct entries:
//!
//! ```json
//! {"method":"add","param_types":["int","int"],"params":[2,3]}
//! {"method":"add","param_types":["string","string"],"params":["a","b"]}
//! ```
//!
//! Resolution is an exact lookup. Anything that goes wrong after a request
//! has been decoded becomes a [`Failure`](courier_wire::Failure) value in the
//! response, never a dropped connection:
//!
//! - no entry for the signature yields `method_not_found`;
//! - an entry registered with [`Access::Internal`] yields `access_denied`;
//! - a method error, argument conversion error, or panic yields
//!   `invocation_failed`, with the cause written to the log only.

mod dispatcher;
mod errors;
mod params;
mod table;

pub use self::dispatcher::{Dispatcher, Invoker};
pub use self::errors::{InvocationError, MethodError, RegistryError};
pub use self::params::WireType;
pub use self::table::{Access, Handler, MethodTable, MethodTableBuilder, Signature};

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
