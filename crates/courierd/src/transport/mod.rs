//! Readiness-driven socket handling.
//!
//! A single reactor thread owns the listener and every accepted connection.
//! Each connection alternates between reading one request and writing its
//! response; nothing here blocks on a socket.

mod connection;
mod errors;
mod reactor;
#[cfg(test)]
mod test_utils;

pub use self::errors::ServerError;
pub(crate) use self::reactor::Reactor;

const REACTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::reactor");
