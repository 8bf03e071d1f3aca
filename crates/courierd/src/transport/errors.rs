//! Error types for the reactor and its connections.

use std::io;
use std::net::SocketAddr;

use courier_wire::CodecError;
use thiserror::Error;

/// Errors surfaced while binding, starting, or joining the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },
    #[error("failed to bind TCP listener at {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[error("failed to read the bound listener address: {source}")]
    LocalAddr {
        #[source]
        source: io::Error,
    },
    #[error("failed to create readiness poll: {source}")]
    Poll {
        #[source]
        source: io::Error,
    },
    #[error("failed to register listener for readiness: {source}")]
    Register {
        #[source]
        source: io::Error,
    },
    #[error("failed to create reactor waker: {source}")]
    Waker {
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn reactor thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    #[error("reactor thread panicked")]
    ThreadPanic,
}

/// Reasons a single connection is torn down.
///
/// These never leave the reactor: they are logged and the connection is
/// closed while every other connection keeps being served.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("socket IO failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
