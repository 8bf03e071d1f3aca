//! Blocking client for issuing requests to a Courier server.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;

use crate::codec::{CodecError, encode_frame, take_frame};
use crate::message::{Request, Response};

/// Connect and read timeout applied unless overridden.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by [`Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The address did not resolve to a usable socket address.
    #[error("failed to resolve server address {address}: {source}")]
    Resolve {
        /// Address as supplied by the caller.
        address: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Establishing the connection failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Resolved address.
        addr: SocketAddr,
        /// Connection error.
        #[source]
        source: io::Error,
    },
    /// The server closed the connection before a full response arrived.
    #[error("server closed the connection")]
    Closed,
    /// Reading or writing the socket failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Framing or parsing a message failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Synchronous request/response client speaking the JSON lines protocol.
///
/// Requests may be written ahead of their responses with [`Client::send`];
/// the server answers them in the order they were sent.
#[derive(Debug)]
pub struct Client {
    stream: TcpStream,
    inbound: Vec<u8>,
}

impl Client {
    /// Connects to `address` using [`DEFAULT_CLIENT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns an error when the address does not resolve or the connection
    /// cannot be established.
    pub fn connect(address: impl ToSocketAddrs + fmt::Debug) -> Result<Self, ClientError> {
        Self::connect_with_timeout(address, DEFAULT_CLIENT_TIMEOUT)
    }

    /// Connects to `address`, bounding connect and read waits by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the address does not resolve or the connection
    /// cannot be established.
    pub fn connect_with_timeout(
        address: impl ToSocketAddrs + fmt::Debug,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let addr = resolve(&address)?;
        let stream = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|source| ClientError::Connect { addr, source })?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            inbound: Vec::new(),
        })
    }

    /// Sends `request` and waits for its response.
    ///
    /// # Errors
    ///
    /// Returns an error when writing, reading, or parsing fails, or the server
    /// closes the connection.
    pub fn call(&mut self, request: &Request) -> Result<Response, ClientError> {
        self.send(request)?;
        self.receive()
    }

    /// Writes one request frame without waiting for the response.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or writing fails.
    pub fn send(&mut self, request: &Request) -> Result<(), ClientError> {
        let mut frame = Vec::new();
        encode_frame(request, &mut frame)?;
        self.send_raw(&frame)
    }

    /// Writes raw bytes to the server, bypassing request framing.
    ///
    /// # Errors
    ///
    /// Returns an error when writing fails.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Blocks until the next response frame arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] when the server closes the connection
    /// first, or an IO or parse error.
    pub fn receive(&mut self) -> Result<Response, ClientError> {
        let mut chunk = [0_u8; 4096];
        loop {
            if let Some(frame) = take_frame(&mut self.inbound)? {
                return serde_json::from_slice(&frame)
                    .map_err(|error| ClientError::Codec(CodecError::from_json_error(error)));
            }
            let read = match self.stream.read(&mut chunk) {
                Ok(0) => return Err(ClientError::Closed),
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(ClientError::Io(error)),
            };
            self.inbound.extend_from_slice(chunk.get(..read).unwrap_or_default());
        }
    }

    /// Shuts down the writing half so the server observes end-of-stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the socket cannot be shut down.
    pub fn finish_sending(&self) -> Result<(), ClientError> {
        self.stream.shutdown(std::net::Shutdown::Write)?;
        Ok(())
    }
}

fn resolve(address: &(impl ToSocketAddrs + fmt::Debug)) -> Result<SocketAddr, ClientError> {
    let mut addrs = address
        .to_socket_addrs()
        .map_err(|source| ClientError::Resolve {
            address: format!("{address:?}"),
            source,
        })?;
    addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| ClientError::Resolve {
            address: format!("{address:?}"),
            source: io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"),
        })
}
