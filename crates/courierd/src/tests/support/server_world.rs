//! World shared by the scenarios that talk to a running server over TCP.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use courier_config::ListenEndpoint;
use courier_wire::{Client, ClientError, Failure, Request, Response, ValueType};

use crate::dispatch::Dispatcher;
use crate::server::{Server, ServerHandle};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Running server plus the named clients connected to it.
#[derive(Default)]
pub struct ServerWorld {
    handle: Option<ServerHandle>,
    addr: Option<SocketAddr>,
    clients: HashMap<String, Client>,
    responses: HashMap<String, Vec<Response>>,
}

impl ServerWorld {
    /// Binds an ephemeral loopback port and starts serving `dispatcher`.
    pub fn start<T: Send + 'static>(&mut self, dispatcher: Dispatcher<T>) -> Result<(), String> {
        if self.handle.is_some() {
            return Err("server already running".to_owned());
        }
        let endpoint = ListenEndpoint::new("127.0.0.1", 0);
        let server = Server::bind(&endpoint, dispatcher).map_err(|error| error.to_string())?;
        let handle = server.start().map_err(|error| error.to_string())?;
        self.addr = Some(handle.local_addr());
        self.handle = Some(handle);
        Ok(())
    }

    pub fn addr(&self) -> Result<SocketAddr, String> {
        self.addr.ok_or_else(|| "server was never started".to_owned())
    }

    /// Stops the server and waits for the reactor thread.
    pub fn shutdown(&mut self) -> Result<(), String> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| "server not running".to_owned())?;
        handle.shutdown().map_err(|error| error.to_string())
    }

    pub fn connect(&mut self, name: &str) -> Result<(), String> {
        self.connect_with_timeout(name, CLIENT_TIMEOUT)
    }

    /// Connects `name` with a custom read timeout.
    pub fn connect_with_timeout(&mut self, name: &str, timeout: Duration) -> Result<(), String> {
        let client =
            Client::connect_with_timeout(self.addr()?, timeout).map_err(|e| e.to_string())?;
        self.clients.insert(name.to_owned(), client);
        Ok(())
    }

    pub fn disconnect(&mut self, name: &str) -> Result<(), String> {
        self.clients
            .remove(name)
            .map(drop)
            .ok_or_else(|| format!("no client named {name}"))
    }

    pub fn client(&mut self, name: &str) -> Result<&mut Client, String> {
        self.clients
            .get_mut(name)
            .ok_or_else(|| format!("no client named {name}"))
    }

    /// Sends `request` and records the response under `name`.
    pub fn call(&mut self, name: &str, request: &Request) -> Result<(), String> {
        let response = self
            .client(name)?
            .call(request)
            .map_err(|error| error.to_string())?;
        self.record(name, response);
        Ok(())
    }

    /// Waits for one more response on `name` and records it.
    pub fn receive(&mut self, name: &str) -> Result<(), String> {
        let response = self
            .client(name)?
            .receive()
            .map_err(|error| error.to_string())?;
        self.record(name, response);
        Ok(())
    }

    /// Attempts a read that should observe the server closing the socket.
    ///
    /// A read timeout is not a close and fails the check.
    pub fn expect_closed(&mut self, name: &str) -> Result<(), String> {
        match self.client(name)?.receive() {
            Err(error) if is_server_close(&error) => Ok(()),
            Err(other) => Err(format!("connection was not closed: {other}")),
            Ok(response) => Err(format!("expected a closed connection, got {response:?}")),
        }
    }

    pub fn responses(&self, name: &str) -> &[Response] {
        self.responses.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn last_response(&self, name: &str) -> Result<&Response, String> {
        self.responses(name)
            .last()
            .ok_or_else(|| format!("client {name} has no responses"))
    }

    fn record(&mut self, name: &str, response: Response) {
        self.responses
            .entry(name.to_owned())
            .or_default()
            .push(response);
    }
}

impl Drop for ServerWorld {
    fn drop(&mut self) {
        self.clients.clear();
        if let Some(handle) = self.handle.take() {
            let _ = handle.shutdown();
        }
    }
}

/// Whether `error` means the peer closed the socket.
pub fn is_server_close(error: &ClientError) -> bool {
    match error {
        ClientError::Closed => true,
        ClientError::Io(source) => matches!(
            source.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}

/// Builds a one-argument `echo` request.
pub fn echo_request(text: &str) -> Request {
    Request::new("echo").arg(ValueType::String, text)
}

/// Parses a failure phrase such as `invocation failed`.
pub fn parse_failure(phrase: &str) -> Result<Failure, String> {
    [
        Failure::MethodNotFound,
        Failure::AccessDenied,
        Failure::InvocationFailed,
    ]
    .into_iter()
    .find(|failure| failure.to_string() == phrase)
    .ok_or_else(|| format!("unknown failure phrase: {phrase}"))
}
