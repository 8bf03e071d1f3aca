//! Lifecycle control for the reactor thread.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use courier_config::ListenEndpoint;
use courier_wire::{JsonLinesCodec, TransportCodec};
use mio::Waker;
use tracing::{info, warn};

use crate::dispatch::{Dispatcher, Invoker};
use crate::transport::{Reactor, ServerError};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");
const REACTOR_THREAD_NAME: &str = "courier-reactor";

/// A bound but not yet running server.
///
/// Binding happens eagerly so address conflicts surface before any thread is
/// spawned.
pub struct Server {
    reactor: Reactor,
}

impl Server {
    /// Binds `endpoint` and serves `dispatcher` with the JSON lines codec.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint does not resolve, the address is in
    /// use or unavailable, or readiness polling cannot be set up.
    pub fn bind<T: Send + 'static>(
        endpoint: &ListenEndpoint,
        dispatcher: Dispatcher<T>,
    ) -> Result<Self, ServerError> {
        Self::bind_with(endpoint, dispatcher, JsonLinesCodec::new())
    }

    /// Binds `endpoint` with an explicit invoker and codec.
    ///
    /// # Errors
    ///
    /// See [`Server::bind`].
    pub fn bind_with<I, C>(
        endpoint: &ListenEndpoint,
        invoker: I,
        codec: C,
    ) -> Result<Self, ServerError>
    where
        I: Invoker,
        C: TransportCodec + Send + 'static,
    {
        let reactor = Reactor::bind(endpoint, Box::new(invoker), Box::new(codec))?;
        Ok(Self { reactor })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.reactor.local_addr()
    }

    /// Spawns the reactor thread and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Spawn`] when the thread cannot be created.
    pub fn start(self) -> Result<ServerHandle, ServerError> {
        let local_addr = self.reactor.local_addr();
        let flag = Arc::new(AtomicBool::new(false));
        let stopper = StopHandle {
            flag: Arc::clone(&flag),
            waker: self.reactor.waker(),
        };
        let reactor = self.reactor;
        let thread = thread::Builder::new()
            .name(REACTOR_THREAD_NAME.to_owned())
            .spawn(move || reactor.run(&flag))
            .map_err(|source| ServerError::Spawn { source })?;
        info!(
            target: SERVER_TARGET,
            addr = %local_addr,
            "server listening"
        );
        Ok(ServerHandle {
            stopper,
            local_addr,
            thread: Some(thread),
        })
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Server")
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

/// Cloneable handle that asks a running reactor to stop.
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl StopHandle {
    /// Requests shutdown and wakes the reactor. Repeated calls are no-ops.
    pub fn stop(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(error) = self.waker.wake() {
            warn!(
                target: SERVER_TARGET,
                error = %error,
                "failed to wake reactor"
            );
        }
    }

    /// Returns `true` once a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StopHandle")
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

/// Handle to a running server.
///
/// Dropping the handle stops the server without waiting for it.
#[derive(Debug)]
pub struct ServerHandle {
    stopper: StopHandle,
    local_addr: SocketAddr,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Address the server accepts connections on.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Requests shutdown; returns without waiting.
    pub fn stop(&self) {
        self.stopper.stop();
    }

    /// Handle that can request shutdown from another thread.
    #[must_use]
    pub fn stopper(&self) -> StopHandle {
        self.stopper.clone()
    }

    /// Blocks until the reactor thread has exited.
    ///
    /// The reactor only exits after a stop request, so joining without one
    /// blocks indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::ThreadPanic`] when the reactor thread panicked.
    pub fn join(mut self) -> Result<(), ServerError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        thread.join().map_err(|_| ServerError::ThreadPanic)?;
        info!(
            target: SERVER_TARGET,
            addr = %self.local_addr,
            "server stopped"
        );
        Ok(())
    }

    /// Stops the server and waits for the reactor thread.
    ///
    /// # Errors
    ///
    /// See [`ServerHandle::join`].
    pub fn shutdown(self) -> Result<(), ServerError> {
        self.stop();
        self.join()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stopper.stop();
        }
    }
}
