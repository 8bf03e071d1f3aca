//! Single-threaded readiness loop.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener as StdTcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use courier_config::ListenEndpoint;
use courier_wire::TransportCodec;
use mio::event::Event;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use tracing::{debug, info, warn};

use super::connection::{Connection, Flush};
use super::errors::ConnectionError;
use super::{REACTOR_TARGET, ServerError};
use crate::dispatch::Invoker;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;
const EVENT_CAPACITY: usize = 256;
const POLL_ERROR_BACKOFF: Duration = Duration::from_millis(150);
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// What the reactor does with a connection after its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Keep,
    Close,
}

/// Collapses repeated accept failures into one warning per error kind.
#[derive(Debug, Default)]
struct AcceptErrors {
    last: Option<io::ErrorKind>,
}

impl AcceptErrors {
    /// Records `kind` and reports whether it differs from the previous one.
    fn record(&mut self, kind: io::ErrorKind) -> bool {
        let changed = self.last != Some(kind);
        self.last = Some(kind);
        changed
    }

    fn clear(&mut self) {
        self.last = None;
    }
}

/// Owns the listener, the poll instance, and every live connection.
pub(crate) struct Reactor {
    poll: Poll,
    waker: Arc<Waker>,
    listener: TcpListener,
    local_addr: SocketAddr,
    connections: HashMap<Token, Connection<TcpStream>>,
    next_token: usize,
    accept_errors: AcceptErrors,
    invoker: Box<dyn Invoker>,
    codec: Box<dyn TransportCodec + Send>,
}

impl Reactor {
    /// Binds `endpoint` and registers the listener for accept readiness.
    pub(crate) fn bind(
        endpoint: &ListenEndpoint,
        invoker: Box<dyn Invoker>,
        codec: Box<dyn TransportCodec + Send>,
    ) -> Result<Self, ServerError> {
        let listener = bind_tcp(endpoint.host(), endpoint.port())?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ServerError::NonBlocking { source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::LocalAddr { source })?;
        let mut listener = TcpListener::from_std(listener);

        let poll = Poll::new().map_err(|source| ServerError::Poll { source })?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(|source| ServerError::Register { source })?;
        let waker = Waker::new(poll.registry(), WAKER)
            .map_err(|source| ServerError::Waker { source })?;

        Ok(Self {
            poll,
            waker: Arc::new(waker),
            listener,
            local_addr,
            connections: HashMap::new(),
            next_token: FIRST_CONNECTION,
            accept_errors: AcceptErrors::default(),
            invoker,
            codec,
        })
    }

    pub(crate) const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waker that interrupts a blocked poll.
    pub(crate) fn waker(&self) -> Arc<Waker> {
        Arc::clone(&self.waker)
    }

    /// Serves connections until `shutdown` is observed after a wake-up.
    pub(crate) fn run(mut self, shutdown: &AtomicBool) {
        info!(
            target: REACTOR_TARGET,
            addr = %self.local_addr,
            "reactor running"
        );
        let mut events = Events::with_capacity(EVENT_CAPACITY);
        let mut last_error = None::<io::ErrorKind>;
        while !shutdown.load(Ordering::SeqCst) {
            if let Err(error) = self.poll.poll(&mut events, None) {
                let kind = error.kind();
                if kind == io::ErrorKind::Interrupted {
                    continue;
                }
                if last_error != Some(kind) {
                    warn!(
                        target: REACTOR_TARGET,
                        error = %error,
                        "readiness poll failed"
                    );
                }
                last_error = Some(kind);
                thread::sleep(POLL_ERROR_BACKOFF);
                continue;
            }
            last_error = None;

            for event in &events {
                match event.token() {
                    LISTENER => self.accept_pending(),
                    WAKER => {}
                    token => self.service(token, event),
                }
            }
        }
        self.close_all();
    }

    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    self.accept_errors.clear();
                    self.admit(stream, peer);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return,
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::ConnectionAborted
                    ) => {}
                Err(error) => {
                    if self.accept_errors.record(error.kind()) {
                        warn!(
                            target: REACTOR_TARGET,
                            error = %error,
                            "socket accept error"
                        );
                    }
                    thread::sleep(ACCEPT_ERROR_BACKOFF);
                    self.rearm_listener();
                    return;
                }
            }
        }
    }

    // Re-arming makes an undrained backlog report readiness again.
    fn rearm_listener(&mut self) {
        if let Err(error) =
            self.poll
                .registry()
                .reregister(&mut self.listener, LISTENER, Interest::READABLE)
        {
            warn!(
                target: REACTOR_TARGET,
                error = %error,
                "failed to re-arm listener"
            );
        }
    }

    fn admit(&mut self, stream: TcpStream, peer: SocketAddr) {
        let token = self.allocate_token();
        let mut connection = Connection::new(stream, peer);
        if let Err(error) = connection.register(self.poll.registry(), token) {
            warn!(
                target: REACTOR_TARGET,
                peer = %peer,
                error = %error,
                "failed to register connection"
            );
            return;
        }
        debug!(
            target: REACTOR_TARGET,
            peer = %peer,
            token = token.0,
            "accepted connection"
        );
        self.connections.insert(token, connection);
    }

    fn allocate_token(&mut self) -> Token {
        loop {
            let token = Token(self.next_token);
            self.next_token = self
                .next_token
                .checked_add(1)
                .unwrap_or(FIRST_CONNECTION);
            if !self.connections.contains_key(&token) {
                return token;
            }
        }
    }

    fn service(&mut self, token: Token, event: &Event) {
        let Some(connection) = self.connections.get_mut(&token) else {
            return;
        };
        let outcome = drive(
            connection,
            wants_read(event),
            self.invoker.as_ref(),
            self.codec.as_ref(),
        )
        .and_then(|turn| match turn {
            Turn::Keep => connection
                .reregister(self.poll.registry(), token)
                .map(|()| Turn::Keep)
                .map_err(ConnectionError::from),
            Turn::Close => Ok(Turn::Close),
        });
        match outcome {
            Ok(Turn::Keep) => {}
            Ok(Turn::Close) => self.close(token, None),
            Err(error) => self.close(token, Some(&error)),
        }
    }

    fn close(&mut self, token: Token, cause: Option<&ConnectionError>) {
        let Some(mut connection) = self.connections.remove(&token) else {
            return;
        };
        match cause {
            Some(error) => warn!(
                target: REACTOR_TARGET,
                peer = %connection.peer(),
                error = %error,
                "closing connection after error"
            ),
            None => debug!(
                target: REACTOR_TARGET,
                peer = %connection.peer(),
                "connection closed by peer"
            ),
        }
        connection.close(self.poll.registry());
    }

    fn close_all(&mut self) {
        let open = self.connections.len();
        for (_, mut connection) in self.connections.drain() {
            connection.close(self.poll.registry());
        }
        if let Err(error) = self.poll.registry().deregister(&mut self.listener) {
            debug!(
                target: REACTOR_TARGET,
                error = %error,
                "failed to deregister listener"
            );
        }
        info!(
            target: REACTOR_TARGET,
            addr = %self.local_addr,
            closed_connections = open,
            "reactor stopped"
        );
    }
}

/// Whether `event` may carry bytes, end-of-stream, or a socket error.
fn wants_read(event: &Event) -> bool {
    event.is_readable() || event.is_read_closed() || event.is_error()
}

/// Runs one connection as far as it can go without blocking.
///
/// Reads are only attempted while awaiting a request. Each decoded request is
/// answered before the next one is decoded, and a fully written response lets
/// the loop pick up any request that is already buffered.
fn drive<S, C>(
    connection: &mut Connection<S>,
    readable: bool,
    invoker: &dyn Invoker,
    codec: &C,
) -> Result<Turn, ConnectionError>
where
    S: Read + Write,
    C: TransportCodec + ?Sized,
{
    if readable && !connection.is_responding() {
        connection.fill_inbound()?;
    }
    loop {
        if connection.is_responding() {
            match connection.flush(codec)? {
                Flush::Pending => return Ok(Turn::Keep),
                Flush::Complete | Flush::Idle => continue,
            }
        }
        match connection.receive(codec)? {
            Some(request) => {
                let response = invoker.invoke(&request);
                connection.attach(response);
            }
            None if connection.peer_closed() => return Ok(Turn::Close),
            None => return Ok(Turn::Keep),
        }
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<StdTcpListener, ServerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ServerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs
        .next()
        .ok_or_else(|| ServerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })?;
    StdTcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })
}
