//! Per-connection buffers and request/response phase.

use std::io::{self, Read, Write};
use std::net::SocketAddr;

use courier_wire::{CodecError, MAX_FRAME_BYTES, Request, Response, TransportCodec};
use mio::event::Source;
use mio::{Interest, Registry, Token};
use tracing::debug;

use super::REACTOR_TARGET;
use super::errors::ConnectionError;

const READ_CHUNK_BYTES: usize = 8 * 1024;

// Reading stops here even without `WouldBlock`; the codec then either finds
// complete frames or reports the oversized one.
const INBOUND_HIGH_WATER: usize = MAX_FRAME_BYTES + READ_CHUNK_BYTES;

/// Result of one attempt to write the attached response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flush {
    /// No response was attached.
    Idle,
    /// The socket stopped accepting bytes before the frame was written.
    Pending,
    /// The whole frame was written and the connection awaits the next request.
    Complete,
}

struct PendingResponse {
    response: Response,
    encoded: Option<Vec<u8>>,
    written: usize,
}

enum Phase {
    AwaitingRequest,
    Responding(PendingResponse),
}

/// One accepted client connection.
///
/// Holds at most one response at a time, so readiness interest is always
/// exactly one of readable or writable.
pub(crate) struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    inbound: Vec<u8>,
    phase: Phase,
    peer_closed: bool,
    registered: bool,
}

impl<S> Connection<S> {
    pub(crate) const fn new(stream: S, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            inbound: Vec::new(),
            phase: Phase::AwaitingRequest,
            peer_closed: false,
            registered: false,
        }
    }

    pub(crate) const fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Readiness this connection currently waits for.
    pub(crate) const fn interest(&self) -> Interest {
        match self.phase {
            Phase::AwaitingRequest => Interest::READABLE,
            Phase::Responding(_) => Interest::WRITABLE,
        }
    }

    pub(crate) const fn is_responding(&self) -> bool {
        matches!(self.phase, Phase::Responding(_))
    }

    /// Whether the peer has finished sending.
    pub(crate) const fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Stores `response` for writing; replaces any response still attached.
    pub(crate) fn attach(&mut self, response: Response) {
        self.phase = Phase::Responding(PendingResponse {
            response,
            encoded: None,
            written: 0,
        });
    }

    /// Removes the attached response and returns to awaiting a request.
    pub(crate) fn take_attachment(&mut self) -> Option<Response> {
        match std::mem::replace(&mut self.phase, Phase::AwaitingRequest) {
            Phase::AwaitingRequest => None,
            Phase::Responding(pending) => Some(pending.response),
        }
    }

    /// Decodes the next buffered request.
    ///
    /// Once the peer has closed, bytes left without a terminator are handed
    /// to [`TransportCodec::decode_eof`].
    pub(crate) fn receive<C>(&mut self, codec: &C) -> Result<Option<Request>, CodecError>
    where
        C: TransportCodec + ?Sized,
    {
        if let Some(request) = codec.decode(&mut self.inbound)? {
            return Ok(Some(request));
        }
        if self.peer_closed {
            return codec.decode_eof(&mut self.inbound);
        }
        Ok(None)
    }
}

#[cfg(test)]
impl<S> Connection<S> {
    pub(crate) fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

impl<S: Read> Connection<S> {
    /// Reads until the socket would block, the peer closes, or the buffer
    /// reaches its high-water mark.
    pub(crate) fn fill_inbound(&mut self) -> io::Result<()> {
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        while !self.peer_closed && self.inbound.len() < INBOUND_HIGH_WATER {
            match self.stream.read(&mut chunk) {
                Ok(0) => self.peer_closed = true,
                Ok(read) => self
                    .inbound
                    .extend_from_slice(chunk.get(..read).unwrap_or_default()),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }
}

impl<S: Write> Connection<S> {
    /// Writes as much of the attached response as the socket accepts.
    ///
    /// The response is encoded on the first call and the encoded frame is
    /// kept until it has been written in full.
    pub(crate) fn flush<C>(&mut self, codec: &C) -> Result<Flush, ConnectionError>
    where
        C: TransportCodec + ?Sized,
    {
        let Phase::Responding(pending) = &mut self.phase else {
            return Ok(Flush::Idle);
        };
        let frame = encode_once(&mut pending.encoded, &pending.response, codec)?;
        while pending.written < frame.len() {
            let remaining = frame.get(pending.written..).unwrap_or_default();
            match self.stream.write(remaining) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(written) => pending.written += written,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(Flush::Pending);
                }
                Err(error) => return Err(error.into()),
            }
        }
        self.take_attachment();
        Ok(Flush::Complete)
    }
}

impl<S: Source> Connection<S> {
    pub(crate) fn register(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        let interest = self.interest();
        registry.register(&mut self.stream, token, interest)?;
        self.registered = true;
        Ok(())
    }

    /// Re-arms the registration with the interest of the current phase.
    pub(crate) fn reregister(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        let interest = self.interest();
        registry.reregister(&mut self.stream, token, interest)
    }

    /// Deregisters the stream. Calling it again is a no-op.
    pub(crate) fn close(&mut self, registry: &Registry) {
        if !self.registered {
            return;
        }
        self.registered = false;
        if let Err(error) = registry.deregister(&mut self.stream) {
            debug!(
                target: REACTOR_TARGET,
                peer = %self.peer,
                error = %error,
                "failed to deregister connection"
            );
        }
    }
}

fn encode_once<'a, C>(
    slot: &'a mut Option<Vec<u8>>,
    response: &Response,
    codec: &C,
) -> Result<&'a [u8], CodecError>
where
    C: TransportCodec + ?Sized,
{
    if slot.is_none() {
        let mut frame = Vec::new();
        codec.encode(response, &mut frame)?;
        *slot = Some(frame);
    }
    Ok(slot.as_deref().unwrap_or_default())
}
