//! Test doubles for driving connections without sockets.

use std::cell::Cell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};

use courier_wire::{CodecError, JsonLinesCodec, Request, Response, TransportCodec};

/// Non-blocking stand-in for a socket.
///
/// Reads drain `input` and then block, or report end-of-stream once `eof` is
/// set. Writes stop with `WouldBlock` when `write_budget` runs out.
#[derive(Default)]
pub(crate) struct MemoryStream {
    pub(crate) input: VecDeque<u8>,
    pub(crate) eof: bool,
    pub(crate) output: Vec<u8>,
    pub(crate) write_budget: Option<usize>,
}

impl MemoryStream {
    pub(crate) fn with_input(bytes: &[u8]) -> Self {
        Self {
            input: bytes.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.input.is_empty() {
            return if self.eof {
                Ok(0)
            } else {
                Err(io::ErrorKind::WouldBlock.into())
            };
        }
        let count = buf.len().min(self.input.len());
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = match self.write_budget {
            Some(0) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(budget) => budget.min(buf.len()),
            None => buf.len(),
        };
        if let Some(budget) = self.write_budget.as_mut() {
            *budget -= accepted;
        }
        self.output
            .extend_from_slice(buf.get(..accepted).unwrap_or_default());
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// JSON-lines codec that counts how often responses are encoded.
#[derive(Default)]
pub(crate) struct CountingCodec {
    pub(crate) encodes: Cell<usize>,
}

impl TransportCodec for CountingCodec {
    fn decode(&self, inbound: &mut Vec<u8>) -> Result<Option<Request>, CodecError> {
        JsonLinesCodec::new().decode(inbound)
    }

    fn decode_eof(&self, inbound: &mut Vec<u8>) -> Result<Option<Request>, CodecError> {
        JsonLinesCodec::new().decode_eof(inbound)
    }

    fn encode(&self, response: &Response, outbound: &mut Vec<u8>) -> Result<(), CodecError> {
        self.encodes.set(self.encodes.get() + 1);
        JsonLinesCodec::new().encode(response, outbound)
    }
}
