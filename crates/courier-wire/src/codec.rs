//! Newline-delimited JSON framing.

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::message::{Request, Response};

/// Largest frame accepted in either direction, excluding the delimiter.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

const FRAME_DELIMITER: u8 = b'\n';

/// Errors surfaced while framing or parsing messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Frame could not be parsed as a message.
    #[error("malformed frame: {message}")]
    Malformed {
        /// Human-readable description of the problem.
        message: String,
        /// Parser error, when one was raised.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Frame exceeds [`MAX_FRAME_BYTES`].
    #[error("frame too large: {size} bytes exceeds {max_size} byte limit")]
    FrameTooLarge {
        /// Bytes buffered without a delimiter, or length of the frame.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// Request declares a different number of types than it carries values.
    #[error("request declares {declared} parameter types but carries {supplied} arguments")]
    ArityMismatch {
        /// Number of parameter type descriptors.
        declared: usize,
        /// Number of argument values.
        supplied: usize,
    },

    /// Message serialization failed.
    #[error("failed to serialize frame: {0}")]
    Serialize(#[source] serde_json::Error),

    /// IO error while moving frame bytes.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Creates a malformed frame error from a parser error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed frame error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }
}

/// Framing used by the reactor to turn buffered bytes into requests and
/// responses into bytes.
///
/// Implementations never touch sockets: the connection owns the buffers and
/// performs the non-blocking reads and writes, which keeps the reactor testable
/// with an in-memory codec.
pub trait TransportCodec {
    /// Removes one complete request frame from the front of `inbound`.
    ///
    /// Returns `Ok(None)` while the buffered bytes do not yet hold a whole
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns an error when the frame is malformed or exceeds the size limit.
    fn decode(&self, inbound: &mut Vec<u8>) -> Result<Option<Request>, CodecError>;

    /// Interprets whatever remains in `inbound` after the peer stopped sending.
    ///
    /// The default treats leftover bytes as absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the leftover bytes are not a valid frame.
    fn decode_eof(&self, inbound: &mut Vec<u8>) -> Result<Option<Request>, CodecError> {
        inbound.clear();
        Ok(None)
    }

    /// Appends one encoded response frame to `outbound`.
    ///
    /// # Errors
    ///
    /// Returns an error when the response cannot be serialized.
    fn encode(&self, response: &Response, outbound: &mut Vec<u8>) -> Result<(), CodecError>;
}

/// Production codec: one JSON document per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesCodec;

impl JsonLinesCodec {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TransportCodec for JsonLinesCodec {
    fn decode(&self, inbound: &mut Vec<u8>) -> Result<Option<Request>, CodecError> {
        match take_frame(inbound)? {
            Some(frame) => parse_request(&frame).map(Some),
            None => Ok(None),
        }
    }

    fn decode_eof(&self, inbound: &mut Vec<u8>) -> Result<Option<Request>, CodecError> {
        let remainder = std::mem::take(inbound);
        if trim_whitespace(&remainder).is_empty() {
            return Ok(None);
        }
        parse_request(&remainder).map(Some)
    }

    fn encode(&self, response: &Response, outbound: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_frame(response, outbound)
    }
}

/// Serializes `message` as one frame appended to `outbound`.
///
/// # Errors
///
/// Returns an error when serialization fails or the frame exceeds
/// [`MAX_FRAME_BYTES`].
pub fn encode_frame<T: Serialize>(message: &T, outbound: &mut Vec<u8>) -> Result<(), CodecError> {
    let body = serde_json::to_vec(message).map_err(CodecError::Serialize)?;
    if body.len() > MAX_FRAME_BYTES {
        return Err(CodecError::FrameTooLarge {
            size: body.len(),
            max_size: MAX_FRAME_BYTES,
        });
    }
    outbound.reserve(body.len() + 1);
    outbound.extend_from_slice(&body);
    outbound.push(FRAME_DELIMITER);
    Ok(())
}

/// Removes the first delimited frame from `inbound`, without its delimiter.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] when no delimiter appears within
/// [`MAX_FRAME_BYTES`].
pub fn take_frame(inbound: &mut Vec<u8>) -> Result<Option<Vec<u8>>, CodecError> {
    let Some(position) = inbound.iter().position(|byte| *byte == FRAME_DELIMITER) else {
        return enforce_limit(inbound.len()).map(|()| None);
    };
    enforce_limit(position)?;
    let mut frame: Vec<u8> = inbound.drain(..=position).collect();
    frame.pop();
    Ok(Some(frame))
}

fn parse_request(frame: &[u8]) -> Result<Request, CodecError> {
    let trimmed = trim_whitespace(frame);
    if trimmed.is_empty() {
        return Err(CodecError::malformed("empty request frame"));
    }
    let request: Request = serde_json::from_slice(trimmed).map_err(CodecError::from_json_error)?;
    if !request.is_well_formed() {
        return Err(CodecError::ArityMismatch {
            declared: request.param_types.len(),
            supplied: request.params.len(),
        });
    }
    if request.method.trim().is_empty() {
        return Err(CodecError::malformed("method name is empty"));
    }
    Ok(request)
}

const fn enforce_limit(size: usize) -> Result<(), CodecError> {
    if size > MAX_FRAME_BYTES {
        return Err(CodecError::FrameTooLarge {
            size,
            max_size: MAX_FRAME_BYTES,
        });
    }
    Ok(())
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(start, |position| position + 1);
    bytes.get(start..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::message::{Failure, ValueType};

    fn decode_all(bytes: &[u8]) -> (Vec<Request>, Vec<u8>) {
        let codec = JsonLinesCodec::new();
        let mut inbound = bytes.to_vec();
        let mut requests = Vec::new();
        while let Some(request) = codec.decode(&mut inbound).expect("decode frame") {
            requests.push(request);
        }
        (requests, inbound)
    }

    #[test]
    fn decodes_a_complete_frame() {
        let (requests, rest) =
            decode_all(b"{\"method\":\"echo\",\"param_types\":[\"string\"],\"params\":[\"hello\"]}\n");
        assert_eq!(
            requests,
            vec![Request::new("echo").arg(ValueType::String, "hello")]
        );
        assert!(rest.is_empty());
    }

    #[test]
    fn waits_for_the_delimiter() {
        let (requests, rest) = decode_all(b"{\"method\":\"co");
        assert!(requests.is_empty());
        assert_eq!(rest, b"{\"method\":\"co");
    }

    #[test]
    fn splits_pipelined_frames_in_order() {
        let (requests, rest) =
            decode_all(b"{\"method\":\"first\"}\n{\"method\":\"second\"}\n{\"meth");
        let names: Vec<_> = requests.iter().map(|r| r.method.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
        assert_eq!(rest, b"{\"meth");
    }

    #[rstest]
    #[case::blank(b"\n".as_slice())]
    #[case::whitespace(b"   \t\n".as_slice())]
    #[case::not_json(b"not json\n".as_slice())]
    #[case::empty_method(b"{\"method\":\"  \"}\n".as_slice())]
    fn rejects_malformed_frames(#[case] bytes: &[u8]) {
        let mut inbound = bytes.to_vec();
        let result = JsonLinesCodec::new().decode(&mut inbound);
        assert!(matches!(result, Err(CodecError::Malformed { .. })));
    }

    #[test]
    fn rejects_arity_mismatch() {
        let mut inbound = br#"{"method":"add","param_types":["int","int"],"params":[1]}"#.to_vec();
        inbound.push(b'\n');
        let result = JsonLinesCodec::new().decode(&mut inbound);
        assert!(matches!(
            result,
            Err(CodecError::ArityMismatch {
                declared: 2,
                supplied: 1
            })
        ));
    }

    #[test]
    fn rejects_oversized_partial_frame() {
        let mut inbound = vec![b'x'; MAX_FRAME_BYTES + 1];
        let result = JsonLinesCodec::new().decode(&mut inbound);
        assert!(matches!(result, Err(CodecError::FrameTooLarge { .. })));
    }

    #[test]
    fn eof_accepts_an_unterminated_final_frame() {
        let codec = JsonLinesCodec::new();
        let mut inbound = br#"{"method":"count"}"#.to_vec();
        let request = codec.decode_eof(&mut inbound).expect("decode eof");
        assert_eq!(request, Some(Request::new("count")));
        assert!(inbound.is_empty());
    }

    #[test]
    fn eof_with_only_whitespace_is_absent() {
        let codec = JsonLinesCodec::new();
        let mut inbound = b" \r\n".to_vec();
        assert_eq!(codec.decode_eof(&mut inbound).expect("decode eof"), None);
    }

    #[test]
    fn encodes_one_line_per_response() {
        let codec = JsonLinesCodec::new();
        let mut outbound = Vec::new();
        codec
            .encode(&Response::success(json!(5)), &mut outbound)
            .expect("encode success");
        codec
            .encode(&Response::failure(Failure::MethodNotFound), &mut outbound)
            .expect("encode failure");

        let text = String::from_utf8(outbound).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                r#"{"outcome":"success","value":5}"#,
                r#"{"outcome":"failure","failure":"method_not_found"}"#
            ]
        );
    }
}
