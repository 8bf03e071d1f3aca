//! Wire types shared by the Courier server and its clients.
//!
//! A client sends one [`Request`] per frame naming a method, the ordered
//! parameter types it expects to match, and the argument values. The server
//! answers each request with exactly one [`Response`] frame, which carries
//! either the method's return value or a [`Failure`] marker.
//!
//! Frames are newline-delimited JSON documents:
//!
//! ```json
//! {"method":"echo","param_types":["string"],"params":["hello"]}
//! {"outcome":"success","value":"hello"}
//! ```
//!
//! The [`TransportCodec`] trait is the seam between the server's reactor and
//! the framing; [`JsonLinesCodec`] is the production implementation.

mod client;
mod codec;
mod message;

pub use client::{Client, ClientError, DEFAULT_CLIENT_TIMEOUT};
pub use codec::{CodecError, JsonLinesCodec, MAX_FRAME_BYTES, TransportCodec, encode_frame, take_frame};
pub use message::{Failure, Request, Response, UnknownValueType, ValueType};

/// Dynamically typed argument and result values.
pub use serde_json::Value;
