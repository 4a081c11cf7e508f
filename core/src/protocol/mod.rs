//! # RelayMQ Protocol Module
//!
//! Wire types and the binary codec for the broker's request/response
//! protocol. Both the broker and its clients speak a single deterministic
//! little-endian record format; the codec here is stateless and free of
//! I/O, operating purely on byte buffers.
//!
//! ## Request/Response Flows
//!
//! - Post: `Produce` with a payload, answered by `ProduceOk`.
//! - Fetch: `FetchNonblocking` or `FetchBlocking` with no payload,
//!   answered by `FetchOk` plus the message, `TopicEmpty` (non-blocking
//!   miss), or by silence while the broker parks the consumer (blocking
//!   miss).
//! - Delivery acknowledgement: every `FetchOk` is followed by a
//!   `DeliveryAck` from the consumer and a single opaque byte back from
//!   the broker, after which the connection is reusable.
//!
//! ## Modules
//!
//! - [`messages`] - Protocol message definitions and type codes
//! - [`codec`] - Binary encoding/decoding over byte buffers

pub mod codec;
pub mod messages;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, CodecError, RequestDecoder,
    ACK_ACK_BYTE, DEFAULT_MAX_FRAME_BYTES,
};
pub use messages::*;
