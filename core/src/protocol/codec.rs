//! Binary Wire Codec
//!
//! Encoding and decoding of [`Request`] and [`Response`] records. The
//! format is deterministic and self-delimiting:
//!
//! - All integers are fixed-width little-endian
//! - `string` is a u64 length followed by that many raw bytes
//! - `optional<T>` is one byte (0 or 1); if 1, followed by T
//! - `Message` is a u32 kind code followed by a `string` payload
//! - `Request` is `optional<Message>`, topic `string`, u32 type code
//! - `Response` is `optional<Message>`, u32 type code
//!
//! Decoding is incremental: a well-formed prefix of a record yields
//! `Ok(None)` until the rest of the bytes arrive. The codec performs no
//! I/O; [`RequestDecoder`] adapts it to the broker's framed socket reader.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use thiserror::Error;
use tokio_util::codec::Decoder;

use super::messages::{Message, MessageKind, Request, RequestType, Response, ResponseType};

/// Value of the single byte the broker writes after a delivery ack.
/// Clients treat it as opaque.
pub const ACK_ACK_BYTE: u8 = 0x00;

/// Default bound on a single encoded record, in either direction.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid optional flag {0:#04x}")]
    InvalidOptionalFlag(u8),
    #[error("unknown message kind code {0}")]
    UnknownMessageKind(u32),
    #[error("unknown response type code {0}")]
    UnknownResponseType(u32),
    #[error("topic is not valid UTF-8")]
    TopicNotUtf8,
    #[error("declared length {declared} exceeds frame bound {bound}")]
    FrameTooLarge { declared: u64, bound: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Internal decode outcome: a record prefix that simply needs more bytes
/// is distinguished from malformed input.
enum Fail {
    Incomplete,
    Bad(CodecError),
}

impl From<CodecError> for Fail {
    fn from(e: CodecError) -> Self {
        Fail::Bad(e)
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> std::result::Result<&'a [u8], Fail> {
        if self.buf.len() - self.pos < n {
            return Err(Fail::Incomplete);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> std::result::Result<u8, Fail> {
        Ok(self.take(1)?[0])
    }

    fn u32_le(&mut self) -> std::result::Result<u32, Fail> {
        let mut bytes = self.take(4)?;
        Ok(bytes.get_u32_le())
    }

    fn u64_le(&mut self) -> std::result::Result<u64, Fail> {
        let mut bytes = self.take(8)?;
        Ok(bytes.get_u64_le())
    }

    /// Length-prefixed byte string, with the declared length checked
    /// against the frame bound before any allocation.
    fn lstring(&mut self, bound: usize) -> std::result::Result<&'a [u8], Fail> {
        let declared = self.u64_le()?;
        if declared > bound as u64 {
            return Err(Fail::Bad(CodecError::FrameTooLarge { declared, bound }));
        }
        self.take(declared as usize)
    }
}

fn read_message(r: &mut Reader<'_>, bound: usize) -> std::result::Result<Message, Fail> {
    let code = r.u32_le()?;
    let kind = MessageKind::from_code(code).ok_or(CodecError::UnknownMessageKind(code))?;
    let data = r.lstring(bound)?;
    Ok(Message {
        kind,
        data: Bytes::copy_from_slice(data),
    })
}

fn read_opt_message(r: &mut Reader<'_>, bound: usize) -> std::result::Result<Option<Message>, Fail> {
    match r.u8()? {
        0 => Ok(None),
        1 => Ok(Some(read_message(r, bound)?)),
        flag => Err(Fail::Bad(CodecError::InvalidOptionalFlag(flag))),
    }
}

fn put_string(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u64_le(bytes.len() as u64);
    buf.put_slice(bytes);
}

fn put_opt_message(buf: &mut BytesMut, message: Option<&Message>) {
    match message {
        None => buf.put_u8(0),
        Some(m) => {
            buf.put_u8(1);
            buf.put_u32_le(m.kind.code());
            put_string(buf, &m.data);
        }
    }
}

/// Encodes a request into one self-delimiting record.
pub fn encode_request(request: &Request) -> Bytes {
    let payload = request.message.as_ref().map_or(0, |m| m.data.len());
    let mut buf = BytesMut::with_capacity(payload + request.topic.len() + 32);
    put_opt_message(&mut buf, request.message.as_ref());
    put_string(&mut buf, request.topic.as_bytes());
    buf.put_u32_le(request.kind.code());
    buf.freeze()
}

/// Encodes a response into one self-delimiting record.
pub fn encode_response(response: &Response) -> Bytes {
    let payload = response.message.as_ref().map_or(0, |m| m.data.len());
    let mut buf = BytesMut::with_capacity(payload + 24);
    put_opt_message(&mut buf, response.message.as_ref());
    buf.put_u32_le(response.kind.code());
    buf.freeze()
}

/// Decodes one request from the front of `buf`, consuming its bytes.
/// Returns `Ok(None)` when the buffer does not yet hold a complete record.
pub fn decode_request(buf: &mut BytesMut, bound: usize) -> Result<Option<Request>> {
    let mut r = Reader::new(buf);
    let parsed = (|| {
        let message = read_opt_message(&mut r, bound)?;
        let topic = r.lstring(bound)?;
        let topic =
            std::str::from_utf8(topic).map_err(|_| CodecError::TopicNotUtf8)?.to_string();
        let kind = RequestType::from_code(r.u32_le()?);
        Ok::<_, Fail>(Request {
            kind,
            topic,
            message,
        })
    })();
    match parsed {
        Ok(request) => {
            let consumed = r.pos;
            buf.advance(consumed);
            Ok(Some(request))
        }
        Err(Fail::Incomplete) => Ok(None),
        Err(Fail::Bad(e)) => Err(e),
    }
}

/// Decodes one response from the front of `buf`, consuming its bytes.
/// Returns `Ok(None)` when the buffer does not yet hold a complete record.
pub fn decode_response(buf: &mut BytesMut, bound: usize) -> Result<Option<Response>> {
    let mut r = Reader::new(buf);
    let parsed = (|| {
        let message = read_opt_message(&mut r, bound)?;
        let code = r.u32_le()?;
        let kind =
            ResponseType::from_code(code).ok_or(CodecError::UnknownResponseType(code))?;
        Ok::<_, Fail>(Response { kind, message })
    })();
    match parsed {
        Ok(response) => {
            let consumed = r.pos;
            buf.advance(consumed);
            Ok(Some(response))
        }
        Err(Fail::Incomplete) => Ok(None),
        Err(Fail::Bad(e)) => Err(e),
    }
}

/// [`Decoder`] adapter feeding the broker's framed socket reader.
#[derive(Debug, Clone)]
pub struct RequestDecoder {
    max_frame_bytes: usize,
}

impl RequestDecoder {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Request>> {
        match decode_request(src, self.max_frame_bytes)? {
            Some(request) => Ok(Some(request)),
            None => {
                // A record that cannot complete within the frame bound is
                // a protocol violation, not a short read.
                if src.len() > self.max_frame_bytes {
                    return Err(CodecError::FrameTooLarge {
                        declared: src.len() as u64,
                        bound: self.max_frame_bytes,
                    });
                }
                Ok(None)
            }
        }
    }
}
