//! Wire protocol types and binary codec for talking to a RelayMQ broker.
//!
//! The format is deterministic and self-delimiting: fixed-width
//! little-endian integers, `string` as a u64 length followed by raw
//! bytes, `optional<T>` as a one-byte flag followed by T. A request is
//! `optional<Message>`, topic `string`, u32 type code; a response is
//! `optional<Message>`, u32 type code. After every received message the
//! client sends a `DeliveryAck` and reads one opaque acknowledgement byte
//! back, outside the record format.

use crate::error::ClientError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Default bound on a single encoded record, matching the broker's
/// per-connection buffer.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

/// Payload classification carried with every message; the broker echoes
/// it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Binary,
}

impl MessageKind {
    pub const fn code(self) -> u32 {
        match self {
            MessageKind::Text => 0,
            MessageKind::Binary => 1,
        }
    }

    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(MessageKind::Text),
            1 => Some(MessageKind::Binary),
            _ => None,
        }
    }
}

/// A broker message: opaque payload bytes tagged with a [`MessageKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub data: Bytes,
}

impl Message {
    pub fn new(kind: MessageKind, data: impl Into<Bytes>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    pub fn text(data: impl Into<Bytes>) -> Self {
        Self::new(MessageKind::Text, data)
    }

    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(MessageKind::Binary, data)
    }
}

/// Request type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Produce,
    FetchBlocking,
    FetchNonblocking,
    DeliveryAck,
}

impl RequestType {
    pub const fn code(self) -> u32 {
        match self {
            RequestType::Produce => 0,
            RequestType::FetchBlocking => 1,
            RequestType::FetchNonblocking => 2,
            RequestType::DeliveryAck => 3,
        }
    }
}

/// Response type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    ProduceOk,
    ProduceError,
    FetchOk,
    TopicEmpty,
    Error,
}

impl ResponseType {
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(ResponseType::ProduceOk),
            1 => Some(ResponseType::ProduceError),
            2 => Some(ResponseType::FetchOk),
            3 => Some(ResponseType::TopicEmpty),
            4 => Some(ResponseType::Error),
            _ => None,
        }
    }
}

/// A client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: RequestType,
    pub topic: String,
    pub message: Option<Message>,
}

/// A broker response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub kind: ResponseType,
    pub message: Option<Message>,
}

fn put_string(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u64_le(bytes.len() as u64);
    buf.put_slice(bytes);
}

/// Encodes a request into one self-delimiting record.
pub fn encode_request(request: &Request) -> Bytes {
    let payload = request.message.as_ref().map_or(0, |m| m.data.len());
    let mut buf = BytesMut::with_capacity(payload + request.topic.len() + 32);
    match &request.message {
        None => buf.put_u8(0),
        Some(message) => {
            buf.put_u8(1);
            buf.put_u32_le(message.kind.code());
            put_string(&mut buf, &message.data);
        }
    }
    put_string(&mut buf, request.topic.as_bytes());
    buf.put_u32_le(request.kind.code());
    buf.freeze()
}

/// Decodes one response from the front of `buf`, consuming its bytes.
/// Returns `Ok(None)` when the buffer does not yet hold a complete
/// record.
pub fn decode_response(
    buf: &mut BytesMut,
    bound: usize,
) -> Result<Option<Response>, ClientError> {
    let mut view = &buf[..];

    let flag = match take(&mut view, 1) {
        Some(bytes) => bytes[0],
        None => return Ok(None),
    };
    let message = match flag {
        0 => None,
        1 => {
            let code = match take(&mut view, 4) {
                Some(mut bytes) => bytes.get_u32_le(),
                None => return Ok(None),
            };
            let kind = MessageKind::from_code(code).ok_or_else(|| {
                ClientError::protocol(format!("unknown message kind code {}", code))
            })?;
            let data = match take_lstring(&mut view, bound)? {
                Some(data) => Bytes::copy_from_slice(data),
                None => return Ok(None),
            };
            Some(Message { kind, data })
        }
        other => {
            return Err(ClientError::protocol(format!(
                "invalid optional flag {:#04x}",
                other
            )))
        }
    };

    let code = match take(&mut view, 4) {
        Some(mut bytes) => bytes.get_u32_le(),
        None => return Ok(None),
    };
    let kind = ResponseType::from_code(code)
        .ok_or_else(|| ClientError::protocol(format!("unknown response type code {}", code)))?;

    let consumed = buf.len() - view.len();
    buf.advance(consumed);
    Ok(Some(Response { kind, message }))
}

fn take<'a>(view: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if view.len() < n {
        return None;
    }
    let (head, tail) = view.split_at(n);
    *view = tail;
    Some(head)
}

fn take_lstring<'a>(
    view: &mut &'a [u8],
    bound: usize,
) -> Result<Option<&'a [u8]>, ClientError> {
    let declared = match take(view, 8) {
        Some(mut bytes) => bytes.get_u64_le(),
        None => return Ok(None),
    };
    if declared > bound as u64 {
        return Err(ClientError::protocol(format!(
            "declared length {} exceeds frame bound {}",
            declared, bound
        )));
    }
    Ok(take(view, declared as usize))
}
