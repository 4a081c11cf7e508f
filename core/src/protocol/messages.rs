use bytes::Bytes;

pub type TopicName = String;

/// Payload classification carried with every message.
///
/// The broker stores and echoes it verbatim; it has no broker-side
/// semantics.
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

/// A single broker message: a payload the broker treats as opaque bytes,
/// tagged with its [`MessageKind`].
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

/// Request type codes of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    /// Post a message under a topic and await confirmation
    Produce,
    /// Fetch the head of a topic, parking on the topic when it is empty
    FetchBlocking,
    /// Fetch the head of a topic, answered immediately either way
    FetchNonblocking,
    /// Confirm receipt of a delivered message
    DeliveryAck,
    /// Unrecognised type code, preserved verbatim so the broker can answer
    /// `Error` instead of tearing the connection down
    Unknown(u32),
}

impl RequestType {
    pub const fn code(self) -> u32 {
        match self {
            RequestType::Produce => 0,
            RequestType::FetchBlocking => 1,
            RequestType::FetchNonblocking => 2,
            RequestType::DeliveryAck => 3,
            RequestType::Unknown(code) => code,
        }
    }

    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => RequestType::Produce,
            1 => RequestType::FetchBlocking,
            2 => RequestType::FetchNonblocking,
            3 => RequestType::DeliveryAck,
            other => RequestType::Unknown(other),
        }
    }
}

/// Response type codes of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Post was accepted
    ProduceOk,
    /// Reserved by the protocol for a failed post; the broker never emits
    /// it
    ProduceError,
    /// Fetch succeeded; the response carries the message
    FetchOk,
    /// Non-blocking fetch found the topic empty
    TopicEmpty,
    /// The request type was not recognised
    Error,
}

impl ResponseType {
    pub const fn code(self) -> u32 {
        match self {
            ResponseType::ProduceOk => 0,
            ResponseType::ProduceError => 1,
            ResponseType::FetchOk => 2,
            ResponseType::TopicEmpty => 3,
            ResponseType::Error => 4,
        }
    }

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

/// A client request: type, topic, and an optional message.
///
/// The message is present for `Produce` and absent for fetches and
/// delivery acks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: RequestType,
    pub topic: TopicName,
    pub message: Option<Message>,
}

impl Request {
    pub fn produce(topic: impl Into<TopicName>, message: Message) -> Self {
        Self {
            kind: RequestType::Produce,
            topic: topic.into(),
            message: Some(message),
        }
    }

    pub fn fetch_blocking(topic: impl Into<TopicName>) -> Self {
        Self {
            kind: RequestType::FetchBlocking,
            topic: topic.into(),
            message: None,
        }
    }

    pub fn fetch_nonblocking(topic: impl Into<TopicName>) -> Self {
        Self {
            kind: RequestType::FetchNonblocking,
            topic: topic.into(),
            message: None,
        }
    }

    pub fn delivery_ack(topic: impl Into<TopicName>) -> Self {
        Self {
            kind: RequestType::DeliveryAck,
            topic: topic.into(),
            message: None,
        }
    }
}

/// A broker response: type and an optional message.
///
/// The message is present exactly when the type is `FetchOk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub kind: ResponseType,
    pub message: Option<Message>,
}

impl Response {
    pub fn produce_ok() -> Self {
        Self {
            kind: ResponseType::ProduceOk,
            message: None,
        }
    }

    pub fn fetch_ok(message: Message) -> Self {
        Self {
            kind: ResponseType::FetchOk,
            message: Some(message),
        }
    }

    pub fn topic_empty() -> Self {
        Self {
            kind: ResponseType::TopicEmpty,
            message: None,
        }
    }

    pub fn error() -> Self {
        Self {
            kind: ResponseType::Error,
            message: None,
        }
    }
}
