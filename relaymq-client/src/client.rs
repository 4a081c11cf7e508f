//! The broker client.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::protocol::{
    self, Message, Request, RequestType, Response, ResponseType, DEFAULT_MAX_FRAME_BYTES,
};
use crate::Result;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// A connection to one RelayMQ broker.
///
/// The client issues one request at a time and completes each exchange
/// before the next: a post waits for the broker's confirmation, and a
/// fetch that yields a message acknowledges the delivery (and reads the
/// broker's one-byte ack-ack) before returning it.
pub struct BrokerClient {
    stream: TcpStream,
    buf: BytesMut,
    max_frame_bytes: usize,
}

impl BrokerClient {
    /// Connects to the broker at `address:port`.
    pub async fn connect(address: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((address, port)).await?;
        stream.set_nodelay(true)?;
        debug!("connected to broker at {}:{}", address, port);
        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(4096),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        })
    }

    /// Connects using a [`ClientConfig`].
    pub async fn connect_with(config: &ClientConfig) -> Result<Self> {
        Self::connect(&config.server_address, config.server_port).await
    }

    /// Posts `message` under `topic`, returning once the broker confirms
    /// it accepted the message.
    pub async fn post_message(&mut self, topic: &str, message: Message) -> Result<()> {
        let request = Request {
            kind: RequestType::Produce,
            topic: topic.to_string(),
            message: Some(message),
        };
        let response = self.round_trip(&request).await?;
        match response.kind {
            ResponseType::ProduceOk => Ok(()),
            other => Err(ClientError::broker(format!(
                "broker rejected post: {:?}",
                other
            ))),
        }
    }

    /// Fetches the next message from `topic`, waiting for one to be
    /// posted when the topic is empty. The delivery is acknowledged
    /// before the message is returned.
    pub async fn get_message(&mut self, topic: &str) -> Result<Message> {
        let request = Request {
            kind: RequestType::FetchBlocking,
            topic: topic.to_string(),
            message: None,
        };
        let response = self.round_trip(&request).await?;
        match (response.kind, response.message) {
            (ResponseType::FetchOk, Some(message)) => {
                self.confirm_delivery(topic).await?;
                Ok(message)
            }
            (kind, _) => Err(ClientError::broker(format!(
                "unexpected response to blocking fetch: {:?}",
                kind
            ))),
        }
    }

    /// Fetches the next message from `topic` if one is queued, `None`
    /// when the topic is empty. A received delivery is acknowledged
    /// before the message is returned.
    pub async fn try_get_message(&mut self, topic: &str) -> Result<Option<Message>> {
        let request = Request {
            kind: RequestType::FetchNonblocking,
            topic: topic.to_string(),
            message: None,
        };
        let response = self.round_trip(&request).await?;
        match (response.kind, response.message) {
            (ResponseType::FetchOk, Some(message)) => {
                self.confirm_delivery(topic).await?;
                Ok(Some(message))
            }
            (ResponseType::TopicEmpty, _) => Ok(None),
            (kind, _) => Err(ClientError::broker(format!(
                "unexpected response to non-blocking fetch: {:?}",
                kind
            ))),
        }
    }

    async fn round_trip(&mut self, request: &Request) -> Result<Response> {
        let bytes = protocol::encode_request(request);
        self.stream.write_all(&bytes).await?;
        self.read_response().await
    }

    async fn read_response(&mut self) -> Result<Response> {
        loop {
            if let Some(response) =
                protocol::decode_response(&mut self.buf, self.max_frame_bytes)?
            {
                return Ok(response);
            }
            if self.buf.len() > self.max_frame_bytes {
                return Err(ClientError::protocol(
                    "response exceeds the frame bound".to_string(),
                ));
            }
            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(ClientError::connection("broker closed the connection"));
            }
        }
    }

    /// Sends the delivery confirmation and waits for the broker's
    /// one-byte acknowledgement, after which the connection is reusable.
    async fn confirm_delivery(&mut self, topic: &str) -> Result<()> {
        let ack = Request {
            kind: RequestType::DeliveryAck,
            topic: topic.to_string(),
            message: None,
        };
        self.stream.write_all(&protocol::encode_request(&ack)).await?;

        // The ack-ack is a single opaque byte outside the record format.
        if self.buf.is_empty() {
            let _ = self.stream.read_u8().await?;
        } else {
            self.buf.advance(1);
        }
        Ok(())
    }
}
