//! Per-connection protocol state machine.
//!
//! Each accepted socket is driven by one task that owns the socket halves,
//! so a connection processes one request at a time: reads resume only
//! after the response write - and, for a delivered message, the
//! delivery-ack round-trip - has completed.
//!
//! A message taken out of storage for this peer is "in flight" until the
//! peer's `DeliveryAck` arrives. If the connection dies anywhere inside
//! that window the message is returned to its topic, so a posted message
//! is never lost to a consumer crash.

use crate::protocol::codec::{self, RequestDecoder, ACK_ACK_BYTE};
use crate::protocol::{Message, Request, RequestType, Response, TopicName};
use crate::storage::{BlockingGet, MessageStore};
use crate::{RelayError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

/// Protocol state machine for one TCP peer.
pub struct Connection {
    reader: FramedRead<OwnedReadHalf, RequestDecoder>,
    writer: OwnedWriteHalf,
    peer: SocketAddr,
    storage: Arc<dyn MessageStore>,
    /// Message delivered to the peer and not yet acknowledged, with its
    /// topic. Returned to storage on teardown.
    in_flight: Option<(TopicName, Message)>,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        storage: Arc<dyn MessageStore>,
        max_frame_bytes: usize,
    ) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: FramedRead::new(read_half, RequestDecoder::new(max_frame_bytes)),
            writer: write_half,
            peer,
            storage,
            in_flight: None,
        }
    }

    /// Drives the connection until the peer disconnects or a protocol or
    /// I/O error tears it down. A message still awaiting its delivery ack
    /// at teardown is re-posted to its topic.
    pub async fn run(mut self) {
        match self.serve().await {
            Ok(()) => debug!("client {} disconnected", self.peer),
            Err(e) => warn!("dropping client {}: {}", self.peer, e),
        }
        if let Some((topic, message)) = self.in_flight.take() {
            warn!(
                "client {} went away before acking, returning message to topic '{}'",
                self.peer, topic
            );
            self.storage.post_message(&topic, message);
        }
    }

    async fn serve(&mut self) -> Result<()> {
        while let Some(frame) = self.reader.next().await {
            let request = frame?;
            self.process(request).await?;
        }
        Ok(())
    }

    async fn process(&mut self, request: Request) -> Result<()> {
        match request.kind {
            RequestType::Produce => {
                let message = request.message.ok_or_else(|| {
                    RelayError::Protocol("produce request without a payload".to_string())
                })?;
                debug!(
                    "client {} posted {} bytes to topic '{}'",
                    self.peer,
                    message.data.len(),
                    request.topic
                );
                self.storage.post_message(&request.topic, message);
                self.write_response(&Response::produce_ok()).await
            }
            RequestType::FetchNonblocking => {
                match self.storage.get_message_nonblocking(&request.topic) {
                    Some(message) => self.deliver(request.topic, message).await,
                    None => self.write_response(&Response::topic_empty()).await,
                }
            }
            RequestType::FetchBlocking => {
                match self.storage.get_message_blocking(&request.topic) {
                    BlockingGet::Ready(message) => self.deliver(request.topic, message).await,
                    BlockingGet::Parked(rx) => {
                        debug!("client {} parked on topic '{}'", self.peer, request.topic);
                        match self.wait_for_handoff(rx, &request.topic).await? {
                            Some(message) => self.deliver(request.topic, message).await,
                            // Peer closed while parked; the serve loop
                            // will observe the same EOF and finish.
                            None => Ok(()),
                        }
                    }
                }
            }
            RequestType::DeliveryAck => Err(RelayError::Protocol(
                "delivery ack outside an ack window".to_string(),
            )),
            RequestType::Unknown(code) => {
                debug!("client {} sent unknown request type {}", self.peer, code);
                self.write_response(&Response::error()).await
            }
        }
    }

    /// Waits for storage to hand a posted message to this parked
    /// connection. The socket is watched at the same time so a vanished
    /// peer does not leave a waiter parked behind a live hand-off.
    async fn wait_for_handoff(
        &mut self,
        mut rx: oneshot::Receiver<Message>,
        topic: &str,
    ) -> Result<Option<Message>> {
        tokio::select! {
            handed = &mut rx => {
                match handed {
                    Ok(message) => Ok(Some(message)),
                    // Storage dropped the sender without a message; only
                    // possible while the broker is tearing down.
                    Err(_) => Ok(None),
                }
            }
            frame = self.reader.next() => {
                let outcome = match frame {
                    None => Ok(None),
                    Some(Err(e)) => Err(e.into()),
                    Some(Ok(_)) => Err(RelayError::Protocol(
                        "request received while a blocking fetch was outstanding".to_string(),
                    )),
                };
                // A post may have matched this waiter while we were
                // noticing the peer is gone. Close the channel first so no
                // further send can land, then reclaim anything already
                // handed over.
                rx.close();
                if let Ok(message) = rx.try_recv() {
                    debug!(
                        "reclaiming hand-off for dead client {} on topic '{}'",
                        self.peer, topic
                    );
                    self.storage.post_message(topic, message);
                }
                outcome
            }
        }
    }

    /// Writes a `FetchOk` carrying `message` and runs the delivery-ack
    /// round-trip. The message counts as in flight from before the write
    /// until the ack arrives.
    async fn deliver(&mut self, topic: TopicName, message: Message) -> Result<()> {
        self.in_flight = Some((topic, message.clone()));
        self.write_response(&Response::fetch_ok(message)).await?;
        self.await_delivery_ack().await
    }

    async fn await_delivery_ack(&mut self) -> Result<()> {
        let request = match self.reader.next().await {
            None => {
                return Err(RelayError::Protocol(
                    "peer closed before acking delivery".to_string(),
                ))
            }
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(request)) => request,
        };
        if request.kind != RequestType::DeliveryAck {
            return Err(RelayError::Protocol(format!(
                "expected delivery ack, got request type {}",
                request.kind.code()
            )));
        }
        // The peer has confirmed receipt: the message is retired even if
        // the ack-ack write below fails.
        self.in_flight = None;
        self.writer.write_all(&[ACK_ACK_BYTE]).await?;
        Ok(())
    }

    async fn write_response(&mut self, response: &Response) -> Result<()> {
        let bytes = codec::encode_response(response);
        self.writer.write_all(&bytes).await?;
        Ok(())
    }
}
