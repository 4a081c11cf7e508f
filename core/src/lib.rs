//! # RelayMQ Core Library
//!
//! RelayMQ is an in-memory, topic-keyed message broker with a binary TCP
//! request/response protocol. Producers post messages under a topic;
//! consumers fetch them in FIFO order, either returning immediately when a
//! topic is empty or parking on the topic until a message arrives. Every
//! delivered message is closed out by an explicit delivery-acknowledgement
//! round-trip: a consumer that disconnects before acknowledging causes the
//! broker to return the message to its topic.
//!
//! ## Architecture Overview
//!
//! - [`broker`] - TCP server and per-connection protocol state machine
//! - [`storage`] - Per-topic message and waiter queues with the
//!   producer-to-consumer hand-off path
//! - [`protocol`] - Wire types and the binary codec shared with clients
//! - [`queue`] - The FIFO primitive backing both queue roles
//! - [`config`] - Typed configuration with file and environment sources
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relaymq::{BrokerConfig, BrokerServer};
//!
//! #[tokio::main]
//! async fn main() -> relaymq::Result<()> {
//!     let config = BrokerConfig {
//!         endpoint_address: "127.0.0.1".to_string(),
//!         endpoint_port: 9090,
//!         ..Default::default()
//!     };
//!
//!     let server = BrokerServer::bind(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Delivery Guarantees
//!
//! Delivery is at-most-once from the broker's point of view: a message is
//! handed to exactly one consumer. The acknowledgement round-trip promotes
//! this to at-least-once within a session, because an unacknowledged
//! message is re-posted to its topic when the consumer's connection dies.
//! At every moment a posted message is in exactly one place: queued under
//! its topic, in flight toward a single consumer, or acknowledged.

pub mod broker;
pub mod config;
pub mod protocol;
pub mod queue;
pub mod storage;

pub use broker::{BrokerServer, Connection};
pub use config::BrokerConfig;
pub use protocol::{Message, MessageKind, Request, RequestType, Response, ResponseType};
pub use queue::{MutexQueue, QueueKind};
pub use storage::{create_store, BlockingGet, MessageStore, RamStorage, StorageKind};

use thiserror::Error;

/// RelayMQ error types.
///
/// Covers every failure surface of the broker: socket I/O, wire-format
/// violations, protocol-state violations, and configuration problems.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Socket and other I/O failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire-format violations detected by the codec
    #[error("codec error: {0}")]
    Codec(#[from] protocol::CodecError),

    /// Protocol-state violations (a frame that is well formed but illegal
    /// in the connection's current state)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Configuration validation and parsing errors
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias used throughout the RelayMQ codebase.
pub type Result<T> = std::result::Result<T, RelayError>;
