//! # RelayMQ Client Library
//!
//! A small async client for the RelayMQ message broker.
//!
//! The client is a straightforward serialize-write-read-deserialize peer:
//! one request at a time over one TCP connection, with the delivery
//! acknowledgement round-trip handled internally on every received
//! message. It carries its own copy of the wire protocol so the two sides
//! of the connection pin the format independently.
//!
//! ## Posting
//!
//! ```rust,no_run
//! use relaymq_client::{BrokerClient, Message};
//!
//! #[tokio::main]
//! async fn main() -> relaymq_client::Result<()> {
//!     let mut client = BrokerClient::connect("127.0.0.1", 9090).await?;
//!     client.post_message("events", Message::text("hello")).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Fetching
//!
//! ```rust,no_run
//! use relaymq_client::BrokerClient;
//!
//! #[tokio::main]
//! async fn main() -> relaymq_client::Result<()> {
//!     let mut client = BrokerClient::connect("127.0.0.1", 9090).await?;
//!
//!     // Waits for a message when the topic is empty.
//!     let message = client.get_message("events").await?;
//!     println!("got {} bytes", message.data.len());
//!
//!     // Returns None instead of waiting.
//!     if let Some(message) = client.try_get_message("events").await? {
//!         println!("got {} more bytes", message.data.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;

pub use client::BrokerClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use protocol::{Message, MessageKind};

/// Client library result type.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
