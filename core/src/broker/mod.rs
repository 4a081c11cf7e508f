//! # RelayMQ Broker Module
//!
//! TCP server and per-connection protocol handling.
//!
//! - [`server`] - Accepts client sockets and runs the accept loop until a
//!   shutdown request or the configured deadline
//! - [`connection`] - Drives one TCP session through the protocol state
//!   machine: framed request reading, storage dispatch, the parked wait,
//!   and the delivery-ack round-trip

pub mod connection;
pub mod server;

pub use connection::Connection;
pub use server::BrokerServer;
