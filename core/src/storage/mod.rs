//! # RelayMQ Storage Module
//!
//! Per-topic registry owning a message queue and a waiter queue for each
//! topic, and the hand-off path between producers and parked consumers.
//!
//! The conservation discipline lives here: a post either enqueues its
//! message or hands it directly to exactly one parked waiter, never both.
//! Topic slots are created on first use of either queue and live for the
//! server's lifetime.
//!
//! ## Locking
//!
//! Slots are kept in a [`DashMap`]; the compound decisions - "waiter
//! present, hand off instead of enqueue" on the post side and "no head,
//! park instead of reply" on the fetch side - both run under the slot's
//! exclusive entry lock, which serializes them per topic. The queues
//! inside a slot carry their own internal mutexes and are only touched in
//! single operations under that entry lock. The hand-off itself is a
//! channel send, so no connection state is ever reached while a storage
//! lock is held.

pub mod tests;

use crate::protocol::{Message, TopicName};
use crate::queue::{MutexQueue, QueueKind};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Selects the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Ram,
}

impl StorageKind {
    /// Parses a configuration string, falling back to the single defined
    /// variant when the name is not recognised.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ram" => StorageKind::Ram,
            other => {
                warn!("unknown storage type '{}', using 'ram'", other);
                StorageKind::Ram
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Ram => "ram",
        }
    }
}

/// The parked side of a blocking fetch. Storage owns the sender while the
/// consumer is parked and gives it up on match; the consumer's connection
/// task awaits the receiver.
pub type Waiter = oneshot::Sender<Message>;

/// Outcome of a blocking fetch.
#[derive(Debug)]
pub enum BlockingGet {
    /// The topic had a head message; it has been popped.
    Ready(Message),
    /// The topic was empty; the caller is now enqueued as a waiter and
    /// must await the receiver instead of replying.
    Parked(oneshot::Receiver<Message>),
}

/// Storage interface for the broker.
pub trait MessageStore: Send + Sync {
    /// Posts a message under `topic`. Hands it to the first live parked
    /// waiter if one exists, otherwise enqueues it, creating the topic
    /// slot on first use.
    fn post_message(&self, topic: &str, message: Message);

    /// Pops the head of `topic`, or returns `None` when the topic has no
    /// slot or its queue is drained. Never creates a slot, never parks.
    fn get_message_nonblocking(&self, topic: &str) -> Option<Message>;

    /// Pops the head of `topic` if present; otherwise parks the caller on
    /// the topic's waiter queue.
    fn get_message_blocking(&self, topic: &str) -> BlockingGet;
}

/// Creates a message store of the given kind with queues of the given
/// kind.
pub fn create_store(storage: StorageKind, queue: QueueKind) -> Arc<dyn MessageStore> {
    match storage {
        StorageKind::Ram => Arc::new(RamStorage::new(queue)),
    }
}

/// Per-topic pair of message queue and waiter queue.
#[derive(Debug, Default)]
struct TopicSlot {
    messages: MutexQueue<Message>,
    waiters: MutexQueue<Waiter>,
}

/// In-memory implementation of [`MessageStore`]. Thread-safe.
#[derive(Debug)]
pub struct RamStorage {
    topics: DashMap<TopicName, TopicSlot>,
    queue_kind: QueueKind,
}

impl RamStorage {
    pub fn new(queue_kind: QueueKind) -> Self {
        Self {
            topics: DashMap::new(),
            queue_kind,
        }
    }

    fn new_slot(&self) -> TopicSlot {
        match self.queue_kind {
            QueueKind::MutexQueue => TopicSlot::default(),
        }
    }
}

impl MessageStore for RamStorage {
    fn post_message(&self, topic: &str, message: Message) {
        // The entry guard is exclusive, so the hand-off-or-enqueue
        // decision is atomic with respect to parking fetches on the same
        // topic.
        let slot = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| self.new_slot());

        let mut message = message;
        while let Some(waiter) = slot.waiters.pop() {
            match waiter.send(message) {
                Ok(()) => {
                    debug!("handed message on topic '{}' to a parked consumer", topic);
                    return;
                }
                // The waiter's consumer vanished before a post matched it;
                // reclaim the message and try the next one.
                Err(returned) => {
                    debug!("discarding dead waiter on topic '{}'", topic);
                    message = returned;
                }
            }
        }
        slot.messages.push(message);
    }

    fn get_message_nonblocking(&self, topic: &str) -> Option<Message> {
        match self.topics.get(topic) {
            Some(slot) => slot.messages.pop(),
            None => {
                debug!("no queue for topic '{}'", topic);
                None
            }
        }
    }

    fn get_message_blocking(&self, topic: &str) -> BlockingGet {
        let slot = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| self.new_slot());

        if let Some(message) = slot.messages.pop() {
            return BlockingGet::Ready(message);
        }
        // Still under the entry lock: a concurrent post cannot slip in
        // between the empty check and the park.
        let (tx, rx) = oneshot::channel();
        slot.waiters.push(tx);
        debug!("queue for topic '{}' is empty, parking consumer", topic);
        BlockingGet::Parked(rx)
    }
}
