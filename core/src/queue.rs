//! FIFO queue primitive backing both queue roles in storage: pending
//! messages per topic and parked waiters per topic.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::warn;

/// Selects the queue implementation used inside topic slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueKind {
    #[default]
    MutexQueue,
}

impl QueueKind {
    /// Parses a configuration string, falling back to the single defined
    /// variant when the name is not recognised.
    pub fn from_name(name: &str) -> Self {
        match name {
            "mutex" => QueueKind::MutexQueue,
            other => {
                warn!("unknown queue type '{}', using 'mutex'", other);
                QueueKind::MutexQueue
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueueKind::MutexQueue => "mutex",
        }
    }
}

/// Thread-safe FIFO with full internal synchronization.
///
/// `pop` on an empty queue returns `None` instead of blocking; all
/// operations are total and non-blocking from the caller's standpoint.
#[derive(Debug)]
pub struct MutexQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> MutexQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends an element at the tail.
    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
    }

    /// Removes and returns the head element, or `None` when the queue is
    /// empty.
    pub fn pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Instantaneous length. Advisory only: it must not be used to guard a
    /// subsequent `pop` without external coordination.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for MutexQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
