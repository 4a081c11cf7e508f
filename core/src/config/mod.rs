pub mod settings;

use crate::protocol::DEFAULT_MAX_FRAME_BYTES;
use crate::queue::QueueKind;
use crate::storage::StorageKind;
use std::time::Duration;

/// Typed broker configuration.
///
/// Produced from a YAML file, `RELAYMQ_*` environment variables, or
/// command-line overrides; see [`settings`].
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub endpoint_address: String,
    pub endpoint_port: u16,
    pub storage_type: StorageKind,
    pub queue_type: QueueKind,
    /// Worker threads for the runtime; `<= 0` selects hardware
    /// concurrency.
    pub threads: i64,
    /// Wall-clock server deadline in seconds; `<= 0` disables it.
    pub timeout: i64,
    /// Upper bound on a single encoded record in either direction.
    pub max_frame_bytes: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            endpoint_address: "127.0.0.1".to_string(),
            endpoint_port: 9090,
            storage_type: StorageKind::Ram,
            queue_type: QueueKind::MutexQueue,
            threads: -1,
            timeout: -1,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl BrokerConfig {
    /// Number of runtime worker threads this configuration asks for.
    pub fn worker_threads(&self) -> usize {
        if self.threads > 0 {
            self.threads as usize
        } else {
            num_cpus::get()
        }
    }

    /// The server deadline, when one is configured.
    pub fn deadline(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout as u64))
    }

    /// Validates configuration bounds.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.endpoint_address.is_empty() {
            return Err("endpoint_address must not be empty".to_string());
        }
        if self.max_frame_bytes == 0 {
            return Err("max_frame_bytes must be > 0".to_string());
        }
        Ok(())
    }
}
