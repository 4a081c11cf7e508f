use super::BrokerConfig;
use crate::queue::QueueKind;
use crate::storage::StorageKind;
use crate::{RelayError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Raw key/value view of the configuration sources, converted into the
/// typed [`BrokerConfig`]. Missing keys take the defaults; unknown
/// storage/queue names fall back to the single defined variant with a
/// warning.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    endpoint_address: Option<String>,
    endpoint_port: Option<u16>,
    storage_type: Option<String>,
    queue_type: Option<String>,
    threads: Option<i64>,
    timeout: Option<i64>,
    max_frame_bytes: Option<usize>,
}

impl RawSettings {
    fn into_config(self) -> BrokerConfig {
        let defaults = BrokerConfig::default();
        BrokerConfig {
            endpoint_address: self.endpoint_address.unwrap_or(defaults.endpoint_address),
            endpoint_port: self.endpoint_port.unwrap_or(defaults.endpoint_port),
            storage_type: self
                .storage_type
                .as_deref()
                .map(StorageKind::from_name)
                .unwrap_or(defaults.storage_type),
            queue_type: self
                .queue_type
                .as_deref()
                .map(QueueKind::from_name)
                .unwrap_or(defaults.queue_type),
            threads: self.threads.unwrap_or(defaults.threads),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            max_frame_bytes: self.max_frame_bytes.unwrap_or(defaults.max_frame_bytes),
        }
    }
}

impl BrokerConfig {
    /// Loads configuration from a YAML file, with `RELAYMQ_*` environment
    /// variables taking precedence over file keys. A missing or
    /// unparsable file is a fatal configuration error.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Yaml))
            .add_source(Environment::with_prefix("RELAYMQ"))
            .build()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        let raw = settings
            .try_deserialize::<RawSettings>()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        Ok(raw.into_config())
    }

    /// Loads configuration from `RELAYMQ_*` environment variables alone.
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .add_source(Environment::with_prefix("RELAYMQ"))
            .build()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        let raw = settings
            .try_deserialize::<RawSettings>()
            .map_err(|e| RelayError::Config(e.to_string()))?;

        Ok(raw.into_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_keys_are_set() {
        let config = RawSettings::default().into_config();
        assert_eq!(config.endpoint_address, "127.0.0.1");
        assert_eq!(config.endpoint_port, 9090);
        assert_eq!(config.storage_type, StorageKind::Ram);
        assert_eq!(config.queue_type, QueueKind::MutexQueue);
        assert_eq!(config.threads, -1);
        assert_eq!(config.timeout, -1);
        assert!(config.deadline().is_none());
        assert!(config.worker_threads() >= 1);
    }

    #[test]
    fn test_yaml_source_is_parsed() {
        let yaml = "endpoint_address: 0.0.0.0\n\
                    endpoint_port: 9191\n\
                    storage_type: ram\n\
                    queue_type: mutex\n\
                    threads: 4\n\
                    timeout: 30\n";
        let settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap();
        let config = settings
            .try_deserialize::<RawSettings>()
            .unwrap()
            .into_config();

        assert_eq!(config.endpoint_address, "0.0.0.0");
        assert_eq!(config.endpoint_port, 9191);
        assert_eq!(config.worker_threads(), 4);
        assert_eq!(
            config.deadline(),
            Some(std::time::Duration::from_secs(30))
        );
    }

    #[test]
    fn test_unknown_enum_names_fall_back() {
        let raw = RawSettings {
            storage_type: Some("postgres".to_string()),
            queue_type: Some("lockfree".to_string()),
            ..Default::default()
        };
        let config = raw.into_config();
        assert_eq!(config.storage_type, StorageKind::Ram);
        assert_eq!(config.queue_type, QueueKind::MutexQueue);
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let config = BrokerConfig {
            max_frame_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BrokerConfig {
            endpoint_address: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(BrokerConfig::default().validate().is_ok());
    }
}
