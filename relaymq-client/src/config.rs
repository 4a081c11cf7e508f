//! Client configuration.

use crate::error::ClientError;
use crate::Result;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Where the client should connect.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub server_address: String,
    pub server_port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            server_port: 9090,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    server_address: Option<String>,
    server_port: Option<u16>,
}

impl RawSettings {
    fn into_config(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            server_address: self.server_address.unwrap_or(defaults.server_address),
            server_port: self.server_port.unwrap_or(defaults.server_port),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a YAML file, with `RELAYMQ_CLIENT_*`
    /// environment variables taking precedence over file keys.
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Yaml))
            .add_source(Environment::with_prefix("RELAYMQ_CLIENT"))
            .build()
            .map_err(|e| ClientError::config(e.to_string()))?;

        let raw = settings
            .try_deserialize::<RawSettings>()
            .map_err(|e| ClientError::config(e.to_string()))?;

        Ok(raw.into_config())
    }

    /// Loads configuration from `RELAYMQ_CLIENT_*` environment variables
    /// alone.
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .add_source(Environment::with_prefix("RELAYMQ_CLIENT"))
            .build()
            .map_err(|e| ClientError::config(e.to_string()))?;

        let raw = settings
            .try_deserialize::<RawSettings>()
            .map_err(|e| ClientError::config(e.to_string()))?;

        Ok(raw.into_config())
    }
}
