//! Error types for the RelayMQ client library.

/// Main error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection-level failures (refused, closed mid-exchange)
    #[error("connection error: {message}")]
    Connection { message: String },

    /// Wire-format violations in the broker's responses
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// The broker answered with an error response
    #[error("broker error: {message}")]
    Broker { message: String },

    /// Invalid client configuration
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a new broker error
    pub fn broker<S: Into<String>>(message: S) -> Self {
        Self::Broker {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Io(_))
    }
}
