use thiserror::Error;

/// Top-level error type for Arbolito.
#[derive(Debug, Error)]
pub enum ArbolitoError {
    /// Error from the messaging client (connect, lookup, send).
    #[error("channel error: {0}")]
    Channel(String),

    /// Error from the completion provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Malformed recipient input (e.g. a phone string with no digits).
    #[error("recipient error: {0}")]
    Recipient(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
