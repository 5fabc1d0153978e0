//! Error types for DrishtiLink

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiLink error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration write error
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Wire protocol violation that cannot be recovered locally
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
