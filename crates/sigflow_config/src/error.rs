//! Error types for configuration loading and validation.

/// Errors raised while loading `sigflow.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed into the expected shape.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A value parsed but is out of range or inconsistent.
    #[error("validation error: {0}")]
    ValidationError(String),
}
