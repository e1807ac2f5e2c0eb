//! Error types for the keyfob core library.

use thiserror::Error;

/// Top-level error type for keyfob operations.
#[derive(Error, Debug)]
pub enum KeyfobError {
    /// A replicated state key did not have the `<field>:<networkId>` shape.
    #[error("Invalid state key: {0:?}")]
    InvalidStateKey(String),

    /// A replicated value had the wrong JSON type for its field.
    #[error("Invalid value for state field `{field}`: {value}")]
    InvalidStateValue {
        /// Which field was being written.
        field: &'static str,
        /// The offending JSON value.
        value: serde_json::Value,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, KeyfobError>;
