//! Error types

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested record is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored record could not be decrypted or decoded
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Encryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend error (generic)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// True when the error means "record absent" rather than a real failure.
    ///
    /// Absence is recoverable: it usually means first launch or an already
    /// deleted record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
