//! Error types for the Ember key engine
//!
//! Error taxonomy for mnemonic validation and key derivation.

use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Key engine errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid mnemonic phrase (bad word, word count, or checksum)
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Invalid seed material
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Key derivation error
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Invalid key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid address format
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidMnemonic(_) | Error::InvalidSeed(_) | Error::InvalidAddress(_)
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidMnemonic(_) | Error::InvalidSeed(_) => {
                "The recovery phrase is invalid. Please check the words and try again.".to_string()
            }
            Error::InvalidAddress(_) => {
                "The address is invalid. Please check and try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidMnemonic(_) | Error::InvalidSeed(_) => ErrorCategory::Seed,
            Error::KeyDerivation(_) | Error::InvalidKey(_) => ErrorCategory::Keys,
            Error::InvalidAddress(_) => ErrorCategory::Address,
            Error::Io(_) | Error::Serialization(_) | Error::Other(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Mnemonic/seed errors
    Seed,
    /// Key-related errors
    Keys,
    /// Address-related errors
    Address,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Seed => write!(f, "Seed"),
            ErrorCategory::Keys => write!(f, "Keys"),
            ErrorCategory::Address => write!(f, "Address"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_detection() {
        assert!(Error::InvalidMnemonic("test".to_string()).is_user_error());
        assert!(Error::InvalidSeed("test".to_string()).is_user_error());
        assert!(!Error::KeyDerivation("test".to_string()).is_user_error());
        assert!(!Error::Other("test".to_string()).is_user_error());
    }

    #[test]
    fn test_user_messages() {
        let error = Error::InvalidMnemonic("details".to_string());
        let msg = error.user_message();
        assert!(msg.contains("recovery phrase is invalid"));

        let error = Error::InvalidAddress("details".to_string());
        let msg = error.user_message();
        assert!(msg.contains("address is invalid"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::InvalidMnemonic("test".to_string()).category(),
            ErrorCategory::Seed
        );
        assert_eq!(
            Error::KeyDerivation("test".to_string()).category(),
            ErrorCategory::Keys
        );
        assert_eq!(
            Error::InvalidAddress("test".to_string()).category(),
            ErrorCategory::Address
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Seed.to_string(), "Seed");
        assert_eq!(ErrorCategory::Keys.to_string(), "Keys");
    }
}
