//! Error types for the custody service
//!
//! Error taxonomy for wallet lifecycle, session gating, and backup/restore.

use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Custody errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wallet not found
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account does not belong to the requested wallet
    #[error("Account mismatch: {0}")]
    AccountMismatch(String),

    /// Secret access attempted after the session window elapsed
    #[error("Session expired")]
    SessionExpired,

    /// Secret access attempted while locked
    #[error("Wallet is locked")]
    Locked,

    /// No wallet exists yet
    #[error("No wallet configured")]
    NoWallet,

    /// Supplied seed phrase failed validation
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Wallet deletion requires an explicit confirmation token
    #[error("Invalid confirmation token")]
    InvalidConfirmation,

    /// Credential verification failed
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Backup decryption failed (wrong passphrase or corrupt ciphertext)
    #[error("Backup decryption failed: {0}")]
    DecryptionFailed(String),

    /// Backup checksum mismatch
    #[error("Backup integrity check failed: {0}")]
    IntegrityCheckFailed(String),

    /// Backup document is malformed
    #[error("Invalid backup document: {0}")]
    InvalidBackup(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key engine error
    #[error(transparent)]
    Core(#[from] ember_core::Error),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] ember_storage::Error),
}

impl Error {
    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::SessionExpired
                | Error::Locked
                | Error::InvalidSeed(_)
                | Error::InvalidConfirmation
                | Error::AuthenticationFailed
                | Error::DecryptionFailed(_)
                | Error::IntegrityCheckFailed(_)
        )
    }

    /// True when the failure should surface as a re-authentication prompt
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, Error::SessionExpired | Error::Locked)
    }

    /// Get user-friendly error message.
    ///
    /// Never embeds secret material or raw record contents.
    pub fn user_message(&self) -> String {
        match self {
            Error::SessionExpired | Error::Locked => {
                "Your session has ended. Please unlock your wallet to continue.".to_string()
            }
            Error::InvalidSeed(_) => {
                "The recovery phrase is invalid. Please check the words and try again.".to_string()
            }
            Error::AuthenticationFailed => {
                "Authentication failed. Please try again.".to_string()
            }
            Error::DecryptionFailed(_) | Error::IntegrityCheckFailed(_) => {
                "This backup is corrupted or the password is wrong.".to_string()
            }
            Error::InvalidBackup(_) => {
                "This file is not a valid wallet backup.".to_string()
            }
            Error::WalletNotFound(_) => "That wallet no longer exists.".to_string(),
            _ => self.to_string(),
        }
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::WalletNotFound(_) | Error::AccountNotFound(_) | Error::AccountMismatch(_) => {
                ErrorCategory::Wallet
            }
            Error::SessionExpired | Error::Locked | Error::NoWallet => ErrorCategory::Session,
            Error::InvalidSeed(_) => ErrorCategory::Seed,
            Error::InvalidConfirmation | Error::AuthenticationFailed => ErrorCategory::Auth,
            Error::DecryptionFailed(_) | Error::IntegrityCheckFailed(_) | Error::InvalidBackup(_) => {
                ErrorCategory::Backup
            }
            Error::Serialization(_) | Error::Core(_) | Error::Storage(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Wallet/account lookup errors
    Wallet,
    /// Session gating errors
    Session,
    /// Seed validation errors
    Seed,
    /// Authentication errors
    Auth,
    /// Backup/restore errors
    Backup,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Wallet => write!(f, "Wallet"),
            ErrorCategory::Session => write!(f, "Session"),
            ErrorCategory::Seed => write!(f, "Seed"),
            ErrorCategory::Auth => write!(f, "Auth"),
            ErrorCategory::Backup => write!(f, "Backup"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reauthentication_detection() {
        assert!(Error::SessionExpired.requires_reauthentication());
        assert!(Error::Locked.requires_reauthentication());
        assert!(!Error::NoWallet.requires_reauthentication());
    }

    #[test]
    fn test_backup_user_message_names_both_causes() {
        let msg = Error::DecryptionFailed("bad tag".to_string()).user_message();
        assert!(msg.contains("corrupted"));
        assert!(msg.contains("password"));

        let msg = Error::IntegrityCheckFailed("digest mismatch".to_string()).user_message();
        assert!(msg.contains("corrupted"));
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::SessionExpired.category(), ErrorCategory::Session);
        assert_eq!(
            Error::WalletNotFound("x".to_string()).category(),
            ErrorCategory::Wallet
        );
        assert_eq!(
            Error::IntegrityCheckFailed("x".to_string()).category(),
            ErrorCategory::Backup
        );
    }
}
