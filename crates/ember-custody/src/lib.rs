//! Ember Wallet custody service
//!
//! The orchestration layer of the custody core: wallet/account lifecycle,
//! the lock/unlock session state machine, secret export gating, and
//! checksum-verified backup/restore. Screens call this crate only; the
//! storage tiers underneath are never reached directly by UI code.
//!
//! All services are explicitly constructed and dependency-injected so tests
//! can instantiate isolated instances per case.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod autolock;
pub mod backup;
pub mod error;
pub mod orchestrator;
pub mod session;

pub use auth::{AcceptAll, CredentialVerifier, StaticCredential};
pub use autolock::{schedule_auto_lock, AutoLockHandle};
pub use backup::{
    BackupOptions, BackupPayload, BackupService, RestoreOptions, WalletBackup,
    BACKUP_SCHEMA_VERSION,
};
pub use error::{Error, ErrorCategory, Result};
pub use orchestrator::{CreateWalletParams, WalletOrchestrator, WalletWithAccounts};
pub use session::{CustodyConfig, SessionStatus};
