//! Tier record models
//!
//! Every persisted record carries a `schema_version` tag. Secret material
//! appears ONLY in [`SecretRecord`]/[`AccountSecret`]; descriptor-tier types
//! have no secret-capable fields, so secret isolation can be verified by
//! inspecting this module alone.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current record schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Wallet identifier
pub type WalletId = Uuid;

/// Account identifier
pub type AccountId = Uuid;

// =============================================================================
// Secret tier
// =============================================================================

/// Per-account secret material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSecret {
    /// Account ID
    pub account_id: AccountId,
    /// Derivation path used
    pub derivation_path: String,
    /// Private key (0x-prefixed hex)
    pub private_key: String,
}

/// Wallet secret record (seed phrase plus derived account keys)
///
/// Serialized then sealed with the master key before it reaches the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Record schema version
    pub schema_version: u32,
    /// Owning wallet ID
    pub wallet_id: WalletId,
    /// Seed phrase. Immutable for the wallet's lifetime.
    pub mnemonic: String,
    /// Derived account keys
    pub accounts: Vec<AccountSecret>,
    /// Created timestamp (unix seconds)
    pub created_at: i64,
}

// =============================================================================
// Descriptor tier
// =============================================================================

/// How a wallet came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletCategory {
    /// Created in-app with a fresh seed
    Created,
    /// Imported from an existing seed phrase
    Imported,
}

/// Wallet metadata record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Record schema version
    pub schema_version: u32,
    /// Wallet ID
    pub id: WalletId,
    /// User-facing name
    pub name: String,
    /// Presentation color tag
    pub color: String,
    /// Category tag
    pub category: WalletCategory,
    /// Created timestamp (unix seconds)
    pub created_at: i64,
    /// Last-used timestamp (unix seconds)
    pub last_used_at: i64,
    /// Ordered account ids belonging to this wallet
    pub account_ids: Vec<AccountId>,
    /// Next account index to allocate. High-water mark: never decremented,
    /// so indices are not reused after deletion within a session.
    pub next_account_index: u32,
}

/// Account metadata record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Record schema version
    pub schema_version: u32,
    /// Account ID
    pub id: AccountId,
    /// Owning wallet ID
    pub wallet_id: WalletId,
    /// Display name
    pub name: String,
    /// Checksummed account address
    pub address: String,
    /// Derivation path
    pub derivation_path: String,
    /// Derivation index within the wallet
    pub index: u32,
    /// Hidden from listings
    pub hidden: bool,
    /// Cached balance (display only, non-authoritative)
    pub cached_balance: Option<String>,
    /// Last-activity timestamp (unix seconds)
    pub last_activity_at: i64,
    /// Display order within the wallet
    pub order_index: u32,
}

/// Display order of wallets (separate from per-record fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletOrder {
    /// Record schema version
    pub schema_version: u32,
    /// Wallet ids in display order
    pub ids: Vec<WalletId>,
}

impl Default for WalletOrder {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            ids: Vec::new(),
        }
    }
}

/// Persisted session state. Contains no secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Record schema version
    pub schema_version: u32,
    /// Currently selected wallet
    pub current_wallet: Option<WalletId>,
    /// Currently selected account
    pub current_account: Option<AccountId>,
    /// Currently selected network
    pub network_id: u64,
    /// Locked flag
    pub locked: bool,
    /// Last unlock timestamp (unix seconds)
    pub unlocked_at: Option<i64>,
    /// Session expiry timestamp (unix seconds)
    pub expires_at: Option<i64>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            current_wallet: None,
            current_account: None,
            network_id: 1,
            locked: true,
            unlocked_at: None,
            expires_at: None,
        }
    }
}

/// Network configuration entry (descriptor tier)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSetting {
    /// Chain identifier
    pub chain_id: u64,
    /// Display name
    pub name: String,
    /// Enabled for selection
    pub enabled: bool,
}

/// User preferences and network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Record schema version
    pub schema_version: u32,
    /// Fiat display currency
    pub fiat_currency: String,
    /// UI language tag
    pub language: String,
    /// Configured networks
    pub networks: Vec<NetworkSetting>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            fiat_currency: "USD".to_string(),
            language: "en".to_string(),
            networks: vec![NetworkSetting {
                chain_id: 1,
                name: "Mainnet".to_string(),
                enabled: true,
            }],
        }
    }
}
