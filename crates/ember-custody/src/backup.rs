//! Backup/Restore Service
//!
//! Serializes a consistent snapshot across the secret and descriptor tiers
//! into a single portable document with an integrity digest, optionally
//! encrypted under a user passphrase. Restoration is checksum-verified and
//! all-or-nothing: the entire target state is rebuilt and validated in
//! memory before the first store write.
//!
//! After a restore that overwrote existing state, re-open the
//! [`WalletOrchestrator`](crate::WalletOrchestrator) so its in-memory
//! session reflects the restored stores.

use crate::{Error, Result};
use base64::Engine;
use ember_storage::{
    generate_salt, hash_sha256, AccountRecord, DescriptorStore, EphemeralCache, MasterKey,
    Preferences, SecretRecord, SecretStore, SessionRecord, WalletId, WalletOrder, WalletRecord,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const BACKUP_MAGIC: &[u8; 4] = b"EMBK";
const BACKUP_VERSION: u8 = 1;
const FLAG_ENCRYPTED: u8 = 0b0000_0001;
const SALT_LEN: usize = 32;

/// Backup document schema version (forward migration hook)
pub const BACKUP_SCHEMA_VERSION: u32 = 1;

/// Options for [`BackupService::create_backup`]
#[derive(Debug, Default)]
pub struct BackupOptions {
    /// Encrypt the whole document under this passphrase
    pub passphrase: Option<String>,
    /// Include preferences and network settings
    pub include_settings: bool,
}

/// Options for [`BackupService::restore_from_backup`]
#[derive(Debug)]
pub struct RestoreOptions {
    /// Passphrase for encrypted documents
    pub passphrase: Option<String>,
    /// Clear existing state before writing the restored records
    pub overwrite_existing: bool,
    /// Verify the integrity digest before any store mutation
    pub validate_integrity: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            passphrase: None,
            overwrite_existing: false,
            validate_integrity: true,
        }
    }
}

/// One wallet's slice of a backup: metadata, accounts, and secret record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBackup {
    /// Wallet metadata
    pub wallet: WalletRecord,
    /// Account metadata
    pub accounts: Vec<AccountRecord>,
    /// Secret-tier record (seed phrase, private keys)
    pub secret: SecretRecord,
}

/// Canonical backup payload; the checksum is computed over these bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPayload {
    /// Document schema version
    pub schema_version: u32,
    /// Snapshot timestamp (unix seconds)
    pub created_at: i64,
    /// Every wallet with its accounts and secrets
    pub wallets: Vec<WalletBackup>,
    /// Display order at snapshot time
    pub wallet_order: Vec<WalletId>,
    /// Preferences/network settings, when `include_settings` was set
    pub preferences: Option<Preferences>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BackupDocument {
    payload: BackupPayload,
    /// Hex SHA-256 over the canonical serialization of `payload`
    checksum: String,
}

/// Creates and restores portable wallet backups
pub struct BackupService {
    secrets: Arc<SecretStore>,
    descriptors: Arc<DescriptorStore>,
    cache: Arc<EphemeralCache>,
}

impl BackupService {
    /// Create a service over the same stores the orchestrator uses
    pub fn new(
        secrets: Arc<SecretStore>,
        descriptors: Arc<DescriptorStore>,
        cache: Arc<EphemeralCache>,
    ) -> Self {
        Self {
            secrets,
            descriptors,
            cache,
        }
    }

    /// Snapshot every wallet and return the (possibly encrypted) document as
    /// an opaque string for the caller to export.
    pub async fn create_backup(&self, options: BackupOptions) -> Result<String> {
        let order = self.descriptors.wallet_order().await?;
        let mut wallet_ids = order.ids.clone();
        // Wallets missing from the display order are still backed up.
        for wallet in self.descriptors.list_wallets().await? {
            if !wallet_ids.contains(&wallet.id) {
                wallet_ids.push(wallet.id);
            }
        }

        let mut wallets = Vec::with_capacity(wallet_ids.len());
        for id in &wallet_ids {
            let wallet = self.descriptors.get_wallet(id).await?;
            let accounts = self.descriptors.list_accounts(id).await?;
            let secret = self.secrets.get(id).await?;
            wallets.push(WalletBackup {
                wallet,
                accounts,
                secret,
            });
        }

        let payload = BackupPayload {
            schema_version: BACKUP_SCHEMA_VERSION,
            created_at: chrono::Utc::now().timestamp(),
            wallets,
            wallet_order: wallet_ids,
            preferences: if options.include_settings {
                Some(self.descriptors.preferences().await?)
            } else {
                None
            },
        };

        let wallet_count = payload.wallets.len();
        let checksum = hex::encode(hash_sha256(&serde_json::to_vec(&payload)?));
        let document = serde_json::to_vec(&BackupDocument { payload, checksum })?;

        // Envelope: [magic(4)][version(1)][flags(1)][salt(32)?][body]
        let mut envelope = Vec::with_capacity(6 + SALT_LEN + document.len());
        envelope.extend_from_slice(BACKUP_MAGIC);
        envelope.push(BACKUP_VERSION);

        match &options.passphrase {
            Some(passphrase) => {
                envelope.push(FLAG_ENCRYPTED);
                let salt = generate_salt();
                let key = MasterKey::from_passphrase(passphrase, &salt)?;
                envelope.extend_from_slice(&salt);
                envelope.extend_from_slice(&key.encrypt(&document)?);
            }
            None => {
                envelope.push(0);
                envelope.extend_from_slice(&document);
            }
        }

        tracing::info!(
            wallets = wallet_count,
            encrypted = options.passphrase.is_some(),
            "backup created"
        );
        Ok(base64::engine::general_purpose::STANDARD.encode(envelope))
    }

    /// Verify and apply a backup document.
    ///
    /// Order of failure: `DecryptionFailed` (bad passphrase or ciphertext),
    /// then `IntegrityCheckFailed` (corrupt content or checksum mismatch),
    /// then `InvalidBackup` (internally inconsistent records) — all before
    /// any store mutation. Aborting before the commit step has zero effect.
    pub async fn restore_from_backup(
        &self,
        document: &str,
        options: RestoreOptions,
    ) -> Result<()> {
        let envelope = base64::engine::general_purpose::STANDARD
            .decode(document.trim())
            .map_err(|_| Error::InvalidBackup("not base64".to_string()))?;

        if envelope.len() < 6 || &envelope[0..4] != BACKUP_MAGIC {
            return Err(Error::InvalidBackup("unrecognized document header".to_string()));
        }
        if envelope[4] != BACKUP_VERSION {
            return Err(Error::InvalidBackup(format!(
                "unsupported backup version {}",
                envelope[4]
            )));
        }

        let encrypted = envelope[5] & FLAG_ENCRYPTED != 0;
        let body = if encrypted {
            if envelope.len() < 6 + SALT_LEN {
                return Err(Error::DecryptionFailed("truncated ciphertext".to_string()));
            }
            let passphrase = options
                .passphrase
                .as_deref()
                .ok_or_else(|| Error::DecryptionFailed("passphrase required".to_string()))?;
            let salt = &envelope[6..6 + SALT_LEN];
            let key = MasterKey::from_passphrase(passphrase, salt)?;
            key.decrypt(&envelope[6 + SALT_LEN..])
                .map_err(|e| Error::DecryptionFailed(e.to_string()))?
        } else {
            envelope[6..].to_vec()
        };

        let document: BackupDocument = serde_json::from_slice(&body)
            .map_err(|_| Error::IntegrityCheckFailed("backup content is corrupted".to_string()))?;

        if options.validate_integrity {
            let recomputed = hex::encode(hash_sha256(&serde_json::to_vec(&document.payload)?));
            if !recomputed.eq_ignore_ascii_case(&document.checksum) {
                return Err(Error::IntegrityCheckFailed(
                    "checksum does not match content".to_string(),
                ));
            }
        }

        let payload = document.payload;
        if payload.schema_version > BACKUP_SCHEMA_VERSION {
            return Err(Error::InvalidBackup(format!(
                "backup schema {} is newer than supported",
                payload.schema_version
            )));
        }

        // Validate the complete target state before the first write.
        for entry in &payload.wallets {
            Self::validate_wallet_backup(entry)?;
        }

        // Commit. Everything below writes pre-validated records.
        if options.overwrite_existing {
            self.secrets.clear().await?;
            self.descriptors.clear().await?;
        }

        for entry in &payload.wallets {
            self.secrets.put(&entry.secret).await?;
            for account in &entry.accounts {
                self.descriptors.put_account(account).await?;
            }
            self.descriptors.put_wallet(&entry.wallet).await?;
        }

        let restored_ids: Vec<WalletId> = payload
            .wallet_order
            .iter()
            .filter(|id| payload.wallets.iter().any(|w| w.wallet.id == **id))
            .copied()
            .collect();
        let mut order = if options.overwrite_existing {
            WalletOrder::default()
        } else {
            self.descriptors.wallet_order().await?
        };
        order.ids.retain(|id| !restored_ids.contains(id));
        let mut merged = restored_ids.clone();
        merged.append(&mut order.ids);
        order.ids = merged;
        self.descriptors.set_wallet_order(&order).await?;

        if let Some(preferences) = &payload.preferences {
            self.descriptors.put_preferences(preferences).await?;
        }

        if options.overwrite_existing {
            // Fresh, locked session pointing at the first restored wallet.
            let mut session = SessionRecord::default();
            if let Some(first) = restored_ids.first() {
                if let Some(entry) = payload.wallets.iter().find(|w| w.wallet.id == *first) {
                    session.current_wallet = Some(*first);
                    session.current_account = entry.wallet.account_ids.first().copied();
                }
            }
            self.descriptors.put_session(&session).await?;
        }

        self.cache.clear_all();
        tracing::info!(wallets = payload.wallets.len(), "backup restored");
        Ok(())
    }

    /// Check one wallet's internal consistency: the secret belongs to the
    /// wallet, the mnemonic parses, and every account re-derives to the
    /// recorded address and private key.
    fn validate_wallet_backup(entry: &WalletBackup) -> Result<()> {
        let wallet_id = entry.wallet.id;
        if entry.secret.wallet_id != wallet_id {
            return Err(Error::InvalidBackup(format!(
                "secret record does not belong to wallet {wallet_id}"
            )));
        }

        ember_core::validate_mnemonic(&entry.secret.mnemonic)
            .map_err(|e| Error::InvalidBackup(format!("wallet {wallet_id}: {e}")))?;
        let seed = ember_core::seed_from_mnemonic(&entry.secret.mnemonic, "")
            .map_err(|e| Error::InvalidBackup(format!("wallet {wallet_id}: {e}")))?;

        for account in &entry.accounts {
            if account.wallet_id != wallet_id {
                return Err(Error::InvalidBackup(format!(
                    "account {} does not belong to wallet {wallet_id}",
                    account.id
                )));
            }
            if !entry.wallet.account_ids.contains(&account.id) {
                return Err(Error::InvalidBackup(format!(
                    "account {} missing from wallet {wallet_id} account list",
                    account.id
                )));
            }

            let secret = entry
                .secret
                .accounts
                .iter()
                .find(|s| s.account_id == account.id)
                .ok_or_else(|| {
                    Error::InvalidBackup(format!(
                        "account {} has no secret material in the backup",
                        account.id
                    ))
                })?;

            let derived = ember_core::derive_account(seed.as_ref(), account.index)
                .map_err(|e| Error::InvalidBackup(format!("wallet {wallet_id}: {e}")))?;
            if derived.address.to_checksum() != account.address
                || derived.path != account.derivation_path
                || derived.private_key_hex().as_str() != secret.private_key
            {
                return Err(Error::InvalidBackup(format!(
                    "account {} does not re-derive from the wallet seed",
                    account.id
                )));
            }
        }

        Ok(())
    }
}
