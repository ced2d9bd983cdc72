//! Wallet Orchestrator
//!
//! The only component that coordinates across the three storage tiers. Owns
//! wallet/account creation, HD derivation, active selection, the lock/unlock
//! session state machine, and secret export gating.

use crate::auth::CredentialVerifier;
use crate::session::{self, CustodyConfig, SessionStatus};
use crate::{Error, Result};
use ember_storage::{
    AccountId, AccountRecord, AccountSecret, DescriptorStore, EphemeralCache, SecretRecord,
    SecretStore, SessionRecord, WalletCategory, WalletId, WalletRecord, SCHEMA_VERSION,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Parameters for wallet creation
#[derive(Debug, Default)]
pub struct CreateWalletParams {
    /// User-facing name
    pub name: String,
    /// Presentation color tag
    pub color: Option<String>,
    /// Seed phrase to import. Generated fresh when absent.
    pub mnemonic: Option<String>,
    /// Word count for generated seeds (12, 18, or 24)
    pub word_count: Option<u32>,
}

/// Wallet metadata together with its accounts
#[derive(Debug, Clone)]
pub struct WalletWithAccounts {
    /// Wallet record
    pub wallet: WalletRecord,
    /// Accounts in display order
    pub accounts: Vec<AccountRecord>,
}

/// Coordinates the secret store, descriptor store, and ephemeral cache
pub struct WalletOrchestrator {
    secrets: Arc<SecretStore>,
    descriptors: Arc<DescriptorStore>,
    cache: Arc<EphemeralCache>,
    verifier: Arc<dyn CredentialVerifier>,
    config: CustodyConfig,
    session: RwLock<SessionRecord>,
    // Per-wallet serialization of account-index allocation: two concurrent
    // create_account calls must never derive the same index.
    index_locks: Mutex<HashMap<WalletId, Arc<tokio::sync::Mutex<()>>>>,
}

impl WalletOrchestrator {
    /// Open the orchestrator, loading persisted session state.
    ///
    /// A restored session stays unlocked only when its window is still open;
    /// any ambiguity re-locks (fail closed).
    pub async fn open(
        secrets: Arc<SecretStore>,
        descriptors: Arc<DescriptorStore>,
        cache: Arc<EphemeralCache>,
        verifier: Arc<dyn CredentialVerifier>,
        config: CustodyConfig,
    ) -> Result<Self> {
        let loaded = descriptors.session().await?;
        let session = session::sanitize_loaded(loaded, session::now_ts());
        descriptors.put_session(&session).await?;

        Ok(Self {
            secrets,
            descriptors,
            cache,
            verifier,
            config,
            session: RwLock::new(session),
            index_locks: Mutex::new(HashMap::new()),
        })
    }

    // =========================================================================
    // Session gating
    // =========================================================================

    /// Coarse custody state
    pub async fn status(&self) -> Result<SessionStatus> {
        if self.descriptors.wallet_order().await?.ids.is_empty() {
            return Ok(SessionStatus::NoWallet);
        }
        if self.is_locked().await? {
            Ok(SessionStatus::Locked)
        } else {
            Ok(SessionStatus::Unlocked)
        }
    }

    /// Whether secrets are currently unreachable.
    ///
    /// Evaluates expiry lazily: an elapsed window observed here performs the
    /// full transition to Locked (including the cache clear).
    pub async fn is_locked(&self) -> Result<bool> {
        let now = session::now_ts();
        let (locked, expired) = {
            let session = self.session.read();
            (session.locked, !session::is_active(&session, now))
        };
        if !locked && expired {
            self.transition_to_locked().await?;
            return Ok(true);
        }
        Ok(locked)
    }

    /// Fail unless the session permits secret access right now.
    async fn ensure_unlocked(&self) -> Result<()> {
        let now = session::now_ts();
        let (locked, active) = {
            let session = self.session.read();
            (session.locked, session::is_active(&session, now))
        };
        if locked {
            return Err(Error::Locked);
        }
        if !active {
            // Window elapsed between calls; complete the transition here.
            self.transition_to_locked().await?;
            return Err(Error::SessionExpired);
        }
        Ok(())
    }

    async fn transition_to_locked(&self) -> Result<()> {
        let snapshot = {
            let mut session = self.session.write();
            session::mark_locked(&mut session);
            session.clone()
        };
        self.cache.clear_all();
        self.descriptors.put_session(&snapshot).await?;
        tracing::info!("session locked");
        Ok(())
    }

    async fn persist_session(&self) -> Result<()> {
        let snapshot = self.session.read().clone();
        self.descriptors.put_session(&snapshot).await?;
        Ok(())
    }

    /// Explicitly lock the session
    pub async fn lock(&self) -> Result<()> {
        self.transition_to_locked().await
    }

    /// Unlock with an externally verified credential.
    ///
    /// Session state flips only on verifier success; failure keeps Locked.
    pub async fn unlock(&self, credential: &str) -> Result<()> {
        if self.descriptors.wallet_order().await?.ids.is_empty() {
            return Err(Error::NoWallet);
        }
        if !self.verifier.verify(credential).await {
            tracing::warn!("unlock rejected by credential verifier");
            return Err(Error::AuthenticationFailed);
        }

        {
            let mut session = self.session.write();
            session::mark_unlocked(&mut session, session::now_ts(), self.config.session_window);
        }
        self.persist_session().await?;
        tracing::info!("session unlocked");
        Ok(())
    }

    // =========================================================================
    // Wallet lifecycle
    // =========================================================================

    /// Create a wallet from a fresh or supplied seed.
    ///
    /// Derives account 0 at the canonical path, writes secret and descriptor
    /// records, and prepends the wallet to the display order. The very first
    /// wallet ever created may auto-unlock (see `CustodyConfig`); every later
    /// wallet starts Locked.
    pub async fn create_wallet(&self, params: CreateWalletParams) -> Result<WalletId> {
        self.create_wallet_inner(params, WalletCategory::Created).await
    }

    /// Import a wallet from an existing seed phrase
    pub async fn import_wallet(&self, name: &str, mnemonic: &str) -> Result<WalletId> {
        self.create_wallet_inner(
            CreateWalletParams {
                name: name.to_string(),
                mnemonic: Some(mnemonic.to_string()),
                ..CreateWalletParams::default()
            },
            WalletCategory::Imported,
        )
        .await
    }

    async fn create_wallet_inner(
        &self,
        params: CreateWalletParams,
        category: WalletCategory,
    ) -> Result<WalletId> {
        let mnemonic = match params.mnemonic {
            Some(supplied) => ember_core::validate_mnemonic(&supplied)
                .map_err(|e| Error::InvalidSeed(e.to_string()))?,
            None => ember_core::generate_mnemonic(params.word_count),
        };

        let is_first = self.descriptors.wallet_order().await?.ids.is_empty();
        let now = session::now_ts();
        let wallet_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();

        let seed = ember_core::seed_from_mnemonic(&mnemonic, "")
            .map_err(|e| Error::InvalidSeed(e.to_string()))?;
        let key = ember_core::derive_account(seed.as_ref(), 0)?;

        let secret = SecretRecord {
            schema_version: SCHEMA_VERSION,
            wallet_id,
            mnemonic,
            accounts: vec![AccountSecret {
                account_id,
                derivation_path: key.path.clone(),
                private_key: key.private_key_hex().to_string(),
            }],
            created_at: now,
        };
        self.secrets.put(&secret).await?;

        let account = AccountRecord {
            schema_version: SCHEMA_VERSION,
            id: account_id,
            wallet_id,
            name: "Account 1".to_string(),
            address: key.address.to_checksum(),
            derivation_path: key.path.clone(),
            index: 0,
            hidden: false,
            cached_balance: None,
            last_activity_at: now,
            order_index: 0,
        };
        self.descriptors.put_account(&account).await?;

        let wallet = WalletRecord {
            schema_version: SCHEMA_VERSION,
            id: wallet_id,
            name: params.name,
            color: params.color.unwrap_or_else(|| "#ff7a00".to_string()),
            category,
            created_at: now,
            last_used_at: now,
            account_ids: vec![account_id],
            next_account_index: 1,
        };
        self.descriptors.put_wallet(&wallet).await?;
        self.descriptors.push_front_wallet_order(wallet_id).await?;

        let auto_unlock = is_first && self.config.first_wallet_auto_unlock;
        {
            let mut session = self.session.write();
            session.current_wallet = Some(wallet_id);
            session.current_account = Some(account_id);
            if auto_unlock {
                session::mark_unlocked(&mut session, now, self.config.session_window);
            } else {
                session::mark_locked(&mut session);
            }
        }
        if !auto_unlock {
            self.cache.clear_all();
        }
        self.persist_session().await?;

        tracing::info!(wallet_id = %wallet_id, ?category, "wallet created");
        Ok(wallet_id)
    }

    /// Derive the next sequential account for a wallet. Session-gated.
    pub async fn create_account(
        &self,
        wallet_id: WalletId,
        name: Option<String>,
    ) -> Result<AccountRecord> {
        self.ensure_unlocked().await?;

        // Serialize index allocation per wallet; the index is re-read under
        // the lock so concurrent calls observe each other's increments.
        let index_lock = self.index_lock(wallet_id);
        let _guard = index_lock.lock().await;

        let mut wallet = self
            .descriptors
            .get_wallet(&wallet_id)
            .await
            .map_err(|e| Self::map_wallet_lookup(e, &wallet_id))?;
        let mut secret = self.get_secret_with_retry(&wallet_id).await?;

        let index = wallet.next_account_index;
        let seed = ember_core::seed_from_mnemonic(&secret.mnemonic, "")?;
        let key = ember_core::derive_account(seed.as_ref(), index)?;
        let now = session::now_ts();
        let account_id = Uuid::new_v4();

        secret.accounts.push(AccountSecret {
            account_id,
            derivation_path: key.path.clone(),
            private_key: key.private_key_hex().to_string(),
        });
        self.secrets.put(&secret).await?;

        let account = AccountRecord {
            schema_version: SCHEMA_VERSION,
            id: account_id,
            wallet_id,
            name: name.unwrap_or_else(|| format!("Account {}", index + 1)),
            address: key.address.to_checksum(),
            derivation_path: key.path.clone(),
            index,
            hidden: false,
            cached_balance: None,
            last_activity_at: now,
            order_index: index,
        };
        self.descriptors.put_account(&account).await?;

        wallet.account_ids.push(account_id);
        wallet.next_account_index = index + 1;
        wallet.last_used_at = now;
        self.descriptors.put_wallet(&wallet).await?;

        tracing::info!(wallet_id = %wallet_id, index, "account created");
        Ok(account)
    }

    /// Switch the active wallet (and optionally account), resetting the
    /// session window.
    pub async fn switch_wallet(
        &self,
        wallet_id: WalletId,
        account_id: Option<AccountId>,
    ) -> Result<()> {
        let mut wallet = self
            .descriptors
            .get_wallet(&wallet_id)
            .await
            .map_err(|e| Self::map_wallet_lookup(e, &wallet_id))?;

        let selected = match account_id {
            Some(id) => {
                let account = self
                    .descriptors
                    .get_account(&id)
                    .await
                    .map_err(|e| Self::map_account_lookup(e, &id))?;
                if account.wallet_id != wallet_id {
                    return Err(Error::AccountMismatch(format!(
                        "account {id} does not belong to wallet {wallet_id}"
                    )));
                }
                account.id
            }
            None => *wallet
                .account_ids
                .first()
                .ok_or_else(|| Error::AccountNotFound(format!("wallet {wallet_id} has no accounts")))?,
        };

        let now = session::now_ts();
        wallet.last_used_at = now;
        self.descriptors.put_wallet(&wallet).await?;

        {
            let mut session = self.session.write();
            session.current_wallet = Some(wallet_id);
            session.current_account = Some(selected);
            if !session.locked {
                session::mark_unlocked(&mut session, now, self.config.session_window);
            }
        }
        self.persist_session().await?;

        tracing::info!(wallet_id = %wallet_id, account_id = %selected, "switched wallet");
        Ok(())
    }

    /// Delete a wallet and everything derived from it.
    ///
    /// `confirmation` must be the wallet id string; the UI collects it as an
    /// explicit confirmation step. Cascades across both persistent tiers and
    /// the cache. If the deleted wallet was current, selection moves to the
    /// next remaining wallet (Locked) or back to the no-wallet state.
    pub async fn delete_wallet(&self, wallet_id: WalletId, confirmation: &str) -> Result<()> {
        if confirmation != wallet_id.to_string() {
            return Err(Error::InvalidConfirmation);
        }

        let wallet = self
            .descriptors
            .get_wallet(&wallet_id)
            .await
            .map_err(|e| Self::map_wallet_lookup(e, &wallet_id))?;

        self.secrets.delete(&wallet_id).await?;
        for account_id in &wallet.account_ids {
            self.descriptors.delete_account(account_id).await?;
        }
        self.descriptors.delete_wallet(&wallet_id).await?;
        self.descriptors.remove_from_wallet_order(&wallet_id).await?;
        self.cache.invalidate_prefix(&format!("wallet.{}.", wallet_id.as_simple()));
        self.index_locks.lock().remove(&wallet_id);

        let was_current = self.session.read().current_wallet == Some(wallet_id);
        if was_current {
            let remaining = self.descriptors.wallet_order().await?;
            match remaining.ids.first().copied() {
                Some(next) => {
                    let next_wallet = self.descriptors.get_wallet(&next).await?;
                    let mut session = self.session.write();
                    session.current_wallet = Some(next);
                    session.current_account = next_wallet.account_ids.first().copied();
                    session::mark_locked(&mut session);
                }
                None => {
                    let mut session = self.session.write();
                    session.current_wallet = None;
                    session.current_account = None;
                    session::mark_locked(&mut session);
                }
            }
            self.cache.clear_all();
            self.persist_session().await?;
        }

        tracing::info!(wallet_id = %wallet_id, "wallet deleted");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All wallet records in display order
    pub async fn get_all_wallets(&self) -> Result<Vec<WalletRecord>> {
        let order = self.descriptors.wallet_order().await?;
        let mut wallets = Vec::with_capacity(order.ids.len());
        for id in &order.ids {
            match self.descriptors.get_wallet(id).await {
                Ok(wallet) => wallets.push(wallet),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(wallets)
    }

    /// One wallet with its accounts
    pub async fn get_wallet_with_accounts(&self, wallet_id: WalletId) -> Result<WalletWithAccounts> {
        let wallet = self
            .descriptors
            .get_wallet(&wallet_id)
            .await
            .map_err(|e| Self::map_wallet_lookup(e, &wallet_id))?;
        let accounts = self.descriptors.list_accounts(&wallet_id).await?;
        Ok(WalletWithAccounts { wallet, accounts })
    }

    /// The currently selected wallet, if any
    pub async fn get_current_wallet(&self) -> Result<Option<WalletWithAccounts>> {
        let current = self.session.read().current_wallet;
        match current {
            Some(id) => Ok(Some(self.get_wallet_with_accounts(id).await?)),
            None => Ok(None),
        }
    }

    /// Currently selected (wallet, account) ids
    pub fn current_selection(&self) -> (Option<WalletId>, Option<AccountId>) {
        let session = self.session.read();
        (session.current_wallet, session.current_account)
    }

    // =========================================================================
    // Secret-sensitive operations (session-gated)
    // =========================================================================

    /// Export a wallet's seed phrase. Only while Unlocked and inside the
    /// session window. The returned buffer zeroizes on drop; the phrase is
    /// never logged or cached.
    pub async fn export_mnemonic(&self, wallet_id: WalletId) -> Result<Zeroizing<String>> {
        self.ensure_unlocked().await?;
        let secret = self.get_secret_with_retry(&wallet_id).await?;
        Ok(Zeroizing::new(secret.mnemonic))
    }

    /// Export the current account's private key. Only while Unlocked and
    /// inside the session window.
    pub async fn get_account_private_key(&self) -> Result<Zeroizing<String>> {
        self.ensure_unlocked().await?;

        let (wallet_id, account_id) = {
            let session = self.session.read();
            (session.current_wallet, session.current_account)
        };
        let wallet_id = wallet_id.ok_or(Error::NoWallet)?;
        let account_id = account_id.ok_or(Error::NoWallet)?;

        let secret = self.get_secret_with_retry(&wallet_id).await?;
        let account = secret
            .accounts
            .into_iter()
            .find(|a| a.account_id == account_id)
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;
        Ok(Zeroizing::new(account.private_key))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn index_lock(&self, wallet_id: WalletId) -> Arc<tokio::sync::Mutex<()>> {
        self.index_locks
            .lock()
            .entry(wallet_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Read a secret record, retrying once on transient backend failure.
    /// Writes are never retried; their failures surface immediately.
    async fn get_secret_with_retry(&self, wallet_id: &WalletId) -> Result<SecretRecord> {
        match self.secrets.get(wallet_id).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_not_found() => Err(Error::WalletNotFound(wallet_id.to_string())),
            Err(ember_storage::Error::Io(_)) | Err(ember_storage::Error::Backend(_)) => {
                tracing::warn!(wallet_id = %wallet_id, "secret read failed, retrying once");
                self.secrets.get(wallet_id).await.map_err(|e| {
                    if e.is_not_found() {
                        Error::WalletNotFound(wallet_id.to_string())
                    } else {
                        e.into()
                    }
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn map_wallet_lookup(e: ember_storage::Error, wallet_id: &WalletId) -> Error {
        if e.is_not_found() {
            Error::WalletNotFound(wallet_id.to_string())
        } else {
            e.into()
        }
    }

    fn map_account_lookup(e: ember_storage::Error, account_id: &AccountId) -> Error {
        if e.is_not_found() {
            Error::AccountNotFound(account_id.to_string())
        } else {
            e.into()
        }
    }
}
