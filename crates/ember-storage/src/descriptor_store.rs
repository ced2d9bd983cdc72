//! Descriptor Store
//!
//! Non-sensitive wallet/account metadata, display ordering, session state,
//! and user preferences. No operation here accepts or returns secret
//! material; the record types in [`crate::models`] have no secret-capable
//! fields, so isolation is enforced by shape rather than convention.

use crate::backend::{Namespace, StorageBackend};
use crate::models::{
    AccountId, AccountRecord, Preferences, SessionRecord, WalletId, WalletOrder, WalletRecord,
};
use crate::{Error, Result};
use std::sync::Arc;

const WALLET_ORDER_KEY: &str = "wallet-order";
const SESSION_KEY: &str = "session";
const PREFERENCES_KEY: &str = "preferences";

/// Descriptor-tier store
pub struct DescriptorStore {
    backend: Arc<dyn StorageBackend>,
}

impl DescriptorStore {
    /// Create store over a backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn wallet_key(id: &WalletId) -> String {
        format!("wallet-{}", id.as_simple())
    }

    fn account_key(id: &AccountId) -> String {
        format!("account-{}", id.as_simple())
    }

    async fn put_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.put(Namespace::Descriptor, key, bytes).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(Namespace::Descriptor, key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| Error::CorruptRecord(format!("descriptor {key}: {e}"))),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Wallet metadata
    // =========================================================================

    /// Write a wallet record
    pub async fn put_wallet(&self, record: &WalletRecord) -> Result<()> {
        self.put_json(&Self::wallet_key(&record.id), record).await
    }

    /// Read a wallet record
    pub async fn get_wallet(&self, id: &WalletId) -> Result<WalletRecord> {
        self.get_json(&Self::wallet_key(id))
            .await?
            .ok_or_else(|| Error::NotFound(format!("wallet {id}")))
    }

    /// Delete a wallet record
    pub async fn delete_wallet(&self, id: &WalletId) -> Result<()> {
        self.backend
            .delete(Namespace::Descriptor, &Self::wallet_key(id))
            .await
    }

    /// List every wallet record
    pub async fn list_wallets(&self) -> Result<Vec<WalletRecord>> {
        let mut wallets = Vec::new();
        for key in self.backend.list_keys(Namespace::Descriptor).await? {
            if key.starts_with("wallet-") && key != WALLET_ORDER_KEY {
                if let Some(record) = self.get_json::<WalletRecord>(&key).await? {
                    wallets.push(record);
                }
            }
        }
        Ok(wallets)
    }

    // =========================================================================
    // Account metadata
    // =========================================================================

    /// Write an account record
    pub async fn put_account(&self, record: &AccountRecord) -> Result<()> {
        self.put_json(&Self::account_key(&record.id), record).await
    }

    /// Read an account record
    pub async fn get_account(&self, id: &AccountId) -> Result<AccountRecord> {
        self.get_json(&Self::account_key(id))
            .await?
            .ok_or_else(|| Error::NotFound(format!("account {id}")))
    }

    /// Delete an account record
    pub async fn delete_account(&self, id: &AccountId) -> Result<()> {
        self.backend
            .delete(Namespace::Descriptor, &Self::account_key(id))
            .await
    }

    /// List accounts belonging to a wallet, ordered by `order_index`
    pub async fn list_accounts(&self, wallet_id: &WalletId) -> Result<Vec<AccountRecord>> {
        let mut accounts = Vec::new();
        for key in self.backend.list_keys(Namespace::Descriptor).await? {
            if key.starts_with("account-") {
                if let Some(record) = self.get_json::<AccountRecord>(&key).await? {
                    if record.wallet_id == *wallet_id {
                        accounts.push(record);
                    }
                }
            }
        }
        accounts.sort_by_key(|a| a.order_index);
        Ok(accounts)
    }

    // =========================================================================
    // Display order
    // =========================================================================

    /// Display order of wallets (empty on first launch)
    pub async fn wallet_order(&self) -> Result<WalletOrder> {
        Ok(self.get_json(WALLET_ORDER_KEY).await?.unwrap_or_default())
    }

    /// Replace the display order
    pub async fn set_wallet_order(&self, order: &WalletOrder) -> Result<()> {
        self.put_json(WALLET_ORDER_KEY, order).await
    }

    /// Prepend a wallet id to the display order
    pub async fn push_front_wallet_order(&self, id: WalletId) -> Result<()> {
        let mut order = self.wallet_order().await?;
        order.ids.retain(|existing| *existing != id);
        order.ids.insert(0, id);
        self.set_wallet_order(&order).await
    }

    /// Remove a wallet id from the display order
    pub async fn remove_from_wallet_order(&self, id: &WalletId) -> Result<()> {
        let mut order = self.wallet_order().await?;
        order.ids.retain(|existing| existing != id);
        self.set_wallet_order(&order).await
    }

    // =========================================================================
    // Session and preferences
    // =========================================================================

    /// Persisted session state (locked default on first launch)
    pub async fn session(&self) -> Result<SessionRecord> {
        Ok(self.get_json(SESSION_KEY).await?.unwrap_or_default())
    }

    /// Replace the session record
    pub async fn put_session(&self, session: &SessionRecord) -> Result<()> {
        self.put_json(SESSION_KEY, session).await
    }

    /// User preferences (defaults on first launch)
    pub async fn preferences(&self) -> Result<Preferences> {
        Ok(self.get_json(PREFERENCES_KEY).await?.unwrap_or_default())
    }

    /// Replace preferences
    pub async fn put_preferences(&self, preferences: &Preferences) -> Result<()> {
        self.put_json(PREFERENCES_KEY, preferences).await
    }

    /// Remove every descriptor record. Used only by verified full restore.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear(Namespace::Descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::{WalletCategory, SCHEMA_VERSION};
    use uuid::Uuid;

    fn store() -> DescriptorStore {
        DescriptorStore::new(Arc::new(MemoryBackend::new()))
    }

    fn wallet_record(id: WalletId, name: &str) -> WalletRecord {
        WalletRecord {
            schema_version: SCHEMA_VERSION,
            id,
            name: name.to_string(),
            color: "#3366ff".to_string(),
            category: WalletCategory::Created,
            created_at: 1_700_000_000,
            last_used_at: 1_700_000_000,
            account_ids: Vec::new(),
            next_account_index: 0,
        }
    }

    fn account_record(id: AccountId, wallet_id: WalletId, index: u32) -> AccountRecord {
        AccountRecord {
            schema_version: SCHEMA_VERSION,
            id,
            wallet_id,
            name: format!("Account {}", index + 1),
            address: "0x0000000000000000000000000000000000000000".to_string(),
            derivation_path: format!("m/44'/60'/0'/0/{index}"),
            index,
            hidden: false,
            cached_balance: None,
            last_activity_at: 1_700_000_000,
            order_index: index,
        }
    }

    #[tokio::test]
    async fn test_wallet_crud() {
        let store = store();
        let id = Uuid::new_v4();
        store.put_wallet(&wallet_record(id, "Main")).await.unwrap();

        let loaded = store.get_wallet(&id).await.unwrap();
        assert_eq!(loaded.name, "Main");

        store.delete_wallet(&id).await.unwrap();
        assert!(store.get_wallet(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_accounts_ordered_by_order_index() {
        let store = store();
        let wallet_id = Uuid::new_v4();
        for index in [2u32, 0, 1] {
            store
                .put_account(&account_record(Uuid::new_v4(), wallet_id, index))
                .await
                .unwrap();
        }
        // An account of another wallet is not listed
        store
            .put_account(&account_record(Uuid::new_v4(), Uuid::new_v4(), 0))
            .await
            .unwrap();

        let accounts = store.list_accounts(&wallet_id).await.unwrap();
        let indices: Vec<u32> = accounts.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_wallet_order_push_front_dedupes() {
        let store = store();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.push_front_wallet_order(a).await.unwrap();
        store.push_front_wallet_order(b).await.unwrap();
        store.push_front_wallet_order(a).await.unwrap();

        assert_eq!(store.wallet_order().await.unwrap().ids, vec![a, b]);

        store.remove_from_wallet_order(&b).await.unwrap();
        assert_eq!(store.wallet_order().await.unwrap().ids, vec![a]);
    }

    #[tokio::test]
    async fn test_session_defaults_and_roundtrip() {
        let store = store();
        let session = store.session().await.unwrap();
        assert!(session.locked);

        let mut updated = session;
        updated.locked = false;
        updated.expires_at = Some(1_800_000_000);
        store.put_session(&updated).await.unwrap();

        let loaded = store.session().await.unwrap();
        assert!(!loaded.locked);
        assert_eq!(loaded.expires_at, Some(1_800_000_000));
    }

    #[tokio::test]
    async fn test_preferences_defaults() {
        let store = store();
        let prefs = store.preferences().await.unwrap();
        assert_eq!(prefs.fiat_currency, "USD");
        assert!(!prefs.networks.is_empty());
    }
}
