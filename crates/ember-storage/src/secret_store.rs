//! Secret Store
//!
//! Encrypted-at-rest storage of seed phrases and derived private keys,
//! keyed by wallet id. Records are sealed with the master key before they
//! reach the persistence backend; plaintext exists only in the in-memory
//! return value handed to an authorized caller.

use crate::backend::{Namespace, StorageBackend};
use crate::models::{SecretRecord, WalletId};
use crate::security::MasterKey;
use crate::{Error, Result};
use std::sync::Arc;

/// Encrypted secret-tier store
pub struct SecretStore {
    backend: Arc<dyn StorageBackend>,
    master_key: MasterKey,
}

impl SecretStore {
    /// Create store over a backend with an unsealed master key
    pub fn new(backend: Arc<dyn StorageBackend>, master_key: MasterKey) -> Self {
        Self {
            backend,
            master_key,
        }
    }

    fn record_key(wallet_id: &WalletId) -> String {
        format!("wallet-{}", wallet_id.as_simple())
    }

    /// Write a secret record. Durable before returning.
    pub async fn put(&self, record: &SecretRecord) -> Result<()> {
        let plaintext = serde_json::to_vec(record)?;
        let sealed = self.master_key.encrypt(&plaintext)?;
        self.backend
            .put(Namespace::Secret, &Self::record_key(&record.wallet_id), sealed)
            .await?;
        tracing::debug!(wallet_id = %record.wallet_id, "secret record written");
        Ok(())
    }

    /// Read and unseal a secret record.
    ///
    /// `NotFound` when the id is absent; `CorruptRecord` when decryption or
    /// deserialization fails. Neither is a panic.
    pub async fn get(&self, wallet_id: &WalletId) -> Result<SecretRecord> {
        let sealed = self
            .backend
            .get(Namespace::Secret, &Self::record_key(wallet_id))
            .await?
            .ok_or_else(|| Error::NotFound(format!("secret record {wallet_id}")))?;

        let plaintext = self
            .master_key
            .decrypt(&sealed)
            .map_err(|e| Error::CorruptRecord(format!("secret record {wallet_id}: {e}")))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| Error::CorruptRecord(format!("secret record {wallet_id}: {e}")))
    }

    /// Delete a secret record. Absent ids are not an error.
    pub async fn delete(&self, wallet_id: &WalletId) -> Result<()> {
        self.backend
            .delete(Namespace::Secret, &Self::record_key(wallet_id))
            .await?;
        tracing::debug!(wallet_id = %wallet_id, "secret record deleted");
        Ok(())
    }

    /// List wallet ids with stored secrets
    pub async fn list_ids(&self) -> Result<Vec<WalletId>> {
        let keys = self.backend.list_keys(Namespace::Secret).await?;
        let mut ids = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(raw) = key.strip_prefix("wallet-") {
                if let Ok(id) = raw.parse() {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    /// Remove every secret record. Used only by verified full restore.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear(Namespace::Secret).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::{AccountSecret, SCHEMA_VERSION};
    use crate::security::EncryptionAlgorithm;
    use uuid::Uuid;

    fn sample_record(wallet_id: WalletId) -> SecretRecord {
        SecretRecord {
            schema_version: SCHEMA_VERSION,
            wallet_id,
            mnemonic: "legal winner thank year wave sausage worth useful legal winner thank yellow"
                .to_string(),
            accounts: vec![AccountSecret {
                account_id: Uuid::new_v4(),
                derivation_path: "m/44'/60'/0'/0/0".to_string(),
                private_key: "0x00".to_string(),
            }],
            created_at: 1_700_000_000,
        }
    }

    fn store() -> SecretStore {
        SecretStore::new(
            Arc::new(MemoryBackend::new()),
            MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305),
        )
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = store();
        let wallet_id = Uuid::new_v4();
        store.put(&sample_record(wallet_id)).await.unwrap();

        let loaded = store.get(&wallet_id).await.unwrap();
        assert_eq!(loaded.wallet_id, wallet_id);
        assert!(loaded.mnemonic.starts_with("legal winner"));
        assert_eq!(loaded.accounts.len(), 1);
    }

    #[tokio::test]
    async fn test_get_absent_is_not_found() {
        let store = store();
        let err = store.get(&Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_record_is_encrypted_at_rest() {
        let backend = Arc::new(MemoryBackend::new());
        let store = SecretStore::new(
            backend.clone(),
            MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305),
        );

        let wallet_id = Uuid::new_v4();
        store.put(&sample_record(wallet_id)).await.unwrap();

        let raw = backend
            .get(Namespace::Secret, &SecretStore::record_key(&wallet_id))
            .await
            .unwrap()
            .unwrap();
        let raw_text = String::from_utf8_lossy(&raw);
        assert!(!raw_text.contains("legal winner"));
        assert!(!raw_text.contains("mnemonic"));
    }

    #[tokio::test]
    async fn test_wrong_key_is_corrupt_record() {
        let backend = Arc::new(MemoryBackend::new());
        let store = SecretStore::new(
            backend.clone(),
            MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305),
        );
        let wallet_id = Uuid::new_v4();
        store.put(&sample_record(wallet_id)).await.unwrap();

        let other = SecretStore::new(
            backend,
            MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305),
        );
        let err = other.get(&wallet_id).await.unwrap_err();
        assert!(matches!(err, Error::CorruptRecord(_)));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = store();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.put(&sample_record(a)).await.unwrap();
        store.put(&sample_record(b)).await.unwrap();

        let mut ids = store.list_ids().await.unwrap();
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);

        store.delete(&a).await.unwrap();
        assert_eq!(store.list_ids().await.unwrap(), vec![b]);
    }
}
