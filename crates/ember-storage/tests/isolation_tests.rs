//! Tier isolation tests
//!
//! Verifies that secret material never appears in the descriptor or cache
//! tiers, and that the secret tier is unreadable without the master key.

use ember_storage::{
    AccountRecord, AccountSecret, CacheClass, CachePriority, DescriptorStore, EphemeralCache,
    EncryptionAlgorithm, MasterKey, MemoryBackend, Namespace, SecretRecord, SecretStore,
    SessionRecord, StorageBackend, WalletCategory, WalletRecord, SCHEMA_VERSION,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const MNEMONIC: &str =
    "legal winner thank year wave sausage worth useful legal winner thank yellow";
const PRIVATE_KEY: &str = "0x7f9f7bb6e7f6b1eab0a63eb08a4b3e2c9f0b1b2c3d4e5f60718293a4b5c6d7e8";

async fn populate(backend: Arc<MemoryBackend>) -> (Uuid, Uuid) {
    let wallet_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let now = 1_700_000_000;

    let secrets = SecretStore::new(
        backend.clone(),
        MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305),
    );
    secrets
        .put(&SecretRecord {
            schema_version: SCHEMA_VERSION,
            wallet_id,
            mnemonic: MNEMONIC.to_string(),
            accounts: vec![AccountSecret {
                account_id,
                derivation_path: "m/44'/60'/0'/0/0".to_string(),
                private_key: PRIVATE_KEY.to_string(),
            }],
            created_at: now,
        })
        .await
        .unwrap();

    let descriptors = DescriptorStore::new(backend.clone());
    descriptors
        .put_wallet(&WalletRecord {
            schema_version: SCHEMA_VERSION,
            id: wallet_id,
            name: "Main wallet".to_string(),
            color: "#ff7a00".to_string(),
            category: WalletCategory::Created,
            created_at: now,
            last_used_at: now,
            account_ids: vec![account_id],
            next_account_index: 1,
        })
        .await
        .unwrap();
    descriptors
        .put_account(&AccountRecord {
            schema_version: SCHEMA_VERSION,
            id: account_id,
            wallet_id,
            name: "Account 1".to_string(),
            address: "0x9858EfFD232B4033E47d90003D41EC34EcaEda94".to_string(),
            derivation_path: "m/44'/60'/0'/0/0".to_string(),
            index: 0,
            hidden: false,
            cached_balance: Some("1.25".to_string()),
            last_activity_at: now,
            order_index: 0,
        })
        .await
        .unwrap();
    descriptors
        .put_session(&SessionRecord {
            current_wallet: Some(wallet_id),
            current_account: Some(account_id),
            ..SessionRecord::default()
        })
        .await
        .unwrap();
    descriptors.push_front_wallet_order(wallet_id).await.unwrap();

    (wallet_id, account_id)
}

#[tokio::test]
async fn descriptor_tier_never_contains_secret_material() {
    let backend = Arc::new(MemoryBackend::new());
    populate(backend.clone()).await;

    for key in backend.list_keys(Namespace::Descriptor).await.unwrap() {
        let bytes = backend.get(Namespace::Descriptor, &key).await.unwrap().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(
            !text.contains("legal winner"),
            "descriptor record {key} leaks seed words"
        );
        assert!(
            !text.contains(&PRIVATE_KEY[2..]),
            "descriptor record {key} leaks private key"
        );
    }
}

#[tokio::test]
async fn secret_tier_is_opaque_at_rest() {
    let backend = Arc::new(MemoryBackend::new());
    populate(backend.clone()).await;

    for key in backend.list_keys(Namespace::Secret).await.unwrap() {
        let bytes = backend.get(Namespace::Secret, &key).await.unwrap().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("legal winner"));
        assert!(!text.contains(&PRIVATE_KEY[2..]));
    }
}

#[tokio::test]
async fn cache_clear_cannot_touch_other_tiers() {
    let backend = Arc::new(MemoryBackend::new());
    let (wallet_id, _) = populate(backend.clone()).await;

    let cache = EphemeralCache::default();
    cache.set(
        "balance.main",
        json!({"wei": "125"}),
        CacheClass::Balance,
        CachePriority::Normal,
    );
    cache.clear_all();
    backend.clear(Namespace::Cache).await.unwrap();

    // Secret and descriptor records survive a full cache clear
    assert!(!backend.list_keys(Namespace::Secret).await.unwrap().is_empty());
    let descriptors = DescriptorStore::new(backend.clone());
    assert_eq!(descriptors.get_wallet(&wallet_id).await.unwrap().name, "Main wallet");
}
