//! Tiered storage for the Ember custody core
//!
//! Three storage tiers with distinct sensitivity and durability guarantees:
//!
//! - **Secret Store**: seed phrases and derived private keys, sealed with a
//!   device-bound master key before they reach the persistence backend
//! - **Descriptor Store**: non-sensitive wallet/account metadata, display
//!   ordering, session state, preferences
//! - **Ephemeral Cache**: TTL-keyed volatile data with lazy expiry
//!
//! Each tier owns a disjoint key namespace so a blanket clear of one tier
//! cannot touch another.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod cache;
pub mod descriptor_store;
pub mod device_key;
pub mod error;
pub mod models;
pub mod secret_store;
pub mod security;

pub use backend::{FileBackend, MemoryBackend, Namespace, StorageBackend};
pub use cache::{CacheClass, CacheConfig, CachePriority, EphemeralCache};
pub use descriptor_store::DescriptorStore;
pub use device_key::{DeviceKeyProvider, MockDeviceKey, SealedKey};
pub use error::{Error, Result};
pub use models::*;
pub use secret_store::SecretStore;
pub use security::{
    derive_key_bytes, generate_salt, hash_sha256, EncryptionAlgorithm, MasterKey, ARGON2_PARAMS,
};
