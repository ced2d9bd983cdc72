//! Device-bound key sealing
//!
//! The Secret Store's master key is sealed under a device-bound primitive
//! (platform keystore, secure element). The primitive itself lives outside
//! this crate; implementations bridge to it through [`DeviceKeyProvider`].

use crate::security::{EncryptionAlgorithm, MasterKey};
use crate::Result;

/// Sealed master key, safe to persist alongside descriptor data.
#[derive(Debug, Clone)]
pub struct SealedKey {
    /// Encrypted master key bytes
    pub encrypted_key: Vec<u8>,
    /// Key identifier in the device keystore
    pub key_id: String,
    /// Algorithm the unsealed key uses
    pub algorithm: EncryptionAlgorithm,
}

/// Device keystore abstraction
///
/// Implementations wrap a platform keystore (Android Keystore, Keychain,
/// DPAPI, libsecret). Only the sealing surface is modeled here.
pub trait DeviceKeyProvider: Send + Sync {
    /// Seal (encrypt) a master key under the device-bound key
    fn seal_key(&self, key: &MasterKey, key_id: &str) -> Result<SealedKey>;

    /// Unseal (decrypt) a master key
    fn unseal_key(&self, sealed: &SealedKey) -> Result<MasterKey>;

    /// Delete a sealed key from the device keystore
    fn delete_key(&self, key_id: &str) -> Result<()>;
}

/// Mock provider for tests and platforms without native integration
pub struct MockDeviceKey {
    wrapping_key: MasterKey,
}

impl MockDeviceKey {
    /// Create new mock provider with a random in-process wrapping key
    pub fn new() -> Self {
        Self {
            wrapping_key: MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305),
        }
    }
}

impl Default for MockDeviceKey {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceKeyProvider for MockDeviceKey {
    fn seal_key(&self, key: &MasterKey, key_id: &str) -> Result<SealedKey> {
        let encrypted_key = self.wrapping_key.encrypt(key.as_bytes())?;
        Ok(SealedKey {
            encrypted_key,
            key_id: key_id.to_string(),
            algorithm: key.algorithm(),
        })
    }

    fn unseal_key(&self, sealed: &SealedKey) -> Result<MasterKey> {
        let bytes = self.wrapping_key.decrypt(&sealed.encrypted_key)?;
        MasterKey::from_bytes(&bytes, sealed.algorithm)
    }

    fn delete_key(&self, _key_id: &str) -> Result<()> {
        Ok(())
    }
}
