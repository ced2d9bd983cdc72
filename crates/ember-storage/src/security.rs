//! Security and encryption primitives
//!
//! Implements AES-GCM and ChaCha20-Poly1305 sealing for stored records,
//! Argon2id for passphrase derivation, and key zeroization.

use crate::{Error, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::{Argon2, ParamsBuilder, Version};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Encryption algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionAlgorithm {
    /// AES-256-GCM
    AesGcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
}

/// Argon2id parameters for passphrase-derived keys
/// Memory: 64 MiB (65536 KiB), Iterations: 3, Parallelism: 4
pub const ARGON2_PARAMS: (u32, u32, u32) = (65536, 3, 4);

/// Master key for record sealing
#[derive(Clone)]
pub struct MasterKey {
    key: Zeroizing<[u8; 32]>,
    algorithm: EncryptionAlgorithm,
}

impl MasterKey {
    /// Generate new random master key
    pub fn generate(algorithm: EncryptionAlgorithm) -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);

        Self {
            key: Zeroizing::new(key),
            algorithm,
        }
    }

    /// Create from bytes
    pub fn from_bytes(bytes: &[u8], algorithm: EncryptionAlgorithm) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::Encryption("Invalid key length".to_string()));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);

        Ok(Self {
            key: Zeroizing::new(key),
            algorithm,
        })
    }

    /// Derive from a passphrase and salt (Argon2id)
    pub fn from_passphrase(passphrase: &str, salt: &[u8]) -> Result<Self> {
        let key_bytes = derive_key_bytes(passphrase, salt)?;
        Self::from_bytes(&key_bytes, EncryptionAlgorithm::ChaCha20Poly1305)
    }

    /// Get key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Encrypt data
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        // Format: [version(1)][algorithm(1)][nonce(12)][ciphertext(variable)]
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);

        let (tag, ciphertext) = match self.algorithm {
            EncryptionAlgorithm::AesGcm => {
                let cipher = Aes256Gcm::new(self.key.as_ref().into());
                let nonce = Nonce::from_slice(&nonce_bytes);
                (
                    0u8,
                    cipher
                        .encrypt(nonce, plaintext)
                        .map_err(|e| Error::Encryption(e.to_string()))?,
                )
            }
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(self.key.as_ref().into());
                let nonce = chacha20poly1305::Nonce::from_slice(&nonce_bytes);
                (
                    1u8,
                    cipher
                        .encrypt(nonce, plaintext)
                        .map_err(|e| Error::Encryption(e.to_string()))?,
                )
            }
        };

        let mut result = Vec::with_capacity(1 + 1 + 12 + ciphertext.len());
        result.push(1); // Version 1
        result.push(tag);
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Decrypt data
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        // Format: [version(1)][algorithm(1)][nonce(12)][ciphertext(variable)]
        if data.len() < 14 {
            return Err(Error::Encryption("Invalid ciphertext length".to_string()));
        }

        let version = data[0];
        let algorithm = data[1];

        if version != 1 {
            return Err(Error::Encryption(format!(
                "Unsupported encryption version: {}",
                version
            )));
        }

        let expected = match self.algorithm {
            EncryptionAlgorithm::AesGcm => 0,
            EncryptionAlgorithm::ChaCha20Poly1305 => 1,
        };
        if algorithm != expected {
            return Err(Error::Encryption(format!(
                "Algorithm mismatch: expected {}, got {}",
                expected, algorithm
            )));
        }

        let ciphertext = &data[14..];
        match self.algorithm {
            EncryptionAlgorithm::AesGcm => {
                let cipher = Aes256Gcm::new(self.key.as_ref().into());
                let nonce = Nonce::from_slice(&data[2..14]);
                cipher
                    .decrypt(nonce, ciphertext)
                    .map_err(|e| Error::Encryption(e.to_string()))
            }
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(self.key.as_ref().into());
                let nonce = chacha20poly1305::Nonce::from_slice(&data[2..14]);
                cipher
                    .decrypt(nonce, ciphertext)
                    .map_err(|e| Error::Encryption(e.to_string()))
            }
        }
    }

    /// Algorithm in use
    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }
}

/// Derive raw key bytes from passphrase using Argon2id.
pub fn derive_key_bytes(passphrase: &str, salt: &[u8]) -> Result<[u8; 32]> {
    if salt.len() < 16 {
        return Err(Error::Encryption("Salt too short".to_string()));
    }

    let params = ParamsBuilder::new()
        .m_cost(ARGON2_PARAMS.0)
        .t_cost(ARGON2_PARAMS.1)
        .p_cost(ARGON2_PARAMS.2)
        .output_len(32)
        .build()
        .map_err(|e| Error::Encryption(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut *key)
        .map_err(|e| Error::Encryption(e.to_string()))?;

    let mut out = [0u8; 32];
    out.copy_from_slice(&key[..]);
    Ok(out)
}

/// Generate secure random salt
pub fn generate_salt() -> [u8; 32] {
    let mut salt = [0u8; 32];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Hash data with SHA-256
pub fn hash_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_key_generation() {
        let key = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        assert_eq!(key.as_bytes().len(), 32);
    }

    #[test]
    fn test_encryption_decryption_aes_gcm() {
        let key = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        let plaintext = b"Hello, Ember!";

        let ciphertext = key.encrypt(plaintext).unwrap();
        assert_ne!(ciphertext.as_slice(), plaintext);

        let decrypted = key.decrypt(&ciphertext).unwrap();
        assert_eq!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn test_encryption_decryption_chacha20() {
        let key = MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305);
        let plaintext = b"Secret message";

        let ciphertext = key.encrypt(plaintext).unwrap();
        assert_ne!(ciphertext.as_slice(), plaintext);

        let decrypted = key.decrypt(&ciphertext).unwrap();
        assert_eq!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn test_wrong_key_decryption() {
        let key1 = MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305);
        let key2 = MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305);

        let ciphertext = key1.encrypt(b"Secret").unwrap();
        assert!(key2.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let key = MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305);
        let mut ciphertext = key.encrypt(b"Secret").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;
        assert!(key.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let salt = generate_salt();
        let key1 = MasterKey::from_passphrase("correct horse battery", &salt).unwrap();
        let key2 = MasterKey::from_passphrase("correct horse battery", &salt).unwrap();

        // Same passphrase + salt = same key
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        let key3 = MasterKey::from_passphrase("different passphrase", &salt).unwrap();
        assert_ne!(key1.as_bytes(), key3.as_bytes());
    }

    #[test]
    fn test_short_salt_rejected() {
        assert!(derive_key_bytes("pass", &[0u8; 8]).is_err());
    }

    #[test]
    fn test_sha256() {
        let digest = hash_sha256(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
