//! Key derivation and mnemonic management
//!
//! Implements BIP-39 mnemonic handling and BIP-32/BIP-44 HD key derivation
//! for Ember accounts on the canonical path `m/44'/60'/0'/0/{index}`.

use crate::address::{self, Address};
use crate::{Error, Result};
use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use std::str::FromStr;
use zeroize::Zeroizing;

/// BIP-44 coin type for Ember accounts
pub const COIN_TYPE: u32 = 60;

/// Default mnemonic word count
pub const DEFAULT_WORD_COUNT: u32 = 24;

/// BIP-39 seed bytes, zeroized on drop
pub type Seed = Zeroizing<[u8; 64]>;

/// Generate new random mnemonic
///
/// # Arguments
/// * `word_count` - Number of words in mnemonic (12, 18, or 24). Defaults to 24.
///
/// # Returns
/// BIP39 mnemonic phrase with the specified number of words
pub fn generate_mnemonic(word_count: Option<u32>) -> String {
    let word_count = word_count.unwrap_or(DEFAULT_WORD_COUNT);

    // BIP39 entropy requirements:
    // 12 words = 128 bits = 16 bytes
    // 18 words = 192 bits = 24 bytes
    // 24 words = 256 bits = 32 bytes
    let entropy_size = match word_count {
        12 => 16,
        18 => 24,
        24 => 32,
        _ => {
            // Default to 24 words for invalid input
            32
        }
    };

    let mut entropy = Zeroizing::new(vec![0u8; entropy_size]);
    use rand::RngCore;
    rand::thread_rng().fill_bytes(&mut entropy);

    let mnemonic =
        Mnemonic::from_entropy(&entropy).expect("Entropy should always produce valid mnemonic");
    mnemonic.to_string()
}

/// Validate a mnemonic phrase and return its normalized form.
///
/// Word count and checksum are verified by the BIP-39 parser.
pub fn validate_mnemonic(phrase: &str) -> Result<String> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| Error::InvalidSeed(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Get seed bytes from mnemonic
pub fn seed_from_mnemonic(phrase: &str, passphrase: &str) -> Result<Seed> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| Error::InvalidSeed(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// Canonical derivation path for the account at `index`.
///
/// Path: m/44'/60'/0'/0/{index}
pub fn derivation_path(index: u32) -> String {
    format!("m/44'/{}'/0'/0/{}", COIN_TYPE, index)
}

/// Account key pair derived from a wallet seed
///
/// Address and private key are pure functions of (seed, path): re-deriving
/// with the same inputs always yields the same account.
pub struct DerivedKey {
    /// Derivation path used
    pub path: String,
    /// Account index within the wallet
    pub index: u32,
    /// Raw private key bytes (zeroized on drop)
    private_key: Zeroizing<[u8; 32]>,
    /// Uncompressed SEC1 public key (65 bytes, 0x04 prefix)
    public_key: Vec<u8>,
    /// Account address
    pub address: Address,
}

impl DerivedKey {
    /// Raw private key bytes
    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.private_key
    }

    /// Private key as 0x-prefixed hex (zeroized on drop)
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.private_key.as_ref())))
    }

    /// Uncompressed public key bytes
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Rebuild from raw private key bytes (e.g. a stored secret record).
    pub fn from_private_key_hex(key_hex: &str, path: String, index: u32) -> Result<Self> {
        let stripped = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let bytes = Zeroizing::new(
            hex::decode(stripped).map_err(|_| Error::InvalidKey("Invalid hex encoding".to_string()))?,
        );
        if bytes.len() != 32 {
            return Err(Error::InvalidKey("Private key must be 32 bytes".to_string()));
        }
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&bytes);

        let signing_key = k256::ecdsa::SigningKey::from_slice(key.as_ref())
            .map_err(|e| Error::InvalidKey(format!("Invalid private key: {e}")))?;
        let public_key = signing_key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();
        let address = address::address_from_public_key(&public_key)?;

        Ok(Self {
            path,
            index,
            private_key: key,
            public_key,
            address,
        })
    }
}

/// Derive the account key pair at `index` from a wallet seed.
///
/// Uses BIP-32 derivation over the canonical BIP-44 path. Deterministic:
/// the same (seed, index) always produces the same key pair and address.
pub fn derive_account(seed: &[u8], index: u32) -> Result<DerivedKey> {
    let path_str = derivation_path(index);
    let path = DerivationPath::from_str(&path_str)
        .map_err(|e| Error::KeyDerivation(format!("Invalid derivation path: {e}")))?;

    let xprv = XPrv::derive_from_path(seed, &path)
        .map_err(|e| Error::KeyDerivation(format!("Child key derivation failed: {e}")))?;

    let mut private_key = Zeroizing::new([0u8; 32]);
    private_key.copy_from_slice(&xprv.private_key().to_bytes());

    let public_key = xprv
        .public_key()
        .public_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec();

    let address = address::address_from_public_key(&public_key)?;

    Ok(DerivedKey {
        path: path_str,
        index,
        private_key,
        public_key,
        address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_mnemonic() {
        let mnemonic = generate_mnemonic(None);
        let words: Vec<&str> = mnemonic.split_whitespace().collect();
        assert_eq!(words.len(), 24);
    }

    #[test]
    fn test_generate_mnemonic_word_counts() {
        for (count, expected) in [(12, 12), (18, 18), (24, 24), (17, 24)] {
            let mnemonic = generate_mnemonic(Some(count));
            let words: Vec<&str> = mnemonic.split_whitespace().collect();
            assert_eq!(words.len(), expected);
        }
    }

    #[test]
    fn test_validate_mnemonic() {
        let mnemonic = generate_mnemonic(None);
        assert!(validate_mnemonic(&mnemonic).is_ok());

        // Bad checksum: all-abandon 12-word phrase ending in "abandon"
        let bad = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        assert!(validate_mnemonic(bad).is_err());

        assert!(validate_mnemonic("not a mnemonic").is_err());
    }

    #[test]
    fn test_derivation_path_format() {
        assert_eq!(derivation_path(0), "m/44'/60'/0'/0/0");
        assert_eq!(derivation_path(7), "m/44'/60'/0'/0/7");
    }

    #[test]
    fn test_derive_account_deterministic() {
        let mnemonic = generate_mnemonic(None);
        let seed = seed_from_mnemonic(&mnemonic, "").unwrap();

        let a = derive_account(seed.as_ref(), 0).unwrap();
        let b = derive_account(seed.as_ref(), 0).unwrap();
        assert_eq!(a.address, b.address);
        assert_eq!(a.private_key_bytes(), b.private_key_bytes());

        let c = derive_account(seed.as_ref(), 1).unwrap();
        assert_ne!(a.address, c.address);
    }

    #[test]
    fn test_known_vector() {
        // BIP-39 reference mnemonic; first account on m/44'/60'/0'/0/0
        let mnemonic =
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let seed = seed_from_mnemonic(mnemonic, "").unwrap();
        let key = derive_account(seed.as_ref(), 0).unwrap();
        assert_eq!(
            key.address.to_checksum(),
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );
    }

    #[test]
    fn test_private_key_hex_roundtrip() {
        let mnemonic = generate_mnemonic(Some(12));
        let seed = seed_from_mnemonic(&mnemonic, "").unwrap();
        let key = derive_account(seed.as_ref(), 3).unwrap();

        let hex_key = key.private_key_hex();
        let rebuilt = DerivedKey::from_private_key_hex(&hex_key, key.path.clone(), 3).unwrap();
        assert_eq!(rebuilt.address, key.address);
    }
}
