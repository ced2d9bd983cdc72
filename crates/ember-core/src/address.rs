//! Account address encoding
//!
//! 20-byte account addresses derived from secp256k1 public keys via
//! Keccak-256, with EIP-55 checksum encoding.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Account address (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Encode with EIP-55 mixed-case checksum
    pub fn to_checksum(&self) -> String {
        checksum_address(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl std::str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_address(s).map(Address)
    }
}

/// Derive the account address from an uncompressed SEC1 public key.
///
/// The address is the last 20 bytes of Keccak-256 over the 64-byte
/// public key body (0x04 prefix stripped).
pub fn address_from_public_key(public_key: &[u8]) -> Result<Address> {
    if public_key.len() != 65 || public_key[0] != 0x04 {
        return Err(Error::InvalidKey(
            "Expected 65-byte uncompressed public key".to_string(),
        ));
    }
    let hash = Keccak256::digest(&public_key[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(Address(address))
}

/// Encode an address with the EIP-55 mixed-case checksum.
pub fn checksum_address(address: &[u8; 20]) -> String {
    let addr_hex = hex::encode(address);
    let hash = hex::encode(Keccak256::digest(addr_hex.as_bytes()));

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (i, c) in addr_hex.chars().enumerate() {
        if c.is_ascii_alphabetic() {
            let hash_char = hash.as_bytes()[i];
            if hash_char >= b'8' {
                result.push(c.to_ascii_uppercase());
            } else {
                result.push(c);
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Parse a hex address string to bytes.
///
/// Accepts with or without the 0x prefix; mixed-case inputs are verified
/// against the EIP-55 checksum.
pub fn parse_address(addr: &str) -> Result<[u8; 20]> {
    let stripped = addr.strip_prefix("0x").unwrap_or(addr);
    if stripped.len() != 40 {
        return Err(Error::InvalidAddress(format!(
            "Expected 40 hex characters, got {}",
            stripped.len()
        )));
    }

    let bytes =
        hex::decode(stripped).map_err(|_| Error::InvalidAddress("Invalid hex encoding".to_string()))?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);

    // Mixed-case input carries an EIP-55 checksum; verify it.
    let has_upper = stripped.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = stripped.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        let expected = checksum_address(&out);
        if expected[2..] != *stripped {
            return Err(Error::InvalidAddress("Checksum mismatch".to_string()));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // EIP-55 reference vectors
    const VECTORS: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_checksum_vectors() {
        for vector in VECTORS {
            let raw = parse_address(vector).unwrap();
            assert_eq!(checksum_address(&raw), vector);
        }
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        // Flip the case of one alphabetic character
        let bad = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD";
        assert!(parse_address(bad).is_err());
    }

    #[test]
    fn test_parse_accepts_lowercase() {
        let lower = VECTORS[0].to_lowercase();
        assert!(parse_address(&lower).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_address_display_roundtrip() {
        let addr = Address::from_str(VECTORS[1]).unwrap();
        assert_eq!(addr.to_string(), VECTORS[1]);
    }

    #[test]
    fn test_address_from_public_key_rejects_compressed() {
        let compressed = [0x02u8; 33];
        assert!(address_from_public_key(&compressed).is_err());
    }
}
