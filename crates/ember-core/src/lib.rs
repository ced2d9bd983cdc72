//! Ember Wallet key engine
//!
//! This crate implements mnemonic handling, BIP-44 HD key derivation,
//! and account address encoding for the Ember custody core.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod error;
pub mod keys;

pub use address::{checksum_address, parse_address, Address};
pub use error::{Error, ErrorCategory, Result};
pub use keys::{
    derivation_path, derive_account, generate_mnemonic, seed_from_mnemonic, validate_mnemonic,
    DerivedKey, Seed, COIN_TYPE, DEFAULT_WORD_COUNT,
};
