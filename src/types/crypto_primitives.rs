/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Cryptographic primitives.
//!
//! The definitions and re-exports in this module provide two categories of cryptographic primitives:
//! 1. **Cryptographic Hashes**: provided by the [`sha2`] crate.
//! 2. **Miner identities**: Ed25519 verifying keys provided by the [`ed25519_dalek`] crate.
//!
//! Signing and verifying consensus data is not done in this crate; keys are only used to identify
//! miners.

use super::data_types::Address;

// re-exports below.
pub use sha2::Digest;
pub use sha2::Sha256 as CryptoHasher;

pub use ed25519_dalek::{SignatureError, SigningKey, VerifyingKey};

/// Internal type used for serializing and deserializing values of type [`VerifyingKey`].
pub type VerifyingKeyBytes = [u8; 32];

/// Compute the account [`Address`] owned by `verifying_key`.
pub fn address_of(verifying_key: &VerifyingKey) -> Address {
    let mut hasher = CryptoHasher::new();
    hasher.update(verifying_key.as_bytes());
    Address::new(hasher.finalize().into())
}
