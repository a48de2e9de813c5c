//! Cryptographic utilities: hashing, address derivation and signature checks

use crate::{
    error::{CoreError, CoreResult},
    types::{sizes, Address, Hash, PublicKey},
};
use ed25519_dalek::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};

/// Central cryptographic utilities
pub struct CryptoUtils;

impl CryptoUtils {
    /// Compute SHA-256 hash of data
    pub fn hash(data: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().into()
    }

    /// Compute hash of multiple data chunks
    pub fn hash_multiple(chunks: &[&[u8]]) -> Hash {
        let mut hasher = Sha256::new();
        for chunk in chunks {
            hasher.update(chunk);
        }
        hasher.finalize().into()
    }

    /// Derive the 20-byte address from an Ed25519 public key.
    /// The address is the first 20 bytes of SHA-256 of the key bytes.
    pub fn address_from_public_key(public_key: &PublicKey) -> Address {
        let digest = Self::hash(public_key);
        let mut address = [0u8; sizes::ADDRESS_SIZE];
        address.copy_from_slice(&digest[..sizes::ADDRESS_SIZE]);
        address
    }

    /// Verify an Ed25519 signature over a message
    pub fn verify_signature(
        public_key: &PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> CoreResult<()> {
        let key = VerifyingKey::from_bytes(public_key)
            .map_err(|e| CoreError::invalid_signature(format!("bad public key: {e}")))?;

        let sig_bytes: [u8; sizes::SIGNATURE_SIZE] = signature.try_into().map_err(|_| {
            CoreError::invalid_signature(format!(
                "bad signature length: expected {}, got {}",
                sizes::SIGNATURE_SIZE,
                signature.len()
            ))
        })?;
        let signature = Signature::from_bytes(&sig_bytes);

        key.verify_strict(message, &signature)
            .map_err(|e| CoreError::invalid_signature(e.to_string()))
    }

    /// Convert hex string to address
    pub fn hex_to_address(hex_str: &str) -> CoreResult<Address> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CoreError::validation(format!("invalid hex: {e}")))?;
        if bytes.len() != sizes::ADDRESS_SIZE {
            crate::core_bail!(
                Validation,
                "invalid address length: expected {}, got {}",
                sizes::ADDRESS_SIZE,
                bytes.len()
            );
        }
        let mut address = [0u8; sizes::ADDRESS_SIZE];
        address.copy_from_slice(&bytes);
        Ok(address)
    }

    /// Convert address to hex string
    pub fn address_to_hex(address: &Address) -> String {
        hex::encode(address)
    }

    /// Convert hex string to public key
    pub fn hex_to_public_key(hex_str: &str) -> CoreResult<PublicKey> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CoreError::validation(format!("invalid hex: {e}")))?;
        if bytes.len() != sizes::PUBKEY_SIZE {
            crate::core_bail!(
                Validation,
                "invalid public key length: expected {}, got {}",
                sizes::PUBKEY_SIZE,
                bytes.len()
            );
        }
        let mut key = [0u8; sizes::PUBKEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(key)
    }

    /// Convert hash to hex string
    pub fn hash_to_hex(hash: &Hash) -> String {
        hex::encode(hash)
    }
}
