//! Common type definitions and constants used throughout Atlas

/// Account / actor identifier - first 20 bytes of SHA-256 of the public key
pub type Address = [u8; 20];

/// Hash type - 32-byte SHA-256
pub type Hash = [u8; 32];

/// Ed25519 public key - 32-byte
pub type PublicKey = [u8; 32];

/// Block height
pub type BlockHeight = u64;

/// Cryptographic sizes
pub mod sizes {
    /// Address size in bytes
    pub const ADDRESS_SIZE: usize = 20;

    /// Hash size in bytes (SHA-256)
    pub const HASH_SIZE: usize = 32;

    /// Public key size in bytes
    pub const PUBKEY_SIZE: usize = 32;

    /// Signature size in bytes
    pub const SIGNATURE_SIZE: usize = 64;
}

/// Utility functions for common operations using extension traits
macro_rules! impl_byte_array_ext {
    ($name:ident, $len:expr) => {
        pub trait $name {
            /// Create an array filled with zeros
            fn zero() -> Self;
            /// Check if every byte in the array is zero
            fn is_zero(&self) -> bool;
        }

        impl $name for [u8; $len] {
            fn zero() -> Self {
                [0u8; $len]
            }

            fn is_zero(&self) -> bool {
                self.iter().all(|&b| b == 0)
            }
        }
    };
}

impl_byte_array_ext!(AddressExt, 20);
