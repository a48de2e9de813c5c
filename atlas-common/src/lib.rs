//! # Atlas Common
//!
//! Common utilities, traits, and standardized patterns shared by the Atlas
//! state-transition core. This crate is the single source of truth for the
//! types and helpers every other crate builds on, preventing duplication
//! and circular dependencies.
//!
//! ## Modules
//!
//! - **error**: The `CoreError` enum and `CoreResult` alias
//! - **types**: Addresses, hashes, public keys and size constants
//! - **crypto**: SHA-256 digests, address derivation, Ed25519 verification
//! - **serialization**: Canonical encoding/decoding patterns
//! - **amount**: Arbitrary-precision token amount helpers

pub mod amount;
pub mod crypto;
pub mod error;
pub mod serialization;
pub mod types;

/// Re-export commonly used types and traits
pub mod prelude {
    pub use crate::crypto::CryptoUtils;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::serialization::{AtlasSerialize, EncodingType};
    pub use crate::types::{sizes, Address, AddressExt, BlockHeight, Hash, PublicKey};

    // Re-export essential external crates
    pub use anyhow::Result;
}

/// Atlas Common crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version for state compatibility
pub const PROTOCOL_VERSION: u32 = 1;
