//! Standardized error types for all Atlas components

use thiserror::Error;

/// Standard result type used throughout Atlas
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Comprehensive error type for all Atlas operations
#[derive(Error, Debug)]
pub enum CoreError {
    // Block staging / application errors
    #[error("proposal block not set")]
    ProposalNotSet,

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    // Per-transaction rejections
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("insufficient funds for {address}: needed {needed}, available {available}")]
    InsufficientFunds {
        address: String,
        needed: String,
        available: String,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    // Governance parameter errors
    #[error("parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("type mismatch for parameter {name}: expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    // Storage collaborator failures
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    // Savepoint / entity lookups
    #[error("not found: {0}")]
    NotFound(String),

    // Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    // Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    // Genesis loading errors
    #[error("genesis error: {0}")]
    Genesis(String),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("internal error: {0}")]
    Internal(String),

    // External library errors
    #[error("external error: {0}")]
    External(#[from] anyhow::Error),
}

impl CoreError {
    /// Create a new invalid-proposal error
    pub fn invalid_proposal(msg: impl Into<String>) -> Self {
        Self::InvalidProposal(msg.into())
    }

    /// Create a new malformed-transaction error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedTransaction(msg.into())
    }

    /// Create a new invalid-signature error
    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::InvalidSignature(msg.into())
    }

    /// Create a new unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new storage-unavailable error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new genesis error
    pub fn genesis(msg: impl Into<String>) -> Self {
        Self::Genesis(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convenience macro for creating CoreError instances
#[macro_export]
macro_rules! core_error {
    ($variant:ident, $($arg:tt)*) => {
        $crate::error::CoreError::$variant(format!($($arg)*))
    };
}

/// Convenience macro for returning early with a CoreError
#[macro_export]
macro_rules! core_bail {
    ($variant:ident, $($arg:tt)*) => {
        return Err($crate::core_error!($variant, $($arg)*))
    };
}
