//! Standardized data encoding/decoding patterns
//!
//! World-state values and transaction signing bytes use bincode, which is
//! deterministic for the types stored here. Genesis documents use JSON.

use crate::error::{CoreError, CoreResult};
use serde::{de::DeserializeOwned, Serialize};

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingType {
    /// Compact, deterministic binary encoding (state values, signing bytes)
    Bincode,
    /// Human-readable encoding (genesis documents, debugging)
    Json,
}

/// Standardized serialization for Atlas data types
pub trait AtlasSerialize: Serialize + DeserializeOwned {
    /// Preferred encoding for this type
    fn preferred_encoding() -> EncodingType {
        EncodingType::Bincode
    }

    /// Encode using the preferred encoding
    fn encode(&self) -> CoreResult<Vec<u8>> {
        match Self::preferred_encoding() {
            EncodingType::Bincode => bincode::serialize(self)
                .map_err(|e| CoreError::serialization(format!("bincode encode: {e}"))),
            EncodingType::Json => serde_json::to_vec(self)
                .map_err(|e| CoreError::serialization(format!("json encode: {e}"))),
        }
    }

    /// Decode using the preferred encoding
    fn decode(bytes: &[u8]) -> CoreResult<Self> {
        match Self::preferred_encoding() {
            EncodingType::Bincode => bincode::deserialize(bytes)
                .map_err(|e| CoreError::serialization(format!("bincode decode: {e}"))),
            EncodingType::Json => serde_json::from_slice(bytes)
                .map_err(|e| CoreError::serialization(format!("json decode: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        id: u64,
        name: String,
    }

    impl AtlasSerialize for TestData {}

    #[test]
    fn test_bincode_roundtrip() {
        let data = TestData {
            id: 42,
            name: "proposer".to_string(),
        };
        let encoded = data.encode().unwrap();
        let decoded = TestData::decode(&encoded).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn test_encoding_is_stable() {
        let data = TestData {
            id: 42,
            name: "proposer".to_string(),
        };
        assert_eq!(data.encode().unwrap(), data.encode().unwrap());
    }
}
