//! Transaction and message types
//!
//! A transaction is immutable once constructed; its canonical byte encoding
//! is the unit of integrity. The signing bytes cover the message, fee,
//! nonce and public key; the signature is appended afterwards. The signer
//! address is derived from the public key.

use atlas_common::prelude::*;
use atlas_persistence::{ActorKind, ParamValue, StakingMessageKind};
use ed25519_dalek::{Signer, SigningKey};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// The state mutations a transaction can request
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Message {
    /// Move `amount` from the signer to `to`
    Send { to: Address, amount: BigUint },
    /// Create a staked actor owned by the signer
    Stake {
        kind: ActorKind,
        amount: BigUint,
        chains: Vec<String>,
        output_address: Address,
    },
    /// Raise the signer's stake and/or replace its chains
    EditStake {
        kind: ActorKind,
        amount: BigUint,
        chains: Vec<String>,
    },
    /// Begin unbonding the signer's actor
    Unstake { kind: ActorKind },
    /// Pause the signer's actor
    Pause { kind: ActorKind },
    /// Resume the signer's actor after the minimum pause window
    Unpause { kind: ActorKind },
    /// Replace a governance parameter value; only its owner may sign this
    ChangeParameter { name: String, value: ParamValue },
}

impl Message {
    pub fn name(&self) -> &'static str {
        match self {
            Message::Send { .. } => "send",
            Message::Stake { .. } => "stake",
            Message::EditStake { .. } => "edit_stake",
            Message::Unstake { .. } => "unstake",
            Message::Pause { .. } => "pause",
            Message::Unpause { .. } => "unpause",
            Message::ChangeParameter { .. } => "change_parameter",
        }
    }

    /// Governance parameter naming this message's minimum fee
    pub fn fee_param(&self) -> &'static str {
        match self {
            Message::Send { .. } => atlas_persistence::params::names::MESSAGE_SEND_FEE,
            Message::ChangeParameter { .. } => {
                atlas_persistence::params::names::MESSAGE_CHANGE_PARAMETER_FEE
            }
            Message::Stake { kind, .. } => kind.message_fee_param(StakingMessageKind::Stake),
            Message::EditStake { kind, .. } => {
                kind.message_fee_param(StakingMessageKind::EditStake)
            }
            Message::Unstake { kind } => kind.message_fee_param(StakingMessageKind::Unstake),
            Message::Pause { kind } => kind.message_fee_param(StakingMessageKind::Pause),
            Message::Unpause { kind } => kind.message_fee_param(StakingMessageKind::Unpause),
        }
    }

    /// The amount this message moves out of the signer's account, beyond
    /// the fee
    pub fn value_moved(&self) -> Option<&BigUint> {
        match self {
            Message::Send { amount, .. } => Some(amount),
            Message::Stake { amount, .. } => Some(amount),
            // EditStake moves only the difference; the executor computes it
            _ => None,
        }
    }
}

/// A signed transaction
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    pub message: Message,
    pub fee: BigUint,
    /// Per-signer sequence number; the executor requires it to match the
    /// signer account's transaction count, so signed bytes apply once
    pub nonce: u64,
    pub public_key: PublicKey,
    /// 64-byte Ed25519 signature over the signing bytes
    pub signature: Vec<u8>,
}

/// The signature-less view serialized into signing bytes
#[derive(Serialize)]
struct SigningView<'a> {
    message: &'a Message,
    fee: &'a BigUint,
    nonce: u64,
    public_key: &'a PublicKey,
}

impl Transaction {
    /// Construct and sign a transaction
    pub fn sign(
        message: Message,
        fee: BigUint,
        nonce: u64,
        signing_key: &SigningKey,
    ) -> CoreResult<Self> {
        let public_key = signing_key.verifying_key().to_bytes();
        let mut tx = Self {
            message,
            fee,
            nonce,
            public_key,
            signature: Vec::new(),
        };
        let bytes = tx.signing_bytes()?;
        tx.signature = signing_key.sign(&bytes).to_bytes().to_vec();
        Ok(tx)
    }

    /// Canonical bytes covered by the signature
    pub fn signing_bytes(&self) -> CoreResult<Vec<u8>> {
        bincode::serialize(&SigningView {
            message: &self.message,
            fee: &self.fee,
            nonce: self.nonce,
            public_key: &self.public_key,
        })
        .map_err(|e| CoreError::serialization(format!("signing bytes: {e}")))
    }

    /// Verify the signature against the signing bytes
    pub fn verify(&self) -> CoreResult<()> {
        if self.signature.len() != sizes::SIGNATURE_SIZE {
            return Err(CoreError::invalid_signature(format!(
                "bad signature length: expected {}, got {}",
                sizes::SIGNATURE_SIZE,
                self.signature.len()
            )));
        }
        let bytes = self.signing_bytes()?;
        CryptoUtils::verify_signature(&self.public_key, &bytes, &self.signature)
    }

    /// The signer's address, derived from the public key
    pub fn signer_address(&self) -> Address {
        CryptoUtils::address_from_public_key(&self.public_key)
    }

    /// Hash of the canonical transaction bytes
    pub fn hash(&self) -> CoreResult<Hash> {
        Ok(CryptoUtils::hash(&self.to_bytes()?))
    }

    /// Canonical wire encoding
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CoreError::serialization(format!("transaction encode: {e}")))
    }

    /// Decode raw transaction bytes; failure is a per-transaction rejection
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        bincode::deserialize(bytes).map_err(|e| CoreError::malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn send_tx(seed: u8) -> Transaction {
        Transaction::sign(
            Message::Send {
                to: [2u8; 20],
                amount: BigUint::from(500u64),
            },
            BigUint::from(10000u64),
            0,
            &signing_key(seed),
        )
        .unwrap()
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let tx = send_tx(1);
        tx.verify().unwrap();

        let decoded = Transaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, tx);
        decoded.verify().unwrap();
    }

    #[test]
    fn test_tampered_fee_fails_verification() {
        let mut tx = send_tx(1);
        tx.fee = BigUint::from(1u64);
        assert!(matches!(tx.verify(), Err(CoreError::InvalidSignature(_))));
    }

    #[test]
    fn test_garbage_bytes_are_malformed() {
        assert!(matches!(
            Transaction::from_bytes(b"not a transaction"),
            Err(CoreError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_hash_is_stable_and_signer_dependent() {
        let a = send_tx(1);
        let b = send_tx(1);
        let c = send_tx(3);
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
        assert_ne!(a.hash().unwrap(), c.hash().unwrap());
        assert_ne!(a.signer_address(), c.signer_address());
    }

    #[test]
    fn test_fee_params_by_message() {
        assert_eq!(
            Message::Send {
                to: [0u8; 20],
                amount: BigUint::from(1u64)
            }
            .fee_param(),
            "message_send_fee"
        );
        assert_eq!(
            Message::Unstake {
                kind: ActorKind::Fisherman
            }
            .fee_param(),
            "message_unstake_fisherman_fee"
        );
    }
}
