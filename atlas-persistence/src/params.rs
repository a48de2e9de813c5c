//! Governance parameters and the typed read path
//!
//! Parameters are named, owner-controlled protocol constants stored in the
//! world state alongside accounts and actors. They are seeded at genesis
//! and mutated only through `ChangeParameter` transactions; nothing else
//! writes them.

use crate::context::PersistenceRwContext;
use atlas_common::prelude::*;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Well-known parameter names not tied to a single actor kind
pub mod names {
    /// Integer percentage (0-100) of block fees credited to the proposer
    pub const PROPOSER_PERCENTAGE_OF_FEES: &str = "proposer_percentage_of_fees";
    /// Fee for a Send message
    pub const MESSAGE_SEND_FEE: &str = "message_send_fee";
    /// Fee for a ChangeParameter message
    pub const MESSAGE_CHANGE_PARAMETER_FEE: &str = "message_change_parameter_fee";
}

/// A typed parameter value
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Int(u64),
    BigInt(BigUint),
    Address(Address),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::BigInt(_) => "big_int",
            ParamValue::Address(_) => "address",
        }
    }

    /// Whether `other` carries the same value type
    pub fn same_type(&self, other: &ParamValue) -> bool {
        self.type_name() == other.type_name()
    }
}

/// A governance parameter: value plus the address authorized to change it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub value: ParamValue,
    pub owner: Address,
}

impl AtlasSerialize for Param {}

/// Read-only, typed view over the governance parameters in a context.
/// Callers request a concrete type; a registered parameter of another type
/// fails with `TypeMismatch`, an unregistered name with `ParameterNotFound`.
pub struct GovParams<'a> {
    ctx: &'a PersistenceRwContext,
}

impl<'a> GovParams<'a> {
    pub fn new(ctx: &'a PersistenceRwContext) -> Self {
        Self { ctx }
    }

    fn fetch(&self, name: &str) -> CoreResult<Param> {
        self.ctx
            .get_param(name)?
            .ok_or_else(|| CoreError::ParameterNotFound(name.to_string()))
    }

    /// Integer-typed parameter
    pub fn int(&self, name: &str) -> CoreResult<u64> {
        match self.fetch(name)?.value {
            ParamValue::Int(v) => Ok(v),
            _ => Err(CoreError::TypeMismatch {
                name: name.to_string(),
                expected: "int",
            }),
        }
    }

    /// Big-integer-typed parameter (amounts, fees)
    pub fn big_int(&self, name: &str) -> CoreResult<BigUint> {
        match self.fetch(name)?.value {
            ParamValue::BigInt(v) => Ok(v),
            _ => Err(CoreError::TypeMismatch {
                name: name.to_string(),
                expected: "big_int",
            }),
        }
    }

    /// Address-typed parameter
    pub fn address(&self, name: &str) -> CoreResult<Address> {
        match self.fetch(name)?.value {
            ParamValue::Address(v) => Ok(v),
            _ => Err(CoreError::TypeMismatch {
                name: name.to_string(),
                expected: "address",
            }),
        }
    }

    /// Owner authorized to change the named parameter
    pub fn owner(&self, name: &str) -> CoreResult<Address> {
        Ok(self.fetch(name)?.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PersistenceRwContext;

    fn ctx_with_params() -> PersistenceRwContext {
        let mut ctx = PersistenceRwContext::new();
        let owner = [1u8; 20];
        ctx.set_param(
            names::PROPOSER_PERCENTAGE_OF_FEES,
            Param {
                value: ParamValue::Int(10),
                owner,
            },
        )
        .unwrap();
        ctx.set_param(
            names::MESSAGE_SEND_FEE,
            Param {
                value: ParamValue::BigInt(BigUint::from(10000u64)),
                owner,
            },
        )
        .unwrap();
        ctx
    }

    #[test]
    fn test_typed_lookups() {
        let ctx = ctx_with_params();
        let params = GovParams::new(&ctx);

        assert_eq!(params.int(names::PROPOSER_PERCENTAGE_OF_FEES).unwrap(), 10);
        assert_eq!(
            params.big_int(names::MESSAGE_SEND_FEE).unwrap(),
            BigUint::from(10000u64)
        );
        assert_eq!(
            params.owner(names::MESSAGE_SEND_FEE).unwrap(),
            [1u8; 20]
        );
    }

    #[test]
    fn test_unregistered_name_fails() {
        let ctx = ctx_with_params();
        let params = GovParams::new(&ctx);
        assert!(matches!(
            params.int("no_such_parameter"),
            Err(CoreError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn test_wrong_type_fails() {
        let ctx = ctx_with_params();
        let params = GovParams::new(&ctx);
        assert!(matches!(
            params.big_int(names::PROPOSER_PERCENTAGE_OF_FEES),
            Err(CoreError::TypeMismatch { .. })
        ));
        assert!(matches!(
            params.address(names::MESSAGE_SEND_FEE),
            Err(CoreError::TypeMismatch { .. })
        ));
    }
}
