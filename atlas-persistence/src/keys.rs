//! Byte-key layout for the world-state keyspace
//!
//! Keys are prefixed by entity kind so the ordered keyspace groups accounts,
//! actors and parameters, and sorts within each group by address or name.
//! The state hash walks this ordering, so the layout is part of consensus.

use crate::actor::ActorKind;
use atlas_common::prelude::Address;

/// Prefix for account entries, sorted by address
pub const ACCOUNT_PREFIX: &[u8] = b"a/";

/// Prefix for governance parameter entries, sorted by name
pub const PARAM_PREFIX: &[u8] = b"p/";

/// Prefix for staked actor entries, grouped by kind then sorted by address
pub const ACTOR_PREFIX: &[u8] = b"s/";

/// Key for an account record
pub fn account_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_PREFIX.len() + address.len());
    key.extend_from_slice(ACCOUNT_PREFIX);
    key.extend_from_slice(address);
    key
}

/// Key for a staked actor record
pub fn actor_key(kind: ActorKind, address: &Address) -> Vec<u8> {
    let mut key = actor_kind_prefix(kind);
    key.extend_from_slice(address);
    key
}

/// Prefix covering every actor of one kind
pub fn actor_kind_prefix(kind: ActorKind) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACTOR_PREFIX.len() + 2);
    key.extend_from_slice(ACTOR_PREFIX);
    key.push(kind.key_byte());
    key.push(b'/');
    key
}

/// Key for a governance parameter record
pub fn param_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(PARAM_PREFIX.len() + name.len());
    key.extend_from_slice(PARAM_PREFIX);
    key.extend_from_slice(name.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefixes_are_disjoint() {
        let account = account_key(&[1u8; 20]);
        let actor = actor_key(ActorKind::Validator, &[1u8; 20]);
        let param = param_key("proposer_percentage_of_fees");

        assert!(account.starts_with(ACCOUNT_PREFIX));
        assert!(actor.starts_with(ACTOR_PREFIX));
        assert!(param.starts_with(PARAM_PREFIX));
        assert_ne!(account, actor);
        assert_ne!(account, param);
    }

    #[test]
    fn test_actor_keys_group_by_kind() {
        let validator = actor_key(ActorKind::Validator, &[0xff; 20]);
        let app = actor_key(ActorKind::Application, &[0x00; 20]);
        // Application prefix byte sorts before validator prefix byte, so all
        // applications precede all validators regardless of address.
        assert!(app < validator);
    }
}
