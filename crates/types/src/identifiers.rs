//! Domain-specific identifier types.

use crate::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account identifier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self.0)
    }
}

/// Identifier of the consensus node that submitted a transaction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// A 20-byte implicit address derived from a primitive public key.
///
/// Accounts created lazily by a transfer to an address they do not yet
/// control carry this as their alias until a real key is set.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Derive the implicit address of a public key: the trailing 20 bytes
    /// of its Blake3 hash.
    pub fn of(key: &PublicKey) -> Self {
        let hash = blake3::hash(key.as_bytes());
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash.as_bytes()[12..32]);
        Address(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Globally unique transaction identity.
///
/// The user transaction carries nonce 0; every nested dispatch under it is
/// assigned the same payer and valid-start with an incremented nonce, so
/// record consumers can reconstruct the nesting tree.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct TransactionId {
    /// Account paying for the transaction.
    pub payer: AccountId,
    /// Client-chosen start time, nanoseconds since epoch.
    pub valid_start_nanos: u64,
    /// 0 for the user transaction, incremented per nested dispatch.
    pub nonce: u32,
}

impl TransactionId {
    /// Create a user-level transaction id (nonce 0).
    pub fn new(payer: AccountId, valid_start_nanos: u64) -> Self {
        Self {
            payer,
            valid_start_nanos,
            nonce: 0,
        }
    }

    /// The same identity with a different nonce, for a nested dispatch.
    pub fn with_nonce(self, nonce: u32) -> Self {
        Self { nonce, ..self }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}#{}",
            self.payer, self.valid_start_nanos, self.nonce
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_address_derivation_deterministic() {
        let key = KeyPair::from_seed(&[7u8; 32]).public_key();
        assert_eq!(Address::of(&key), Address::of(&key));

        let other = KeyPair::from_seed(&[8u8; 32]).public_key();
        assert_ne!(Address::of(&key), Address::of(&other));
    }

    #[test]
    fn test_transaction_id_nonce() {
        let id = TransactionId::new(AccountId(5), 1_000);
        assert_eq!(id.nonce, 0);

        let nested = id.with_nonce(3);
        assert_eq!(nested.payer, AccountId(5));
        assert_eq!(nested.valid_start_nanos, 1_000);
        assert_eq!(nested.nonce, 3);
    }
}
