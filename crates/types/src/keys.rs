//! Composite account keys.
//!
//! A key is either a primitive ED25519 key, a threshold over child keys, or
//! a list requiring every child. Hollow accounts carry the empty key list
//! as a sentinel until a real key is set.

use crate::{Address, PublicKey};
use serde::{Deserialize, Serialize};

/// A possibly composite account key.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub enum Key {
    /// A primitive ED25519 key.
    Ed25519(PublicKey),
    /// At least `threshold` of the child keys must verify.
    Threshold {
        /// Number of child keys that must verify.
        threshold: u32,
        /// Child keys.
        keys: Vec<Key>,
    },
    /// Every child key must verify.
    KeyList(Vec<Key>),
}

impl Key {
    /// The sentinel key of a hollow account: an empty key list.
    ///
    /// It authorizes nothing; the account stays immutable until completion
    /// replaces it with a real key.
    pub fn sentinel() -> Self {
        Key::KeyList(Vec::new())
    }

    /// Whether this is the hollow-account sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Key::KeyList(keys) if keys.is_empty())
    }

    /// Whether this key can ever authorize anything.
    ///
    /// A key is unusable if it is the sentinel, a threshold of zero or over
    /// no keys, or composed entirely of unusable children.
    pub fn is_usable(&self) -> bool {
        match self {
            Key::Ed25519(_) => true,
            Key::Threshold { threshold, keys } => {
                *threshold > 0
                    && keys.iter().filter(|k| k.is_usable()).count() >= *threshold as usize
            }
            Key::KeyList(keys) => !keys.is_empty() && keys.iter().all(|k| k.is_usable()),
        }
    }

    /// Collect the primitive keys in this structure, depth-first.
    pub fn primitive_keys(&self) -> Vec<PublicKey> {
        let mut out = Vec::new();
        self.collect_primitives(&mut out);
        out
    }

    fn collect_primitives(&self, out: &mut Vec<PublicKey>) {
        match self {
            Key::Ed25519(pk) => out.push(*pk),
            Key::Threshold { keys, .. } | Key::KeyList(keys) => {
                for key in keys {
                    key.collect_primitives(out);
                }
            }
        }
    }

    /// The implicit address of a primitive key; `None` for composite keys.
    pub fn implicit_address(&self) -> Option<Address> {
        match self {
            Key::Ed25519(pk) => Some(Address::of(pk)),
            _ => None,
        }
    }
}
