//! Ledger account state.

use crate::{AccountId, Address, Key};
use serde::{Deserialize, Serialize};

/// An account as stored in the state store.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Authorization key; the sentinel key list while the account is hollow.
    pub key: Key,
    /// Implicit address the account was lazily created for, if any.
    pub alias: Option<Address>,
    /// Balance in the smallest denomination.
    pub balance: u64,
    /// Deleted accounts stay in state but reject all activity.
    pub deleted: bool,
    /// Whether credits to this account require its signature.
    pub receiver_sig_required: bool,
}

impl Account {
    /// Create a plain account with a real key.
    pub fn new(id: AccountId, key: Key, balance: u64) -> Self {
        Self {
            id,
            key,
            alias: None,
            balance,
            deleted: false,
            receiver_sig_required: false,
        }
    }

    /// Create a hollow account: sentinel key, alias only.
    pub fn hollow(id: AccountId, alias: Address) -> Self {
        Self {
            id,
            key: Key::sentinel(),
            alias: Some(alias),
            balance: 0,
            deleted: false,
            receiver_sig_required: false,
        }
    }

    /// A hollow account has the sentinel key and an alias, and is waiting
    /// for a verified signature over its address to complete it.
    pub fn is_hollow(&self) -> bool {
        self.key.is_sentinel() && self.alias.is_some()
    }
}
