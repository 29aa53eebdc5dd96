//! The durable state store and its typed read interface.

use indexmap::IndexMap;
use unison_types::{Account, AccountId, Address};

/// Entity ids below this are reserved for genesis/system accounts.
pub const FIRST_ALLOCATABLE_ID: u64 = 1000;

/// Typed key into the state store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// An account by id.
    Account(AccountId),
    /// Alias link from an implicit address to the owning account.
    Alias(Address),
    /// One storage cell of a contract account.
    ContractSlot(AccountId, Vec<u8>),
    /// The next-entity-id allocation counter.
    EntityCounter,
}

/// Typed value in the state store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    /// Account state.
    Account(Account),
    /// Alias link target.
    AliasLink(AccountId),
    /// Contract storage cell contents.
    ContractSlot(Vec<u8>),
    /// Entity id counter value.
    Counter(u64),
}

/// Read access to typed state.
///
/// Implemented by the durable [`StateStore`] (used by speculative
/// pre-handle) and by [`crate::SavepointStack`] (used during execution,
/// where reads see uncommitted frames first).
pub trait StateReader {
    /// Read one entry; implementations return a clone of current contents.
    fn read(&self, key: &StateKey) -> Option<StateValue>;

    /// Look up an account by id.
    fn account(&self, id: AccountId) -> Option<Account> {
        match self.read(&StateKey::Account(id)) {
            Some(StateValue::Account(account)) => Some(account),
            _ => None,
        }
    }

    /// Resolve an implicit address to the account linked to it.
    fn account_id_by_alias(&self, address: &Address) -> Option<AccountId> {
        match self.read(&StateKey::Alias(*address)) {
            Some(StateValue::AliasLink(id)) => Some(id),
            _ => None,
        }
    }

    /// Read one contract storage cell.
    fn contract_slot(&self, contract: AccountId, slot: &[u8]) -> Option<Vec<u8>> {
        match self.read(&StateKey::ContractSlot(contract, slot.to_vec())) {
            Some(StateValue::ContractSlot(value)) => Some(value),
            _ => None,
        }
    }
}

/// The durable, versioned state store.
///
/// Only root-savepoint commits mutate it during handling; direct writes
/// exist for genesis setup. The version increments on every durable commit
/// so a speculative pre-handle pass can detect staleness.
#[derive(Debug, Default)]
pub struct StateStore {
    entries: IndexMap<StateKey, StateValue>,
    version: u64,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version; bumped on every durable commit.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    pub(crate) fn apply(&mut self, key: StateKey, value: Option<StateValue>) {
        match value {
            Some(value) => {
                self.entries.insert(key, value);
            }
            None => {
                self.entries.shift_remove(&key);
            }
        }
    }

    /// Write one entry directly, for genesis setup.
    pub fn put(&mut self, key: StateKey, value: StateValue) {
        self.entries.insert(key, value);
    }

    /// Install an account directly, linking its alias if present.
    /// For genesis setup only.
    pub fn put_account(&mut self, account: Account) {
        if let Some(alias) = account.alias {
            self.entries
                .insert(StateKey::Alias(alias), StateValue::AliasLink(account.id));
        }
        self.entries
            .insert(StateKey::Account(account.id), StateValue::Account(account));
    }

    /// Number of entries, for tests and diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateReader for StateStore {
    fn read(&self, key: &StateKey) -> Option<StateValue> {
        self.entries.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unison_types::{Key, KeyPair};

    #[test]
    fn test_put_account_links_alias() {
        let mut store = StateStore::new();
        let pk = KeyPair::from_seed(&[1; 32]).public_key();
        let alias = Address::of(&pk);
        let mut account = Account::new(AccountId(7), Key::Ed25519(pk), 50);
        account.alias = Some(alias);
        store.put_account(account.clone());

        assert_eq!(store.account(AccountId(7)), Some(account));
        assert_eq!(store.account_id_by_alias(&alias), Some(AccountId(7)));
    }

    #[test]
    fn test_missing_reads() {
        let store = StateStore::new();
        assert_eq!(store.account(AccountId(1)), None);
        assert_eq!(store.contract_slot(AccountId(1), b"slot"), None);
    }
}
