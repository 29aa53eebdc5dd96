//! Nested savepoints over the durable store.
//!
//! The stack is an arena of frames indexed by depth: a child frame refers
//! to its parent only by position, and committing is an explicit merge of
//! the child's write set into the frame below (or into the durable store
//! for the root frame). Reads check frames top-down and fall through to
//! the base store, so uncommitted writes shadow older state without
//! touching it.

use crate::{StateKey, StateReader, StateStore, StateValue, FIRST_ALLOCATABLE_ID};
use indexmap::IndexMap;
use tracing::debug;
use unison_types::{Account, AccountId, Address};

/// One revocable frame of uncommitted writes.
///
/// `None` entries are tombstones shadowing a removal.
#[derive(Debug, Default)]
pub struct Savepoint {
    writes: IndexMap<StateKey, Option<StateValue>>,
}

impl Savepoint {
    /// Number of uncommitted writes in this frame.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether the frame has no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// The savepoint stack exclusively owned by one in-flight dispatch tree.
#[derive(Debug)]
pub struct SavepointStack<'a> {
    store: &'a mut StateStore,
    frames: Vec<Savepoint>,
}

impl<'a> SavepointStack<'a> {
    /// Open a stack over the durable store. No frame is pushed yet.
    pub fn new(store: &'a mut StateStore) -> Self {
        Self {
            store,
            frames: Vec::new(),
        }
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a new savepoint frame.
    pub fn push(&mut self) {
        self.frames.push(Savepoint::default());
    }

    /// Commit the top frame: fold its writes into the parent frame, or
    /// apply them durably (bumping the store version) if it is the root.
    pub fn commit(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        match self.frames.last_mut() {
            Some(parent) => {
                for (key, value) in frame.writes {
                    parent.writes.insert(key, value);
                }
            }
            None => {
                debug!(writes = frame.writes.len(), "committing root savepoint");
                for (key, value) in frame.writes {
                    self.store.apply(key, value);
                }
                self.store.bump_version();
            }
        }
    }

    /// Discard the top frame and everything written in it.
    pub fn rollback(&mut self) {
        if let Some(frame) = self.frames.pop() {
            debug!(discarded = frame.writes.len(), "rolled back savepoint");
        }
    }

    /// Write one entry into the top frame.
    pub fn put(&mut self, key: StateKey, value: StateValue) {
        self.write(key, Some(value));
    }

    /// Remove one entry (tombstone in the top frame).
    pub fn remove(&mut self, key: StateKey) {
        self.write(key, None);
    }

    fn write(&mut self, key: StateKey, value: Option<StateValue>) {
        debug_assert!(!self.frames.is_empty(), "write outside any savepoint");
        match self.frames.last_mut() {
            Some(frame) => {
                frame.writes.insert(key, value);
            }
            // With no open frame the write lands durably; dispatch always
            // opens a frame first, so this is a setup-only path.
            None => self.store.apply(key, value),
        }
    }

    /// Write an account into the top frame.
    pub fn put_account(&mut self, account: Account) {
        self.put(StateKey::Account(account.id), StateValue::Account(account));
    }

    /// Link an implicit address to an account in the top frame.
    pub fn link_alias(&mut self, address: Address, id: AccountId) {
        self.put(StateKey::Alias(address), StateValue::AliasLink(id));
    }

    /// Write one contract storage cell in the top frame.
    pub fn put_contract_slot(&mut self, contract: AccountId, slot: Vec<u8>, value: Vec<u8>) {
        self.put(
            StateKey::ContractSlot(contract, slot),
            StateValue::ContractSlot(value),
        );
    }

    /// Allocate the next entity id, advancing the counter in the top frame.
    pub fn next_entity_id(&mut self) -> AccountId {
        let next = match self.read(&StateKey::EntityCounter) {
            Some(StateValue::Counter(n)) => n,
            _ => FIRST_ALLOCATABLE_ID,
        };
        self.put(StateKey::EntityCounter, StateValue::Counter(next + 1));
        AccountId(next)
    }
}

impl StateReader for SavepointStack<'_> {
    fn read(&self, key: &StateKey) -> Option<StateValue> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.writes.get(key) {
                return value.clone();
            }
        }
        self.store.read(key)
    }
}
