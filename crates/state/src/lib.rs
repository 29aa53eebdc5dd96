//! Versioned key-value state store with a nested savepoint stack.
//!
//! The dispatch pipeline treats state as an external collaborator with a
//! narrow interface: typed reads, typed writes scoped to the current
//! savepoint, and begin/commit/rollback of nested savepoints. Committing a
//! nested savepoint folds its changes into the parent frame; committing the
//! root frame lands them durably and bumps the store version.

mod savepoint;
mod store;

pub use savepoint::{Savepoint, SavepointStack};
pub use store::{StateKey, StateReader, StateStore, StateValue, FIRST_ALLOCATABLE_ID};
