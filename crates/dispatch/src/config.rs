//! Configuration for dispatch limits and fees.

use unison_types::{AccountId, Functionality};

/// Structural limits and fee policy for one pipeline.
///
/// Nesting is bounded by the child and depth caps rather than by any
/// timeout: a dispatch always runs to commit or rollback.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum child (and following) dispatches per user transaction.
    ///
    /// The request that would exceed the cap fails with
    /// `MaxChildDispatchesExceeded`; nothing is truncated silently.
    pub max_child_dispatches: usize,

    /// Maximum preceding dispatches per user transaction.
    pub max_preceding_dispatches: usize,

    /// Maximum dispatch nesting depth below the user transaction.
    pub max_nesting_depth: usize,

    /// Account credited with transaction fees.
    pub fee_collector: AccountId,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_child_dispatches: 50,
            max_preceding_dispatches: 3,
            max_nesting_depth: 10,
            fee_collector: AccountId(98),
        }
    }
}

impl DispatchConfig {
    /// Create a config with a custom child dispatch cap.
    pub fn with_max_children(max_child_dispatches: usize) -> Self {
        Self {
            max_child_dispatches,
            ..Default::default()
        }
    }

    /// Flat base fee charged to the payer per user transaction.
    pub fn base_fee(&self, functionality: Functionality) -> u64 {
        match functionality {
            Functionality::Transfer => 10,
            Functionality::CreateAccount => 50,
            Functionality::UpdateAccount => 20,
            Functionality::ContractCall => 100,
            Functionality::WrappedTransfer => 30,
            Functionality::Unknown => 0,
        }
    }
}
