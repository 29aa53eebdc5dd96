//! The externalized record emitted for every dispatch.

use crate::{AccountAmount, AccountId, Functionality, ResponseCode, TransactionId};
use serde::{Deserialize, Serialize};

/// Result of a contract engine invocation, folded into the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractOutcome {
    /// Whether the call succeeded.
    pub success: bool,
    /// Gas consumed by the call.
    pub gas_used: u64,
    /// Return data.
    pub output: Vec<u8>,
    /// Engine-reported error, if any.
    pub error: Option<String>,
}

/// A sealed transaction record.
///
/// One record is externalized per dispatch, in the order preceding < user
/// < child < following, with strictly increasing consensus timestamps.
/// Every non-user record links to its parent's consensus timestamp so
/// consumers can reconstruct the nesting tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction identity; nested dispatches share the user's payer and
    /// valid-start with an incremented nonce.
    pub transaction_id: TransactionId,
    /// Assigned consensus timestamp, nanoseconds since epoch.
    pub consensus_nanos: i64,
    /// Consensus timestamp of the parent record; `None` for the user record.
    pub parent_consensus_nanos: Option<i64>,
    /// Final status of the dispatch.
    pub status: ResponseCode,
    /// Functionality that was dispatched.
    pub functionality: Functionality,
    /// Balance adjustments applied. Fee entries come first and survive a
    /// rollback; all other adjustments are dropped when the dispatch rolls
    /// back.
    pub transfers: Vec<AccountAmount>,
    /// Account created or finalized by this dispatch, if any.
    pub created_account: Option<AccountId>,
    /// Contract engine outcome, if the dispatch invoked it.
    pub contract_outcome: Option<ContractOutcome>,
    /// Fee charged to the payer for this dispatch.
    pub fee_charged: u64,
}
