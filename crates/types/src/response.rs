//! Response codes carried by every sealed record.

use serde::{Deserialize, Serialize};

/// Outcome of one dispatch, externalized in its record.
///
/// Codes fall into three classes: pre-check failures (detected before any
/// state mutation), business-rule failures (detected during execution,
/// rolling back only the failing dispatch), and resource-exhaustion
/// failures (structural back-pressure on nesting).
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
pub enum ResponseCode {
    /// The dispatch committed.
    Ok,

    // Pre-check failures.
    /// The transaction bytes could not be parsed, or carried an amount
    /// the ledger's arithmetic cannot represent.
    InvalidTransaction,
    /// The payer account does not exist.
    PayerAccountNotFound,
    /// The payer account is deleted.
    PayerAccountDeleted,
    /// The payer account has no usable key.
    KeyRequired,
    /// A required signature did not verify.
    InvalidSignature,
    /// The payer cannot cover the transaction fee.
    InsufficientPayerBalance,

    // Business-rule failures.
    /// A referenced account does not exist.
    AccountNotFound,
    /// A referenced account is deleted.
    AccountDeleted,
    /// A debited account cannot cover the transfer.
    InsufficientBalance,
    /// Transfer amounts do not net to zero.
    UnbalancedTransfer,
    /// The operation is not permitted by the target's key.
    Unauthorized,
    /// The requested alias is already linked to an account.
    AliasAlreadyInUse,
    /// The target of a contract call is not a contract account.
    InvalidContract,
    /// The contract engine reported failure.
    ContractExecutionFailed,

    // Resource exhaustion.
    /// The per-transaction child dispatch cap was exceeded.
    MaxChildDispatchesExceeded,
    /// The per-transaction preceding dispatch cap was exceeded.
    MaxPrecedingDispatchesExceeded,
    /// The dispatch nesting depth cap was exceeded.
    MaxNestingDepthExceeded,
}

impl ResponseCode {
    /// Whether this code represents a committed dispatch.
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseCode::Ok)
    }
}
