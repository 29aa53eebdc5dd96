//! Core types for the unison transaction dispatch pipeline.
//!
//! Everything here is plain data: hashes, identifiers, composite keys,
//! transaction bodies, response codes, and the externalized record type.
//! All execution logic lives in `unison-dispatch`.

mod account;
mod crypto;
mod hash;
mod identifiers;
mod keys;
mod record;
mod response;
mod transaction;

pub use account::Account;
pub use crypto::{KeyPair, PublicKey, Signature};
pub use hash::Hash;
pub use identifiers::{AccountId, Address, NodeId, TransactionId};
pub use keys::Key;
pub use record::{ContractOutcome, TransactionRecord};
pub use response::ResponseCode;
pub use transaction::{
    AccountAmount, AliasCredit, ConsensusTransaction, ContractCallBody, CreateAccountBody,
    Functionality, Operation, ParseError, SignatureMap, SignaturePair, SignedTransaction,
    TransactionBody, TransactionInfo, TransferBody, UpdateAccountBody, WrappedTransferBody,
};
