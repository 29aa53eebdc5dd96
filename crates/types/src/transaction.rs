//! Transaction bodies, signature maps, and the parsed transaction view.
//!
//! The wire format itself is a collaborator concern; signed transaction
//! bytes are a bincode encoding of [`SignedTransaction`], and signatures
//! cover the encoded body bytes.

use crate::{
    AccountId, Address, Key, NodeId, PublicKey, ResponseCode, Signature, TransactionId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transaction kind, used to select the handler for a dispatch.
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
pub enum Functionality {
    /// Move balance between accounts, possibly lazily creating accounts
    /// for alias credits.
    Transfer,
    /// Create a new account.
    CreateAccount,
    /// Update an existing account's key or flags.
    UpdateAccount,
    /// Invoke the external contract engine.
    ContractCall,
    /// An externally-signed payload wrapping a transfer; the embedded
    /// transfer is dispatched as a child.
    WrappedTransfer,
    /// Unparseable transaction; appears only in failure records.
    Unknown,
}

/// One balance adjustment in a transfer list; debits are negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct AccountAmount {
    /// The adjusted account.
    pub account: AccountId,
    /// Signed amount; the full list must net to zero.
    pub amount: i64,
}

/// A credit addressed to an implicit address rather than an account id.
///
/// If no account is linked to the address yet, handling lazily creates a
/// hollow account for it via a child dispatch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct AliasCredit {
    /// Target implicit address.
    pub address: Address,
    /// Amount credited; always positive.
    pub amount: i64,
}

/// Balance movement between accounts.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TransferBody {
    /// Adjustments by account id.
    pub transfers: Vec<AccountAmount>,
    /// Credits by implicit address.
    pub alias_credits: Vec<AliasCredit>,
}

impl TransferBody {
    /// Whether debits and credits (including alias credits) net to zero.
    ///
    /// Sums are taken in i128: an i64 total could wrap on adversarial
    /// amounts and make an unbalanced list look balanced.
    pub fn is_balanced(&self) -> bool {
        let direct: i128 = self.transfers.iter().map(|t| i128::from(t.amount)).sum();
        let alias: i128 = self.alias_credits.iter().map(|c| i128::from(c.amount)).sum();
        direct + alias == 0
    }
}

/// Create a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct CreateAccountBody {
    /// Key of the new account; the sentinel key for hollow creation.
    pub key: Key,
    /// Alias for hollow creation, if any.
    pub alias: Option<Address>,
    /// Initial balance, funded by the payer.
    pub initial_balance: u64,
    /// Whether credits require this account's signature.
    pub receiver_sig_required: bool,
}

/// Update an existing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct UpdateAccountBody {
    /// Account being updated; its current key must authorize the update.
    pub target: AccountId,
    /// Replacement key, if changing.
    pub key: Option<Key>,
    /// New receiver-signature flag, if changing.
    pub receiver_sig_required: Option<bool>,
}

/// Invoke the contract engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct ContractCallBody {
    /// The contract account being called.
    pub contract: AccountId,
    /// Gas limit for the call.
    pub gas: u64,
    /// Value transferred from the payer to the contract.
    pub value: u64,
    /// Opaque call data interpreted by the engine.
    pub call_data: Vec<u8>,
}

/// An externally-signed payload wrapping a transfer.
///
/// The foreign key signs the encoded embedded transfer; the outer payer
/// (relayer) signs the transaction body as usual. The sender account is
/// resolved by the foreign key's implicit address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct WrappedTransferBody {
    /// The foreign sender's primitive key.
    pub sender_key: PublicKey,
    /// Signature by `sender_key` over the encoded embedded transfer.
    pub foreign_signature: Signature,
    /// The embedded transfer, dispatched as a child.
    pub transfer: TransferBody,
}

impl WrappedTransferBody {
    /// The bytes the foreign signature covers.
    pub fn foreign_signing_bytes(&self) -> Vec<u8> {
        // Encoding a TransferBody cannot fail.
        bincode::encode_to_vec(&self.transfer, bincode::config::standard())
            .unwrap_or_default()
    }
}

/// Tagged-variant operation; one handler per variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub enum Operation {
    /// Balance movement.
    Transfer(TransferBody),
    /// Account creation.
    CreateAccount(CreateAccountBody),
    /// Account update.
    UpdateAccount(UpdateAccountBody),
    /// Contract invocation.
    ContractCall(ContractCallBody),
    /// Externally-signed wrapped transfer.
    WrappedTransfer(WrappedTransferBody),
}

impl Operation {
    /// The functionality tag of this operation.
    pub fn functionality(&self) -> Functionality {
        match self {
            Operation::Transfer(_) => Functionality::Transfer,
            Operation::CreateAccount(_) => Functionality::CreateAccount,
            Operation::UpdateAccount(_) => Functionality::UpdateAccount,
            Operation::ContractCall(_) => Functionality::ContractCall,
            Operation::WrappedTransfer(_) => Functionality::WrappedTransfer,
        }
    }
}

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TransactionBody {
    /// Transaction identity chosen by the payer.
    pub transaction_id: TransactionId,
    /// Node the transaction was submitted through.
    pub node_id: NodeId,
    /// Free-form memo.
    pub memo: String,
    /// The operation to execute.
    pub operation: Operation,
}

impl TransactionBody {
    /// The functionality tag of this body.
    pub fn functionality(&self) -> Functionality {
        self.operation.functionality()
    }

    /// Encode the body; these are the bytes signatures cover.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::encode_to_vec(self, bincode::config::standard()).unwrap_or_default()
    }
}

/// A public key together with its signature over the body bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct SignaturePair {
    /// The signing key.
    pub public_key: PublicKey,
    /// Signature over the body bytes.
    pub signature: Signature,
}

/// All signatures submitted with a transaction.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct SignatureMap {
    /// Key/signature pairs; order is as submitted.
    pub pairs: Vec<SignaturePair>,
}

/// The outermost wire shape: encoded body plus signature map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct SignedTransaction {
    /// Encoded [`TransactionBody`].
    pub body_bytes: Vec<u8>,
    /// Signatures over `body_bytes`.
    pub sig_map: SignatureMap,
}

impl SignedTransaction {
    /// Build a signed transaction from a body and pre-computed signatures.
    pub fn new(body: &TransactionBody, sig_map: SignatureMap) -> Self {
        Self {
            body_bytes: body.to_bytes(),
            sig_map,
        }
    }

    /// Encode to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::encode_to_vec(self, bincode::config::standard()).unwrap_or_default()
    }
}

/// Malformed transaction bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The outer envelope or the body failed to decode.
    #[error("malformed transaction bytes")]
    Malformed,
}

impl ParseError {
    /// The response code recorded for this failure.
    pub fn response_code(&self) -> ResponseCode {
        ResponseCode::InvalidTransaction
    }
}

/// Immutable parsed view of one consensus transaction.
///
/// Created once per consensus transaction; read-only thereafter.
#[derive(Debug, Clone)]
pub struct TransactionInfo {
    /// Parsed body.
    pub body: TransactionBody,
    /// Raw signed bytes as delivered by consensus.
    pub signed_bytes: Vec<u8>,
    /// Signature map from the envelope.
    pub sig_map: SignatureMap,
    /// Functionality tag of the body.
    pub functionality: Functionality,
    /// Payer account, from the transaction id.
    pub payer: AccountId,
}

impl TransactionInfo {
    /// Parse raw signed transaction bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let (envelope, _): (SignedTransaction, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|_| ParseError::Malformed)?;
        let (body, _): (TransactionBody, usize) =
            bincode::decode_from_slice(&envelope.body_bytes, bincode::config::standard())
                .map_err(|_| ParseError::Malformed)?;
        Ok(Self {
            functionality: body.functionality(),
            payer: body.transaction_id.payer,
            body,
            signed_bytes: bytes.to_vec(),
            sig_map: envelope.sig_map,
        })
    }

    /// The bytes signatures in the map cover.
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body.to_bytes()
    }

    /// Hash of the raw signed bytes, identifying this transaction in logs.
    pub fn hash(&self) -> crate::Hash {
        crate::Hash::from_bytes(&self.signed_bytes)
    }
}

/// A transaction together with its agreed position in the total order.
#[derive(Debug, Clone)]
pub struct ConsensusTransaction {
    /// Consensus-assigned timestamp, nanoseconds since epoch.
    pub consensus_nanos: i64,
    /// Opaque signed transaction bytes.
    pub bytes: Vec<u8>,
    /// Node that submitted the transaction.
    pub submitting_node: NodeId,
}
