//! Shared fixtures for pipeline and handler tests.

use unison_state::StateStore;
use unison_types::{
    Account, AccountAmount, AccountId, Key, KeyPair, NodeId, Operation, SignatureMap,
    SignaturePair, SignedTransaction, TransactionBody, TransactionId, TransferBody,
};

/// The fee collector account id used by test genesis states.
pub const FEE_COLLECTOR: AccountId = AccountId(98);

/// Deterministic keypair from a one-byte seed.
pub fn keypair(seed: u8) -> KeyPair {
    KeyPair::from_seed(&[seed; 32])
}

/// Primitive key from a one-byte seed.
pub fn ed25519_key(seed: u8) -> Key {
    Key::Ed25519(keypair(seed).public_key())
}

/// A funded account keyed by `keypair(seed)`.
pub fn funded_account(id: u64, seed: u8, balance: u64) -> Account {
    Account::new(AccountId(id), ed25519_key(seed), balance)
}

/// A genesis store holding the given `(id, key seed, balance)` accounts
/// plus the fee collector.
pub fn genesis(accounts: &[(u64, u8, u64)]) -> StateStore {
    let mut store = StateStore::new();
    store.put_account(Account::new(FEE_COLLECTOR, ed25519_key(0), 0));
    for &(id, seed, balance) in accounts {
        store.put_account(funded_account(id, seed, balance));
    }
    store
}

/// A transaction body with the given payer and operation.
pub fn body(payer: u64, valid_start_nanos: u64, operation: Operation) -> TransactionBody {
    TransactionBody {
        transaction_id: TransactionId::new(AccountId(payer), valid_start_nanos),
        node_id: NodeId(0),
        memo: String::new(),
        operation,
    }
}

/// A plain transfer operation over `(account, amount)` adjustments.
pub fn transfer_op(adjustments: &[(u64, i64)]) -> Operation {
    Operation::Transfer(TransferBody {
        transfers: adjustments
            .iter()
            .map(|&(account, amount)| AccountAmount {
                account: AccountId(account),
                amount,
            })
            .collect(),
        alias_credits: vec![],
    })
}

/// Sign a body with every given keypair and encode the envelope.
pub fn sign(body: &TransactionBody, signers: &[&KeyPair]) -> Vec<u8> {
    let body_bytes = body.to_bytes();
    let sig_map = SignatureMap {
        pairs: signers
            .iter()
            .map(|kp| SignaturePair {
                public_key: kp.public_key(),
                signature: kp.sign(&body_bytes),
            })
            .collect(),
    };
    SignedTransaction::new(body, sig_map).to_bytes()
}
