//! Speculative pre-consensus evaluation.
//!
//! Pre-handle runs against a possibly stale snapshot of state, before the
//! transaction's position in the total order is known. It parses the
//! transaction, resolves the payer, gathers every key whose signature the
//! operation will require, and kicks off all signature verifications on
//! the pool. Nothing here mutates state; the result is a cacheable
//! artifact the handle path either reuses or discards.

use crate::verifier::{SignatureVerificationFuture, VerificationPool};
use indexmap::IndexMap;
use tracing::trace;
use unison_state::StateReader;
use unison_types::{
    Account, AccountId, Address, Key, Operation, PublicKey, ResponseCode, TransactionInfo,
};

/// Outcome class of a pre-handle pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreHandleStatus {
    /// Nothing failed yet; execution may still fail at handle time.
    SoFarSoGood,
    /// A pre-check failed; handle will charge and record without executing.
    PreHandleFailure(ResponseCode),
}

/// Everything learned about one transaction before consensus.
#[derive(Debug)]
pub struct PreHandleResult {
    /// Outcome class.
    pub status: PreHandleStatus,
    /// Parsed transaction, when parsing succeeded.
    pub txn_info: Option<TransactionInfo>,
    /// The payer's key, when the payer was resolved.
    pub payer_key: Option<Key>,
    /// Non-payer keys the operation requires signatures for.
    pub required_keys: Vec<Key>,
    /// Implicit addresses that must be proven by a signature, for hollow
    /// account involvement.
    pub required_aliases: Vec<Address>,
    /// In-flight verifications keyed by signing key.
    pub verifications: IndexMap<PublicKey, SignatureVerificationFuture>,
    /// Hollow accounts the operation touches as authorizers; candidates
    /// for completion after a successful handle.
    pub hollow_accounts: Vec<Account>,
    /// Store version the evaluation ran against, for staleness checks.
    pub state_version: u64,
}

impl PreHandleResult {
    fn failure(code: ResponseCode, state_version: u64) -> Self {
        Self {
            status: PreHandleStatus::PreHandleFailure(code),
            txn_info: None,
            payer_key: None,
            required_keys: Vec::new(),
            required_aliases: Vec::new(),
            verifications: IndexMap::new(),
            hollow_accounts: Vec::new(),
            state_version,
        }
    }

    /// The response code this result resolves to so far.
    pub fn response_code(&self) -> ResponseCode {
        match self.status {
            PreHandleStatus::SoFarSoGood => ResponseCode::Ok,
            PreHandleStatus::PreHandleFailure(code) => code,
        }
    }

    /// Whether no pre-check has failed.
    pub fn is_so_far_so_good(&self) -> bool {
        self.status == PreHandleStatus::SoFarSoGood
    }
}

/// Stateless evaluator for the pre-handle pass.
#[derive(Debug, Default)]
pub struct PreHandleEvaluator;

impl PreHandleEvaluator {
    /// Evaluate raw transaction bytes against a state snapshot.
    ///
    /// Verification work for every submitted signature (and any foreign
    /// signature) starts on `pool` before this returns.
    pub fn evaluate(
        &self,
        bytes: &[u8],
        state: &dyn StateReader,
        state_version: u64,
        pool: &mut VerificationPool,
    ) -> PreHandleResult {
        let txn_info = match TransactionInfo::parse(bytes) {
            Ok(info) => info,
            Err(err) => {
                trace!("pre-handle parse failure");
                return PreHandleResult::failure(err.response_code(), state_version);
            }
        };

        let payer = match state.account(txn_info.payer) {
            Some(account) => account,
            None => {
                let mut result =
                    PreHandleResult::failure(ResponseCode::PayerAccountNotFound, state_version);
                result.txn_info = Some(txn_info);
                return result;
            }
        };
        if payer.deleted {
            let mut result =
                PreHandleResult::failure(ResponseCode::PayerAccountDeleted, state_version);
            result.txn_info = Some(txn_info);
            return result;
        }
        if !payer.key.is_usable() {
            // A hollow or keyless payer cannot authorize fees.
            let mut result = PreHandleResult::failure(ResponseCode::KeyRequired, state_version);
            result.txn_info = Some(txn_info);
            return result;
        }

        let mut gather = KeyGather::new(payer.id);
        if let Err(code) = gather.collect(&txn_info.body.operation, state) {
            let mut result = PreHandleResult::failure(code, state_version);
            result.txn_info = Some(txn_info);
            result.payer_key = Some(payer.key);
            return result;
        }

        // Start verification for every submitted signature over the body.
        let body_bytes = txn_info.body_bytes();
        let mut verifications = IndexMap::new();
        for pair in &txn_info.sig_map.pairs {
            let future = pool.submit(pair.public_key, &pair.signature, &body_bytes);
            verifications.insert(pair.public_key, future);
        }
        // A wrapped transfer's foreign signature covers the embedded
        // transfer, not the body.
        if let Operation::WrappedTransfer(wrapped) = &txn_info.body.operation {
            let future = pool.submit(
                wrapped.sender_key,
                &wrapped.foreign_signature,
                &wrapped.foreign_signing_bytes(),
            );
            verifications.insert(wrapped.sender_key, future);
        }

        PreHandleResult {
            status: PreHandleStatus::SoFarSoGood,
            payer_key: Some(payer.key),
            required_keys: gather.required_keys,
            required_aliases: gather.required_aliases,
            verifications,
            hollow_accounts: gather.hollow_accounts,
            state_version,
            txn_info: Some(txn_info),
        }
    }
}

/// Accumulates required keys and hollow candidates for one operation.
struct KeyGather {
    payer: AccountId,
    required_keys: Vec<Key>,
    required_aliases: Vec<Address>,
    hollow_accounts: Vec<Account>,
}

impl KeyGather {
    fn new(payer: AccountId) -> Self {
        Self {
            payer,
            required_keys: Vec::new(),
            required_aliases: Vec::new(),
            hollow_accounts: Vec::new(),
        }
    }

    /// Require either the account's key or, for a hollow account, a
    /// verified signature over its alias.
    fn require_authorization(&mut self, account: Account) {
        if account.id == self.payer {
            return;
        }
        if account.is_hollow() {
            if let Some(alias) = account.alias {
                self.required_aliases.push(alias);
                self.hollow_accounts.push(account);
            }
        } else {
            self.required_keys.push(account.key);
        }
    }

    fn collect(
        &mut self,
        operation: &Operation,
        state: &dyn StateReader,
    ) -> Result<(), ResponseCode> {
        match operation {
            Operation::Transfer(transfer) => {
                for adjustment in &transfer.transfers {
                    let account = state
                        .account(adjustment.account)
                        .ok_or(ResponseCode::AccountNotFound)?;
                    if account.deleted {
                        return Err(ResponseCode::AccountDeleted);
                    }
                    if adjustment.amount < 0 {
                        self.require_authorization(account);
                    } else if account.receiver_sig_required && account.id != self.payer {
                        self.required_keys.push(account.key);
                    }
                }
            }
            Operation::CreateAccount(create) => {
                let hollow_creation = create.key.is_sentinel() && create.alias.is_some();
                if !create.key.is_usable() && !hollow_creation {
                    return Err(ResponseCode::KeyRequired);
                }
            }
            Operation::UpdateAccount(update) => {
                let target = state
                    .account(update.target)
                    .ok_or(ResponseCode::AccountNotFound)?;
                if target.deleted {
                    return Err(ResponseCode::AccountDeleted);
                }
                if let Some(new_key) = &update.key {
                    if !new_key.is_usable() {
                        return Err(ResponseCode::KeyRequired);
                    }
                }
                self.require_authorization(target);
            }
            Operation::ContractCall(_) => {
                // Only the payer authorizes a contract call.
            }
            Operation::WrappedTransfer(wrapped) => {
                self.required_keys.push(Key::Ed25519(wrapped.sender_key));
                // The sender account may still be hollow; its completion
                // rides on the foreign signature.
                let alias = Address::of(&wrapped.sender_key);
                if let Some(id) = state.account_id_by_alias(&alias) {
                    if let Some(account) = state.account(id) {
                        if account.is_hollow() {
                            self.hollow_accounts.push(account);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
