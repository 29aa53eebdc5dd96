//! The end-to-end transaction pipeline.
//!
//! One pipeline instance owns the durable store, the verification pool,
//! and the contract engine, and processes consensus transactions strictly
//! in consensus order: pre-handle (speculative, possibly ahead of time),
//! signature gate, fee charge, dispatch execution, hollow completion,
//! record sealing. Every stage after pre-handle is deterministic given the
//! store contents and the transaction bytes.

use crate::dispatch::{execute, Dispatch, DispatchLevel, DispatchState, HandleContext};
use crate::prehandle::{PreHandleEvaluator, PreHandleResult};
use crate::records::RecordListBuilder;
use crate::verifier::{KeyVerifier, VerificationPool};
use crate::{ContractEngine, DispatchConfig, HollowAccountCompleter, NoContractEngine};
use tracing::{debug, trace};
use unison_state::{SavepointStack, StateReader, StateStore};
use unison_types::{
    AccountId, ConsensusTransaction, Functionality, ResponseCode, TransactionId,
    TransactionRecord,
};

/// Deterministic transaction processor for one replica.
pub struct TransactionPipeline {
    config: DispatchConfig,
    store: StateStore,
    pool: VerificationPool,
    engine: Box<dyn ContractEngine>,
    evaluator: PreHandleEvaluator,
}

impl TransactionPipeline {
    /// Create a pipeline over a genesis store, without contract support.
    pub fn new(config: DispatchConfig, store: StateStore) -> Self {
        Self::with_engine(config, store, Box::new(NoContractEngine))
    }

    /// Create a pipeline with a contract engine.
    pub fn with_engine(
        config: DispatchConfig,
        store: StateStore,
        engine: Box<dyn ContractEngine>,
    ) -> Self {
        Self {
            config,
            store,
            pool: VerificationPool::new(),
            engine,
            evaluator: PreHandleEvaluator,
        }
    }

    /// The durable store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Mutable store access, for genesis setup.
    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    /// Speculatively pre-handle raw transaction bytes.
    ///
    /// Safe to call from any point before the transaction's turn in
    /// consensus order; signature verification starts immediately. The
    /// result is passed back to [`handle`](Self::handle), which discards
    /// it if state moved underneath it.
    pub fn pre_handle(&mut self, bytes: &[u8]) -> PreHandleResult {
        self.evaluator
            .evaluate(bytes, &self.store, self.store.version(), &mut self.pool)
    }

    /// Evict cached verification work at a round boundary.
    pub fn end_round(&mut self) {
        self.pool.drain();
    }

    /// Process one consensus-ordered transaction to its records.
    ///
    /// Never fails: every outcome, including garbage bytes, is expressed
    /// as a sealed record stream.
    pub fn handle(
        &mut self,
        txn: &ConsensusTransaction,
        cached: Option<PreHandleResult>,
    ) -> Vec<TransactionRecord> {
        // A cached result is only current if nothing has committed since
        // it was computed.
        let prehandle = match cached {
            Some(result) if result.state_version == self.store.version() => result,
            stale => {
                if stale.is_some() {
                    trace!("cached pre-handle is stale, re-evaluating");
                }
                self.evaluator.evaluate(
                    &txn.bytes,
                    &self.store,
                    self.store.version(),
                    &mut self.pool,
                )
            }
        };

        let (user_id, functionality) = match &prehandle.txn_info {
            Some(info) => {
                trace!(txn = %info.hash(), functionality = ?info.functionality, "handling");
                (info.body.transaction_id, info.functionality)
            }
            None => (
                TransactionId::new(AccountId(0), 0),
                Functionality::Unknown,
            ),
        };
        let mut records = RecordListBuilder::new(user_id, functionality, &self.config);
        let verifier = KeyVerifier::new(prehandle.verifications.clone());

        if !prehandle.is_so_far_so_good() {
            let code = prehandle.response_code();
            debug!(code = ?code, "transaction failed pre-checks");
            records.builder_mut(records.user_index()).set_status(code);
            // The payer is metered even for a doomed transaction, as long
            // as it exists and authorized the submission.
            if self.payer_authorized(&prehandle, &verifier) {
                let _ = self.charge_fee(user_id.payer, functionality, &mut records);
            }
            return records.build(txn.consensus_nanos);
        }

        if !self.signatures_satisfied(&prehandle, &verifier) {
            records
                .builder_mut(records.user_index())
                .set_status(ResponseCode::InvalidSignature);
            let _ = self.charge_fee(user_id.payer, functionality, &mut records);
            return records.build(txn.consensus_nanos);
        }

        if let Err(code) = self.charge_fee(user_id.payer, functionality, &mut records) {
            records.builder_mut(records.user_index()).set_status(code);
            return records.build(txn.consensus_nanos);
        }

        // The parse succeeded, so txn_info is present on this path.
        let Some(info) = &prehandle.txn_info else {
            records
                .builder_mut(records.user_index())
                .set_status(ResponseCode::InvalidTransaction);
            return records.build(txn.consensus_nanos);
        };

        let mut dispatch = Dispatch::new(
            info.body.clone(),
            user_id.payer,
            DispatchLevel::User,
            records.user_index(),
            0,
        );
        dispatch.state = DispatchState::PreHandled;
        let mut stack = SavepointStack::new(&mut self.store);
        let mut ctx = HandleContext {
            stack: &mut stack,
            records: &mut records,
            verifier: &verifier,
            engine: &mut *self.engine,
            config: &self.config,
            dispatch: &mut dispatch,
        };

        let outcome = execute(&mut ctx);
        if outcome.is_success() {
            // Completion only rides on a committed user dispatch.
            HollowAccountCompleter.finalize(&prehandle, &mut ctx);
        }

        records.build(txn.consensus_nanos)
    }

    fn payer_authorized(&self, prehandle: &PreHandleResult, verifier: &KeyVerifier) -> bool {
        prehandle
            .payer_key
            .as_ref()
            .is_some_and(|key| verifier.verifies(key))
    }

    fn signatures_satisfied(
        &self,
        prehandle: &PreHandleResult,
        verifier: &KeyVerifier,
    ) -> bool {
        if !self.payer_authorized(prehandle, verifier) {
            return false;
        }
        if !prehandle.required_keys.iter().all(|key| verifier.verifies(key)) {
            return false;
        }
        prehandle
            .required_aliases
            .iter()
            .all(|alias| verifier.verification_for_alias(alias).is_some())
    }

    /// Charge the base fee to the payer in its own durably committed step.
    ///
    /// A payer that cannot cover the full fee is drained of what it has
    /// and the transaction fails with `InsufficientPayerBalance` before
    /// execution; the fee entries survive in the user record either way.
    fn charge_fee(
        &mut self,
        payer: AccountId,
        functionality: Functionality,
        records: &mut RecordListBuilder,
    ) -> Result<(), ResponseCode> {
        let fee = self.config.base_fee(functionality);
        if fee == 0 {
            return Ok(());
        }
        let mut stack = SavepointStack::new(&mut self.store);
        stack.push();

        let Some(mut payer_account) = stack.account(payer) else {
            stack.rollback();
            return Err(ResponseCode::PayerAccountNotFound);
        };
        let charged = fee.min(payer_account.balance);
        payer_account.balance -= charged;
        stack.put_account(payer_account);

        if let Some(mut collector) = stack.account(self.config.fee_collector) {
            collector.balance += charged;
            stack.put_account(collector);
        }
        stack.commit();

        let builder = records.builder_mut(records.user_index());
        builder.add_fee_transfer(payer, -(charged as i64));
        builder.add_fee_transfer(self.config.fee_collector, charged as i64);
        builder.set_fee_charged(charged);

        if charged < fee {
            debug!(fee, charged, "payer could not cover the fee");
            Err(ResponseCode::InsufficientPayerBalance)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unison_test_helpers::{
        body, ed25519_key, genesis, keypair, sign, transfer_op, FEE_COLLECTOR,
    };
    use unison_types::{
        Account, Address, AliasCredit, CreateAccountBody, Key, Operation, TransferBody,
        WrappedTransferBody,
    };

    fn consensus(bytes: Vec<u8>, nanos: i64) -> ConsensusTransaction {
        ConsensusTransaction {
            consensus_nanos: nanos,
            bytes,
            submitting_node: unison_types::NodeId(0),
        }
    }

    fn pipeline(accounts: &[(u64, u8, u64)]) -> TransactionPipeline {
        TransactionPipeline::new(DispatchConfig::default(), genesis(accounts))
    }

    #[test]
    fn test_successful_transfer_produces_one_record() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, 0)]);
        let payer = keypair(1);
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1001, -100), (1002, 100)])),
            &[&payer],
        );

        let cached = pipeline.pre_handle(&bytes);
        let records = pipeline.handle(&consensus(bytes, 7_000), Some(cached));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ResponseCode::Ok);
        assert_eq!(records[0].consensus_nanos, 7_000);
        assert_eq!(records[0].fee_charged, 10);
        // Fee debit, fee credit, then the two transfer adjustments.
        assert_eq!(records[0].transfers.len(), 4);

        let store = pipeline.store();
        assert_eq!(store.account(AccountId(1001)).unwrap().balance, 890);
        assert_eq!(store.account(AccountId(1002)).unwrap().balance, 100);
        assert_eq!(store.account(FEE_COLLECTOR).unwrap().balance, 10);
    }

    #[test]
    fn test_handle_without_cached_prehandle() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, 0)]);
        let payer = keypair(1);
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1001, -10), (1002, 10)])),
            &[&payer],
        );

        let records = pipeline.handle(&consensus(bytes, 7_000), None);
        assert_eq!(records[0].status, ResponseCode::Ok);
    }

    #[test]
    fn test_garbage_bytes_yield_failure_record_without_charge() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000)]);
        let records = pipeline.handle(&consensus(vec![0xff, 0x13], 9_000), None);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ResponseCode::InvalidTransaction);
        assert_eq!(records[0].fee_charged, 0);
        assert_eq!(pipeline.store().account(AccountId(1001)).unwrap().balance, 1_000);
    }

    #[test]
    fn test_missing_signature_charges_fee_but_does_not_execute() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, 500)]);
        let payer = keypair(1);
        // The non-payer debit requires account 1002's key, which did not
        // sign.
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1002, -100), (1001, 100)])),
            &[&payer],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records[0].status, ResponseCode::InvalidSignature);
        assert_eq!(records[0].fee_charged, 10);

        let store = pipeline.store();
        assert_eq!(store.account(AccountId(1001)).unwrap().balance, 990);
        assert_eq!(store.account(AccountId(1002)).unwrap().balance, 500);
    }

    #[test]
    fn test_unsigned_payer_is_not_charged() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, 0)]);
        let stranger = keypair(9);
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1001, -10), (1002, 10)])),
            &[&stranger],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records[0].status, ResponseCode::InvalidSignature);
        assert_eq!(records[0].fee_charged, 0);
        assert_eq!(pipeline.store().account(AccountId(1001)).unwrap().balance, 1_000);
    }

    #[test]
    fn test_fee_shortfall_drains_payer_and_skips_execution() {
        // Transfer fee is 10; the payer holds 7.
        let mut pipeline = pipeline(&[(1001, 1, 7), (1002, 2, 0)]);
        let payer = keypair(1);
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1001, -1), (1002, 1)])),
            &[&payer],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records[0].status, ResponseCode::InsufficientPayerBalance);
        assert_eq!(records[0].fee_charged, 7);

        let store = pipeline.store();
        assert_eq!(store.account(AccountId(1001)).unwrap().balance, 0);
        assert_eq!(store.account(FEE_COLLECTOR).unwrap().balance, 7);
        assert_eq!(store.account(AccountId(1002)).unwrap().balance, 0);
    }

    #[test]
    fn test_failed_execution_still_charges_fee() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, 5)]);
        let payer = keypair(1);
        let sender = keypair(2);
        // 1002 signed but cannot cover the transfer.
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1002, -100), (1001, 100)])),
            &[&payer, &sender],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records[0].status, ResponseCode::InsufficientBalance);
        assert_eq!(records[0].fee_charged, 10);
        // Only the fee entries survive the rollback.
        assert_eq!(records[0].transfers.len(), 2);

        let store = pipeline.store();
        assert_eq!(store.account(AccountId(1001)).unwrap().balance, 990);
        assert_eq!(store.account(AccountId(1002)).unwrap().balance, 5);
    }

    #[test]
    fn test_stale_prehandle_is_discarded() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, 100)]);
        let payer = keypair(1);
        let sender = keypair(2);

        // Pre-handle a transfer that drains 1002, then commit another
        // transaction that moves 1002's balance first.
        let drain = sign(
            &body(1001, 60, transfer_op(&[(1002, -100), (1001, 100)])),
            &[&payer, &sender],
        );
        let cached = pipeline.pre_handle(&drain);

        let spend = sign(
            &body(1001, 50, transfer_op(&[(1001, -1), (1002, 1)])),
            &[&payer],
        );
        pipeline.handle(&consensus(spend, 7_000), None);

        // The cached result's version no longer matches; handle must
        // re-evaluate and still see consistent state.
        assert_ne!(cached.state_version, pipeline.store().version());
        let records = pipeline.handle(&consensus(drain, 8_000), Some(cached));
        assert_eq!(records[0].status, ResponseCode::Ok);
        assert_eq!(pipeline.store().account(AccountId(1002)).unwrap().balance, 1);
    }

    #[test]
    fn test_alias_credit_lazily_creates_hollow_account() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000)]);
        let payer = keypair(1);
        let owner = keypair(7);
        let alias = Address::of(&owner.public_key());
        let op = Operation::Transfer(TransferBody {
            transfers: vec![unison_types::AccountAmount {
                account: AccountId(1001),
                amount: -40,
            }],
            alias_credits: vec![AliasCredit { address: alias, amount: 40 }],
        });
        let bytes = sign(&body(1001, 50, op), &[&payer]);

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        // Creation child record follows the user record.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, ResponseCode::Ok);
        assert_eq!(records[1].status, ResponseCode::Ok);
        let created = records[1].created_account.unwrap();
        assert_eq!(records[1].parent_consensus_nanos, Some(records[0].consensus_nanos));

        let account = pipeline.store().account(created).unwrap();
        assert!(account.is_hollow());
        assert_eq!(account.balance, 40);
        assert_eq!(pipeline.store().account_id_by_alias(&alias), Some(created));
    }

    #[test]
    fn test_hollow_debit_completes_account_with_preceding_record() {
        let owner = keypair(7);
        let alias = Address::of(&owner.public_key());
        let mut store = genesis(&[(1001, 1, 1_000), (1003, 3, 0)]);
        let mut hollow = Account::hollow(AccountId(1002), alias);
        hollow.balance = 200;
        store.put_account(hollow);
        let mut pipeline = TransactionPipeline::new(DispatchConfig::default(), store);

        let payer = keypair(1);
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1002, -60), (1003, 60)])),
            &[&payer, &owner],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records.len(), 2);
        // The completion record precedes the user record and names the
        // completed account.
        assert!(records[0].consensus_nanos < records[1].consensus_nanos);
        assert_eq!(records[0].created_account, Some(AccountId(1002)));
        assert_eq!(records[1].status, ResponseCode::Ok);

        let completed = pipeline.store().account(AccountId(1002)).unwrap();
        assert!(!completed.is_hollow());
        assert_eq!(completed.key, Key::Ed25519(owner.public_key()));
        assert_eq!(completed.balance, 140);
    }

    #[test]
    fn test_hollow_account_not_completed_when_execution_fails() {
        let owner = keypair(7);
        let alias = Address::of(&owner.public_key());
        let mut store = genesis(&[(1001, 1, 1_000), (1003, 3, 0)]);
        store.put_account(Account::hollow(AccountId(1002), alias));
        let mut pipeline = TransactionPipeline::new(DispatchConfig::default(), store);

        let payer = keypair(1);
        // Debit exceeds the hollow account's balance.
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1002, -60), (1003, 60)])),
            &[&payer, &owner],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ResponseCode::InsufficientBalance);
        assert!(pipeline.store().account(AccountId(1002)).unwrap().is_hollow());
    }

    #[test]
    fn test_wrapped_transfer_dispatches_child_and_completes_sender() {
        let relayer = keypair(1);
        let foreign = keypair(8);
        let alias = Address::of(&foreign.public_key());
        let mut store = genesis(&[(1001, 1, 1_000), (1003, 3, 0)]);
        let mut sender = Account::hollow(AccountId(1002), alias);
        sender.balance = 500;
        store.put_account(sender);
        let mut pipeline = TransactionPipeline::new(DispatchConfig::default(), store);

        let transfer = TransferBody {
            transfers: vec![
                unison_types::AccountAmount {
                    account: AccountId(1002),
                    amount: -75,
                },
                unison_types::AccountAmount {
                    account: AccountId(1003),
                    amount: 75,
                },
            ],
            alias_credits: vec![],
        };
        let mut wrapped = WrappedTransferBody {
            sender_key: foreign.public_key(),
            foreign_signature: unison_types::Signature(Vec::new()),
            transfer,
        };
        wrapped.foreign_signature = foreign.sign(&wrapped.foreign_signing_bytes());
        let bytes = sign(
            &body(1001, 50, Operation::WrappedTransfer(wrapped)),
            &[&relayer],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        // Completion (preceding), user, embedded transfer (child).
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].created_account, Some(AccountId(1002)));
        assert_eq!(records[1].status, ResponseCode::Ok);
        assert_eq!(records[2].status, ResponseCode::Ok);

        let store = pipeline.store();
        assert!(!store.account(AccountId(1002)).unwrap().is_hollow());
        assert_eq!(store.account(AccountId(1002)).unwrap().balance, 425);
        assert_eq!(store.account(AccountId(1003)).unwrap().balance, 75);
    }

    #[test]
    fn test_overflowing_transfer_amounts_fail_cleanly() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, 0), (1003, 3, 0)]);
        let payer = keypair(1);
        // These amounts wrap an i64 sum to zero; the transfer must be
        // rejected, not executed or panicked on.
        let bytes = sign(
            &body(
                1001,
                50,
                transfer_op(&[(1001, i64::MAX), (1002, i64::MAX), (1003, 2)]),
            ),
            &[&payer],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records[0].status, ResponseCode::UnbalancedTransfer);
        assert_eq!(records[0].fee_charged, 10);

        let store = pipeline.store();
        assert_eq!(store.account(AccountId(1001)).unwrap().balance, 990);
        assert_eq!(store.account(AccountId(1002)).unwrap().balance, 0);
    }

    #[test]
    fn test_credit_overflowing_a_balance_rolls_back() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, u64::MAX)]);
        let payer = keypair(1);
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1001, -1), (1002, 1)])),
            &[&payer],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records[0].status, ResponseCode::InvalidTransaction);

        let store = pipeline.store();
        assert_eq!(store.account(AccountId(1002)).unwrap().balance, u64::MAX);
        // Only the fee left the payer.
        assert_eq!(store.account(AccountId(1001)).unwrap().balance, 990);
    }

    #[test]
    fn test_unrepresentable_initial_balance_fails_cleanly() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000)]);
        let payer = keypair(1);
        let bytes = sign(
            &body(
                1001,
                50,
                Operation::CreateAccount(CreateAccountBody {
                    key: ed25519_key(5),
                    alias: None,
                    initial_balance: i64::MAX as u64 + 1,
                    receiver_sig_required: false,
                }),
            ),
            &[&payer],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records[0].status, ResponseCode::InvalidTransaction);
        assert_eq!(records[0].created_account, None);
        // Only the creation fee left the payer.
        assert_eq!(pipeline.store().account(AccountId(1001)).unwrap().balance, 950);
    }

    #[test]
    fn test_create_account_end_to_end() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000)]);
        let payer = keypair(1);
        let bytes = sign(
            &body(
                1001,
                50,
                Operation::CreateAccount(CreateAccountBody {
                    key: ed25519_key(5),
                    alias: None,
                    initial_balance: 300,
                    receiver_sig_required: false,
                }),
            ),
            &[&payer],
        );

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records[0].status, ResponseCode::Ok);
        let created = records[0].created_account.unwrap();

        let store = pipeline.store();
        assert_eq!(store.account(created).unwrap().balance, 300);
        // Fee of 50 plus the funded balance left the payer.
        assert_eq!(store.account(AccountId(1001)).unwrap().balance, 650);
    }

    #[test]
    fn test_child_cap_fails_the_user_dispatch() {
        let config = DispatchConfig::with_max_children(1);
        let mut pipeline = TransactionPipeline::new(config, genesis(&[(1001, 1, 10_000)]));
        let payer = keypair(1);
        let owner_a = keypair(7);
        let owner_b = keypair(8);
        // Two distinct alias credits need two lazy creations; the cap
        // allows one.
        let op = Operation::Transfer(TransferBody {
            transfers: vec![unison_types::AccountAmount {
                account: AccountId(1001),
                amount: -20,
            }],
            alias_credits: vec![
                AliasCredit {
                    address: Address::of(&owner_a.public_key()),
                    amount: 10,
                },
                AliasCredit {
                    address: Address::of(&owner_b.public_key()),
                    amount: 10,
                },
            ],
        });
        let bytes = sign(&body(1001, 50, op), &[&payer]);

        let records = pipeline.handle(&consensus(bytes, 9_000), None);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].status,
            ResponseCode::MaxChildDispatchesExceeded
        );
        // Only the fee left the payer; the rolled-back creation is gone.
        let store = pipeline.store();
        assert_eq!(
            store.account_id_by_alias(&Address::of(&owner_a.public_key())),
            None
        );
        assert_eq!(store.account(AccountId(1001)).unwrap().balance, 10_000 - 10);
    }

    #[test]
    fn test_round_boundary_drains_pool() {
        let mut pipeline = pipeline(&[(1001, 1, 1_000), (1002, 2, 0)]);
        let payer = keypair(1);
        let bytes = sign(
            &body(1001, 50, transfer_op(&[(1001, -10), (1002, 10)])),
            &[&payer],
        );
        pipeline.pre_handle(&bytes);
        assert!(!pipeline.pool.is_empty());

        pipeline.end_round();
        assert!(pipeline.pool.is_empty());
    }
}
