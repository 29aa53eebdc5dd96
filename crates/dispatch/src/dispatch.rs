//! The dispatch state machine and handler-facing context.
//!
//! A dispatch is one unit of atomic execution: its own savepoint frame,
//! its own record, its own terminal status. Handlers never touch the
//! savepoint stack or the record list directly; they go through a
//! [`HandleContext`], which also lets them request nested dispatches. A
//! nested dispatch runs to completion inside its parent, committing its
//! frame into the parent's on success or rolling it back on failure, so a
//! failed child never taints the parent's writes.

use crate::records::{RecordIndex, RecordListBuilder};
use crate::verifier::KeyVerifier;
use crate::{handlers, ContractEngine, DispatchConfig, HandleError};
use tracing::{debug, trace};
use unison_state::{SavepointStack, StateKey, StateReader, StateValue};
use unison_types::{
    Account, AccountId, Address, Operation, ResponseCode, TransactionBody, TransactionId,
};

/// Position of a dispatch in the record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchLevel {
    /// The user transaction itself.
    User,
    /// Runs and is recorded before the user transaction.
    Preceding,
    /// Requested by a handler, recorded after the user transaction.
    Child,
    /// Triggered by the system after the user dispatch resolves.
    Scheduled,
}

/// Lifecycle of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Constructed, not yet evaluated.
    Created,
    /// Pre-handle ran; awaiting execution.
    PreHandled,
    /// Handler running inside an open savepoint frame.
    Executing,
    /// Frame committed; record carries a success status.
    Committed,
    /// Frame discarded; record carries the failure status.
    RolledBack,
}

/// One dispatch in flight.
#[derive(Debug)]
pub struct Dispatch {
    /// The body being executed.
    pub body: TransactionBody,
    /// Account charged for this dispatch (the root payer throughout).
    pub payer: AccountId,
    /// Position in the record stream.
    pub level: DispatchLevel,
    /// This dispatch's record in the arena.
    pub record: RecordIndex,
    /// Nesting depth below the user dispatch.
    pub depth: usize,
    /// Lifecycle state.
    pub state: DispatchState,
}

impl Dispatch {
    /// Construct a freshly created dispatch.
    pub fn new(
        body: TransactionBody,
        payer: AccountId,
        level: DispatchLevel,
        record: RecordIndex,
        depth: usize,
    ) -> Self {
        Self {
            body,
            payer,
            level,
            record,
            depth,
            state: DispatchState::Created,
        }
    }
}

/// Terminal result of a nested dispatch, reported to the requesting
/// handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildOutcome {
    /// Terminal status of the child.
    pub status: ResponseCode,
    /// Account the child created, if any.
    pub created_account: Option<AccountId>,
    /// The child's record, for parent-side annotation.
    pub record: RecordIndex,
}

impl ChildOutcome {
    /// Whether the child committed.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Everything a handler may touch while executing one dispatch.
pub struct HandleContext<'a, 's> {
    pub(crate) stack: &'a mut SavepointStack<'s>,
    pub(crate) records: &'a mut RecordListBuilder,
    pub(crate) verifier: &'a KeyVerifier,
    pub(crate) engine: &'a mut dyn ContractEngine,
    pub(crate) config: &'a DispatchConfig,
    pub(crate) dispatch: &'a mut Dispatch,
}

impl HandleContext<'_, '_> {
    /// The body being executed.
    pub fn body(&self) -> &TransactionBody {
        &self.dispatch.body
    }

    /// The root payer.
    pub fn payer(&self) -> AccountId {
        self.dispatch.payer
    }

    /// This dispatch's level.
    pub fn level(&self) -> DispatchLevel {
        self.dispatch.level
    }

    /// The signature verifier scoped to the user transaction.
    pub fn verifier(&self) -> &KeyVerifier {
        self.verifier
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &DispatchConfig {
        self.config
    }

    /// This dispatch's record index.
    pub fn record_index(&self) -> RecordIndex {
        self.dispatch.record
    }

    /// Mutable access to this dispatch's record builder.
    pub fn record(&mut self) -> &mut crate::RecordBuilder {
        self.records.builder_mut(self.dispatch.record)
    }

    /// Read an account through the open savepoint frames.
    pub fn account(&self, id: AccountId) -> Option<Account> {
        self.stack.account(id)
    }

    /// Resolve an implicit address through the open savepoint frames.
    pub fn account_id_by_alias(&self, address: &Address) -> Option<AccountId> {
        self.stack.account_id_by_alias(address)
    }

    /// Write an account into the current frame.
    pub fn put_account(&mut self, account: Account) {
        self.stack.put_account(account);
    }

    /// Link an implicit address to an account in the current frame.
    pub fn link_alias(&mut self, address: Address, id: AccountId) {
        self.stack.link_alias(address, id);
    }

    /// Write one contract storage cell in the current frame.
    pub fn put_contract_slot(&mut self, contract: AccountId, slot: Vec<u8>, value: Vec<u8>) {
        self.stack.put_contract_slot(contract, slot, value);
    }

    /// Read one entry through the open savepoint frames.
    pub fn read_state(&self, key: &StateKey) -> Option<StateValue> {
        self.stack.read(key)
    }

    /// Allocate the next entity id in the current frame.
    pub fn next_entity_id(&mut self) -> AccountId {
        self.stack.next_entity_id()
    }

    /// Execute one contract-engine call.
    pub fn execute_contract(&mut self, call: crate::EngineCall<'_>) -> crate::EngineOutcome {
        self.engine.execute(call)
    }

    /// Derive a child body reusing the user transaction's identity; the
    /// record list assigns the actual nonce.
    pub fn child_body(&self, operation: Operation) -> TransactionBody {
        TransactionBody {
            transaction_id: TransactionId::new(
                self.dispatch.body.transaction_id.payer,
                self.dispatch.body.transaction_id.valid_start_nanos,
            ),
            node_id: self.dispatch.body.node_id,
            memo: String::new(),
            operation,
        }
    }

    /// Dispatch a child transaction and run it to completion.
    ///
    /// Fails (without running the child) when the nesting depth or the
    /// child record cap would be exceeded; the failed request is charged
    /// to the requesting handler, which decides whether the failure is
    /// fatal for itself.
    pub fn dispatch_child(&mut self, body: TransactionBody) -> Result<ChildOutcome, HandleError> {
        self.dispatch_nested(body, DispatchLevel::Child)
    }

    /// Dispatch a preceding transaction, recorded before the user record.
    pub fn dispatch_preceding(
        &mut self,
        body: TransactionBody,
    ) -> Result<ChildOutcome, HandleError> {
        let depth = self.dispatch.depth + 1;
        if depth > self.config.max_nesting_depth {
            return Err(ResponseCode::MaxNestingDepthExceeded.into());
        }
        let record = self.records.add_preceding(body.functionality())?;
        self.run_nested(body, DispatchLevel::Preceding, record, depth)
    }

    fn dispatch_nested(
        &mut self,
        body: TransactionBody,
        level: DispatchLevel,
    ) -> Result<ChildOutcome, HandleError> {
        let depth = self.dispatch.depth + 1;
        if depth > self.config.max_nesting_depth {
            return Err(ResponseCode::MaxNestingDepthExceeded.into());
        }
        let record =
            self.records
                .add_child(body.functionality(), level, self.dispatch.record)?;
        self.run_nested(body, level, record, depth)
    }

    fn run_nested(
        &mut self,
        body: TransactionBody,
        level: DispatchLevel,
        record: RecordIndex,
        depth: usize,
    ) -> Result<ChildOutcome, HandleError> {
        let mut child = Dispatch::new(body, self.dispatch.payer, level, record, depth);
        child.state = DispatchState::PreHandled;
        let mut ctx = HandleContext {
            stack: &mut *self.stack,
            records: &mut *self.records,
            verifier: self.verifier,
            engine: &mut *self.engine,
            config: self.config,
            dispatch: &mut child,
        };
        Ok(execute(&mut ctx))
    }
}

/// Run one dispatch to its terminal state.
///
/// Opens a savepoint frame, runs the handler, then commits or rolls back.
/// On rollback the record keeps its status and fee entries but loses its
/// state side effects.
pub(crate) fn execute(ctx: &mut HandleContext<'_, '_>) -> ChildOutcome {
    ctx.dispatch.state = DispatchState::Executing;
    ctx.stack.push();
    trace!(
        depth = ctx.dispatch.depth,
        functionality = ?ctx.dispatch.body.functionality(),
        "executing dispatch"
    );

    let record = ctx.dispatch.record;
    match handlers::run(ctx) {
        Ok(()) => {
            ctx.stack.commit();
            ctx.dispatch.state = DispatchState::Committed;
            let builder = ctx.records.builder_mut(record);
            builder.set_status(ResponseCode::Ok);
            ChildOutcome {
                status: ResponseCode::Ok,
                created_account: builder.created_account(),
                record,
            }
        }
        Err(err) => {
            ctx.stack.rollback();
            ctx.dispatch.state = DispatchState::RolledBack;
            debug!(code = ?err.code, depth = ctx.dispatch.depth, "dispatch rolled back");
            let builder = ctx.records.builder_mut(record);
            builder.set_status(err.code);
            builder.nullify_side_effects();
            ChildOutcome {
                status: err.code,
                created_account: None,
                record,
            }
        }
    }
}
