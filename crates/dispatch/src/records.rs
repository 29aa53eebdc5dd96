//! Record accumulation and ordering.
//!
//! Every dispatch gets a [`RecordBuilder`] in an arena owned by the
//! [`RecordListBuilder`], partitioned into four groups: preceding, user
//! (exactly one), child, and following. Building seals the records in the
//! order preceding < user < child < following with strictly increasing
//! consensus timestamps, and links every non-user record to its parent.

use crate::{DispatchConfig, DispatchLevel, HandleError};
use unison_types::{
    AccountAmount, AccountId, ContractOutcome, Functionality, ResponseCode, TransactionId,
    TransactionRecord,
};

/// Index of a record builder in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIndex(usize);

/// Accumulates one record's fields while its dispatch runs.
#[derive(Debug)]
pub struct RecordBuilder {
    transaction_id: TransactionId,
    functionality: Functionality,
    level: DispatchLevel,
    parent: Option<RecordIndex>,
    status: ResponseCode,
    transfers: Vec<AccountAmount>,
    fee_transfers: Vec<AccountAmount>,
    created_account: Option<AccountId>,
    contract_outcome: Option<ContractOutcome>,
    fee_charged: u64,
}

impl RecordBuilder {
    fn new(
        transaction_id: TransactionId,
        functionality: Functionality,
        level: DispatchLevel,
        parent: Option<RecordIndex>,
    ) -> Self {
        Self {
            transaction_id,
            functionality,
            level,
            parent,
            status: ResponseCode::Ok,
            transfers: Vec::new(),
            fee_transfers: Vec::new(),
            created_account: None,
            contract_outcome: None,
            fee_charged: 0,
        }
    }

    /// The pre-assigned transaction identity of this record.
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// The dispatch level this record belongs to.
    pub fn level(&self) -> DispatchLevel {
        self.level
    }

    /// Current status.
    pub fn status(&self) -> ResponseCode {
        self.status
    }

    /// Set the final status.
    pub fn set_status(&mut self, status: ResponseCode) {
        self.status = status;
    }

    /// Append one balance adjustment.
    pub fn add_transfer(&mut self, account: AccountId, amount: i64) {
        self.transfers.push(AccountAmount { account, amount });
    }

    /// Append one fee adjustment; fee entries survive a rollback since the
    /// fee is charged in its own committed step.
    pub fn add_fee_transfer(&mut self, account: AccountId, amount: i64) {
        self.fee_transfers.push(AccountAmount { account, amount });
    }

    /// Record the account created or finalized by this dispatch.
    pub fn set_created_account(&mut self, account: AccountId) {
        self.created_account = Some(account);
    }

    /// The created account, if any.
    pub fn created_account(&self) -> Option<AccountId> {
        self.created_account
    }

    /// Fold in a contract engine outcome.
    pub fn set_contract_outcome(&mut self, outcome: ContractOutcome) {
        self.contract_outcome = Some(outcome);
    }

    /// Record the fee charged to the payer.
    pub fn set_fee_charged(&mut self, fee: u64) {
        self.fee_charged = fee;
    }

    /// Drop state side effects after a rollback. The status, fee entries,
    /// and contract outcome stay; transfers and created entities did not
    /// happen.
    pub fn nullify_side_effects(&mut self) {
        self.transfers.clear();
        self.created_account = None;
    }

    fn seal(self, consensus_nanos: i64, parent_consensus_nanos: Option<i64>) -> TransactionRecord {
        let mut transfers = self.fee_transfers;
        transfers.extend(self.transfers);
        TransactionRecord {
            transaction_id: self.transaction_id,
            consensus_nanos,
            parent_consensus_nanos,
            status: self.status,
            functionality: self.functionality,
            transfers,
            created_account: self.created_account,
            contract_outcome: self.contract_outcome,
            fee_charged: self.fee_charged,
        }
    }
}

/// Owns the record builders for one user transaction.
#[derive(Debug)]
pub struct RecordListBuilder {
    builders: Vec<RecordBuilder>,
    preceding: Vec<RecordIndex>,
    user: RecordIndex,
    children: Vec<RecordIndex>,
    following: Vec<RecordIndex>,
    user_id: TransactionId,
    next_nonce: u32,
    max_children: usize,
    max_preceding: usize,
}

impl RecordListBuilder {
    /// Create the list with its single user record.
    pub fn new(
        user_id: TransactionId,
        functionality: Functionality,
        config: &DispatchConfig,
    ) -> Self {
        let user_builder =
            RecordBuilder::new(user_id, functionality, DispatchLevel::User, None);
        Self {
            builders: vec![user_builder],
            preceding: Vec::new(),
            user: RecordIndex(0),
            children: Vec::new(),
            following: Vec::new(),
            user_id,
            next_nonce: 1,
            max_children: config.max_child_dispatches,
            max_preceding: config.max_preceding_dispatches,
        }
    }

    /// Index of the user record.
    pub fn user_index(&self) -> RecordIndex {
        self.user
    }

    /// Borrow a builder.
    pub fn builder(&self, index: RecordIndex) -> &RecordBuilder {
        &self.builders[index.0]
    }

    /// Mutably borrow a builder.
    pub fn builder_mut(&mut self, index: RecordIndex) -> &mut RecordBuilder {
        &mut self.builders[index.0]
    }

    /// Total number of records accumulated so far.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Whether only the user record exists.
    pub fn is_empty(&self) -> bool {
        self.builders.len() == 1
    }

    fn next_id(&mut self) -> TransactionId {
        let id = self.user_id.with_nonce(self.next_nonce);
        self.next_nonce += 1;
        id
    }

    /// Open a preceding record. Fails the requesting dispatch when the
    /// preceding cap is reached.
    pub fn add_preceding(
        &mut self,
        functionality: Functionality,
    ) -> Result<RecordIndex, HandleError> {
        if self.preceding.len() >= self.max_preceding {
            return Err(ResponseCode::MaxPrecedingDispatchesExceeded.into());
        }
        let id = self.next_id();
        let index = RecordIndex(self.builders.len());
        self.builders.push(RecordBuilder::new(
            id,
            functionality,
            DispatchLevel::Preceding,
            Some(self.user),
        ));
        self.preceding.push(index);
        Ok(index)
    }

    /// Open a child record nested under `parent`. Fails the requesting
    /// dispatch when the child cap is reached.
    pub fn add_child(
        &mut self,
        functionality: Functionality,
        level: DispatchLevel,
        parent: RecordIndex,
    ) -> Result<RecordIndex, HandleError> {
        if self.children.len() + self.following.len() >= self.max_children {
            return Err(ResponseCode::MaxChildDispatchesExceeded.into());
        }
        let id = self.next_id();
        let index = RecordIndex(self.builders.len());
        self.builders
            .push(RecordBuilder::new(id, functionality, level, Some(parent)));
        self.children.push(index);
        Ok(index)
    }

    /// Open a following record. Counts against the child cap.
    pub fn add_following(
        &mut self,
        functionality: Functionality,
    ) -> Result<RecordIndex, HandleError> {
        if self.children.len() + self.following.len() >= self.max_children {
            return Err(ResponseCode::MaxChildDispatchesExceeded.into());
        }
        let id = self.next_id();
        let index = RecordIndex(self.builders.len());
        self.builders.push(RecordBuilder::new(
            id,
            functionality,
            DispatchLevel::Scheduled,
            Some(self.user),
        ));
        self.following.push(index);
        Ok(index)
    }

    /// Seal all records in emission order: preceding (creation order) <
    /// user < child (creation, depth-first order) < following, with
    /// strictly increasing timestamps derived from the user transaction's
    /// consensus time. Every non-user record links to its parent's
    /// assigned timestamp.
    pub fn build(self, user_consensus_nanos: i64) -> Vec<TransactionRecord> {
        let preceding_count = self.preceding.len() as i64;
        let emission: Vec<RecordIndex> = self
            .preceding
            .iter()
            .chain(std::iter::once(&self.user))
            .chain(self.children.iter())
            .chain(self.following.iter())
            .copied()
            .collect();

        // First pass: assign a timestamp to every arena slot.
        let mut assigned = vec![0i64; self.builders.len()];
        for (position, index) in emission.iter().enumerate() {
            let offset = position as i64 - preceding_count;
            assigned[index.0] = user_consensus_nanos + offset;
        }

        // Second pass: seal in emission order, wiring parent links.
        let mut builders: Vec<Option<RecordBuilder>> =
            self.builders.into_iter().map(Some).collect();
        emission
            .into_iter()
            .filter_map(|index| {
                let builder = builders[index.0].take()?;
                let parent_nanos = builder.parent.map(|p| assigned[p.0]);
                Some(builder.seal(assigned[index.0], parent_nanos))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unison_types::AccountId;

    fn builder_with_caps(max_children: usize, max_preceding: usize) -> RecordListBuilder {
        let config = DispatchConfig {
            max_child_dispatches: max_children,
            max_preceding_dispatches: max_preceding,
            ..Default::default()
        };
        RecordListBuilder::new(
            TransactionId::new(AccountId(1001), 7_000),
            Functionality::Transfer,
            &config,
        )
    }

    #[test]
    fn test_single_user_record_at_offset_zero() {
        let list = builder_with_caps(10, 3);
        let records = list.build(1_000_000);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].consensus_nanos, 1_000_000);
        assert_eq!(records[0].parent_consensus_nanos, None);
        assert_eq!(records[0].transaction_id.nonce, 0);
    }

    #[test]
    fn test_each_group_keeps_its_own_level() {
        let mut list = builder_with_caps(10, 3);
        let preceding = list.add_preceding(Functionality::UpdateAccount).unwrap();
        let child = list
            .add_child(Functionality::Transfer, DispatchLevel::Child, list.user_index())
            .unwrap();
        let following = list.add_following(Functionality::Transfer).unwrap();

        assert_eq!(list.builder(list.user_index()).level(), DispatchLevel::User);
        assert_eq!(list.builder(preceding).level(), DispatchLevel::Preceding);
        assert_eq!(list.builder(child).level(), DispatchLevel::Child);
        assert_eq!(list.builder(following).level(), DispatchLevel::Scheduled);
    }

    #[test]
    fn test_emission_order_and_strictly_increasing_timestamps() {
        let mut list = builder_with_caps(10, 3);
        list.add_child(Functionality::CreateAccount, DispatchLevel::Child, RecordIndex(0))
            .unwrap();
        list.add_preceding(Functionality::UpdateAccount).unwrap();
        list.add_following(Functionality::Transfer).unwrap();
        list.add_child(Functionality::Transfer, DispatchLevel::Child, RecordIndex(0))
            .unwrap();

        let records = list.build(5_000);
        assert_eq!(records.len(), 5);

        // preceding < user < children (creation order) < following
        assert_eq!(records[0].functionality, Functionality::UpdateAccount);
        assert_eq!(records[1].consensus_nanos, 5_000);
        assert_eq!(records[2].functionality, Functionality::CreateAccount);
        assert_eq!(records[3].functionality, Functionality::Transfer);

        for pair in records.windows(2) {
            assert!(pair[0].consensus_nanos < pair[1].consensus_nanos);
        }
        // Preceding records sit before the user timestamp.
        assert!(records[0].consensus_nanos < 5_000);
    }

    #[test]
    fn test_non_user_records_carry_parent_link_and_nonces() {
        let mut list = builder_with_caps(10, 3);
        let user = list.user_index();
        list.add_preceding(Functionality::UpdateAccount).unwrap();
        list.add_child(Functionality::Transfer, DispatchLevel::Child, user)
            .unwrap();

        let records = list.build(9_000);
        let user_record = &records[1];
        assert_eq!(user_record.transaction_id.nonce, 0);

        for record in [&records[0], &records[2]] {
            assert_eq!(record.parent_consensus_nanos, Some(user_record.consensus_nanos));
            assert!(record.transaction_id.nonce > 0);
            assert_eq!(record.transaction_id.payer, user_record.transaction_id.payer);
        }
        assert_ne!(records[0].transaction_id.nonce, records[2].transaction_id.nonce);
    }

    #[test]
    fn test_nested_child_links_to_its_parent_not_user() {
        let mut list = builder_with_caps(10, 3);
        let user = list.user_index();
        let outer = list
            .add_child(Functionality::WrappedTransfer, DispatchLevel::Child, user)
            .unwrap();
        list.add_child(Functionality::Transfer, DispatchLevel::Child, outer)
            .unwrap();

        let records = list.build(2_000);
        assert_eq!(records.len(), 3);
        // The inner child links to the outer child, not the user record.
        assert_eq!(
            records[2].parent_consensus_nanos,
            Some(records[1].consensus_nanos)
        );
        assert_eq!(records[1].parent_consensus_nanos, Some(records[0].consensus_nanos));
    }

    #[test]
    fn test_child_cap_fails_the_next_request() {
        let mut list = builder_with_caps(2, 3);
        let user = list.user_index();
        list.add_child(Functionality::Transfer, DispatchLevel::Child, user)
            .unwrap();
        list.add_child(Functionality::Transfer, DispatchLevel::Child, user)
            .unwrap();

        let err = list
            .add_child(Functionality::Transfer, DispatchLevel::Child, user)
            .unwrap_err();
        assert_eq!(err.code, ResponseCode::MaxChildDispatchesExceeded);
        // Nothing was added for the failed request.
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_preceding_cap() {
        let mut list = builder_with_caps(5, 1);
        list.add_preceding(Functionality::UpdateAccount).unwrap();
        let err = list.add_preceding(Functionality::UpdateAccount).unwrap_err();
        assert_eq!(err.code, ResponseCode::MaxPrecedingDispatchesExceeded);
    }

    #[test]
    fn test_fee_transfers_survive_nullification() {
        let mut list = builder_with_caps(5, 1);
        let user = list.user_index();
        let builder = list.builder_mut(user);
        builder.add_fee_transfer(AccountId(1001), -10);
        builder.add_fee_transfer(AccountId(98), 10);
        builder.add_transfer(AccountId(2), 50);
        builder.set_created_account(AccountId(2));
        builder.nullify_side_effects();
        builder.set_status(ResponseCode::InsufficientBalance);

        let records = list.build(1_000);
        assert_eq!(records[0].transfers.len(), 2);
        assert_eq!(records[0].created_account, None);
        assert_eq!(records[0].status, ResponseCode::InsufficientBalance);
    }
}
