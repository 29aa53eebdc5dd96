//! Hollow account completion.
//!
//! When a user transaction succeeds and one of its authorizers was a
//! hollow account, the signature that authorized it also proves ownership
//! of the account's implicit address. Completion replaces the sentinel
//! key with the proven key through a preceding dispatch, so the account
//! becomes usable and the completion gets its own record before the user
//! record.

use crate::prehandle::PreHandleResult;
use crate::HandleContext;
use tracing::{debug, warn};
use unison_types::{Account, Address, Functionality, Key, Operation, UpdateAccountBody};

/// Completes hollow accounts after a committed user dispatch.
#[derive(Debug, Default)]
pub struct HollowAccountCompleter;

impl HollowAccountCompleter {
    /// Complete every hollow candidate the pre-handle pass gathered.
    ///
    /// A candidate is only completed when a passing verification covers
    /// its alias; that check comes first, so an account that stopped
    /// being hollow mid-transaction with no matching signature is simply
    /// skipped rather than misreported.
    ///
    /// Completion is best-effort and never fails the user transaction: a
    /// candidate whose preceding dispatch cannot be opened (cap or depth
    /// exhaustion) is logged and left hollow, and the remaining
    /// candidates are still attempted.
    pub fn finalize(&self, prehandle: &PreHandleResult, ctx: &mut HandleContext<'_, '_>) {
        let mut candidates: Vec<Account> = prehandle.hollow_accounts.clone();

        // A wrapped transfer's sender may have become resolvable only
        // during execution; pick it up from current state.
        if let Some(info) = &prehandle.txn_info {
            if info.functionality == Functionality::WrappedTransfer {
                if let Operation::WrappedTransfer(wrapped) = &info.body.operation {
                    let alias = Address::of(&wrapped.sender_key);
                    if let Some(account) = ctx
                        .account_id_by_alias(&alias)
                        .and_then(|id| ctx.account(id))
                    {
                        if account.is_hollow()
                            && !candidates.iter().any(|c| c.id == account.id)
                        {
                            candidates.push(account);
                        }
                    }
                }
            }
        }

        for candidate in candidates {
            self.complete_one(&candidate, ctx);
        }
    }

    fn complete_one(&self, candidate: &Account, ctx: &mut HandleContext<'_, '_>) {
        let Some(alias) = candidate.alias else {
            return;
        };
        let Some(proven_key) = ctx.verifier().verification_for_alias(&alias) else {
            debug!(account = candidate.id.0, "no passing verification for hollow alias");
            return;
        };
        // Re-read: the account may have been completed or removed by the
        // transaction itself.
        let current = match ctx.account(candidate.id) {
            Some(account) if account.is_hollow() => account,
            _ => return,
        };

        let body = ctx.child_body(Operation::UpdateAccount(UpdateAccountBody {
            target: current.id,
            key: Some(Key::Ed25519(proven_key)),
            receiver_sig_required: None,
        }));
        match ctx.dispatch_preceding(body) {
            Ok(outcome) if outcome.is_success() => {
                ctx.records
                    .builder_mut(outcome.record)
                    .set_created_account(current.id);
            }
            Ok(outcome) => {
                warn!(
                    account = current.id.0,
                    code = ?outcome.status,
                    "hollow completion dispatch failed"
                );
            }
            Err(err) => {
                warn!(
                    account = current.id.0,
                    code = ?err.code,
                    "hollow completion could not be dispatched"
                );
            }
        }
    }
}
