//! Balance transfers, including lazy creation for alias credits.

use crate::{HandleContext, HandleError};
use unison_types::{
    AccountId, CreateAccountBody, Key, Operation, ResponseCode, TransferBody,
};

/// Apply one transfer body atomically.
///
/// An alias credit whose address is not yet linked to an account first
/// dispatches a child that creates a hollow account for it; the credit
/// then lands on that account. A failed lazy creation fails the whole
/// transfer.
pub(crate) fn handle(
    ctx: &mut HandleContext<'_, '_>,
    body: &TransferBody,
) -> Result<(), HandleError> {
    if !body.is_balanced() {
        return Err(ResponseCode::UnbalancedTransfer.into());
    }

    for adjustment in &body.transfers {
        apply_adjustment(ctx, adjustment.account, adjustment.amount)?;
    }

    for credit in &body.alias_credits {
        let target = match ctx.account_id_by_alias(&credit.address) {
            Some(id) => id,
            None => lazy_create(ctx, credit.address)?,
        };
        apply_adjustment(ctx, target, credit.amount)?;
    }
    Ok(())
}

/// Adjust one account's balance in the current frame and record it.
pub(crate) fn apply_adjustment(
    ctx: &mut HandleContext<'_, '_>,
    id: AccountId,
    amount: i64,
) -> Result<(), HandleError> {
    let mut account = ctx.account(id).ok_or(ResponseCode::AccountNotFound)?;
    if account.deleted {
        return Err(ResponseCode::AccountDeleted.into());
    }
    if amount < 0 {
        let debit = amount.unsigned_abs();
        if account.balance < debit {
            return Err(ResponseCode::InsufficientBalance.into());
        }
        account.balance -= debit;
    } else {
        account.balance = account
            .balance
            .checked_add(amount as u64)
            .ok_or(ResponseCode::InvalidTransaction)?;
    }
    ctx.put_account(account);
    ctx.record().add_transfer(id, amount);
    Ok(())
}

fn lazy_create(
    ctx: &mut HandleContext<'_, '_>,
    address: unison_types::Address,
) -> Result<AccountId, HandleError> {
    let body = ctx.child_body(Operation::CreateAccount(CreateAccountBody {
        key: Key::sentinel(),
        alias: Some(address),
        initial_balance: 0,
        receiver_sig_required: false,
    }));
    let outcome = ctx.dispatch_child(body)?;
    match outcome.created_account {
        Some(id) if outcome.is_success() => Ok(id),
        _ => Err(outcome.status.into()),
    }
}
