//! Externally-signed wrapped transfers.

use crate::{HandleContext, HandleError};
use unison_types::{Address, Operation, ResponseCode, WrappedTransferBody};

/// Dispatch the embedded transfer on behalf of the foreign sender.
///
/// The sender account is resolved by the foreign key's implicit address;
/// its authorization is the foreign signature, already required and
/// verified before execution. Every debit in the embedded transfer must
/// come from that sender, since no other account's key signed it.
pub(crate) fn handle(
    ctx: &mut HandleContext<'_, '_>,
    body: &WrappedTransferBody,
) -> Result<(), HandleError> {
    let sender_address = Address::of(&body.sender_key);
    let sender = ctx
        .account_id_by_alias(&sender_address)
        .ok_or(ResponseCode::AccountNotFound)?;

    for adjustment in &body.transfer.transfers {
        if adjustment.amount < 0 && adjustment.account != sender {
            return Err(ResponseCode::Unauthorized.into());
        }
    }

    let child = ctx.child_body(Operation::Transfer(body.transfer.clone()));
    let outcome = ctx.dispatch_child(child)?;
    if !outcome.is_success() {
        return Err(outcome.status.into());
    }
    Ok(())
}
