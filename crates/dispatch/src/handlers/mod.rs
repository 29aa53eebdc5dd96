//! Per-operation handlers.
//!
//! A handler performs one operation's state transition through the
//! [`HandleContext`] and reports any business failure as a response code.
//! Handlers never commit or roll back; the dispatcher owns the frame.

mod account;
mod contract;
mod transfer;
mod wrapped;

use crate::{HandleContext, HandleError};
use unison_types::Operation;

/// Run the handler selected by the dispatch's operation.
pub(crate) fn run(ctx: &mut HandleContext<'_, '_>) -> Result<(), HandleError> {
    match ctx.body().operation.clone() {
        Operation::Transfer(body) => transfer::handle(ctx, &body),
        Operation::CreateAccount(body) => account::handle_create(ctx, &body),
        Operation::UpdateAccount(body) => account::handle_update(ctx, &body),
        Operation::ContractCall(body) => contract::handle(ctx, &body),
        Operation::WrappedTransfer(body) => wrapped::handle(ctx, &body),
    }
}
