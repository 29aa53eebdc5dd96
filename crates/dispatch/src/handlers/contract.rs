//! Contract invocation through the external engine.

use crate::handlers::transfer::apply_adjustment;
use crate::{EngineCall, HandleContext, HandleError};
use unison_types::{ContractCallBody, ContractOutcome, ResponseCode};

/// Invoke the contract engine for one call.
///
/// The engine outcome is folded into the record whether or not the call
/// succeeds; on failure the dispatch then rolls back, so the value
/// transfer and storage writes are discarded while the outcome survives
/// in the record.
pub(crate) fn handle(
    ctx: &mut HandleContext<'_, '_>,
    body: &ContractCallBody,
) -> Result<(), HandleError> {
    let contract = ctx
        .account(body.contract)
        .ok_or(ResponseCode::InvalidContract)?;
    if contract.deleted {
        return Err(ResponseCode::InvalidContract.into());
    }

    let payer = ctx.payer();
    let value = i64::try_from(body.value).map_err(|_| ResponseCode::InvalidTransaction)?;
    if value > 0 {
        apply_adjustment(ctx, payer, -value)?;
        apply_adjustment(ctx, body.contract, value)?;
    }

    let outcome = ctx.execute_contract(EngineCall {
        sender: payer,
        contract: body.contract,
        gas: body.gas,
        value: body.value,
        call_data: &body.call_data,
    });

    for (slot, value) in &outcome.storage_writes {
        ctx.put_contract_slot(body.contract, slot.clone(), value.clone());
    }
    let success = outcome.success;
    ctx.record().set_contract_outcome(ContractOutcome {
        success,
        gas_used: outcome.gas_used,
        output: outcome.output,
        error: outcome.error,
    });

    if success {
        Ok(())
    } else {
        Err(ResponseCode::ContractExecutionFailed.into())
    }
}
