//! Account creation and update.

use crate::handlers::transfer::apply_adjustment;
use crate::{HandleContext, HandleError};
use unison_types::{Account, CreateAccountBody, ResponseCode, UpdateAccountBody};

/// Create a new account, funded by the payer.
///
/// A sentinel key is only accepted together with an alias: that is the
/// hollow-creation form used by lazy alias credits.
pub(crate) fn handle_create(
    ctx: &mut HandleContext<'_, '_>,
    body: &CreateAccountBody,
) -> Result<(), HandleError> {
    let hollow_creation = body.key.is_sentinel() && body.alias.is_some();
    if !body.key.is_usable() && !hollow_creation {
        return Err(ResponseCode::KeyRequired.into());
    }
    if let Some(alias) = body.alias {
        if ctx.account_id_by_alias(&alias).is_some() {
            return Err(ResponseCode::AliasAlreadyInUse.into());
        }
    }

    let payer = ctx.payer();
    let funding =
        i64::try_from(body.initial_balance).map_err(|_| ResponseCode::InvalidTransaction)?;
    if funding > 0 {
        apply_adjustment(ctx, payer, -funding)?;
    }

    let id = ctx.next_entity_id();
    let account = Account {
        id,
        key: body.key.clone(),
        alias: body.alias,
        balance: body.initial_balance,
        deleted: false,
        receiver_sig_required: body.receiver_sig_required,
    };
    if let Some(alias) = body.alias {
        ctx.link_alias(alias, id);
    }
    ctx.put_account(account);
    if funding > 0 {
        ctx.record().add_transfer(id, funding);
    }
    ctx.record().set_created_account(id);
    Ok(())
}

/// Update an existing account's key or flags.
///
/// A hollow account accepts exactly one update: the completion that sets
/// a primitive key whose implicit address matches the account's alias.
/// Anything else against a hollow account is unauthorized, since the
/// sentinel key can never have verified.
pub(crate) fn handle_update(
    ctx: &mut HandleContext<'_, '_>,
    body: &UpdateAccountBody,
) -> Result<(), HandleError> {
    let mut target = ctx
        .account(body.target)
        .ok_or(ResponseCode::AccountNotFound)?;
    if target.deleted {
        return Err(ResponseCode::AccountDeleted.into());
    }

    if target.is_hollow() {
        let completes = body
            .key
            .as_ref()
            .and_then(|key| key.implicit_address())
            .is_some_and(|address| Some(address) == target.alias);
        if !completes {
            return Err(ResponseCode::Unauthorized.into());
        }
    } else if let Some(new_key) = &body.key {
        if !new_key.is_usable() {
            return Err(ResponseCode::KeyRequired.into());
        }
    }

    if let Some(new_key) = &body.key {
        target.key = new_key.clone();
    }
    if let Some(flag) = body.receiver_sig_required {
        target.receiver_sig_required = flag;
    }
    ctx.put_account(target);
    Ok(())
}
