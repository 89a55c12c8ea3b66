//! Tags and numeric flags on tokens.

use crate::action::execute::Transaction;
use crate::state::{Token, TokenId};

use super::{OpResult, SkipReason};

fn token<'t>(tx: &'t mut Transaction, id: TokenId) -> Result<&'t mut Token, SkipReason> {
    tx.state.token_mut(id).ok_or(SkipReason::UnresolvedTarget)
}

pub(super) fn add_tag(tx: &mut Transaction, id: TokenId, tag: &str) -> OpResult {
    match token(tx, id)?.add_tag(tag) {
        true => Ok(None),
        false => Err(SkipReason::NoEffect),
    }
}

pub(super) fn remove_tag(tx: &mut Transaction, id: TokenId, tag: &str) -> OpResult {
    match token(tx, id)?.remove_tag(tag) {
        true => Ok(None),
        false => Err(SkipReason::NoEffect),
    }
}

pub(super) fn set_flag(tx: &mut Transaction, id: TokenId, flag: &str, value: i32) -> OpResult {
    let previous = token(tx, id)?.values.insert(flag.to_string(), value);
    match previous == Some(value) {
        true => Err(SkipReason::NoEffect),
        false => Ok(Some(value)),
    }
}

pub(super) fn clear_flag(tx: &mut Transaction, id: TokenId, flag: &str) -> OpResult {
    token(tx, id)?
        .values
        .remove(flag)
        .map(|_| None)
        .ok_or(SkipReason::NoEffect)
}
