//! Resource and slot operations.
//!
//! An injected ledger is authoritative. Without one, the token-local pool in
//! `CombatStats` is used.

use crate::action::execute::Transaction;
use crate::env::ExecutionEnv;
use crate::state::{Token, TokenId};

use super::{OpResult, SkipReason};

fn local<'t>(tx: &'t mut Transaction, id: TokenId) -> Result<&'t mut Token, SkipReason> {
    tx.state.token_mut(id).ok_or(SkipReason::UnresolvedTarget)
}

pub(super) fn spend(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    id: TokenId,
    resource: &str,
    amount: i32,
) -> OpResult {
    if let Some(ledger) = env.ledger_mut() {
        return match ledger.spend(id, resource, amount) {
            true => Ok(Some(amount)),
            false => Err(SkipReason::InsufficientResource),
        };
    }
    let pool = local(tx, id)?
        .stats
        .resources
        .get_mut(resource)
        .filter(|current| **current >= amount)
        .ok_or(SkipReason::InsufficientResource)?;
    *pool -= amount;
    Ok(Some(amount))
}

pub(super) fn restore(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    id: TokenId,
    resource: &str,
    amount: i32,
) -> OpResult {
    if let Some(ledger) = env.ledger_mut() {
        return match ledger.restore(id, resource, amount) {
            true => Ok(Some(amount)),
            false => Err(SkipReason::Refused),
        };
    }
    *local(tx, id)?
        .stats
        .resources
        .entry(resource.to_string())
        .or_insert(0) += amount;
    Ok(Some(amount))
}

pub(super) fn set(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    id: TokenId,
    resource: &str,
    amount: i32,
) -> OpResult {
    if let Some(ledger) = env.ledger_mut() {
        return match ledger.set(id, resource, amount) {
            true => Ok(Some(amount)),
            false => Err(SkipReason::Refused),
        };
    }
    local(tx, id)?
        .stats
        .resources
        .insert(resource.to_string(), amount);
    Ok(Some(amount))
}

pub(super) fn consume_slot(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    id: TokenId,
    level: u8,
) -> OpResult {
    if let Some(ledger) = env.ledger_mut() {
        return match ledger.consume_slot(id, level) {
            true => Ok(Some(i32::from(level))),
            false => Err(SkipReason::InsufficientResource),
        };
    }
    let pool = local(tx, id)?
        .stats
        .slots
        .get_mut(&level)
        .filter(|pool| pool.current > 0)
        .ok_or(SkipReason::InsufficientResource)?;
    pool.current -= 1;
    Ok(Some(i32::from(level)))
}

pub(super) fn restore_slot(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    id: TokenId,
    level: u8,
) -> OpResult {
    if let Some(ledger) = env.ledger_mut() {
        return match ledger.restore_slot(id, level) {
            true => Ok(Some(i32::from(level))),
            false => Err(SkipReason::Refused),
        };
    }
    let pool = local(tx, id)?
        .stats
        .slots
        .get_mut(&level)
        .filter(|pool| pool.current < pool.max)
        .ok_or(SkipReason::NoEffect)?;
    pool.current += 1;
    Ok(Some(i32::from(level)))
}
