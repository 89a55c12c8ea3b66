//! Roll context staging, consumed by the next resolution in the same
//! transaction.

use crate::action::execute::Transaction;
use crate::state::{RerollMode, RollContext};

use super::{OpResult, SkipReason};

pub(super) fn add_bonus(tx: &mut Transaction, amount: i32) -> OpResult {
    let ctx = &mut tx.state.roll_context;
    ctx.bonus_delta += amount;
    Ok(Some(ctx.bonus_delta))
}

pub(super) fn add_dc_delta(tx: &mut Transaction, amount: i32) -> OpResult {
    let ctx = &mut tx.state.roll_context;
    ctx.dc_delta += amount;
    Ok(Some(ctx.dc_delta))
}

pub(super) fn override_roll(tx: &mut Transaction, value: u32) -> OpResult {
    tx.state.roll_context.roll_override = Some(value.clamp(1, 20));
    Ok(Some(value.clamp(1, 20) as i32))
}

pub(super) fn set_reroll(tx: &mut Transaction, mode: RerollMode) -> OpResult {
    tx.state.roll_context.reroll = Some(mode);
    Ok(None)
}

pub(super) fn clamp(tx: &mut Transaction, min: Option<u32>, max: Option<u32>) -> OpResult {
    if min.is_none() && max.is_none() {
        return Err(SkipReason::NoEffect);
    }
    let ctx = &mut tx.state.roll_context;
    ctx.clamp_min = min.or(ctx.clamp_min);
    ctx.clamp_max = max.or(ctx.clamp_max);
    Ok(None)
}

pub(super) fn grant_advantage(tx: &mut Transaction) -> OpResult {
    tx.state.roll_context.advantage = true;
    Ok(None)
}

pub(super) fn grant_disadvantage(tx: &mut Transaction) -> OpResult {
    tx.state.roll_context.disadvantage = true;
    Ok(None)
}

pub(super) fn clear(tx: &mut Transaction) -> OpResult {
    if tx.state.roll_context.is_empty() {
        return Err(SkipReason::NoEffect);
    }
    tx.state.roll_context = RollContext::default();
    Ok(None)
}
