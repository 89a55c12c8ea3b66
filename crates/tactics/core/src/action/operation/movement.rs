//! Movement intents.
//!
//! The engine never moves a token on its own authority. It records a
//! [`MovementIntent`] and, when a movement sink is installed, applies the
//! position the sink reports back.

use crate::action::execute::Transaction;
use crate::env::{ExecutionEnv, MovementIntent, MovementKind};
use crate::state::{Position, TokenId};

use super::{OpContext, OpResult, SkipReason};

fn position(tx: &Transaction, id: TokenId) -> Result<Position, SkipReason> {
    tx.state
        .token(id)
        .map(|t| t.position)
        .ok_or(SkipReason::UnresolvedTarget)
}

/// Records the intent and lets the sink decide where the token lands.
fn request(tx: &mut Transaction, env: &mut ExecutionEnv<'_>, intent: MovementIntent) -> OpResult {
    tx.intents.push(intent.clone());
    let Some(sink) = env.movement() else {
        return Ok(None);
    };
    let landed = sink.request(&intent).ok_or(SkipReason::Refused)?;
    if let Some(token) = tx.state.token_mut(intent.token) {
        token.position = landed;
    }
    Ok(Some(intent.from.distance_to(landed) as i32))
}

fn intent(kind: MovementKind, token: TokenId, from: Position, to: Position) -> MovementIntent {
    MovementIntent {
        kind,
        token,
        from,
        to,
        other: None,
    }
}

pub(super) fn move_to(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    id: TokenId,
    to: Position,
) -> OpResult {
    let from = position(tx, id)?;
    request(tx, env, intent(MovementKind::MoveTo, id, from, to))
}

pub(super) fn teleport(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    id: TokenId,
    to: Position,
) -> OpResult {
    let from = position(tx, id)?;
    request(tx, env, intent(MovementKind::Teleport, id, from, to))
}

pub(super) fn forced_move(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    id: TokenId,
    dx: i32,
    dy: i32,
) -> OpResult {
    if dx == 0 && dy == 0 {
        return Err(SkipReason::NoEffect);
    }
    let from = position(tx, id)?;
    let mut intent = intent(MovementKind::ForcedMove, id, from, from.offset(dx, dy));
    intent.other = Some(ctx.actor);
    request(tx, env, intent)
}

/// Moves the token straight away from the actor.
pub(super) fn displace_away(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    id: TokenId,
    distance: u32,
    kind: MovementKind,
) -> OpResult {
    let origin = position(tx, ctx.actor)?;
    let from = position(tx, id)?;
    let (dx, dy) = origin.step_towards(from);
    if distance == 0 || (dx == 0 && dy == 0) {
        return Err(SkipReason::NoEffect);
    }
    let steps = distance as i32;
    let mut intent = intent(kind, id, from, from.offset(dx * steps, dy * steps));
    intent.other = Some(ctx.actor);
    request(tx, env, intent)
}

/// Pulls the token towards the actor, stopping adjacent to it.
pub(super) fn pull(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    id: TokenId,
    distance: u32,
) -> OpResult {
    let anchor = position(tx, ctx.actor)?;
    let from = position(tx, id)?;

    let mut to = from;
    for _ in 0..distance {
        if to.distance_to(anchor) <= 1 {
            break;
        }
        let (dx, dy) = to.step_towards(anchor);
        to = to.offset(dx, dy);
    }
    if to == from {
        return Err(SkipReason::NoEffect);
    }
    let mut intent = intent(MovementKind::Pull, id, from, to);
    intent.other = Some(ctx.actor);
    request(tx, env, intent)
}

/// Swaps the token with the actor.
pub(super) fn swap(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    id: TokenId,
) -> OpResult {
    if id == ctx.actor {
        return Err(SkipReason::NoEffect);
    }
    let actor_at = position(tx, ctx.actor)?;
    let target_at = position(tx, id)?;
    let mut intent = intent(MovementKind::Swap, ctx.actor, actor_at, target_at);
    intent.other = Some(id);

    let moved = request(tx, env, intent)?;
    if moved.is_some() {
        if let Some(token) = tx.state.token_mut(id) {
            token.position = actor_at;
        }
    }
    Ok(moved)
}
