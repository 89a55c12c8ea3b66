//! Summons: spawn, despawn and control, routed through the lifecycle
//! collaborator.

use tracing::debug;

use crate::action::execute::Transaction;
use crate::env::{ExecutionEnv, SpawnRequest};
use crate::state::{Position, TokenId};

use super::{OpContext, OpResult, SkipReason, break_concentration};

pub(super) fn spawn(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    template: &str,
    at: Option<Position>,
) -> OpResult {
    let owner = ctx.actor;
    let at = match at {
        Some(at) => at,
        None => tx
            .state
            .token(owner)
            .map(|t| t.position)
            .ok_or(SkipReason::UnresolvedTarget)?,
    };
    let request = SpawnRequest {
        template: template.to_string(),
        owner,
        at,
        hostile: tx.state.is_enemy(owner),
    };

    let lifecycle = env.lifecycle().ok_or(SkipReason::NoCollaborator)?;
    let token = lifecycle.spawn(&request).ok_or(SkipReason::Refused)?;
    let id = token.id;
    if !tx.state.insert(token) {
        return Err(SkipReason::Refused);
    }
    if request.hostile {
        tx.state.enemies.push(id);
    }
    tx.spawned.push(id);
    debug!(template, id = %id, owner = %owner, "spawned");
    Ok(Some(id.0 as i32))
}

pub(super) fn despawn(tx: &mut Transaction, env: &mut ExecutionEnv<'_>, id: TokenId) -> OpResult {
    let lifecycle = env.lifecycle().ok_or(SkipReason::NoCollaborator)?;
    if !lifecycle.despawn(id) {
        return Err(SkipReason::Refused);
    }
    break_concentration(tx, id);
    tx.state.remove(id);
    Ok(None)
}

/// Hands the summon to the actor and records the controller on the token.
pub(super) fn control(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    id: TokenId,
) -> OpResult {
    let lifecycle = env.lifecycle().ok_or(SkipReason::NoCollaborator)?;
    if !lifecycle.control(ctx.actor, id) {
        return Err(SkipReason::Refused);
    }
    let token = tx.state.token_mut(id).ok_or(SkipReason::UnresolvedTarget)?;
    token
        .values
        .insert("controller".to_string(), ctx.actor.0 as i32);
    Ok(None)
}
