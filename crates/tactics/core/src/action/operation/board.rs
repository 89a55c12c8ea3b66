//! Board effect placement.

use crate::action::execute::Transaction;
use crate::state::{BoardEffect, BoardEffectKind};

use super::{EffectAnchor, OpContext, OpResult, SkipReason};

#[allow(clippy::too_many_arguments)]
pub(super) fn create(
    tx: &mut Transaction,
    ctx: &OpContext<'_>,
    effect_id: &str,
    kind: BoardEffectKind,
    radius: u32,
    rounds: Option<u32>,
    at: EffectAnchor,
    tags: &[String],
) -> OpResult {
    let anchor_id = match at {
        EffectAnchor::Actor => ctx.actor,
        EffectAnchor::Target => ctx.target.ok_or(SkipReason::UnresolvedTarget)?,
    };
    let center = tx
        .state
        .token(anchor_id)
        .map(|t| t.position)
        .ok_or(SkipReason::UnresolvedTarget)?;

    let effect = BoardEffect {
        id: effect_id.to_string(),
        kind,
        owner: ctx.actor,
        center,
        radius,
        remaining_rounds: rounds,
        anchor: (kind == BoardEffectKind::Aura).then_some(anchor_id),
        tags: tags.to_vec(),
        concentration_source: tx
            .state
            .concentration
            .as_ref()
            .filter(|link| link.owner == ctx.actor)
            .map(|link| link.source_id.clone()),
    };

    // Recasting replaces the caster's previous instance.
    tx.state
        .effects
        .retain(|e| !(e.id == effect.id && e.owner == effect.owner));
    tx.state.effects.push(effect);
    Ok(Some(radius as i32))
}

pub(super) fn remove(tx: &mut Transaction, effect_id: &str) -> OpResult {
    let before = tx.state.effects.len();
    tx.state.effects.retain(|e| e.id != effect_id);
    match before - tx.state.effects.len() {
        0 => Err(SkipReason::NoEffect),
        n => Ok(Some(n as i32)),
    }
}
