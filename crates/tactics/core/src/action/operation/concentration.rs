//! Concentration links.
//!
//! Breaking or replacing a link purges every status and board effect tagged
//! with its source id in one step.

use tracing::debug;

use crate::action::execute::{ConcentrationEvent, LogEntry, Transaction};
use crate::config::EngineConfig;
use crate::env::ExecutionEnv;
use crate::state::{Ability, AdvantageMode, ConcentrationLink, TokenId};

use super::{OpContext, OpResult, SkipReason};

fn link_of(tx: &Transaction, token: TokenId) -> Option<ConcentrationLink> {
    tx.state
        .token(token)
        .and_then(|t| t.concentration.clone())
        .or_else(|| {
            tx.state
                .concentration
                .clone()
                .filter(|link| link.owner == token)
        })
}

/// Breaks the concentration of `token`. Returns the number of purged entries,
/// or `None` if the token was not concentrating.
pub(crate) fn break_concentration(tx: &mut Transaction, token: TokenId) -> Option<usize> {
    let link = link_of(tx, token)?;
    let purged = tx.state.purge_concentration(&link.source_id);
    debug!(token = %token, source = %link.source_id, purged, "concentration broken");
    tx.log.push(LogEntry::Concentration {
        token,
        source_id: link.source_id,
        event: ConcentrationEvent::Broken,
    });
    Some(purged)
}

pub(super) fn start(tx: &mut Transaction, ctx: &OpContext<'_>, source: Option<&str>) -> OpResult {
    let source_id = source.map_or_else(
        || format!("{}@{}", ctx.action_id, ctx.actor.0),
        str::to_string,
    );
    let purged = break_concentration(tx, ctx.actor).unwrap_or(0);

    let link = ConcentrationLink {
        source_id: source_id.clone(),
        owner: ctx.actor,
        action_id: ctx.action_id.to_string(),
    };
    tx.state
        .token_mut(ctx.actor)
        .ok_or(SkipReason::UnresolvedTarget)?
        .concentration = Some(link.clone());
    if tx.state.actor == ctx.actor {
        tx.state.concentration = Some(link);
    }
    tx.log.push(LogEntry::Concentration {
        token: ctx.actor,
        source_id,
        event: ConcentrationEvent::Started,
    });
    Ok(Some(purged as i32))
}

pub(super) fn break_op(tx: &mut Transaction, token: TokenId) -> OpResult {
    break_concentration(tx, token)
        .map(|purged| Some(purged as i32))
        .ok_or(SkipReason::NotConcentrating)
}

/// Concentration save after `token` took `damage`.
///
/// DC is `max(floor, damage / 2)` against a d20 plus the token's own CON
/// modifier. A failed save breaks the link.
pub(crate) fn concentration_check(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    config: &EngineConfig,
    token: TokenId,
    damage: u32,
) {
    if damage == 0 {
        return;
    }
    let Some(link) = link_of(tx, token) else {
        return;
    };
    let con = tx.state.token(token).map_or(0, |t| t.ability_mod(Ability::Con));

    let dc = config.concentration_dc_floor.max((damage / 2) as i32);
    let total = env.dice().roll_d20(AdvantageMode::Normal).natural as i32 + con;
    if total >= dc {
        debug!(token = %token, dc, total, "concentration held");
        tx.log.push(LogEntry::Concentration {
            token,
            source_id: link.source_id,
            event: ConcentrationEvent::Maintained { dc, total },
        });
        return;
    }
    debug!(token = %token, dc, total, "concentration save failed");
    break_concentration(tx, token);
}
