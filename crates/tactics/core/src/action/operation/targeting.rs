//! Target list operations. All of them are no-ops once targeting is locked.

use arrayvec::ArrayVec;
use tracing::trace;

use crate::action::condition::Condition;
use crate::action::execute::Transaction;
use crate::config::EngineConfig;
use crate::env::ExecutionEnv;
use crate::state::TokenId;

use super::{OpContext, OpResult, SkipReason};

fn unlocked(tx: &Transaction) -> Result<(), SkipReason> {
    match tx.state.targeting.locked {
        true => Err(SkipReason::TargetingLocked),
        false => Ok(()),
    }
}

pub(super) fn lock(tx: &mut Transaction) -> OpResult {
    unlocked(tx)?;
    tx.state.targeting.locked = true;
    Ok(Some(tx.state.targeting.selected.len() as i32))
}

/// Adds the nearest eligible tokens until the configured maximum is reached.
///
/// Candidates must be alive, not the actor, not already selected, within
/// `radius` of the first selected target (or the actor) and within the
/// configured range of the actor. Ties in distance are broken by id.
pub(super) fn expand(
    tx: &mut Transaction,
    ctx: &OpContext<'_>,
    radius: Option<u32>,
    hostile_only: bool,
) -> OpResult {
    unlocked(tx)?;
    let state = &tx.state;
    let max = state.targeting_config.max_targets;
    let room = max.saturating_sub(state.targeting.selected.len());
    if room == 0 {
        return Err(SkipReason::NoEffect);
    }
    let actor_at = state
        .token(ctx.actor)
        .map(|t| t.position)
        .ok_or(SkipReason::UnresolvedTarget)?;
    let origin = state
        .targeting
        .first()
        .and_then(|id| state.token(id))
        .map_or(actor_at, |t| t.position);
    let range = state.targeting_config.range;

    let mut candidates: ArrayVec<(u32, TokenId), { EngineConfig::MAX_EXPANSION_CANDIDATES }> =
        ArrayVec::new();
    for token in &state.tokens {
        if !token.is_alive() || token.id == ctx.actor || state.targeting.contains(token.id) {
            continue;
        }
        if hostile_only && !state.are_hostile(ctx.actor, token.id) {
            continue;
        }
        let from_actor = actor_at.distance_to(token.position);
        if radius.is_some_and(|r| origin.distance_to(token.position) > r)
            || range.is_some_and(|r| from_actor > r)
        {
            continue;
        }
        if candidates.try_push((from_actor, token.id)).is_err() {
            trace!(limit = EngineConfig::MAX_EXPANSION_CANDIDATES, "expansion candidates truncated");
            break;
        }
    }
    candidates.sort_unstable();

    let added: Vec<TokenId> = candidates.iter().take(room).map(|(_, id)| *id).collect();
    if added.is_empty() {
        return Err(SkipReason::NoEffect);
    }
    tx.state.targeting.selected.extend(added.iter().copied());
    Ok(Some(added.len() as i32))
}

/// Keeps only the selected targets for which `condition` holds.
pub(super) fn filter(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    condition: &Condition,
) -> OpResult {
    unlocked(tx)?;
    let kept: Vec<TokenId> = tx
        .state
        .targeting
        .selected
        .iter()
        .copied()
        .filter(|id| {
            let per_target = OpContext {
                target: Some(*id),
                ..*ctx
            };
            condition.evaluate(&per_target.eval(tx, env))
        })
        .collect();
    let removed = tx.state.targeting.selected.len() - kept.len();
    tx.state.targeting.selected = kept;
    Ok(Some(removed as i32))
}

/// Replaces the selection with a single token.
pub(super) fn retarget(tx: &mut Transaction, token: TokenId) -> OpResult {
    unlocked(tx)?;
    if tx.state.token(token).is_none() {
        return Err(SkipReason::UnresolvedTarget);
    }
    tx.state.targeting.selected = vec![token];
    Ok(None)
}

pub(super) fn clear(tx: &mut Transaction) -> OpResult {
    unlocked(tx)?;
    let cleared = tx.state.targeting.selected.len();
    tx.state.targeting.selected.clear();
    Ok(Some(cleared as i32))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{ctx, fixture};
    use super::super::{OpStatus, Operation, apply};
    use super::*;
    use crate::env::FixedDice;
    use crate::state::{EngineState, Position, TargetingConfig, TargetingMode, Token};

    fn crowd() -> (EngineState, EngineConfig) {
        let (state, config) = fixture();
        let mut state = state
            .with_enemy(Token::new(TokenId(2), "orc", Position::new(2, 0), 15))
            .with_enemy(Token::new(TokenId(3), "kobold", Position::new(0, 2), 5))
            .with_ally(Token::new(TokenId(4), "cleric", Position::new(1, 1), 20))
            .with_enemy(Token::new(TokenId(5), "corpse", Position::new(1, 1), 0));
        state.targeting_config = TargetingConfig {
            mode: TargetingMode::Multi,
            max_targets: 3,
            range: None,
        };
        (state, config)
    }

    #[test]
    fn expansion_orders_by_distance_then_id() {
        let (mut state, config) = crowd();
        state.targeting.selected = vec![TokenId(1)];
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);

        let expand = Operation::ExpandTargets {
            radius: None,
            hostile_only: true,
        };
        assert!(apply(&expand, &mut tx, &mut env, &ctx(&config, None)).is_applied());
        // Orc and kobold are both two cells away, the lower id goes first.
        assert_eq!(tx.state.targeting.selected, vec![TokenId(1), TokenId(2), TokenId(3)]);
    }

    #[test]
    fn expansion_respects_radius_around_first_target() {
        let (mut state, config) = crowd();
        state.targeting.selected = vec![TokenId(1)];
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);

        let expand = Operation::ExpandTargets {
            radius: Some(1),
            hostile_only: false,
        };
        apply(&expand, &mut tx, &mut env, &ctx(&config, None));
        assert_eq!(tx.state.targeting.selected, vec![TokenId(1), TokenId(4), TokenId(2)]);
    }

    #[test]
    fn locked_targeting_rejects_every_change() {
        let (mut state, config) = crowd();
        state.targeting.selected = vec![TokenId(1), TokenId(2)];
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);
        let c = ctx(&config, None);

        assert!(apply(&Operation::LockTargets, &mut tx, &mut env, &c).is_applied());
        for op in [
            Operation::LockTargets,
            Operation::ClearTargets,
            Operation::ExpandTargets {
                radius: None,
                hostile_only: true,
            },
            Operation::Retarget { token: TokenId(3) },
            Operation::FilterTargets {
                condition: Condition::Never,
            },
        ] {
            assert_eq!(
                apply(&op, &mut tx, &mut env, &c),
                OpStatus::Skipped(SkipReason::TargetingLocked)
            );
        }
        assert!(tx.state.targeting.locked);
        assert_eq!(tx.state.targeting.selected, vec![TokenId(1), TokenId(2)]);
    }

    #[test]
    fn filter_evaluates_each_target() {
        let (mut state, config) = crowd();
        state.targeting.selected = vec![TokenId(1), TokenId(2), TokenId(3)];
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);

        let filter = Operation::FilterTargets {
            condition: Condition::Adjacent,
        };
        apply(&filter, &mut tx, &mut env, &ctx(&config, None));
        assert_eq!(tx.state.targeting.selected, vec![TokenId(1)]);
    }
}
