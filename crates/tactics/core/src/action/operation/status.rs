//! Status operations.
//!
//! Statuses created while the actor concentrates carry the link's source id.

use crate::action::execute::Transaction;
use crate::state::{StatusEntry, Token, TokenId};

use super::{OpContext, OpResult, SkipReason};

fn token<'t>(tx: &'t mut Transaction, id: TokenId) -> Result<&'t mut Token, SkipReason> {
    tx.state.token_mut(id).ok_or(SkipReason::UnresolvedTarget)
}

fn new_entry(tx: &Transaction, ctx: &OpContext<'_>, status: &str, turns: Option<u32>) -> StatusEntry {
    let entry = StatusEntry::new(status, turns).with_source(ctx.actor);
    match &tx.state.concentration {
        Some(link) => entry.with_concentration(link.source_id.clone()),
        None => entry,
    }
}

pub(super) fn apply(
    tx: &mut Transaction,
    ctx: &OpContext<'_>,
    id: TokenId,
    status: &str,
    turns: Option<u32>,
) -> OpResult {
    let entry = new_entry(tx, ctx, status, turns);
    token(tx, id)?.statuses.apply(entry);
    Ok(None)
}

pub(super) fn remove(tx: &mut Transaction, id: TokenId, status: &str) -> OpResult {
    match token(tx, id)?.statuses.remove(status) {
        0 => Err(SkipReason::UnknownStatus),
        n => Ok(Some(n as i32)),
    }
}

/// Adds turns. A status without a duration stays permanent.
pub(super) fn extend(tx: &mut Transaction, id: TokenId, status: &str, turns: u32) -> OpResult {
    let entry = token(tx, id)?
        .statuses
        .get_mut(status)
        .ok_or(SkipReason::UnknownStatus)?;
    entry.remaining_turns = entry.remaining_turns.map(|t| t.saturating_add(turns));
    Ok(entry.remaining_turns.map(|t| t as i32))
}

pub(super) fn stack(
    tx: &mut Transaction,
    ctx: &OpContext<'_>,
    id: TokenId,
    status: &str,
    stacks: u32,
    turns: Option<u32>,
) -> OpResult {
    let mut entry = new_entry(tx, ctx, status, turns);
    let target = token(tx, id)?;
    let total = match target.statuses.get_mut(status) {
        Some(existing) => {
            existing.stacks = existing.stacks.saturating_add(stacks);
            existing.stacks
        }
        None => {
            entry.stacks = stacks.max(1);
            let total = entry.stacks;
            target.statuses.apply(entry);
            total
        }
    };
    Ok(Some(total as i32))
}

pub(super) fn reset_stacks(tx: &mut Transaction, id: TokenId, status: &str) -> OpResult {
    let entry = token(tx, id)?
        .statuses
        .get_mut(status)
        .ok_or(SkipReason::UnknownStatus)?;
    entry.stacks = 1;
    Ok(Some(1))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{ctx, fixture};
    use super::super::{OpStatus, Operation, TargetSelector, apply as run};
    use super::*;
    use crate::env::{ExecutionEnv, FixedDice};
    use crate::state::ConcentrationLink;

    #[test]
    fn apply_then_remove_leaves_nothing() {
        let (state, config) = fixture();
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);
        let c = ctx(&config, Some(TokenId(1)));

        run(&Operation::apply_condition("prone", Some(1)), &mut tx, &mut env, &c);
        assert!(tx.state.token(TokenId(1)).unwrap().statuses.has("prone"));
        run(&Operation::remove_condition("prone"), &mut tx, &mut env, &c);
        assert!(!tx.state.token(TokenId(1)).unwrap().statuses.has("prone"));

        assert_eq!(
            run(&Operation::remove_condition("prone"), &mut tx, &mut env, &c),
            OpStatus::Skipped(SkipReason::UnknownStatus)
        );
    }

    #[test]
    fn statuses_inherit_active_concentration() {
        let (mut state, config) = fixture();
        state.concentration = Some(ConcentrationLink {
            source_id: "hex@0".into(),
            owner: TokenId(0),
            action_id: "hex".into(),
        });
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);

        run(
            &Operation::apply_condition("hexed", None),
            &mut tx,
            &mut env,
            &ctx(&config, Some(TokenId(1))),
        );
        let entry = tx.state.token(TokenId(1)).unwrap().statuses.get("hexed").cloned();
        assert_eq!(entry.and_then(|e| e.concentration_source), Some("hex@0".into()));
    }

    #[test]
    fn stacking_extending_and_resetting() {
        let (state, config) = fixture();
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);
        let c = ctx(&config, Some(TokenId(1)));
        let stack = Operation::StackCondition {
            target: TargetSelector::Primary,
            status: "bleeding".into(),
            stacks: 2,
            turns: Some(2),
        };

        run(&stack, &mut tx, &mut env, &c);
        run(&stack, &mut tx, &mut env, &c);
        assert_eq!(tx.state.token(TokenId(1)).unwrap().statuses.stacks("bleeding"), 4);

        run(
            &Operation::ExtendCondition {
                target: TargetSelector::Primary,
                status: "bleeding".into(),
                turns: 3,
            },
            &mut tx,
            &mut env,
            &c,
        );
        run(
            &Operation::ResetStacks {
                target: TargetSelector::Primary,
                status: "bleeding".into(),
            },
            &mut tx,
            &mut env,
            &c,
        );
        let entry = tx.state.token(TokenId(1)).unwrap().statuses.get("bleeding").cloned();
        assert_eq!(entry.map(|e| (e.stacks, e.remaining_turns)), Some((1, Some(5))));
    }
}
