//! Hit point operations.

use tracing::warn;

use crate::action::dice::{CritRule, DiceExpr};
use crate::action::execute::Transaction;
use crate::action::formula::resolve_formula;
use crate::env::ExecutionEnv;
use crate::state::{DamageType, TokenId};

use super::{OpContext, OpResult, ScaleDivisor, SkipReason, concentration_check};

/// Resolves formula tokens against the actor and rolls the result.
pub(super) fn roll_formula(
    tx: &Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    formula: &str,
    crit: Option<CritRule>,
) -> Result<i32, SkipReason> {
    let text = match tx.state.token(ctx.actor) {
        Some(actor) => resolve_formula(formula, actor),
        None => formula.to_string(),
    };
    let expr = DiceExpr::parse(&text).map_err(|error| {
        warn!(action = ctx.action_id, formula, %error, "invalid formula");
        SkipReason::InvalidFormula
    })?;
    Ok(expr.roll(env.dice(), crit).total)
}

pub(super) fn deal(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    target: TokenId,
    formula: &str,
    damage_type: Option<DamageType>,
    divisor: Option<ScaleDivisor>,
) -> OpResult {
    let rolled = roll_formula(tx, env, ctx, formula, ctx.damage_crit())?.max(0) as u32;
    let scaled = divisor.map_or(rolled, |d| rolled / d.divisor());

    let token = tx
        .state
        .token_mut(target)
        .ok_or(SkipReason::UnresolvedTarget)?;
    let amount = damage_type.map_or(scaled, |kind| token.damage_affinity(kind).adjust(scaled));
    token.take_damage(amount);

    concentration_check(tx, env, ctx.config, target, amount);
    Ok(Some(amount as i32))
}

pub(super) fn heal(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    target: TokenId,
    formula: &str,
) -> OpResult {
    let amount = roll_formula(tx, env, ctx, formula, None)?.max(0) as u32;
    let token = tx
        .state
        .token_mut(target)
        .ok_or(SkipReason::UnresolvedTarget)?;
    Ok(Some(token.heal(amount) as i32))
}

pub(super) fn grant_temp_hp(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    target: TokenId,
    formula: &str,
) -> OpResult {
    let amount = roll_formula(tx, env, ctx, formula, None)?.max(0) as u32;
    let token = tx
        .state
        .token_mut(target)
        .ok_or(SkipReason::UnresolvedTarget)?;
    if !token.grant_temp_hp(amount) {
        return Err(SkipReason::NoEffect);
    }
    Ok(Some(amount as i32))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{ctx, fixture};
    use super::super::{Operation, OpStatus, TargetSelector, apply};
    use super::*;
    use crate::action::{Outcome, OutcomeKind};
    use crate::env::FixedDice;

    #[test]
    fn formula_uses_actor_modifiers() {
        let (state, config) = fixture();
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(4);
        let mut env = ExecutionEnv::new(&mut dice);

        apply(
            &Operation::damage("1d6 + modFOR"),
            &mut tx,
            &mut env,
            &ctx(&config, Some(TokenId(1))),
        );
        assert_eq!(tx.state.token(TokenId(1)).unwrap().hp, 3);
        assert_eq!(tx.reports[0].amount, Some(7));
    }

    #[test]
    fn temp_hp_absorbs_and_hp_floors_at_zero() {
        let (mut state, config) = fixture();
        state.token_mut(TokenId(1)).unwrap().temp_hp = 4;
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(6);
        let mut env = ExecutionEnv::new(&mut dice);

        apply(&Operation::damage("3d6"), &mut tx, &mut env, &ctx(&config, Some(TokenId(1))));
        let goblin = tx.state.token(TokenId(1)).unwrap();
        assert_eq!((goblin.temp_hp, goblin.hp), (0, 0));
    }

    #[test]
    fn crit_doubles_dice_and_scaling_floors() {
        let (state, config) = fixture();
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(3);
        let mut env = ExecutionEnv::new(&mut dice);
        let crit = Outcome {
            kind: OutcomeKind::Crit,
            crit: true,
            ..Outcome::automatic(Some(TokenId(1)))
        };
        let c = OpContext {
            outcome: Some(&crit),
            ..ctx(&config, Some(TokenId(1)))
        };

        let op = Operation::DealScaledDamage {
            target: TargetSelector::Primary,
            formula: "1d6".into(),
            divisor: ScaleDivisor::Quarter,
            damage_type: None,
        };
        // 3 + 3 on a crit, quartered
        apply(&op, &mut tx, &mut env, &c);
        assert_eq!(tx.reports[0].amount, Some(1));
    }

    #[test]
    fn resistance_halves_and_bad_formula_skips() {
        let (mut state, config) = fixture();
        state
            .token_mut(TokenId(1))
            .unwrap()
            .resistances
            .push(DamageType::Fire);
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(5);
        let mut env = ExecutionEnv::new(&mut dice);
        let c = ctx(&config, Some(TokenId(1)));

        let fire = Operation::DealDamage {
            target: TargetSelector::Primary,
            formula: "1d6".into(),
            damage_type: Some(DamageType::Fire),
        };
        apply(&fire, &mut tx, &mut env, &c);
        assert_eq!(tx.state.token(TokenId(1)).unwrap().hp, 8);

        let status = apply(&Operation::damage("1d6 + mystery"), &mut tx, &mut env, &c);
        assert_eq!(status, OpStatus::Skipped(SkipReason::InvalidFormula));
        assert_eq!(tx.state.token(TokenId(1)).unwrap().hp, 8);
    }

    #[test]
    fn heal_caps_at_max_and_temp_hp_does_not_stack() {
        let (mut state, config) = fixture();
        state.token_mut(TokenId(1)).unwrap().hp = 8;
        let mut tx = Transaction::open(&state);
        let mut dice = FixedDice(8);
        let mut env = ExecutionEnv::new(&mut dice);
        let c = ctx(&config, Some(TokenId(1)));

        apply(
            &Operation::Heal {
                target: TargetSelector::Primary,
                formula: "1d8".into(),
            },
            &mut tx,
            &mut env,
            &c,
        );
        assert_eq!(tx.reports[0].amount, Some(2));

        let temp = |formula: &str| Operation::GrantTempHp {
            target: TargetSelector::SelfActor,
            formula: formula.into(),
        };
        assert!(apply(&temp("5"), &mut tx, &mut env, &c).is_applied());
        assert_eq!(
            apply(&temp("3"), &mut tx, &mut env, &c),
            OpStatus::Skipped(SkipReason::NoEffect)
        );
        assert_eq!(tx.state.token(TokenId(0)).unwrap().temp_hp, 5);
    }
}
