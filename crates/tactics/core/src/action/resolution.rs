//! Outcome resolution for one target.
//!
//! Every d20 goes through the staged roll context: the natural face is
//! replaced by an override, rerolled, then clamped, in that order.

use tracing::trace;

use crate::config::TieWinner;
use crate::env::Dice;
use crate::state::{AdvantageMode, EngineState, RollContext, Token, TokenId};

use super::mastery::{SAPPED_TAG, vex_mark};
use super::{ActionPlan, ContestedRolls, Outcome, OutcomeKind, ResolutionKind};

const DEFAULT_CHECK_DC: i32 = 10;

/// Resolves the plan against one target (or none).
///
/// Takes the state mutably only to consume the `vex` and `sap` marks an
/// attack roll reads.
pub fn resolve(
    plan: &ActionPlan,
    state: &mut EngineState,
    target: Option<TokenId>,
    dice: &mut dyn Dice,
) -> Outcome {
    let outcome = match plan.resolution.kind {
        ResolutionKind::Automatic => Outcome::automatic(target),
        ResolutionKind::AttackRoll => attack(plan, state, target, dice),
        ResolutionKind::SavingThrow => saving_throw(plan, state, target, dice),
        ResolutionKind::AbilityCheck => check(plan, state, target, dice),
        ResolutionKind::ContestedCheck => contested(plan, state, target, dice),
    };
    trace!(
        action = %plan.action_id,
        target = ?target,
        outcome = %outcome.kind,
        roll = outcome.roll,
        total = outcome.total,
        "resolved"
    );
    outcome
}

/// Rolls a d20 with the staged context applied.
fn roll_d20(ctx: &RollContext, mode: AdvantageMode, dice: &mut dyn Dice) -> u32 {
    let mode = AdvantageMode::from_sources(
        mode.has_advantage() || ctx.advantage,
        mode.has_disadvantage() || ctx.disadvantage,
    );
    let natural = dice.roll_d20(mode).natural;
    ctx.adjust_natural(natural, || dice.roll_die(20))
}

fn actor_of<'s>(plan: &ActionPlan, state: &'s EngineState) -> Option<&'s Token> {
    state.token(plan.actor)
}

fn bonus_or(plan: &ActionPlan, dice: &mut dyn Dice, fallback: i32) -> i32 {
    plan.resolution
        .bonus
        .as_ref()
        .map_or(fallback, |expr| expr.roll(dice, None).total)
}

fn attack(
    plan: &ActionPlan,
    state: &mut EngineState,
    target: Option<TokenId>,
    dice: &mut dyn Dice,
) -> Outcome {
    let r = &plan.resolution;
    let ctx = state.roll_context;

    let mut vexed = false;
    let mut sapped = false;
    if let Some(actor) = state.token_mut(plan.actor) {
        vexed = target.is_some_and(|t| actor.remove_tag(&vex_mark(t)));
        sapped = actor.remove_tag(SAPPED_TAG);
    }
    let mode = AdvantageMode::from_sources(
        r.advantage.has_advantage() || vexed,
        r.advantage.has_disadvantage() || sapped,
    );
    let natural = roll_d20(&ctx, mode, dice);

    let fallback = actor_of(plan, state).map_or(0, |actor| {
        actor.attack_bonus().unwrap_or_else(|| {
            actor.ability_mod(r.ability) + actor.proficiency_bonus().unwrap_or(0)
        })
    });
    let total = natural as i32 + bonus_or(plan, dice, fallback) + ctx.bonus_delta;

    let armor_class = target
        .and_then(|t| state.token(t))
        .and_then(Token::armor_class);
    let crit = natural >= r.crit_threshold;
    let hit = crit || armor_class.is_none_or(|ac| total >= ac);

    Outcome {
        kind: match (crit, hit) {
            (true, _) => OutcomeKind::Crit,
            (false, true) => OutcomeKind::Hit,
            (false, false) => OutcomeKind::Miss,
        },
        target,
        roll: natural,
        total,
        crit,
        against: armor_class,
        contested: None,
    }
}

/// The target saves (the actor, when there is no target).
fn saving_throw(
    plan: &ActionPlan,
    state: &EngineState,
    target: Option<TokenId>,
    dice: &mut dyn Dice,
) -> Outcome {
    let r = &plan.resolution;
    let ctx = state.roll_context;
    let actor = actor_of(plan, state);

    let dc = match &r.dc {
        Some(expr) => expr.roll(dice, None).total,
        None => actor.map_or(8, |a| {
            8 + a.proficiency_bonus().unwrap_or(0) + a.ability_mod(r.ability)
        }),
    } + ctx.dc_delta;

    let saver = target.or(Some(plan.actor)).and_then(|t| state.token(t));
    let natural = roll_d20(&ctx, r.advantage, dice);
    let total =
        natural as i32 + saver.map_or(0, |s| s.ability_mod(r.save_ability)) + ctx.bonus_delta;

    Outcome {
        kind: match total >= dc {
            true => OutcomeKind::SaveSuccess,
            false => OutcomeKind::SaveFail,
        },
        target,
        roll: natural,
        total,
        crit: false,
        against: Some(dc),
        contested: None,
    }
}

fn check(
    plan: &ActionPlan,
    state: &EngineState,
    target: Option<TokenId>,
    dice: &mut dyn Dice,
) -> Outcome {
    let r = &plan.resolution;
    let ctx = state.roll_context;

    let dc = r
        .dc
        .as_ref()
        .map_or(DEFAULT_CHECK_DC, |expr| expr.roll(dice, None).total)
        + ctx.dc_delta;
    let natural = roll_d20(&ctx, r.advantage, dice);
    let modifier = actor_of(plan, state).map_or(0, |a| a.ability_mod(r.ability));
    let total = natural as i32 + bonus_or(plan, dice, modifier) + ctx.bonus_delta;

    Outcome {
        kind: match total >= dc {
            true => OutcomeKind::CheckSuccess,
            false => OutcomeKind::CheckFail,
        },
        target,
        roll: natural,
        total,
        crit: false,
        against: Some(dc),
        contested: None,
    }
}

/// Only the actor's roll goes through the roll context.
fn contested(
    plan: &ActionPlan,
    state: &EngineState,
    target: Option<TokenId>,
    dice: &mut dyn Dice,
) -> Outcome {
    let r = &plan.resolution;
    let ctx = state.roll_context;

    let actor_roll = roll_d20(&ctx, r.advantage, dice);
    let modifier = actor_of(plan, state).map_or(0, |a| a.ability_mod(r.ability));
    let actor_total = actor_roll as i32 + bonus_or(plan, dice, modifier) + ctx.bonus_delta;

    let opponent = target.and_then(|t| state.token(t));
    let (target_roll, target_total) = match opponent {
        Some(opponent) => {
            let roll = dice.roll_d20(AdvantageMode::Normal).natural;
            (roll, roll as i32 + opponent.ability_mod(r.opposed_ability))
        }
        None => (0, i32::MIN),
    };

    let actor_wins = match actor_total.cmp(&target_total) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => r.tie_winner == TieWinner::Actor,
    };

    Outcome {
        kind: match actor_wins {
            true => OutcomeKind::ContestedWin,
            false => OutcomeKind::ContestedLose,
        },
        target,
        roll: actor_roll,
        total: actor_total,
        crit: false,
        against: opponent.map(|_| target_total),
        contested: Some(ContestedRolls {
            actor_roll,
            actor_total,
            target_roll,
            target_total: opponent.map_or(0, |_| target_total),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionSpec, ResolutionSpec};
    use crate::config::EngineConfig;
    use crate::env::{FixedDice, ScriptedDice};
    use crate::state::{Ability, Position, RerollMode};

    fn state() -> EngineState {
        EngineState::new(
            Token::new(TokenId(0), "rogue", Position::ORIGIN, 20)
                .with_mod(Ability::Dex, 3)
                .with_mod(Ability::For, 1)
                .with_level(1),
        )
        .with_enemy(
            Token::new(TokenId(1), "knight", Position::new(1, 0), 30)
                .with_armor_class(18)
                .with_mod(Ability::Con, 2)
                .with_mod(Ability::For, 3),
        )
        .with_enemy(Token::new(TokenId(2), "slime", Position::new(0, 1), 10))
    }

    fn plan(state: &EngineState, resolution: ResolutionSpec, config: &EngineConfig) -> ActionPlan {
        let spec = ActionSpec::new("test").with_resolution(resolution);
        ActionPlan::compile(&spec, state, TokenId(0), Some(TokenId(1)), config).unwrap()
    }

    #[test]
    fn attack_against_armor_class() {
        let mut s = state();
        let p = plan(&s, ResolutionSpec::attack(Ability::Dex), &EngineConfig::default());

        // 13 + 3 + 2 = 18 meets AC 18.
        let hit = resolve(&p, &mut s, Some(TokenId(1)), &mut FixedDice(13));
        assert_eq!((hit.kind, hit.total, hit.against), (OutcomeKind::Hit, 18, Some(18)));

        let miss = resolve(&p, &mut s, Some(TokenId(1)), &mut FixedDice(12));
        assert_eq!(miss.kind, OutcomeKind::Miss);
    }

    #[test]
    fn no_armor_class_always_hits_and_natural_twenty_crits() {
        let mut s = state();
        let p = plan(&s, ResolutionSpec::attack(Ability::Dex), &EngineConfig::default());

        let slime = resolve(&p, &mut s, Some(TokenId(2)), &mut FixedDice(1));
        assert_eq!(slime.kind, OutcomeKind::Hit);

        let crit = resolve(&p, &mut s, Some(TokenId(1)), &mut FixedDice(20));
        assert!(crit.crit && crit.is_hit());
        assert_eq!(crit.kind, OutcomeKind::Crit);
    }

    #[test]
    fn lowered_crit_threshold_applies() {
        let mut s = state();
        let config = EngineConfig::default().with_crit_threshold(19);
        let p = plan(&s, ResolutionSpec::attack(Ability::Dex), &config);
        assert_eq!(resolve(&p, &mut s, Some(TokenId(1)), &mut FixedDice(19)).kind, OutcomeKind::Crit);
    }

    #[test]
    fn saving_throw_uses_target_modifier() {
        let mut s = state();
        let p = plan(&s, ResolutionSpec::saving_throw(Ability::Con, "15"), &EngineConfig::default());

        let save = resolve(&p, &mut s, Some(TokenId(1)), &mut FixedDice(10));
        assert_eq!((save.kind, save.total, save.against), (OutcomeKind::SaveFail, 12, Some(15)));

        s.roll_context.dc_delta = -3;
        let save = resolve(&p, &mut s, Some(TokenId(1)), &mut FixedDice(10));
        assert_eq!(save.kind, OutcomeKind::SaveSuccess);
    }

    #[test]
    fn roll_context_overrides_rerolls_and_clamps() {
        let mut s = state();
        let p = plan(&s, ResolutionSpec::attack(Ability::Dex), &EngineConfig::default());
        s.roll_context = RollContext {
            roll_override: Some(2),
            reroll: Some(RerollMode::KeepMax),
            clamp_max: Some(15),
            bonus_delta: 1,
            ..RollContext::default()
        };
        // d20 shows 20, overridden to 2, reroll shows 19, clamped to 15.
        let outcome = resolve(&p, &mut s, Some(TokenId(1)), &mut ScriptedDice::new([20, 19]));
        assert_eq!((outcome.roll, outcome.total), (15, 21));
        assert!(!outcome.crit);
    }

    #[test]
    fn contested_tie_goes_to_configured_winner() {
        let mut s = state();
        let spec = ResolutionSpec::contested(Ability::Dex, Ability::For);

        // 10 + 3 against 10 + 3.
        let p = plan(&s, spec.clone(), &EngineConfig::default());
        let tie = resolve(&p, &mut s, Some(TokenId(1)), &mut FixedDice(10));
        assert_eq!(tie.kind, OutcomeKind::ContestedWin);

        let config = EngineConfig::default().with_tie_winner(TieWinner::Target);
        let p = plan(&s, spec, &config);
        let tie = resolve(&p, &mut s, Some(TokenId(1)), &mut FixedDice(10));
        assert_eq!(tie.kind, OutcomeKind::ContestedLose);
    }

    #[test]
    fn vex_and_sap_marks_are_consumed() {
        let mut s = state();
        let p = plan(&s, ResolutionSpec::attack(Ability::Dex), &EngineConfig::default());
        s.token_mut(TokenId(0)).unwrap().add_tag(vex_mark(TokenId(1)));

        // Advantage keeps the higher of 5 and 16.
        let outcome = resolve(&p, &mut s, Some(TokenId(1)), &mut ScriptedDice::new([5, 16]));
        assert_eq!(outcome.roll, 16);
        assert!(!s.token(TokenId(0)).unwrap().has_tag(&vex_mark(TokenId(1))));

        s.token_mut(TokenId(0)).unwrap().add_tag(SAPPED_TAG);
        let outcome = resolve(&p, &mut s, Some(TokenId(1)), &mut ScriptedDice::new([5, 16]));
        assert_eq!(outcome.roll, 5);
        assert!(!s.token(TokenId(0)).unwrap().has_tag(SAPPED_TAG));
    }
}
