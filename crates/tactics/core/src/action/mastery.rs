//! Weapon mastery properties.
//!
//! Each mastery is gated by an actor tag `wm:<id>` and an action tag
//! `mastery:<id>`, and is expressed with ordinary operations. Marks left by
//! `vex` and `sap` are read and consumed by the attack resolution.

use tracing::debug;

use crate::config::EngineConfig;
use crate::env::ExecutionEnv;
use crate::state::{Ability, AdvantageMode, Size, TokenId};

use super::execute::{LogEntry, Transaction};
use super::operation::{OpContext, Operation, TargetSelector, apply};
use super::{ActionPlan, Outcome, OutcomeKind, ResolutionKind};

/// Tag on a token that suffers disadvantage on its next attack roll.
pub const SAPPED_TAG: &str = "sapped";

/// Flag set on the actor when `nick` frees the off-hand attack.
pub const OFFHAND_FREE_FLAG: &str = "offhand_free";

/// Actor tag granting advantage on the next attack against `target`.
pub fn vex_mark(target: TokenId) -> String {
    format!("vex:{}", target.0)
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Mastery {
    /// Advantage on the next attack against the same target.
    Vex,
    /// The target has disadvantage on its next attack roll.
    Sap,
    /// Pushes a Large or smaller target two cells away.
    Push,
    /// A miss still deals the attack ability modifier as damage.
    Graze,
    /// Constitution save or fall prone.
    Topple,
    Slow,
    /// One extra resolution against an adjacent enemy.
    Cleave,
    /// The off-hand light weapon attack costs no bonus action.
    Nick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MasteryTrigger {
    OnHit,
    OnMiss,
    OnIntent,
}

impl Mastery {
    pub fn trigger(self) -> MasteryTrigger {
        match self {
            Self::Graze => MasteryTrigger::OnMiss,
            Self::Nick => MasteryTrigger::OnIntent,
            _ => MasteryTrigger::OnHit,
        }
    }

    pub fn actor_tag(self) -> String {
        format!("wm:{self}")
    }

    pub fn action_tag(self) -> String {
        format!("mastery:{self}")
    }

    /// Whether the actor has this mastery and the action declares it.
    pub fn is_active(self, plan: &ActionPlan, tx: &Transaction, config: &EngineConfig) -> bool {
        config.weapon_mastery
            && plan.has_tag(&self.action_tag())
            && tx
                .state
                .token(plan.actor)
                .is_some_and(|actor| actor.has_tag(&self.actor_tag()))
    }
}

/// Per-execution mastery bookkeeping.
#[derive(Clone, Debug, Default)]
pub(crate) struct MasteryState {
    cleaved: bool,
}

fn active(
    plan: &ActionPlan,
    tx: &Transaction,
    config: &EngineConfig,
    trigger: MasteryTrigger,
) -> Vec<Mastery> {
    use strum::IntoEnumIterator;

    Mastery::iter()
        .filter(|m| m.trigger() == trigger && m.is_active(plan, tx, config))
        .collect()
}

/// Masteries that fire while the intent is built.
pub(crate) fn on_intent(
    plan: &ActionPlan,
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
) {
    for mastery in active(plan, tx, ctx.config, MasteryTrigger::OnIntent) {
        if mastery == Mastery::Nick {
            let op = Operation::SetFlag {
                target: TargetSelector::SelfActor,
                flag: OFFHAND_FREE_FLAG.to_string(),
                value: 1,
            };
            if apply(&op, tx, env, ctx).is_applied() {
                log(tx, mastery, Some(plan.actor));
            }
        }
    }
}

/// Masteries keyed by the outcome of one attack roll. Returns an extra target
/// to resolve when `cleave` found one. Other resolution kinds never trigger.
pub(crate) fn on_outcome(
    plan: &ActionPlan,
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    outcome: &Outcome,
    resolved: &[TokenId],
    state: &mut MasteryState,
) -> Option<TokenId> {
    if plan.resolution.kind != ResolutionKind::AttackRoll {
        return None;
    }
    let target = outcome.target?;
    let trigger = match outcome.kind {
        OutcomeKind::Hit | OutcomeKind::Crit => MasteryTrigger::OnHit,
        OutcomeKind::Miss => MasteryTrigger::OnMiss,
        _ => return None,
    };

    let mut chained = None;
    for mastery in active(plan, tx, ctx.config, trigger) {
        let fired = match mastery {
            Mastery::Vex => apply(
                &Operation::AddTag {
                    target: TargetSelector::SelfActor,
                    tag: vex_mark(target),
                },
                tx,
                env,
                ctx,
            )
            .is_applied(),
            Mastery::Sap => apply(
                &Operation::AddTag {
                    target: TargetSelector::Primary,
                    tag: SAPPED_TAG.to_string(),
                },
                tx,
                env,
                ctx,
            )
            .is_applied(),
            Mastery::Push => {
                let fits = tx
                    .state
                    .token(target)
                    .is_some_and(|t| t.movement.size <= Size::Large);
                fits && apply(
                    &Operation::Push {
                        target: TargetSelector::Primary,
                        distance: 2,
                    },
                    tx,
                    env,
                    ctx,
                )
                .is_applied()
            }
            Mastery::Graze => {
                let modifier = tx
                    .state
                    .token(plan.actor)
                    .map_or(0, |a| a.ability_mod(plan.resolution.ability));
                modifier > 0
                    && apply(&Operation::damage(modifier.to_string()), tx, env, ctx).is_applied()
            }
            Mastery::Topple => topple(plan, tx, env, ctx, target),
            Mastery::Slow => apply(
                &Operation::apply_condition("slowed", Some(1)),
                tx,
                env,
                ctx,
            )
            .is_applied(),
            Mastery::Cleave => {
                if state.cleaved {
                    false
                } else {
                    chained = cleave_target(plan, tx, target, resolved);
                    state.cleaved = chained.is_some();
                    chained.is_some()
                }
            }
            Mastery::Nick => false,
        };
        if fired {
            let logged = match mastery {
                Mastery::Cleave => chained,
                _ => Some(target),
            };
            log(tx, mastery, logged);
        }
    }
    chained
}

/// Target makes a CON save against 8 + the attack ability modifier + the
/// actor's proficiency bonus, and falls prone on a failure.
fn topple(
    plan: &ActionPlan,
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    target: TokenId,
) -> bool {
    let Some(actor) = tx.state.token(plan.actor) else {
        return false;
    };
    let dc = 8 + actor.ability_mod(plan.resolution.ability) + actor.proficiency_bonus().unwrap_or(0);
    let save_mod = tx.state.token(target).map_or(0, |t| t.ability_mod(Ability::Con));
    let total = env.dice().roll_d20(AdvantageMode::Normal).natural as i32 + save_mod;
    debug!(target = %target, dc, total, "topple save");
    if total >= dc {
        return false;
    }
    apply(&Operation::apply_condition("prone", None), tx, env, ctx).is_applied()
}

/// Nearest living enemy of the actor within one cell of `target` that this
/// action has not resolved yet. Ties go to the lower id.
fn cleave_target(
    plan: &ActionPlan,
    tx: &Transaction,
    target: TokenId,
    resolved: &[TokenId],
) -> Option<TokenId> {
    let state = &tx.state;
    let origin = state.token(target)?.position;
    state
        .tokens
        .iter()
        .filter(|t| {
            t.is_alive()
                && t.id != target
                && !resolved.contains(&t.id)
                && !state.targeting.contains(t.id)
                && state.are_hostile(plan.actor, t.id)
                && origin.distance_to(t.position) <= 1
        })
        .min_by_key(|t| (origin.distance_to(t.position), t.id))
        .map(|t| t.id)
}

fn log(tx: &mut Transaction, mastery: Mastery, target: Option<TokenId>) {
    debug!(%mastery, target = ?target, "weapon mastery");
    tx.log.push(LogEntry::Mastery { mastery, target });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionSpec, Phase, ResolutionSpec};
    use crate::env::{FixedDice, ScriptedDice};
    use crate::state::{EngineState, Position, Token};

    fn state() -> EngineState {
        EngineState::new(
            Token::new(TokenId(0), "fighter", Position::ORIGIN, 30)
                .with_mod(Ability::For, 3)
                .with_level(5)
                .with_tag("wm:graze")
                .with_tag("wm:topple")
                .with_tag("wm:cleave"),
        )
        .with_enemy(Token::new(TokenId(1), "orc", Position::new(1, 0), 15))
        .with_enemy(Token::new(TokenId(2), "orc", Position::new(2, 0), 15))
    }

    fn plan(state: &EngineState, tag: &str) -> ActionPlan {
        plan_with(state, tag, ResolutionSpec::attack(Ability::For))
    }

    fn plan_with(state: &EngineState, tag: &str, resolution: ResolutionSpec) -> ActionPlan {
        let spec = ActionSpec::new("greataxe")
            .with_resolution(resolution)
            .with_tag(tag);
        ActionPlan::compile(&spec, state, TokenId(0), Some(TokenId(1)), &EngineConfig::default())
            .unwrap()
    }

    fn ctx<'p>(
        plan: &'p ActionPlan,
        config: &'p EngineConfig,
        outcome: &'p Outcome,
    ) -> OpContext<'p> {
        OpContext {
            action_id: &plan.action_id,
            action_tags: &plan.tags,
            actor: plan.actor,
            target: outcome.target,
            outcome: Some(outcome),
            phase: Phase::Outcome,
            crit_rule: plan.resolution.crit_rule,
            config,
            depth: 0,
        }
    }

    fn outcome(kind: OutcomeKind) -> Outcome {
        Outcome {
            kind,
            ..Outcome::automatic(Some(TokenId(1)))
        }
    }

    fn run(
        plan: &ActionPlan,
        state: &EngineState,
        config: &EngineConfig,
        dice: &mut dyn crate::env::Dice,
        outcome: &Outcome,
    ) -> Transaction {
        let mut tx = Transaction::open(state);
        let mut env = ExecutionEnv::new(dice);
        let c = ctx(plan, config, outcome);
        on_outcome(plan, &mut tx, &mut env, &c, outcome, &[], &mut MasteryState::default());
        tx
    }

    #[test]
    fn graze_deals_modifier_on_miss() {
        let state = state();
        let plan = plan(&state, "mastery:graze");
        let config = EngineConfig::default();
        let miss = outcome(OutcomeKind::Miss);

        let tx = run(&plan, &state, &config, &mut FixedDice(1), &miss);
        assert_eq!(tx.state.token(TokenId(1)).unwrap().hp, 12);
        assert!(tx.log.contains(&LogEntry::Mastery {
            mastery: Mastery::Graze,
            target: Some(TokenId(1))
        }));
    }

    #[test]
    fn only_attack_rolls_trigger_masteries() {
        let state = state();
        let config = EngineConfig::default();

        let save = plan_with(&state, "mastery:graze", ResolutionSpec::saving_throw(Ability::Sag, "10"));
        for kind in [OutcomeKind::SaveSuccess, OutcomeKind::SaveFail] {
            let tx = run(&save, &state, &config, &mut FixedDice(20), &outcome(kind));
            assert_eq!(tx.state, state);
            assert!(tx.log.is_empty());
        }

        let automatic = plan_with(&state, "mastery:topple", ResolutionSpec::default());
        let hit = outcome(OutcomeKind::Hit);
        let tx = run(&automatic, &state, &config, &mut FixedDice(1), &hit);
        assert!(!tx.state.token(TokenId(1)).unwrap().statuses.has("prone"));
        assert!(tx.log.is_empty());
    }

    #[test]
    fn nick_is_logged_only_when_the_flag_is_set() {
        let state = EngineState::new(
            Token::new(TokenId(0), "duelist", Position::ORIGIN, 20).with_tag("wm:nick"),
        );
        let spec = ActionSpec::new("shortsword").with_tag("mastery:nick");
        let config = EngineConfig::default();
        let plan = ActionPlan::compile(&spec, &state, TokenId(0), None, &config).unwrap();
        let miss = outcome(OutcomeKind::Miss);
        let c = ctx(&plan, &config, &miss);
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);

        let mut tx = Transaction::open(&state);
        on_intent(&plan, &mut tx, &mut env, &c);
        assert_eq!(tx.state.token(TokenId(0)).unwrap().value(OFFHAND_FREE_FLAG), Some(1));
        assert!(tx.log.contains(&LogEntry::Mastery {
            mastery: Mastery::Nick,
            target: Some(TokenId(0))
        }));

        // Flag already set: the operation is skipped and nothing is logged.
        on_intent(&plan, &mut tx, &mut env, &c);
        let logged = tx
            .log
            .iter()
            .filter(|e| matches!(e, LogEntry::Mastery { .. }))
            .count();
        assert_eq!(logged, 1);
    }

    #[test]
    fn mastery_requires_both_tags_and_the_switch() {
        let state = state();
        let config = EngineConfig::default();
        let miss = outcome(OutcomeKind::Miss);

        // Action does not declare graze.
        let plain = plan(&state, "mastery:vex");
        let tx = run(&plain, &state, &config, &mut FixedDice(1), &miss);
        assert_eq!(tx.state, state);

        let graze = plan(&state, "mastery:graze");
        let disabled = EngineConfig::default().with_weapon_mastery(false);
        let tx = run(&graze, &state, &disabled, &mut FixedDice(1), &miss);
        assert_eq!(tx.state, state);
    }

    #[test]
    fn topple_knocks_prone_on_failed_save() {
        let state = state();
        let plan = plan(&state, "mastery:topple");
        let config = EngineConfig::default();
        let hit = outcome(OutcomeKind::Hit);

        // DC 8 + 3 + 3 = 14; a natural 13 fails.
        let tx = run(&plan, &state, &config, &mut ScriptedDice::new([13]), &hit);
        assert!(tx.state.token(TokenId(1)).unwrap().statuses.has("prone"));

        let tx = run(&plan, &state, &config, &mut ScriptedDice::new([14]), &hit);
        assert!(!tx.state.token(TokenId(1)).unwrap().statuses.has("prone"));
    }

    #[test]
    fn cleave_chains_once_to_an_adjacent_enemy() {
        let state = state();
        let plan = plan(&state, "mastery:cleave");
        let config = EngineConfig::default();
        let hit = outcome(OutcomeKind::Hit);
        let mut tx = Transaction::open(&state);
        tx.state.targeting.selected = vec![TokenId(1)];
        let mut dice = FixedDice(1);
        let mut env = ExecutionEnv::new(&mut dice);
        let mut bookkeeping = MasteryState::default();

        let c = ctx(&plan, &config, &hit);
        let resolved = [TokenId(1)];
        let chained = on_outcome(&plan, &mut tx, &mut env, &c, &hit, &resolved, &mut bookkeeping);
        assert_eq!(chained, Some(TokenId(2)));

        let again = on_outcome(&plan, &mut tx, &mut env, &c, &hit, &resolved, &mut bookkeeping);
        assert_eq!(again, None);
    }
}
