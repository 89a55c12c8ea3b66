//! The twelve-phase action pipeline.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::action::hook::fire_hooks;
use crate::action::mastery::{self, MasteryState};
use crate::action::operation::{OpContext, OpReport, Operation, apply_all};
use crate::action::resolution::resolve;
use crate::action::{ActionPlan, Outcome, OutcomeKind, Phase};
use crate::config::EngineConfig;
use crate::env::{ExecutionEnv, MovementIntent, ReactionContext, ReactionSignal, ReactionWindow};
use crate::state::{
    EngineState, RollContext, TargetingConfig, TargetingMode, TargetingState, TokenId,
};

use super::{LogEntry, Transaction};

/// Everything one execution produced.
///
/// `state` is authoritative: the snapshot passed to [`execute`] is never
/// touched. On interruption it is a copy of that snapshot.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub ok: bool,
    pub interrupted: bool,
    pub state: EngineState,
    /// Outcome of the last resolved target.
    pub outcome: Option<Outcome>,
    /// One outcome per resolution, in order.
    pub outcomes: Vec<Outcome>,
    pub logs: Vec<LogEntry>,
    pub reports: Vec<OpReport>,
    pub intents: Vec<MovementIntent>,
    pub spawned: Vec<TokenId>,
}

impl ExecutionResult {
    fn finish(tx: Transaction, outcomes: Vec<Outcome>) -> Self {
        Self {
            ok: true,
            interrupted: false,
            state: tx.state,
            outcome: outcomes.last().cloned(),
            outcomes,
            logs: tx.log,
            reports: tx.reports,
            intents: tx.intents,
            spawned: tx.spawned,
        }
    }

    fn interrupted(snapshot: &EngineState, tx: Transaction, outcomes: Vec<Outcome>) -> Self {
        Self {
            ok: false,
            interrupted: true,
            state: snapshot.clone(),
            outcome: outcomes.last().cloned(),
            outcomes,
            logs: tx.log,
            reports: tx.reports,
            intents: Vec::new(),
            spawned: Vec::new(),
        }
    }
}

/// Runs a compiled plan against `state`.
///
/// Never fails. Skipped work shows up in `reports`; an interrupt raised in a
/// reaction window returns `ok: false` with the log accumulated so far.
pub fn execute(
    plan: &ActionPlan,
    state: &EngineState,
    env: &mut ExecutionEnv<'_>,
    config: &EngineConfig,
) -> ExecutionResult {
    let mut tx = Transaction::open(state);
    begin(plan, &mut tx);

    let base = OpContext {
        action_id: &plan.action_id,
        action_tags: &plan.tags,
        actor: plan.actor,
        target: tx.state.targeting.first(),
        outcome: None,
        phase: Phase::IntentBuild,
        crit_rule: plan.resolution.crit_rule,
        config,
        depth: 0,
    };

    for phase in [
        Phase::IntentBuild,
        Phase::OptionsResolve,
        Phase::Validate,
        Phase::Targeting,
    ] {
        let ctx = OpContext {
            target: tx.state.targeting.first(),
            ..base
        };
        enter(phase, plan, &mut tx, ctx.target);
        fire_hooks(phase, plan, &mut tx, env, &ctx);
        if phase == Phase::IntentBuild {
            mastery::on_intent(plan, &mut tx, env, &OpContext { phase, ..ctx });
        }
    }
    tx.state.targeting.locked = true;

    let first = tx.state.targeting.first();
    enter(Phase::PreResolution, plan, &mut tx, first);
    fire_hooks(
        Phase::PreResolution,
        plan,
        &mut tx,
        env,
        &OpContext {
            target: first,
            ..base
        },
    );
    if plan.reactions.pre && interrupt(ReactionWindow::Pre, plan, &mut tx, env, first, None) {
        return ExecutionResult::interrupted(state, tx, Vec::new());
    }

    let mut queue: VecDeque<Option<TokenId>> = match tx.state.targeting.selected.as_slice() {
        [] => VecDeque::from([None]),
        selected => selected.iter().copied().map(Some).collect(),
    };
    let mut resolved = Vec::new();
    let mut outcomes = Vec::new();
    let mut mastery_state = MasteryState::default();

    while let Some(target) = queue.pop_front() {
        let outcome = resolve(plan, &mut tx.state, target, env.dice());
        debug!(action = %plan.action_id, target = ?target, outcome = %outcome.kind, "target resolved");
        tx.log.push(LogEntry::Outcome(outcome.clone()));
        if let Some(id) = target {
            resolved.push(id);
        }

        let ctx = OpContext {
            target,
            outcome: Some(&outcome),
            ..base
        };
        for phase in [Phase::Resolve, Phase::Outcome] {
            enter(phase, plan, &mut tx, target);
            fire_hooks(phase, plan, &mut tx, env, &ctx);
        }

        let chained = mastery::on_outcome(
            plan,
            &mut tx,
            env,
            &OpContext {
                phase: Phase::Outcome,
                ..ctx
            },
            &outcome,
            &resolved,
            &mut mastery_state,
        );
        if let Some(next) = chained {
            queue.push_back(Some(next));
        }

        enter(Phase::BeforeApply, plan, &mut tx, target);
        fire_hooks(Phase::BeforeApply, plan, &mut tx, env, &ctx);
        apply_all(
            branch_operations(plan, outcome.kind),
            &mut tx,
            env,
            &OpContext {
                phase: Phase::BeforeApply,
                ..ctx
            },
        );

        for phase in [Phase::AfterApply, Phase::PostResolution] {
            enter(phase, plan, &mut tx, target);
            fire_hooks(phase, plan, &mut tx, env, &ctx);
        }
        outcomes.push(outcome);
    }

    let last = outcomes.last();
    let last_target = last.and_then(|o| o.target);
    if plan.reactions.post
        && interrupt(ReactionWindow::Post, plan, &mut tx, env, last_target, last)
    {
        return ExecutionResult::interrupted(state, tx, outcomes);
    }

    let ctx = OpContext {
        target: last_target,
        outcome: last,
        ..base
    };
    for phase in [Phase::BeforeCommit, Phase::AfterCommit] {
        enter(phase, plan, &mut tx, last_target);
        fire_hooks(phase, plan, &mut tx, env, &ctx);
    }

    tx.state.roll_context = RollContext::default();
    debug!(
        action = %plan.action_id,
        resolutions = outcomes.len(),
        ops = tx.reports.len(),
        "action committed"
    );
    ExecutionResult::finish(tx, outcomes)
}

/// Binds the working copy to the plan's actor and seeds targeting.
fn begin(plan: &ActionPlan, tx: &mut Transaction) {
    let state = &mut tx.state;
    if state.actor != plan.actor {
        state.actor = plan.actor;
        state.concentration = state.token(plan.actor).and_then(|t| t.concentration.clone());
    }

    let rule = plan.targeting;
    state.targeting_config = TargetingConfig {
        mode: rule.mode,
        max_targets: rule.max_targets,
        range: rule.range,
    };
    let seed = match rule.mode {
        TargetingMode::SelfOnly => vec![plan.actor],
        TargetingMode::None => Vec::new(),
        _ => plan.target.into_iter().collect(),
    };
    state.targeting = TargetingState::seeded(seed);
}

fn enter(phase: Phase, plan: &ActionPlan, tx: &mut Transaction, target: Option<TokenId>) {
    trace!(action = %plan.action_id, %phase, target = ?target, "phase entered");
    tx.state.phase = phase;
    tx.log.push(LogEntry::PhaseEntered { phase, target });
}

/// Opens a reaction window. Returns true when the handler interrupts.
fn interrupt(
    window: ReactionWindow,
    plan: &ActionPlan,
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    target: Option<TokenId>,
    outcome: Option<&Outcome>,
) -> bool {
    let Some(handler) = env.reactions() else {
        return false;
    };
    let signal = handler.open(
        window,
        &ReactionContext {
            action_id: &plan.action_id,
            actor: plan.actor,
            target,
            outcome,
        },
    );
    if signal == ReactionSignal::Continue {
        return false;
    }
    debug!(action = %plan.action_id, %window, "reaction window interrupted");
    tx.log.push(LogEntry::Interrupted { window });
    true
}

/// Operations applied for one outcome. `on_resolve` always runs first; a crit
/// runs `on_hit` and then `on_crit`.
fn branch_operations(plan: &ActionPlan, kind: OutcomeKind) -> impl Iterator<Item = &Operation> {
    let b = &plan.branches;
    let (first, second): (&[Operation], &[Operation]) = match kind {
        OutcomeKind::Crit => (&b.on_hit, &b.on_crit),
        OutcomeKind::Hit | OutcomeKind::CheckSuccess | OutcomeKind::ContestedWin => (&b.on_hit, &[]),
        OutcomeKind::Miss | OutcomeKind::CheckFail | OutcomeKind::ContestedLose => (&b.on_miss, &[]),
        OutcomeKind::SaveSuccess => (&b.on_save_success, &[]),
        OutcomeKind::SaveFail => (&b.on_save_fail, &[]),
    };
    b.on_resolve.iter().chain(first).chain(second)
}
