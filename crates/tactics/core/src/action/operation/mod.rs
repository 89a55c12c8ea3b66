//! Effect operations and their interpreter.
//!
//! [`Operation`] is the closed set of effect primitives an action can apply.
//! [`apply`] runs one of them against a transaction and always returns: an
//! operation that cannot act reports a [`SkipReason`] and leaves the state
//! untouched. Every application is recorded as an [`OpReport`] in both the
//! transaction's reports and its log.

mod board;
mod concentration;
mod damage;
mod entity;
mod marker;
mod movement;
mod presentation;
mod resource;
mod roll;
mod status;
mod targeting;

use std::collections::BTreeMap;

use tracing::trace;

use crate::config::EngineConfig;
use crate::env::{ExecutionEnv, MovementKind};
use crate::state::{BoardEffectKind, DamageType, Position, RerollMode, TokenId};

use super::condition::{Condition, EvalContext};
use super::execute::{LogEntry, Transaction};
use super::{CritRule, Outcome, Phase};

pub(crate) use concentration::{break_concentration, concentration_check};

/// Token an operation acts on.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetSelector {
    /// The target currently being resolved.
    #[default]
    Primary,
    /// The acting token.
    #[cfg_attr(feature = "serde", serde(rename = "self"))]
    #[strum(serialize = "self")]
    SelfActor,
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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ScaleDivisor {
    Half,
    Quarter,
}

impl ScaleDivisor {
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Half => 2,
            Self::Quarter => 4,
        }
    }
}

/// Where a board effect is placed.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EffectAnchor {
    Actor,
    #[default]
    Target,
}

#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")
)]
pub enum Operation {
    // ===== hit points =====
    DealDamage {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        formula: String,
        #[cfg_attr(feature = "serde", serde(default))]
        damage_type: Option<DamageType>,
    },
    /// Damage whose rolled total is floor-divided before it lands.
    DealScaledDamage {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        formula: String,
        divisor: ScaleDivisor,
        #[cfg_attr(feature = "serde", serde(default))]
        damage_type: Option<DamageType>,
    },
    Heal {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        formula: String,
    },
    GrantTempHp {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        formula: String,
    },

    // ===== statuses =====
    ApplyCondition {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        status: String,
        #[cfg_attr(feature = "serde", serde(default))]
        turns: Option<u32>,
    },
    RemoveCondition {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        status: String,
    },
    ExtendCondition {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        status: String,
        turns: u32,
    },
    StackCondition {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        status: String,
        stacks: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        turns: Option<u32>,
    },
    ResetStacks {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        status: String,
    },

    // ===== concentration =====
    /// Starts concentration for the actor. The source id defaults to
    /// `<action>@<actor>`.
    StartConcentration {
        #[cfg_attr(feature = "serde", serde(default))]
        source: Option<String>,
    },
    BreakConcentration {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
    },

    // ===== resources =====
    SpendResource {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        resource: String,
        amount: i32,
    },
    RestoreResource {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        resource: String,
        amount: i32,
    },
    SetResource {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        resource: String,
        amount: i32,
    },
    ConsumeSlot {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        level: u8,
    },
    RestoreSlot {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        level: u8,
    },

    // ===== movement intents =====
    MoveTo {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        to: Position,
    },
    /// Displaces the token by a fixed offset.
    ForcedMove {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        dx: i32,
        dy: i32,
    },
    Teleport {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        to: Position,
    },
    /// Swaps places with the actor.
    Swap {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
    },
    Knockback {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        distance: u32,
    },
    Push {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        distance: u32,
    },
    /// Pulls towards the actor, stopping in an adjacent cell.
    Pull {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        distance: u32,
    },

    // ===== entities =====
    Spawn {
        template: String,
        /// Defaults to the actor's position.
        #[cfg_attr(feature = "serde", serde(default))]
        at: Option<Position>,
    },
    Despawn {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
    },
    ControlSummon {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
    },

    // ===== tags & flags =====
    AddTag {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        tag: String,
    },
    RemoveTag {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        tag: String,
    },
    SetFlag {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        flag: String,
        #[cfg_attr(feature = "serde", serde(default = "flag_on"))]
        value: i32,
    },
    ClearFlag {
        #[cfg_attr(feature = "serde", serde(default))]
        target: TargetSelector,
        flag: String,
    },

    // ===== board =====
    CreateBoardEffect {
        id: String,
        kind: BoardEffectKind,
        radius: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        rounds: Option<u32>,
        #[cfg_attr(feature = "serde", serde(default))]
        at: EffectAnchor,
        #[cfg_attr(feature = "serde", serde(default))]
        tags: Vec<String>,
    },
    RemoveBoardEffect {
        id: String,
    },

    // ===== targeting =====
    LockTargets,
    /// Adds the nearest eligible tokens until `max_targets` is reached.
    ExpandTargets {
        /// Maximum distance from the first selected target (or the actor).
        #[cfg_attr(feature = "serde", serde(default))]
        radius: Option<u32>,
        #[cfg_attr(feature = "serde", serde(default = "hostile_default"))]
        hostile_only: bool,
    },
    FilterTargets {
        condition: Condition,
    },
    Retarget {
        token: TokenId,
    },
    ClearTargets,

    // ===== roll context =====
    AddRollBonus {
        amount: i32,
    },
    AddDcDelta {
        amount: i32,
    },
    OverrideRoll {
        value: u32,
    },
    SetReroll {
        mode: RerollMode,
    },
    ClampRoll {
        #[cfg_attr(feature = "serde", serde(default))]
        min: Option<u32>,
        #[cfg_attr(feature = "serde", serde(default))]
        max: Option<u32>,
    },
    GrantAdvantage,
    GrantDisadvantage,
    ClearRollContext,

    // ===== presentation =====
    PlayVisual {
        id: String,
    },
    Log {
        message: String,
    },
    EmitEvent {
        name: String,
        #[cfg_attr(feature = "serde", serde(default))]
        payload: BTreeMap<String, String>,
    },

    // ===== control flow =====
    Conditional {
        condition: Condition,
        #[cfg_attr(feature = "serde", serde(default))]
        then: Vec<Operation>,
        #[cfg_attr(feature = "serde", serde(default))]
        otherwise: Vec<Operation>,
    },
}

#[cfg(feature = "serde")]
fn flag_on() -> i32 {
    1
}

#[cfg(feature = "serde")]
fn hostile_default() -> bool {
    true
}

impl Operation {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Selector of operations that act on a single token.
    pub fn selector(&self) -> Option<TargetSelector> {
        use Operation::*;

        match self {
            DealDamage { target, .. }
            | DealScaledDamage { target, .. }
            | Heal { target, .. }
            | GrantTempHp { target, .. }
            | ApplyCondition { target, .. }
            | RemoveCondition { target, .. }
            | ExtendCondition { target, .. }
            | StackCondition { target, .. }
            | ResetStacks { target, .. }
            | BreakConcentration { target }
            | SpendResource { target, .. }
            | RestoreResource { target, .. }
            | SetResource { target, .. }
            | ConsumeSlot { target, .. }
            | RestoreSlot { target, .. }
            | MoveTo { target, .. }
            | ForcedMove { target, .. }
            | Teleport { target, .. }
            | Swap { target }
            | Knockback { target, .. }
            | Push { target, .. }
            | Pull { target, .. }
            | Despawn { target }
            | ControlSummon { target }
            | AddTag { target, .. }
            | RemoveTag { target, .. }
            | SetFlag { target, .. }
            | ClearFlag { target, .. } => Some(*target),
            StartConcentration { .. } => Some(TargetSelector::SelfActor),
            _ => None,
        }
    }

    pub fn damage(formula: impl Into<String>) -> Self {
        Self::DealDamage {
            target: TargetSelector::Primary,
            formula: formula.into(),
            damage_type: None,
        }
    }

    pub fn apply_condition(status: impl Into<String>, turns: Option<u32>) -> Self {
        Self::ApplyCondition {
            target: TargetSelector::Primary,
            status: status.into(),
            turns,
        }
    }

    pub fn remove_condition(status: impl Into<String>) -> Self {
        Self::RemoveCondition {
            target: TargetSelector::Primary,
            status: status.into(),
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The target selector did not resolve to a token.
    UnresolvedTarget,
    TargetingLocked,
    /// The operation needs a collaborator that was not injected.
    NoCollaborator,
    /// A collaborator refused the request.
    Refused,
    NotConcentrating,
    UnknownStatus,
    ConditionFailed,
    InvalidFormula,
    InsufficientResource,
    /// Nothing changed.
    NoEffect,
    NestingTooDeep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OpStatus {
    Applied,
    Skipped(SkipReason),
}

impl OpStatus {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Record of one operation application.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpReport {
    pub op: String,
    pub target: Option<TokenId>,
    pub status: OpStatus,
    /// Amount involved (damage dealt, HP healed, resource spent, ...).
    pub amount: Option<i32>,
}

/// What a handler returns: an optional amount, or why it skipped.
pub(crate) type OpResult = Result<Option<i32>, SkipReason>;

// ============================================================================
// Interpreter
// ============================================================================

/// Read-only context of one operation application.
#[derive(Clone, Copy)]
pub struct OpContext<'p> {
    pub action_id: &'p str,
    pub action_tags: &'p [String],
    pub actor: TokenId,
    /// Target currently being resolved.
    pub target: Option<TokenId>,
    pub outcome: Option<&'p Outcome>,
    pub phase: Phase,
    pub crit_rule: CritRule,
    pub config: &'p EngineConfig,
    /// Current `Conditional` nesting depth.
    pub depth: u8,
}

impl<'p> OpContext<'p> {
    fn select(&self, selector: TargetSelector, tx: &Transaction) -> Option<TokenId> {
        let id = match selector {
            TargetSelector::Primary => self.target?,
            TargetSelector::SelfActor => self.actor,
        };
        tx.state.token(id).map(|_| id)
    }

    /// Crit rule to roll damage with, when the current outcome is a crit.
    fn damage_crit(&self) -> Option<CritRule> {
        self.outcome
            .is_some_and(|o| o.flags().contains(super::OutcomeFlags::CRIT))
            .then_some(self.crit_rule)
    }

    pub(crate) fn eval<'e>(&self, tx: &'e Transaction, env: &'e ExecutionEnv<'_>) -> EvalContext<'e>
    where
        'p: 'e,
    {
        EvalContext::new(&tx.state, self.actor)
            .with_target(self.target)
            .with_outcome(self.outcome)
            .with_phase(self.phase)
            .with_action_tags(self.action_tags)
            .with_ledger(env.ledger())
    }
}

/// Applies every operation in order.
pub fn apply_all<'o>(
    ops: impl IntoIterator<Item = &'o Operation>,
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
) {
    for op in ops {
        apply(op, tx, env, ctx);
    }
}

/// Applies one operation and records its report.
pub fn apply(
    op: &Operation,
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
) -> OpStatus {
    let (target, result) = match op.selector() {
        Some(selector) => match ctx.select(selector, tx) {
            Some(id) => (Some(id), dispatch(op, Some(id), tx, env, ctx)),
            None => (None, Err(SkipReason::UnresolvedTarget)),
        },
        None => (ctx.target, dispatch(op, None, tx, env, ctx)),
    };

    let (status, amount) = match result {
        Ok(amount) => (OpStatus::Applied, amount),
        Err(reason) => {
            trace!(op = op.name(), target = ?target, reason = %reason, "operation skipped");
            (OpStatus::Skipped(reason), None)
        }
    };
    let report = OpReport {
        op: op.name().to_string(),
        target,
        status,
        amount,
    };
    tx.log.push(LogEntry::Operation(report.clone()));
    tx.reports.push(report);
    status
}

fn dispatch(
    op: &Operation,
    target: Option<TokenId>,
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
) -> OpResult {
    use Operation::*;

    // Selector-bearing operations always receive a resolved id.
    let id = target.unwrap_or(ctx.actor);

    match op {
        DealDamage {
            formula,
            damage_type,
            ..
        } => damage::deal(tx, env, ctx, id, formula, *damage_type, None),
        DealScaledDamage {
            formula,
            divisor,
            damage_type,
            ..
        } => damage::deal(tx, env, ctx, id, formula, *damage_type, Some(*divisor)),
        Heal { formula, .. } => damage::heal(tx, env, ctx, id, formula),
        GrantTempHp { formula, .. } => damage::grant_temp_hp(tx, env, ctx, id, formula),

        ApplyCondition { status, turns, .. } => status::apply(tx, ctx, id, status, *turns),
        RemoveCondition { status, .. } => status::remove(tx, id, status),
        ExtendCondition { status, turns, .. } => status::extend(tx, id, status, *turns),
        StackCondition {
            status,
            stacks,
            turns,
            ..
        } => status::stack(tx, ctx, id, status, *stacks, *turns),
        ResetStacks { status, .. } => status::reset_stacks(tx, id, status),

        StartConcentration { source } => concentration::start(tx, ctx, source.as_deref()),
        BreakConcentration { .. } => concentration::break_op(tx, id),

        SpendResource {
            resource, amount, ..
        } => resource::spend(tx, env, id, resource, *amount),
        RestoreResource {
            resource, amount, ..
        } => resource::restore(tx, env, id, resource, *amount),
        SetResource {
            resource, amount, ..
        } => resource::set(tx, env, id, resource, *amount),
        ConsumeSlot { level, .. } => resource::consume_slot(tx, env, id, *level),
        RestoreSlot { level, .. } => resource::restore_slot(tx, env, id, *level),

        MoveTo { to, .. } => movement::move_to(tx, env, id, *to),
        ForcedMove { dx, dy, .. } => movement::forced_move(tx, env, ctx, id, *dx, *dy),
        Teleport { to, .. } => movement::teleport(tx, env, id, *to),
        Swap { .. } => movement::swap(tx, env, ctx, id),
        Knockback { distance, .. } => {
            movement::displace_away(tx, env, ctx, id, *distance, MovementKind::Knockback)
        }
        Push { distance, .. } => {
            movement::displace_away(tx, env, ctx, id, *distance, MovementKind::Push)
        }
        Pull { distance, .. } => movement::pull(tx, env, ctx, id, *distance),

        Spawn { template, at } => entity::spawn(tx, env, ctx, template, *at),
        Despawn { .. } => entity::despawn(tx, env, id),
        ControlSummon { .. } => entity::control(tx, env, ctx, id),

        AddTag { tag, .. } => marker::add_tag(tx, id, tag),
        RemoveTag { tag, .. } => marker::remove_tag(tx, id, tag),
        SetFlag { flag, value, .. } => marker::set_flag(tx, id, flag, *value),
        ClearFlag { flag, .. } => marker::clear_flag(tx, id, flag),

        CreateBoardEffect {
            id: effect,
            kind,
            radius,
            rounds,
            at,
            tags,
        } => board::create(tx, ctx, effect, *kind, *radius, *rounds, *at, tags),
        RemoveBoardEffect { id: effect } => board::remove(tx, effect),

        LockTargets => targeting::lock(tx),
        ExpandTargets {
            radius,
            hostile_only,
        } => targeting::expand(tx, ctx, *radius, *hostile_only),
        FilterTargets { condition } => targeting::filter(tx, env, ctx, condition),
        Retarget { token } => targeting::retarget(tx, *token),
        ClearTargets => targeting::clear(tx),

        AddRollBonus { amount } => roll::add_bonus(tx, *amount),
        AddDcDelta { amount } => roll::add_dc_delta(tx, *amount),
        OverrideRoll { value } => roll::override_roll(tx, *value),
        SetReroll { mode } => roll::set_reroll(tx, *mode),
        ClampRoll { min, max } => roll::clamp(tx, *min, *max),
        GrantAdvantage => roll::grant_advantage(tx),
        GrantDisadvantage => roll::grant_disadvantage(tx),
        ClearRollContext => roll::clear(tx),

        PlayVisual { id: visual } => presentation::visual(tx, env, ctx, visual),
        Log { message } => presentation::log(tx, env, message),
        EmitEvent { name, payload } => presentation::event(env, name, payload),

        Conditional {
            condition,
            then,
            otherwise,
        } => conditional(tx, env, ctx, condition, then, otherwise),
    }
}

fn conditional(
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    condition: &Condition,
    then: &[Operation],
    otherwise: &[Operation],
) -> OpResult {
    if ctx.depth >= ctx.config.max_nesting {
        return Err(SkipReason::NestingTooDeep);
    }
    let holds = condition.evaluate(&ctx.eval(tx, env));
    let branch = if holds { then } else { otherwise };
    if branch.is_empty() {
        return Err(SkipReason::ConditionFailed);
    }

    let nested = OpContext {
        depth: ctx.depth + 1,
        ..*ctx
    };
    apply_all(branch, tx, env, &nested);
    Ok(None)
}
