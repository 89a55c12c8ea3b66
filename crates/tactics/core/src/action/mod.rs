//! Action domain: authored specs, compiled plans and their execution.
//!
//! # Module Structure
//!
//! - `spec`: authored action data (`ActionSpec`, hooks, resolution settings)
//! - `plan`: `ActionSpec` bound to an actor and target (`ActionPlan`)
//! - `phase`: the twelve pipeline phases and legacy aliases
//! - `condition`: declarative predicates gating hooks and operations
//! - `formula` / `dice`: token substitution and dice expressions
//! - `resolution`: attack, save, check and contested rolls
//! - `operation`: typed effect operations and their interpreter
//! - `hook` / `mastery`: phase-bound bundles and weapon-mastery effects
//! - `execute`: transaction, pipeline and execution log

pub mod condition;
pub mod dice;
pub mod error;
pub mod execute;
pub mod formula;
pub mod hook;
pub mod mastery;
pub mod operation;
pub mod outcome;
pub mod phase;
pub mod plan;
pub mod resolution;
pub mod spec;

pub use condition::{Comparator, Condition, EvalContext, Subject};
pub use dice::{CritRule, DiceExpr, DiceRoll};
pub use error::{DiceError, PlanError};
pub use execute::{ConcentrationEvent, ExecutionResult, LogEntry, Transaction, execute};
pub use formula::{FormulaToken, resolve_formula, resolve_token};
pub use hook::Hook;
pub use mastery::{Mastery, MasteryTrigger};
pub use operation::{
    EffectAnchor, OpContext, OpReport, OpStatus, Operation, ScaleDivisor, SkipReason,
    TargetSelector,
};
pub use outcome::{ContestedRolls, Outcome, OutcomeFlags, OutcomeKind};
pub use phase::{Phase, PhaseTable};
pub use plan::{ActionPlan, OutcomeBranches, PlanWarning, ResolutionPlan};
pub use resolution::resolve;
pub use spec::{
    ActionSpec, ConfirmPrompt, HookSpec, ReactionWindows, ResolutionKind, ResolutionSpec,
    TargetingRule,
};
