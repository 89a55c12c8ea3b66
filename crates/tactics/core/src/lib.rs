//! Deterministic tactical action interpreter.
//!
//! `tactics-core` executes compiled action plans (attacks, spells, abilities)
//! against a battle snapshot through a fixed twelve-phase pipeline. All
//! mutation happens on a transaction; [`engine::TacticsEngine`] hands back a
//! new state together with the typed execution log. Randomness and every
//! side effect outside the board come in through [`env::ExecutionEnv`].
pub mod action;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;
pub use action::{
    ActionPlan, ActionSpec, Condition, ConfirmPrompt, CritRule, DiceError, DiceExpr,
    ExecutionResult, HookSpec, LogEntry, Mastery, OpReport, OpStatus, Operation, Outcome,
    OutcomeKind, Phase, PlanError, ReactionWindows, ResolutionKind, ResolutionSpec, SkipReason,
    TargetSelector, TargetingRule,
};
pub use config::{EngineConfig, TieWinner};
pub use engine::TacticsEngine;
pub use env::{
    ConfirmationHandler, D20Roll, Decision, Dice, EntityLifecycle, ExecutionEnv, FixedDice,
    MovementIntent, MovementKind, MovementSink, PcgDice, PresentationSink, ReactionContext,
    ReactionHandler, ReactionSignal, ReactionWindow, ResourceLedger, ScriptedDice, SpawnRequest,
};
pub use error::{ErrorContext, ErrorSeverity, GameError};
pub use state::{
    Ability, AdvantageMode, BoardEffect, BoardEffectKind, ConcentrationLink, DamageType,
    EngineState, Position, RollContext, StatusEntry, TargetingConfig, TargetingMode, Token,
    TokenId,
};
