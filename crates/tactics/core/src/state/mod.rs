//! Battle state consumed and produced by the action pipeline.
//!
//! Every type here is plain owned data. The caller keeps the canonical
//! [`EngineState`]; the engine only ever works on a cloned copy and hands a new
//! value back.
mod board;
mod common;
mod engine;
mod roll;
mod status;
mod targeting;
mod token;

pub use board::{BoardEffect, BoardEffectKind};
pub use common::{Position, TokenId};
pub use engine::EngineState;
pub use roll::{AdvantageMode, RerollMode, RollContext};
pub use status::{StatusEntry, StatusList};
pub use targeting::{TargetingConfig, TargetingMode, TargetingState};
pub use token::{
    Ability, AbilitySet, CombatStats, ConcentrationLink, DamageAffinity, DamageType, LegacySheet,
    MovementModes, MovementProfile, Size, SlotPool, Token, modifier_for_score,
};
