//! Errors at the authored-data boundary.
//!
//! Nothing in the execution pipeline returns these; they come from parsing
//! dice expressions and compiling plans.

use crate::error::{ErrorContext, ErrorSeverity, GameError};
use crate::state::TokenId;

/// Dice expression parsing errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiceError {
    #[error("empty dice expression")]
    Empty,

    #[error("unexpected character '{found}' at offset {offset} in \"{expr}\"")]
    UnexpectedChar {
        expr: String,
        found: char,
        offset: usize,
    },

    #[error("unresolved symbol \"{symbol}\" in \"{expr}\"")]
    UnresolvedSymbol { expr: String, symbol: String },

    #[error("dice with zero sides in \"{0}\"")]
    ZeroSides(String),

    #[error("number too large in \"{0}\"")]
    Overflow(String),
}

impl GameError for DiceError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "DICE_EMPTY",
            Self::UnexpectedChar { .. } => "DICE_UNEXPECTED_CHAR",
            Self::UnresolvedSymbol { .. } => "DICE_UNRESOLVED_SYMBOL",
            Self::ZeroSides(_) => "DICE_ZERO_SIDES",
            Self::Overflow(_) => "DICE_OVERFLOW",
        }
    }
}

/// Errors raised while compiling an action spec into a plan.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("actor {actor} not found")]
    ActorNotFound {
        actor: TokenId,
        context: ErrorContext,
    },

    #[error("explicit target {target} not found")]
    TargetNotFound {
        target: TokenId,
        context: ErrorContext,
    },

    #[error("invalid {field} formula for action \"{action}\": {source}")]
    InvalidFormula {
        action: String,
        field: &'static str,
        source: DiceError,
    },
}

impl PlanError {
    pub fn actor_not_found(actor: TokenId, round: u32) -> Self {
        Self::ActorNotFound {
            actor,
            context: ErrorContext::new(round)
                .with_token(actor)
                .with_message("actor missing from arena"),
        }
    }

    pub fn target_not_found(target: TokenId, round: u32) -> Self {
        Self::TargetNotFound {
            target,
            context: ErrorContext::new(round)
                .with_token(target)
                .with_message("explicit target missing from arena"),
        }
    }
}

impl GameError for PlanError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::ActorNotFound { context, .. } | Self::TargetNotFound { context, .. } => {
                Some(context)
            }
            Self::InvalidFormula { .. } => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActorNotFound { .. } => "PLAN_ACTOR_NOT_FOUND",
            Self::TargetNotFound { .. } => "PLAN_TARGET_NOT_FOUND",
            Self::InvalidFormula { .. } => "PLAN_INVALID_FORMULA",
        }
    }
}
