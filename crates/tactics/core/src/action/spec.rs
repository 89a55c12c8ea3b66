//! Authored action definitions.
//!
//! An [`ActionSpec`] is immutable content loaded by the caller. It is compiled
//! into an [`ActionPlan`](super::ActionPlan) for one actor before execution.

use crate::config::TieWinner;
use crate::state::{Ability, AdvantageMode, TargetingMode};

use super::{Condition, CritRule, Operation};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ActionSpec {
    pub id: String,
    pub name: String,
    pub targeting: TargetingRule,
    pub resolution: ResolutionSpec,
    pub on_resolve: Vec<Operation>,
    pub on_hit: Vec<Operation>,
    pub on_miss: Vec<Operation>,
    pub on_crit: Vec<Operation>,
    pub on_save_success: Vec<Operation>,
    pub on_save_fail: Vec<Operation>,
    pub hooks: Vec<HookSpec>,
    pub reactions: ReactionWindows,
    pub tags: Vec<String>,
}

impl ActionSpec {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_targeting(mut self, targeting: TargetingRule) -> Self {
        self.targeting = targeting;
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, resolution: ResolutionSpec) -> Self {
        self.resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: HookSpec) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct TargetingRule {
    pub mode: TargetingMode,
    pub max_targets: usize,
    pub range: Option<u32>,
}

impl Default for TargetingRule {
    fn default() -> Self {
        Self {
            mode: TargetingMode::Single,
            max_targets: 1,
            range: None,
        }
    }
}

impl TargetingRule {
    pub fn new(mode: TargetingMode, max_targets: usize) -> Self {
        Self {
            mode,
            max_targets,
            range: None,
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

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
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ResolutionKind {
    /// No roll; resolves as a hit.
    #[default]
    Automatic,
    AttackRoll,
    SavingThrow,
    AbilityCheck,
    ContestedCheck,
}

/// How an action decides its outcome.
///
/// Formulas are written in dice notation with symbolic tokens (`modDEX`,
/// `proficiencyBonus`, ...). When `bonus` is absent, an attack uses the
/// actor's attack bonus, or its ability modifier plus proficiency. When `dc`
/// is absent, a save uses `8 + proficiency + ability modifier` of the actor
/// and a check uses 10.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ResolutionSpec {
    pub kind: ResolutionKind,
    /// Ability of the actor's roll (attack, check, contest) and of the DC.
    pub ability: Option<Ability>,
    pub bonus: Option<String>,
    pub dc: Option<String>,
    /// Ability the target saves with.
    pub save_ability: Option<Ability>,
    /// Ability the target rolls in a contest. Defaults to `ability`.
    pub opposed_ability: Option<Ability>,
    pub advantage: AdvantageMode,
    /// Overrides the configured crit threshold.
    pub crit_threshold: Option<u32>,
    pub crit_rule: CritRule,
    /// Overrides the configured contest tie winner.
    pub tie_winner: Option<TieWinner>,
}

impl ResolutionSpec {
    pub fn attack(ability: Ability) -> Self {
        Self {
            kind: ResolutionKind::AttackRoll,
            ability: Some(ability),
            ..Self::default()
        }
    }

    pub fn saving_throw(save_ability: Ability, dc: impl Into<String>) -> Self {
        Self {
            kind: ResolutionKind::SavingThrow,
            save_ability: Some(save_ability),
            dc: Some(dc.into()),
            ..Self::default()
        }
    }

    pub fn check(ability: Ability, dc: impl Into<String>) -> Self {
        Self {
            kind: ResolutionKind::AbilityCheck,
            ability: Some(ability),
            dc: Some(dc.into()),
            ..Self::default()
        }
    }

    pub fn contested(ability: Ability, opposed: Ability) -> Self {
        Self {
            kind: ResolutionKind::ContestedCheck,
            ability: Some(ability),
            opposed_ability: Some(opposed),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bonus(mut self, formula: impl Into<String>) -> Self {
        self.bonus = Some(formula.into());
        self
    }

    #[must_use]
    pub fn with_advantage(mut self, mode: AdvantageMode) -> Self {
        self.advantage = mode;
        self
    }
}

// ============================================================================
// Hooks & reactions
// ============================================================================

/// Question put to the player before a hook applies.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ConfirmPrompt {
    pub text: String,
    /// Decision used when no confirmation handler is installed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_accept: bool,
}

impl ConfirmPrompt {
    pub fn new(text: impl Into<String>, default_accept: bool) -> Self {
        Self {
            text: text.into(),
            default_accept,
        }
    }
}

/// Authored hook. `phase` may be a canonical or a legacy phase name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct HookSpec {
    pub phase: String,
    pub label: Option<String>,
    /// AND-combined.
    pub conditions: Vec<Condition>,
    pub prompt: Option<ConfirmPrompt>,
    pub operations: Vec<Operation>,
}

impl HookSpec {
    pub fn new(phase: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            phase: phase.into(),
            operations,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: ConfirmPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }
}

/// Which reaction windows the pipeline opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReactionWindows {
    pub pre: bool,
    pub post: bool,
}
