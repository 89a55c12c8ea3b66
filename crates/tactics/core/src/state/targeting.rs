//! Targeting state shared by the pipeline and targeting operations.

use super::TokenId;

/// How an action picks its initial targets.
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
pub enum TargetingMode {
    /// The actor targets itself.
    #[cfg_attr(feature = "serde", serde(alias = "self"))]
    #[strum(serialize = "self_only", serialize = "self")]
    SelfOnly,
    /// One explicit target.
    #[default]
    Single,
    /// Several targets, expanded by operations up to `max_targets`.
    Multi,
    /// Targets gathered from an area by operations.
    Area,
    /// No target at all.
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetingConfig {
    pub mode: TargetingMode,
    pub max_targets: usize,
    /// Maximum distance from the actor in cells.
    pub range: Option<u32>,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            mode: TargetingMode::Single,
            max_targets: 1,
            range: None,
        }
    }
}

/// Currently selected targets. Once locked, targeting operations leave it as is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetingState {
    pub selected: Vec<TokenId>,
    pub locked: bool,
}

impl TargetingState {
    pub fn seeded(selected: Vec<TokenId>) -> Self {
        Self {
            selected,
            locked: false,
        }
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.selected.contains(&id)
    }

    pub fn first(&self) -> Option<TokenId> {
        self.selected.first().copied()
    }
}
