//! Canonical pipeline phases.
//!
//! Authored content still uses older phase names. They are mapped onto the
//! canonical enum once, when a plan is compiled.

use crate::config::EngineConfig;

/// The twelve pipeline phases, in execution order.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Phase {
    #[default]
    IntentBuild = 0,
    OptionsResolve = 1,
    Validate = 2,
    Targeting = 3,
    PreResolution = 4,
    Resolve = 5,
    Outcome = 6,
    BeforeApply = 7,
    AfterApply = 8,
    PostResolution = 9,
    BeforeCommit = 10,
    AfterCommit = 11,
}

/// Legacy names still found in authored hooks.
const ALIASES: &[(&str, Phase)] = &[
    ("onIntent", Phase::IntentBuild),
    ("intent", Phase::IntentBuild),
    ("buildIntent", Phase::IntentBuild),
    ("onOptions", Phase::OptionsResolve),
    ("resolveOptions", Phase::OptionsResolve),
    ("onValidate", Phase::Validate),
    ("validation", Phase::Validate),
    ("onTargeting", Phase::Targeting),
    ("onTarget", Phase::Targeting),
    ("beforeResolve", Phase::PreResolution),
    ("preResolve", Phase::PreResolution),
    ("beforeResolution", Phase::PreResolution),
    ("onResolve", Phase::Resolve),
    ("resolution", Phase::Resolve),
    ("onOutcome", Phase::Outcome),
    ("afterResolve", Phase::Outcome),
    ("beforeEffects", Phase::BeforeApply),
    ("preApply", Phase::BeforeApply),
    ("afterEffects", Phase::AfterApply),
    ("postApply", Phase::AfterApply),
    ("onApply", Phase::AfterApply),
    ("postResolve", Phase::PostResolution),
    ("afterResolution", Phase::PostResolution),
    ("preCommit", Phase::BeforeCommit),
    ("onCommit", Phase::AfterCommit),
    ("postCommit", Phase::AfterCommit),
];

impl Phase {
    pub const ALL: [Phase; EngineConfig::PHASE_COUNT] = [
        Phase::IntentBuild,
        Phase::OptionsResolve,
        Phase::Validate,
        Phase::Targeting,
        Phase::PreResolution,
        Phase::Resolve,
        Phase::Outcome,
        Phase::BeforeApply,
        Phase::AfterApply,
        Phase::PostResolution,
        Phase::BeforeCommit,
        Phase::AfterCommit,
    ];

    /// Maps a canonical or legacy phase name onto a phase.
    pub fn normalize(name: &str) -> Option<Phase> {
        let name = name.trim();
        if let Ok(phase) = name.parse::<Phase>() {
            return Some(phase);
        }
        ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, phase)| *phase)
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One slot per phase.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseTable<T> {
    slots: [T; EngineConfig::PHASE_COUNT],
}

impl<T: Default> Default for PhaseTable<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T> PhaseTable<T> {
    pub fn get(&self, phase: Phase) -> &T {
        &self.slots[phase.index()]
    }

    pub fn get_mut(&mut self, phase: Phase) -> &mut T {
        &mut self.slots[phase.index()]
    }
}
