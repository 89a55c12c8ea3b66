//! Transient roll modifiers staged during one action execution.

/// Advantage state of a d20 roll.
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
pub enum AdvantageMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl AdvantageMode {
    /// Any advantage and any disadvantage cancel out.
    pub fn from_sources(advantage: bool, disadvantage: bool) -> Self {
        match (advantage, disadvantage) {
            (true, false) => Self::Advantage,
            (false, true) => Self::Disadvantage,
            _ => Self::Normal,
        }
    }

    pub fn has_advantage(self) -> bool {
        matches!(self, Self::Advantage)
    }

    pub fn has_disadvantage(self) -> bool {
        matches!(self, Self::Disadvantage)
    }
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
pub enum RerollMode {
    /// Roll again and keep the higher result.
    KeepMax,
    /// Roll again and keep the lower result.
    KeepMin,
}

/// Roll modifiers consumed by the resolution step of the same transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RollContext {
    pub bonus_delta: i32,
    pub dc_delta: i32,
    pub roll_override: Option<u32>,
    pub reroll: Option<RerollMode>,
    pub clamp_min: Option<u32>,
    pub clamp_max: Option<u32>,
    pub advantage: bool,
    pub disadvantage: bool,
}

impl RollContext {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies override, reroll and clamp to a natural roll, in that order.
    pub fn adjust_natural(&self, natural: u32, reroll: impl FnOnce() -> u32) -> u32 {
        let mut value = self.roll_override.unwrap_or(natural);

        value = match self.reroll {
            Some(RerollMode::KeepMax) => value.max(reroll()),
            Some(RerollMode::KeepMin) => value.min(reroll()),
            None => value,
        };

        if let Some(min) = self.clamp_min {
            value = value.max(min);
        }
        if let Some(max) = self.clamp_max {
            value = value.min(max);
        }
        value
    }
}
