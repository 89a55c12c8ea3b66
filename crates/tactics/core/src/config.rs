/// Engine configuration constants and tunable rule parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Natural d20 result at or above which an attack roll is critical.
    pub crit_threshold: u32,

    /// Lower bound for the concentration save DC after taking damage.
    pub concentration_dc_floor: i32,

    /// Winner of a contested check when both totals are equal.
    pub tie_winner: TieWinner,

    /// Maximum nesting depth of `Conditional` operations.
    pub max_nesting: u8,

    /// Enables the weapon-mastery layer.
    pub weapon_mastery: bool,
}

/// Which side wins a contested check on equal totals.
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
pub enum TieWinner {
    #[default]
    Actor,
    Target,
}

impl EngineConfig {
    // ===== compile-time constants =====
    pub const PHASE_COUNT: usize = 12;
    pub const MAX_D20_DICE: usize = 2;
    pub const MAX_EXPANSION_CANDIDATES: usize = 64;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CRIT_THRESHOLD: u32 = 20;
    pub const DEFAULT_CONCENTRATION_DC_FLOOR: i32 = 10;
    pub const DEFAULT_MAX_NESTING: u8 = 8;

    pub fn new() -> Self {
        Self {
            crit_threshold: Self::DEFAULT_CRIT_THRESHOLD,
            concentration_dc_floor: Self::DEFAULT_CONCENTRATION_DC_FLOOR,
            tie_winner: TieWinner::Actor,
            max_nesting: Self::DEFAULT_MAX_NESTING,
            weapon_mastery: true,
        }
    }

    #[must_use]
    pub fn with_crit_threshold(mut self, threshold: u32) -> Self {
        self.crit_threshold = threshold.clamp(1, 20);
        self
    }

    #[must_use]
    pub fn with_tie_winner(mut self, winner: TieWinner) -> Self {
        self.tie_winner = winner;
        self
    }

    #[must_use]
    pub fn with_max_nesting(mut self, depth: u8) -> Self {
        self.max_nesting = depth;
        self
    }

    #[must_use]
    pub fn with_weapon_mastery(mut self, enabled: bool) -> Self {
        self.weapon_mastery = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
