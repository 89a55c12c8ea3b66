//! Tokens: the combatants an action reads and mutates.
//!
//! Stats come from two sources. `CombatStats` holds the fields the combat layer
//! maintains explicitly; `LegacySheet` mirrors older character-sheet exports.
//! Lookups prefer the explicit field, then the sheet, then a derived value.

use std::collections::BTreeMap;

use bitflags::bitflags;

use super::{Position, StatusList, TokenId};

// ============================================================================
// Abilities
// ============================================================================

/// The six ability scores, keyed by their sheet abbreviations.
#[derive(
    Clone,
    Copy,
    Debug,
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
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Ability {
    For,
    Dex,
    Con,
    Int,
    Sag,
    Cha,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::For,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Sag,
        Ability::Cha,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Modifier for a raw ability score: `floor((score - 10) / 2)`.
pub fn modifier_for_score(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Optional per-ability values (modifiers or scores).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySet {
    values: [Option<i32>; 6],
}

impl AbilitySet {
    pub fn get(&self, ability: Ability) -> Option<i32> {
        self.values[ability.index()]
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        self.values[ability.index()] = Some(value);
    }

    #[must_use]
    pub fn with(mut self, ability: Ability, value: i32) -> Self {
        self.set(ability, value);
        self
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Spell slot pool for a single slot level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotPool {
    pub current: u32,
    pub max: u32,
}

/// Fields the combat layer maintains explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatStats {
    pub mods: AbilitySet,
    pub scores: AbilitySet,
    pub level: Option<u32>,
    pub proficiency_bonus: Option<i32>,
    pub attack_bonus: Option<i32>,
    pub move_range: Option<u32>,
    pub armor_class: Option<i32>,
    /// Token-local resource pool, used when no ledger is injected.
    pub resources: BTreeMap<String, i32>,
    pub slots: BTreeMap<u8, SlotPool>,
}

/// Character-sheet fields from older exports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LegacySheet {
    pub mods: AbilitySet,
    pub scores: AbilitySet,
    pub level: Option<u32>,
    pub proficiency_bonus: Option<i32>,
    pub attack_bonus: Option<i32>,
    pub move_range: Option<u32>,
    pub armor_class: Option<i32>,
}

// ============================================================================
// Damage types
// ============================================================================

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
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Lightning,
    Thunder,
    Acid,
    Poison,
    Necrotic,
    Radiant,
    Force,
    Psychic,
}

/// How a token reacts to a damage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageAffinity {
    Normal,
    Immune,
    Resistant,
    Vulnerable,
}

impl DamageAffinity {
    /// Adjusts a rolled damage total.
    pub fn adjust(self, amount: u32) -> u32 {
        match self {
            Self::Normal => amount,
            Self::Immune => 0,
            Self::Resistant => amount / 2,
            Self::Vulnerable => amount.saturating_mul(2),
        }
    }
}

// ============================================================================
// Movement
// ============================================================================

bitflags! {
    /// Movement modes a token can use.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MovementModes: u8 {
        const WALK   = 1 << 0;
        const FLY    = 1 << 1;
        const SWIM   = 1 << 2;
        const CLIMB  = 1 << 3;
        const BURROW = 1 << 4;
        const HOVER  = 1 << 5;
    }
}

impl Default for MovementModes {
    fn default() -> Self {
        Self::WALK
    }
}

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
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Size {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
}

/// Movement and footprint profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MovementProfile {
    /// Speed in cells per turn.
    pub speed: u32,
    pub modes: MovementModes,
    pub size: Size,
    /// Side length of the occupied square in cells.
    pub footprint: u8,
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self {
            speed: 6,
            modes: MovementModes::WALK,
            size: Size::Medium,
            footprint: 1,
        }
    }
}

// ============================================================================
// Concentration
// ============================================================================

/// Ownership link between a concentrating token and the effects it sustains.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcentrationLink {
    pub source_id: String,
    pub owner: TokenId,
    pub action_id: String,
}

// ============================================================================
// Token
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    pub position: Position,
    pub hp: u32,
    pub max_hp: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub temp_hp: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stats: CombatStats,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sheet: LegacySheet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub statuses: StatusList,
    #[cfg_attr(feature = "serde", serde(default))]
    pub concentration: Option<ConcentrationLink>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub movement: MovementProfile,
    #[cfg_attr(feature = "serde", serde(default))]
    pub immunities: Vec<DamageType>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resistances: Vec<DamageType>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vulnerabilities: Vec<DamageType>,
    /// Named numeric values and flags (flags are stored as 0/1).
    #[cfg_attr(feature = "serde", serde(default))]
    pub values: BTreeMap<String, i32>,
}

impl Token {
    pub fn new(id: TokenId, name: impl Into<String>, position: Position, hp: u32) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            hp,
            max_hp: hp,
            temp_hp: 0,
            stats: CombatStats::default(),
            sheet: LegacySheet::default(),
            tags: Vec::new(),
            statuses: StatusList::new(),
            concentration: None,
            movement: MovementProfile::default(),
            immunities: Vec::new(),
            resistances: Vec::new(),
            vulnerabilities: Vec::new(),
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_mod(mut self, ability: Ability, value: i32) -> Self {
        self.stats.mods.set(ability, value);
        self
    }

    #[must_use]
    pub fn with_armor_class(mut self, ac: i32) -> Self {
        self.stats.armor_class = Some(ac);
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.stats.level = Some(level);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tag(tag);
        self
    }

    #[must_use]
    pub fn with_temp_hp(mut self, temp_hp: u32) -> Self {
        self.temp_hp = temp_hp;
        self
    }

    /// Ability modifier with the full fallback chain, defaulting to 0.
    pub fn ability_mod(&self, ability: Ability) -> i32 {
        self.stats
            .mods
            .get(ability)
            .or_else(|| self.sheet.mods.get(ability))
            .or_else(|| {
                self.stats
                    .scores
                    .get(ability)
                    .or_else(|| self.sheet.scores.get(ability))
                    .map(modifier_for_score)
            })
            .unwrap_or(0)
    }

    pub fn level(&self) -> Option<u32> {
        self.stats.level.or(self.sheet.level)
    }

    /// Proficiency bonus, derived from level when neither source sets it.
    pub fn proficiency_bonus(&self) -> Option<i32> {
        self.stats
            .proficiency_bonus
            .or(self.sheet.proficiency_bonus)
            .or_else(|| {
                self.level()
                    .map(|level| 2 + (level.max(1) as i32 - 1) / 4)
            })
    }

    pub fn attack_bonus(&self) -> Option<i32> {
        self.stats.attack_bonus.or(self.sheet.attack_bonus)
    }

    pub fn move_range(&self) -> u32 {
        self.stats
            .move_range
            .or(self.sheet.move_range)
            .unwrap_or(self.movement.speed)
    }

    pub fn armor_class(&self) -> Option<i32> {
        self.stats.armor_class.or(self.sheet.armor_class)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Adds a tag if not already present. Returns true if added.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.has_tag(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Removes a tag. Returns true if it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        before != self.tags.len()
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Current HP as a percentage of max HP (0 when max HP is 0).
    pub fn hp_percent(&self) -> u32 {
        if self.max_hp == 0 {
            return 0;
        }
        ((u64::from(self.hp) * 100) / u64::from(self.max_hp)) as u32
    }

    pub fn damage_affinity(&self, damage_type: DamageType) -> DamageAffinity {
        if self.immunities.contains(&damage_type) {
            DamageAffinity::Immune
        } else if self.resistances.contains(&damage_type) {
            DamageAffinity::Resistant
        } else if self.vulnerabilities.contains(&damage_type) {
            DamageAffinity::Vulnerable
        } else {
            DamageAffinity::Normal
        }
    }

    /// Applies raw damage: temp HP absorbs first, HP is floored at zero.
    /// Returns `(temp_absorbed, hp_lost)`.
    pub fn take_damage(&mut self, amount: u32) -> (u32, u32) {
        let absorbed = amount.min(self.temp_hp);
        self.temp_hp -= absorbed;
        let hp_lost = (amount - absorbed).min(self.hp);
        self.hp -= hp_lost;
        (absorbed, hp_lost)
    }

    /// Heals up to max HP. Returns the HP actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max_hp.saturating_sub(self.hp));
        self.hp += restored;
        restored
    }

    /// Temp HP never stacks: the larger pool wins.
    pub fn grant_temp_hp(&mut self, amount: u32) -> bool {
        if amount > self.temp_hp {
            self.temp_hp = amount;
            return true;
        }
        false
    }

    pub fn value(&self, name: &str) -> Option<i32> {
        self.values.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::new(TokenId(1), "fighter", Position::ORIGIN, 20)
    }

    #[test]
    fn ability_mod_prefers_explicit_then_sheet_then_score() {
        let mut t = token();
        assert_eq!(t.ability_mod(Ability::For), 0);

        t.stats.scores.set(Ability::For, 17);
        assert_eq!(t.ability_mod(Ability::For), 3);

        t.sheet.mods.set(Ability::For, 1);
        assert_eq!(t.ability_mod(Ability::For), 1);

        t.stats.mods.set(Ability::For, 5);
        assert_eq!(t.ability_mod(Ability::For), 5);
    }

    #[test]
    fn low_scores_round_down() {
        assert_eq!(modifier_for_score(9), -1);
        assert_eq!(modifier_for_score(8), -1);
        assert_eq!(modifier_for_score(7), -2);
        assert_eq!(modifier_for_score(10), 0);
    }

    #[test]
    fn proficiency_derives_from_level() {
        let t = token().with_level(5);
        assert_eq!(t.proficiency_bonus(), Some(3));
        assert_eq!(token().proficiency_bonus(), None);
    }

    #[test]
    fn temp_hp_absorbs_first() {
        let mut t = token().with_temp_hp(5);
        assert_eq!(t.take_damage(8), (5, 3));
        assert_eq!((t.temp_hp, t.hp), (0, 17));

        assert_eq!(t.take_damage(100), (0, 17));
        assert_eq!(t.hp, 0);
    }

    #[test]
    fn affinity_precedence() {
        let mut t = token();
        t.resistances.push(DamageType::Fire);
        t.immunities.push(DamageType::Fire);
        assert_eq!(t.damage_affinity(DamageType::Fire), DamageAffinity::Immune);
        assert_eq!(DamageAffinity::Resistant.adjust(7), 3);
        assert_eq!(DamageAffinity::Vulnerable.adjust(7), 14);
    }
}
