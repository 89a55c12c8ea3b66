//! Board effects: zones, surfaces and auras placed on the grid.

use super::{Position, TokenId};

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
pub enum BoardEffectKind {
    /// Area spell or hazard anchored to a cell.
    Zone,
    /// Ground coverage (grease, fire, ice) anchored to a cell.
    Surface,
    /// Area centered on a token that moves with it.
    Aura,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardEffect {
    pub id: String,
    pub kind: BoardEffectKind,
    pub owner: TokenId,
    pub center: Position,
    pub radius: u32,
    /// `None` lasts until removed.
    pub remaining_rounds: Option<u32>,
    /// Token the effect follows (auras only).
    #[cfg_attr(feature = "serde", serde(default))]
    pub anchor: Option<TokenId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub concentration_source: Option<String>,
}

impl BoardEffect {
    /// Whether `position` lies inside the effect, given where its anchor stands.
    pub fn covers(&self, position: Position, anchor_position: Option<Position>) -> bool {
        let center = anchor_position.unwrap_or(self.center);
        center.distance_to(position) <= self.radius
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
