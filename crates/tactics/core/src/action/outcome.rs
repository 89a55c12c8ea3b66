//! Classified results of resolved rolls.

use bitflags::bitflags;

use crate::state::TokenId;

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
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum OutcomeKind {
    Hit,
    Miss,
    Crit,
    SaveSuccess,
    SaveFail,
    CheckSuccess,
    CheckFail,
    ContestedWin,
    ContestedLose,
}

bitflags! {
    /// Outcome membership flags used by conditions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct OutcomeFlags: u16 {
        const HIT            = 1 << 0;
        const MISS           = 1 << 1;
        const CRIT           = 1 << 2;
        const SAVE_SUCCESS   = 1 << 3;
        const SAVE_FAIL      = 1 << 4;
        const CHECK_SUCCESS  = 1 << 5;
        const CHECK_FAIL     = 1 << 6;
        const CONTESTED_WIN  = 1 << 7;
        const CONTESTED_LOSE = 1 << 8;

        /// Any outcome favorable to the actor.
        const SUCCESS = Self::HIT.bits()
            | Self::CRIT.bits()
            | Self::SAVE_FAIL.bits()
            | Self::CHECK_SUCCESS.bits()
            | Self::CONTESTED_WIN.bits();
        /// Any outcome unfavorable to the actor.
        const FAILURE = Self::MISS.bits()
            | Self::SAVE_SUCCESS.bits()
            | Self::CHECK_FAIL.bits()
            | Self::CONTESTED_LOSE.bits();
    }
}

impl OutcomeKind {
    pub fn flags(self) -> OutcomeFlags {
        match self {
            Self::Hit => OutcomeFlags::HIT,
            // A crit is always also a hit.
            Self::Crit => OutcomeFlags::HIT | OutcomeFlags::CRIT,
            Self::Miss => OutcomeFlags::MISS,
            Self::SaveSuccess => OutcomeFlags::SAVE_SUCCESS,
            Self::SaveFail => OutcomeFlags::SAVE_FAIL,
            Self::CheckSuccess => OutcomeFlags::CHECK_SUCCESS,
            Self::CheckFail => OutcomeFlags::CHECK_FAIL,
            Self::ContestedWin => OutcomeFlags::CONTESTED_WIN,
            Self::ContestedLose => OutcomeFlags::CONTESTED_LOSE,
        }
    }

    pub fn is_hit(self) -> bool {
        matches!(self, Self::Hit | Self::Crit)
    }
}

/// Both sides of a contested check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContestedRolls {
    pub actor_roll: u32,
    pub actor_total: i32,
    pub target_roll: u32,
    pub target_total: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub target: Option<TokenId>,
    /// Natural die result after roll-context adjustments (0 when nothing rolled).
    pub roll: u32,
    pub total: i32,
    pub crit: bool,
    /// Armor class or DC the total was compared against.
    pub against: Option<i32>,
    pub contested: Option<ContestedRolls>,
}

impl Outcome {
    /// Outcome for an action that resolves without a roll.
    pub fn automatic(target: Option<TokenId>) -> Self {
        Self {
            kind: OutcomeKind::Hit,
            target,
            roll: 0,
            total: 0,
            crit: false,
            against: None,
            contested: None,
        }
    }

    pub fn flags(&self) -> OutcomeFlags {
        let mut flags = self.kind.flags();
        if self.crit {
            flags |= OutcomeFlags::CRIT | OutcomeFlags::HIT;
        }
        flags
    }

    pub fn is_hit(&self) -> bool {
        self.kind.is_hit()
    }
}
