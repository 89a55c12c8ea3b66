//! Leaf predicates, kept as small pure functions.

use crate::env::ResourceLedger;
use crate::state::{EngineState, Token, TokenId};

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
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    #[default]
    Gte,
}

impl Comparator {
    pub fn compare(self, lhs: i64, rhs: i32) -> bool {
        let rhs = i64::from(rhs);
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
        }
    }
}

pub(super) fn creature_type(token: &Token, kind: &str) -> bool {
    token.tags.iter().any(|tag| {
        tag.strip_prefix("creature:")
            .is_some_and(|k| k.eq_ignore_ascii_case(kind))
    })
}

pub(super) fn status_from(token: &Token, status: &str, source: TokenId) -> bool {
    token
        .statuses
        .get(status)
        .is_some_and(|entry| entry.source == Some(source))
}

pub(super) fn bloodied(token: &Token) -> bool {
    token.max_hp > 0 && token.hp * 2 <= token.max_hp
}

/// Resource amount from the ledger, else from the token-local pool.
pub fn resource_amount(
    token: &Token,
    resource: &str,
    ledger: Option<&dyn ResourceLedger>,
) -> Option<i32> {
    ledger
        .and_then(|l| l.amount(token.id, resource))
        .or_else(|| token.stats.resources.get(resource).copied())
}

/// Remaining slots of `level`, from the ledger or the token-local pool.
pub fn slots_remaining(token: &Token, level: u8, ledger: Option<&dyn ResourceLedger>) -> u32 {
    ledger
        .and_then(|l| l.slots_remaining(token.id, level))
        .or_else(|| token.stats.slots.get(&level).map(|pool| pool.current))
        .unwrap_or(0)
}

/// Matches a board effect by id or tag.
pub(super) fn in_board_effect(state: &EngineState, token: TokenId, effect: &str) -> bool {
    state
        .effects_covering(token)
        .any(|e| e.id == effect || e.has_tag(effect))
}
