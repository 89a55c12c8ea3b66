//! Isolated working copy of one execution.

use crate::action::operation::OpReport;
use crate::env::MovementIntent;
use crate::state::{EngineState, TokenId};

use super::LogEntry;

/// Owns a clone of the caller's state for the duration of one execution.
///
/// Nothing is shared with the snapshot it was opened from: tokens, statuses
/// and tag lists are all values, so dropping a transaction is a full rollback.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub state: EngineState,
    pub log: Vec<LogEntry>,
    pub reports: Vec<OpReport>,
    /// Movement requested from the caller, in order.
    pub intents: Vec<MovementIntent>,
    /// Tokens created through the lifecycle collaborator.
    pub spawned: Vec<TokenId>,
}

impl Transaction {
    pub fn open(state: &EngineState) -> Self {
        Self {
            state: state.clone(),
            log: Vec::new(),
            reports: Vec::new(),
            intents: Vec::new(),
            spawned: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Position, Token};

    #[test]
    fn mutations_never_reach_the_snapshot() {
        let snapshot = EngineState::new(
            Token::new(TokenId(0), "hero", Position::ORIGIN, 10).with_tag("brave"),
        );
        let mut tx = Transaction::open(&snapshot);
        let hero = tx.state.token_mut(TokenId(0)).unwrap();
        hero.remove_tag("brave");
        hero.statuses.apply(crate::state::StatusEntry::new("prone", None));

        let original = snapshot.token(TokenId(0)).unwrap();
        assert!(original.has_tag("brave"));
        assert!(original.statuses.is_empty());
    }
}
