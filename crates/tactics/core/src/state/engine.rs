//! Battle snapshot the engine executes against.
//!
//! Tokens live in an arena addressed by stable [`TokenId`]s. A transaction
//! clones the whole value, so nothing it mutates is shared with the caller's
//! copy.

use crate::action::Phase;

use super::{
    BoardEffect, ConcentrationLink, RollContext, TargetingConfig, TargetingState, Token, TokenId,
};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineState {
    pub round: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub phase: Phase,
    /// Token performing the current action.
    pub actor: TokenId,
    pub player: TokenId,
    /// Token arena.
    pub tokens: Vec<Token>,
    /// Ids of hostile tokens; every other token is on the player's side.
    #[cfg_attr(feature = "serde", serde(default))]
    pub enemies: Vec<TokenId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<BoardEffect>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting: TargetingState,
    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting_config: TargetingConfig,
    /// Concentration link of the acting token.
    #[cfg_attr(feature = "serde", serde(default))]
    pub concentration: Option<ConcentrationLink>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub roll_context: RollContext,
}

impl EngineState {
    pub fn new(player: Token) -> Self {
        let id = player.id;
        Self {
            round: 1,
            phase: Phase::default(),
            actor: id,
            player: id,
            tokens: vec![player],
            enemies: Vec::new(),
            effects: Vec::new(),
            targeting: TargetingState::default(),
            targeting_config: TargetingConfig::default(),
            concentration: None,
            roll_context: RollContext::default(),
        }
    }

    /// Adds a hostile token. Ignored if the id is already taken.
    #[must_use]
    pub fn with_enemy(mut self, token: Token) -> Self {
        let id = token.id;
        if self.insert(token) {
            self.enemies.push(id);
        }
        self
    }

    /// Adds a token on the player's side. Ignored if the id is already taken.
    #[must_use]
    pub fn with_ally(mut self, token: Token) -> Self {
        self.insert(token);
        self
    }

    /// Inserts a token into the arena. Returns false on id collision.
    pub fn insert(&mut self, token: Token) -> bool {
        if self.token(token.id).is_some() {
            return false;
        }
        self.tokens.push(token);
        true
    }

    /// Removes a token and every reference to it.
    pub fn remove(&mut self, id: TokenId) -> Option<Token> {
        let index = self.index_of(id)?;
        self.enemies.retain(|e| *e != id);
        self.targeting.selected.retain(|t| *t != id);
        Some(self.tokens.remove(index))
    }

    pub fn index_of(&self, id: TokenId) -> Option<usize> {
        self.tokens.iter().position(|t| t.id == id)
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    pub fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id == id)
    }

    pub fn actor_token(&self) -> Option<&Token> {
        self.token(self.actor)
    }

    pub fn is_enemy(&self, id: TokenId) -> bool {
        self.enemies.contains(&id)
    }

    /// Tokens on opposite sides are hostile to each other.
    pub fn are_hostile(&self, a: TokenId, b: TokenId) -> bool {
        a != b && self.is_enemy(a) != self.is_enemy(b)
    }

    /// Distance in cells between two tokens, if both exist.
    pub fn distance(&self, a: TokenId, b: TokenId) -> Option<u32> {
        Some(self.token(a)?.position.distance_to(self.token(b)?.position))
    }

    /// Board effects currently covering a token.
    pub fn effects_covering(&self, id: TokenId) -> impl Iterator<Item = &BoardEffect> {
        let position = self.token(id).map(|t| t.position);
        self.effects.iter().filter(move |effect| {
            let anchor = effect.anchor.and_then(|a| self.token(a)).map(|t| t.position);
            position.is_some_and(|p| effect.covers(p, anchor))
        })
    }

    /// Removes every status and board effect tied to `source_id`, and clears
    /// any token link with that id. Returns the number of entries purged.
    pub fn purge_concentration(&mut self, source_id: &str) -> usize {
        let mut purged = 0;
        for token in &mut self.tokens {
            purged += token.statuses.purge_concentration(source_id);
            if token
                .concentration
                .as_ref()
                .is_some_and(|link| link.source_id == source_id)
            {
                token.concentration = None;
            }
        }

        let before = self.effects.len();
        self.effects
            .retain(|e| e.concentration_source.as_deref() != Some(source_id));
        purged += before - self.effects.len();

        if self
            .concentration
            .as_ref()
            .is_some_and(|link| link.source_id == source_id)
        {
            self.concentration = None;
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BoardEffectKind, Position, StatusEntry};

    fn state() -> EngineState {
        EngineState::new(Token::new(TokenId(0), "hero", Position::ORIGIN, 30))
            .with_enemy(Token::new(TokenId(1), "goblin", Position::new(1, 0), 7))
            .with_ally(Token::new(TokenId(2), "cleric", Position::new(0, 1), 20))
    }

    #[test]
    fn sides_are_derived_from_enemy_list() {
        let s = state();
        assert!(s.are_hostile(TokenId(0), TokenId(1)));
        assert!(!s.are_hostile(TokenId(0), TokenId(2)));
        assert!(!s.are_hostile(TokenId(1), TokenId(1)));
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut s = state();
        assert!(!s.insert(Token::new(TokenId(1), "dup", Position::ORIGIN, 1)));
        assert_eq!(s.tokens.len(), 3);
    }

    #[test]
    fn purge_removes_statuses_effects_and_links() {
        let mut s = state();
        let link = ConcentrationLink {
            source_id: "bless@0".into(),
            owner: TokenId(0),
            action_id: "bless".into(),
        };
        s.concentration = Some(link.clone());
        s.token_mut(TokenId(0)).unwrap().concentration = Some(link);
        s.token_mut(TokenId(2))
            .unwrap()
            .statuses
            .apply(StatusEntry::new("blessed", Some(10)).with_concentration("bless@0"));
        s.effects.push(BoardEffect {
            id: "light".into(),
            kind: BoardEffectKind::Zone,
            owner: TokenId(0),
            center: Position::ORIGIN,
            radius: 2,
            remaining_rounds: None,
            anchor: None,
            tags: vec![],
            concentration_source: Some("bless@0".into()),
        });

        assert_eq!(s.purge_concentration("bless@0"), 2);
        assert!(s.effects.is_empty());
        assert!(s.concentration.is_none());
        assert!(s.token(TokenId(0)).unwrap().concentration.is_none());
        assert!(!s.token(TokenId(2)).unwrap().statuses.has("blessed"));
    }

    #[test]
    fn remove_clears_references() {
        let mut s = state();
        s.targeting.selected = vec![TokenId(1)];
        assert!(s.remove(TokenId(1)).is_some());
        assert!(s.enemies.is_empty());
        assert!(s.targeting.selected.is_empty());
    }
}
