//! Contracts for the systems the engine talks to but does not own.
//!
//! All calls are synchronous. The engine emits requests (spend a resource,
//! move a token, spawn a summon) and records what the collaborator answered.

use std::collections::BTreeMap;

use crate::action::{ConfirmPrompt, Outcome};
use crate::state::{Position, Token, TokenId};

// ============================================================================
// Resources
// ============================================================================

/// Persistent resource and slot ledger owned by the caller.
pub trait ResourceLedger {
    /// Current amount of `resource`, `None` if the ledger does not track it.
    fn amount(&self, token: TokenId, resource: &str) -> Option<i32>;

    /// Spends `amount`. Returns false if the token cannot pay.
    fn spend(&mut self, token: TokenId, resource: &str, amount: i32) -> bool;

    fn restore(&mut self, token: TokenId, resource: &str, amount: i32) -> bool;

    fn set(&mut self, token: TokenId, resource: &str, amount: i32) -> bool;

    /// Consumes one slot of `level`. Returns false if none is left.
    fn consume_slot(&mut self, token: TokenId, level: u8) -> bool;

    fn restore_slot(&mut self, token: TokenId, level: u8) -> bool;

    /// Remaining slots of `level`, `None` if the ledger does not track slots.
    fn slots_remaining(&self, _token: TokenId, _level: u8) -> Option<u32> {
        None
    }
}

// ============================================================================
// Movement
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
pub enum MovementKind {
    MoveTo,
    ForcedMove,
    Teleport,
    Swap,
    Knockback,
    Push,
    Pull,
}

/// A request to move a token. The caller checks collisions and performs it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementIntent {
    pub kind: MovementKind,
    pub token: TokenId,
    pub from: Position,
    pub to: Position,
    /// Other token involved (swap partner, push origin).
    pub other: Option<TokenId>,
}

pub trait MovementSink {
    /// Returns the position the token actually ended up at, or `None` if the
    /// move was refused.
    fn request(&mut self, intent: &MovementIntent) -> Option<Position>;
}

// ============================================================================
// Entity lifecycle
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnRequest {
    pub template: String,
    pub owner: TokenId,
    pub at: Position,
    /// The owner is on the enemy side.
    pub hostile: bool,
}

pub trait EntityLifecycle {
    /// Allocates a token for the request. `None` when spawning failed.
    fn spawn(&mut self, request: &SpawnRequest) -> Option<Token>;

    fn despawn(&mut self, token: TokenId) -> bool;

    /// Hands control of `summon` to `controller`.
    fn control(&mut self, controller: TokenId, summon: TokenId) -> bool;
}

// ============================================================================
// Presentation
// ============================================================================

/// Fire-and-forget sink for logs, events and visuals.
pub trait PresentationSink {
    fn log(&mut self, _line: &str) {}

    fn event(&mut self, _name: &str, _payload: &BTreeMap<String, String>) {}

    fn visual(&mut self, _id: &str, _at: Option<Position>) {}
}

// ============================================================================
// Confirmation & reactions
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

pub trait ConfirmationHandler {
    fn confirm(&mut self, prompt: &ConfirmPrompt) -> Decision;
}

impl<F> ConfirmationHandler for F
where
    F: FnMut(&ConfirmPrompt) -> Decision,
{
    fn confirm(&mut self, prompt: &ConfirmPrompt) -> Decision {
        self(prompt)
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
pub enum ReactionWindow {
    /// Before any outcome is resolved.
    Pre,
    /// After the last target resolved.
    Post,
}

/// What a reaction handler sees when a window opens.
#[derive(Clone, Copy, Debug)]
pub struct ReactionContext<'a> {
    pub action_id: &'a str,
    pub actor: TokenId,
    pub target: Option<TokenId>,
    pub outcome: Option<&'a Outcome>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionSignal {
    Continue,
    Interrupt,
}

pub trait ReactionHandler {
    fn open(&mut self, window: ReactionWindow, ctx: &ReactionContext<'_>) -> ReactionSignal;
}

impl<F> ReactionHandler for F
where
    F: FnMut(ReactionWindow, &ReactionContext<'_>) -> ReactionSignal,
{
    fn open(&mut self, window: ReactionWindow, ctx: &ReactionContext<'_>) -> ReactionSignal {
        self(window, ctx)
    }
}
