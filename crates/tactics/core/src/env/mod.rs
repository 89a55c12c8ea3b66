//! Execution environment: dice plus the optional collaborators.
//!
//! An [`ExecutionEnv`] is assembled by the caller for one execution. Only the
//! dice are mandatory; operations that need a missing collaborator fall back
//! (token-local resource pool) or report a skip.

mod collaborators;
mod dice;

pub use collaborators::{
    ConfirmationHandler, Decision, EntityLifecycle, MovementIntent, MovementKind, MovementSink,
    PresentationSink, ReactionContext, ReactionHandler, ReactionSignal, ReactionWindow,
    ResourceLedger, SpawnRequest,
};
pub use dice::{D20Roll, Dice, FixedDice, PcgDice, ScriptedDice};

/// Handles threaded through one execution.
pub struct ExecutionEnv<'a> {
    dice: &'a mut dyn Dice,
    ledger: Option<&'a mut dyn ResourceLedger>,
    movement: Option<&'a mut dyn MovementSink>,
    lifecycle: Option<&'a mut dyn EntityLifecycle>,
    presentation: Option<&'a mut dyn PresentationSink>,
    confirmation: Option<&'a mut dyn ConfirmationHandler>,
    reactions: Option<&'a mut dyn ReactionHandler>,
}

impl<'a> ExecutionEnv<'a> {
    pub fn new(dice: &'a mut dyn Dice) -> Self {
        Self {
            dice,
            ledger: None,
            movement: None,
            lifecycle: None,
            presentation: None,
            confirmation: None,
            reactions: None,
        }
    }

    #[must_use]
    pub fn with_ledger(mut self, ledger: &'a mut dyn ResourceLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    #[must_use]
    pub fn with_movement(mut self, movement: &'a mut dyn MovementSink) -> Self {
        self.movement = Some(movement);
        self
    }

    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: &'a mut dyn EntityLifecycle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    #[must_use]
    pub fn with_presentation(mut self, presentation: &'a mut dyn PresentationSink) -> Self {
        self.presentation = Some(presentation);
        self
    }

    #[must_use]
    pub fn with_confirmation(mut self, confirmation: &'a mut dyn ConfirmationHandler) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    #[must_use]
    pub fn with_reactions(mut self, reactions: &'a mut dyn ReactionHandler) -> Self {
        self.reactions = Some(reactions);
        self
    }

    pub fn dice(&mut self) -> &mut (dyn Dice + 'a) {
        &mut *self.dice
    }

    pub fn ledger(&self) -> Option<&(dyn ResourceLedger + 'a)> {
        self.ledger.as_deref()
    }

    pub fn ledger_mut(&mut self) -> Option<&mut (dyn ResourceLedger + 'a)> {
        self.ledger.as_deref_mut()
    }

    pub fn movement(&mut self) -> Option<&mut (dyn MovementSink + 'a)> {
        self.movement.as_deref_mut()
    }

    pub fn lifecycle(&mut self) -> Option<&mut (dyn EntityLifecycle + 'a)> {
        self.lifecycle.as_deref_mut()
    }

    pub fn presentation(&mut self) -> Option<&mut (dyn PresentationSink + 'a)> {
        self.presentation.as_deref_mut()
    }

    pub fn confirmation(&mut self) -> Option<&mut (dyn ConfirmationHandler + 'a)> {
        self.confirmation.as_deref_mut()
    }

    pub fn reactions(&mut self) -> Option<&mut (dyn ReactionHandler + 'a)> {
        self.reactions.as_deref_mut()
    }
}
