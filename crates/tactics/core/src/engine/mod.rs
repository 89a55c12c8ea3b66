//! Entry point binding authored actions to a battle snapshot.
//!
//! The [`TacticsEngine`] never mutates the snapshot it is given. Every
//! execution works on a transaction and hands back a new [`EngineState`]
//! inside the [`ExecutionResult`]; the caller decides whether to adopt it.

use crate::action::{self, ActionPlan, ActionSpec, ExecutionResult, PlanError};
use crate::config::EngineConfig;
use crate::env::ExecutionEnv;
use crate::state::{EngineState, TokenId};

/// Rules interpreter over a borrowed snapshot.
///
/// Compilation is the only fallible step:
/// compile → execute (12 phases) → result
pub struct TacticsEngine<'a> {
    state: &'a EngineState,
    config: &'a EngineConfig,
}

impl<'a> TacticsEngine<'a> {
    /// Creates an engine over the given snapshot and configuration.
    pub fn new(state: &'a EngineState, config: &'a EngineConfig) -> Self {
        Self { state, config }
    }

    pub fn state(&self) -> &EngineState {
        self.state
    }

    /// Binds an action to an actor and an optional explicit target.
    pub fn compile(
        &self,
        spec: &ActionSpec,
        actor: TokenId,
        target: Option<TokenId>,
    ) -> Result<ActionPlan, PlanError> {
        ActionPlan::compile(spec, self.state, actor, target, self.config)
    }

    /// Executes a compiled plan. Never fails; see [`ExecutionResult`].
    pub fn execute(&self, plan: &ActionPlan, env: &mut ExecutionEnv<'_>) -> ExecutionResult {
        action::execute(plan, self.state, env, self.config)
    }

    /// Compiles and executes in one step.
    pub fn run(
        &self,
        spec: &ActionSpec,
        actor: TokenId,
        target: Option<TokenId>,
        env: &mut ExecutionEnv<'_>,
    ) -> Result<ExecutionResult, PlanError> {
        let plan = self.compile(spec, actor, target)?;
        Ok(self.execute(&plan, env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Operation;
    use crate::env::FixedDice;
    use crate::state::{Position, Token};

    #[test]
    fn run_leaves_snapshot_untouched() {
        let mut state = EngineState::new(Token::new(TokenId(0), "cleric", Position::ORIGIN, 20))
            .with_ally(Token::new(TokenId(1), "squire", Position::new(1, 0), 10));
        state.token_mut(TokenId(1)).unwrap().hp = 4;
        let config = EngineConfig::default();
        let spec = ActionSpec {
            on_hit: vec![Operation::Heal {
                target: crate::action::TargetSelector::Primary,
                formula: "5".into(),
            }],
            ..ActionSpec::new("cure")
        };

        let engine = TacticsEngine::new(&state, &config);
        let mut dice = FixedDice(1);
        let result = engine
            .run(&spec, TokenId(0), Some(TokenId(1)), &mut ExecutionEnv::new(&mut dice))
            .unwrap();

        assert!(result.ok);
        assert_eq!(result.state.token(TokenId(1)).unwrap().hp, 9);
        assert_eq!(engine.state().token(TokenId(1)).unwrap().hp, 4);
    }

    #[test]
    fn unknown_actor_fails_to_compile() {
        let state = EngineState::new(Token::new(TokenId(0), "cleric", Position::ORIGIN, 20));
        let config = EngineConfig::default();
        let engine = TacticsEngine::new(&state, &config);
        assert!(matches!(
            engine.compile(&ActionSpec::new("cure"), TokenId(7), None),
            Err(PlanError::ActorNotFound { .. })
        ));
    }
}
