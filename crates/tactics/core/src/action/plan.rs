//! Compiling an [`ActionSpec`] into an executable [`ActionPlan`].
//!
//! Compilation binds the spec to one actor and one optional explicit target,
//! normalizes hook phases once and parses the resolution formulas. It is the
//! only step of an action that can fail.

use tracing::{debug, warn};

use crate::config::{EngineConfig, TieWinner};
use crate::state::{Ability, AdvantageMode, EngineState, TokenId};

use super::hook::Hook;
use super::{
    ActionSpec, CritRule, DiceExpr, Operation, PhaseTable, PlanError, ReactionWindows,
    ResolutionKind, TargetingRule, formula,
};

/// Non-fatal findings recorded during compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanWarning {
    /// A hook named a phase nobody knows. The hook was dropped.
    UnknownPhase { hook: usize, phase: String },
}

/// Resolution with formulas already bound to the actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionPlan {
    pub kind: ResolutionKind,
    pub ability: Ability,
    pub save_ability: Ability,
    pub opposed_ability: Ability,
    /// Attack or check bonus. `None` uses the actor's defaults.
    pub bonus: Option<DiceExpr>,
    pub dc: Option<DiceExpr>,
    pub advantage: AdvantageMode,
    pub crit_threshold: u32,
    pub crit_rule: CritRule,
    pub tie_winner: TieWinner,
}

/// Operation lists keyed by outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutcomeBranches {
    pub on_resolve: Vec<Operation>,
    pub on_hit: Vec<Operation>,
    pub on_miss: Vec<Operation>,
    pub on_crit: Vec<Operation>,
    pub on_save_success: Vec<Operation>,
    pub on_save_fail: Vec<Operation>,
}

#[derive(Clone, Debug)]
pub struct ActionPlan {
    pub action_id: String,
    pub name: String,
    pub actor: TokenId,
    /// Explicit target supplied by the caller.
    pub target: Option<TokenId>,
    pub targeting: TargetingRule,
    pub resolution: ResolutionPlan,
    pub branches: OutcomeBranches,
    pub hooks: PhaseTable<Vec<Hook>>,
    pub reactions: ReactionWindows,
    pub tags: Vec<String>,
    pub warnings: Vec<PlanWarning>,
}

impl ActionPlan {
    pub fn compile(
        spec: &ActionSpec,
        state: &EngineState,
        actor: TokenId,
        target: Option<TokenId>,
        config: &EngineConfig,
    ) -> Result<Self, PlanError> {
        let actor_token = state
            .token(actor)
            .ok_or_else(|| PlanError::actor_not_found(actor, state.round))?;
        if let Some(target) = target.filter(|t| state.token(*t).is_none()) {
            return Err(PlanError::target_not_found(target, state.round));
        }

        let parse = |field: &'static str, text: &Option<String>| {
            text.as_deref()
                .map(|text| {
                    DiceExpr::parse(&formula::resolve_formula(text, actor_token)).map_err(
                        |source| PlanError::InvalidFormula {
                            action: spec.id.clone(),
                            field,
                            source,
                        },
                    )
                })
                .transpose()
        };

        let r = &spec.resolution;
        let ability = r.ability.unwrap_or(Ability::For);
        let resolution = ResolutionPlan {
            kind: r.kind,
            ability,
            save_ability: r.save_ability.unwrap_or(Ability::Con),
            opposed_ability: r.opposed_ability.unwrap_or(ability),
            bonus: parse("bonus", &r.bonus)?,
            dc: parse("dc", &r.dc)?,
            advantage: r.advantage,
            crit_threshold: r
                .crit_threshold
                .map_or(config.crit_threshold, |t| t.clamp(1, 20)),
            crit_rule: r.crit_rule,
            tie_winner: r.tie_winner.unwrap_or(config.tie_winner),
        };

        let mut hooks: PhaseTable<Vec<Hook>> = PhaseTable::default();
        let mut warnings = Vec::new();
        for (index, hook) in spec.hooks.iter().enumerate() {
            match Hook::compile(index, hook) {
                Some(compiled) => hooks.get_mut(compiled.phase).push(compiled),
                None => {
                    warn!(action = %spec.id, phase = %hook.phase, "dropping hook with unknown phase");
                    warnings.push(PlanWarning::UnknownPhase {
                        hook: index,
                        phase: hook.phase.clone(),
                    });
                }
            }
        }

        debug!(
            action = %spec.id,
            actor = %actor,
            target = ?target,
            kind = %resolution.kind,
            "compiled action plan"
        );

        Ok(Self {
            action_id: spec.id.clone(),
            name: spec.name.clone(),
            actor,
            target,
            targeting: spec.targeting,
            resolution,
            branches: OutcomeBranches {
                on_resolve: spec.on_resolve.clone(),
                on_hit: spec.on_hit.clone(),
                on_miss: spec.on_miss.clone(),
                on_crit: spec.on_crit.clone(),
                on_save_success: spec.on_save_success.clone(),
                on_save_fail: spec.on_save_fail.clone(),
            },
            hooks,
            reactions: spec.reactions,
            tags: spec.tags.clone(),
            warnings,
        })
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
