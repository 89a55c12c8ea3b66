//! Boolean condition language used by hooks, filters and conditional
//! operations.
//!
//! A [`Condition`] is a tree of `All`/`Any`/`Not` combinators over leaf
//! predicates. Evaluation is pure: it only reads the [`EvalContext`]. Any leaf
//! scoped to the target evaluates to `false` when there is no target.

mod predicates;

use crate::env::ResourceLedger;
use crate::state::{Ability, DamageType, EngineState, MovementModes, Size, Token, TokenId};

use super::{Outcome, OutcomeFlags, OutcomeKind, Phase};

pub use predicates::Comparator;

/// Which side of the action a leaf reads.
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
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Subject {
    Actor,
    #[default]
    Target,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")
)]
pub enum Condition {
    // ===== combinators =====
    All { of: Vec<Condition> },
    Any { of: Vec<Condition> },
    Not { of: Box<Condition> },
    Always,
    Never,

    // ===== tags =====
    HasTag {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        tag: String,
    },
    /// Creature type, stored as a `creature:<kind>` tag.
    CreatureType {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        kind: String,
    },
    ActionHasTag { tag: String },

    // ===== statuses =====
    HasStatus {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        status: String,
    },
    StatusStacks {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        status: String,
        cmp: Comparator,
        value: i32,
    },
    /// Status present and applied by the actor.
    StatusFromActor {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        status: String,
    },
    Concentrating {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
    },

    // ===== resources =====
    Resource {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        resource: String,
        cmp: Comparator,
        value: i32,
    },
    SlotAvailable {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        level: u8,
    },

    // ===== geometry =====
    /// Distance from actor to target in cells.
    Distance { cmp: Comparator, value: i32 },
    Adjacent,
    /// Subject stands inside a board effect with this id or tag.
    InBoardEffect {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        effect: String,
    },

    // ===== outcome =====
    /// Outcome carries any of the given flags.
    OutcomeAny { flags: OutcomeFlags },
    OutcomeIs { kind: OutcomeKind },
    IsCrit,
    NaturalRoll { cmp: Comparator, value: i32 },
    RollTotal { cmp: Comparator, value: i32 },

    // ===== pipeline =====
    PhaseIs { phase: Phase },
    HasTarget,
    TargetCount { cmp: Comparator, value: i32 },
    TargetingLocked,
    Round { cmp: Comparator, value: i32 },

    // ===== vitals =====
    HpPercent {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        cmp: Comparator,
        value: i32,
    },
    Hp {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        cmp: Comparator,
        value: i32,
    },
    TempHp {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        cmp: Comparator,
        value: i32,
    },
    /// At or below half of max HP.
    Bloodied {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
    },
    IsAlive {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
    },

    // ===== damage affinities =====
    ImmuneTo {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        damage: DamageType,
    },
    ResistantTo {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        damage: DamageType,
    },
    VulnerableTo {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        damage: DamageType,
    },

    // ===== movement =====
    CanMove {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        modes: MovementModes,
    },
    SizeAtMost {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        size: Size,
    },

    // ===== stats & values =====
    AbilityMod {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        ability: Ability,
        cmp: Comparator,
        value: i32,
    },
    Level {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        cmp: Comparator,
        value: i32,
    },
    ArmorClass {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        cmp: Comparator,
        value: i32,
    },
    Value {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        name: String,
        cmp: Comparator,
        value: i32,
    },
    Flag {
        #[cfg_attr(feature = "serde", serde(default))]
        subject: Subject,
        flag: String,
    },

    // ===== sides =====
    TargetIsEnemy,
    TargetIsAlly,
    TargetIsSelf,
}

impl Condition {
    pub fn all(of: impl IntoIterator<Item = Condition>) -> Self {
        Self::All {
            of: of.into_iter().collect(),
        }
    }

    pub fn any(of: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any {
            of: of.into_iter().collect(),
        }
    }

    pub fn negate(self) -> Self {
        Self::Not { of: Box::new(self) }
    }

    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        use predicates as p;

        match self {
            Self::All { of } => of.iter().all(|c| c.evaluate(ctx)),
            Self::Any { of } => of.iter().any(|c| c.evaluate(ctx)),
            Self::Not { of } => !of.evaluate(ctx),
            Self::Always => true,
            Self::Never => false,

            Self::HasTag { subject, tag } => ctx.token(*subject).is_some_and(|t| t.has_tag(tag)),
            Self::CreatureType { subject, kind } => {
                ctx.token(*subject).is_some_and(|t| p::creature_type(t, kind))
            }
            Self::ActionHasTag { tag } => ctx.action_tags.iter().any(|t| t == tag),

            Self::HasStatus { subject, status } => {
                ctx.token(*subject).is_some_and(|t| t.statuses.has(status))
            }
            Self::StatusStacks {
                subject,
                status,
                cmp,
                value,
            } => ctx
                .token(*subject)
                .is_some_and(|t| cmp.compare(t.statuses.stacks(status) as i64, *value)),
            Self::StatusFromActor { subject, status } => ctx
                .token(*subject)
                .is_some_and(|t| p::status_from(t, status, ctx.actor)),
            Self::Concentrating { subject } => {
                ctx.token(*subject).is_some_and(|t| t.concentration.is_some())
            }

            Self::Resource {
                subject,
                resource,
                cmp,
                value,
            } => ctx.token(*subject).is_some_and(|t| {
                p::resource_amount(t, resource, ctx.ledger)
                    .is_some_and(|amount| cmp.compare(amount as i64, *value))
            }),
            Self::SlotAvailable { subject, level } => ctx
                .token(*subject)
                .is_some_and(|t| p::slots_remaining(t, *level, ctx.ledger) > 0),

            Self::Distance { cmp, value } => ctx
                .distance()
                .is_some_and(|d| cmp.compare(d as i64, *value)),
            Self::Adjacent => ctx.distance().is_some_and(|d| d <= 1),
            Self::InBoardEffect { subject, effect } => ctx
                .subject_id(*subject)
                .is_some_and(|id| p::in_board_effect(ctx.state, id, effect)),

            Self::OutcomeAny { flags } => ctx.outcome.is_some_and(|o| o.flags().intersects(*flags)),
            Self::OutcomeIs { kind } => ctx.outcome.is_some_and(|o| o.kind == *kind),
            Self::IsCrit => ctx.outcome.is_some_and(|o| o.flags().contains(OutcomeFlags::CRIT)),
            Self::NaturalRoll { cmp, value } => ctx
                .outcome
                .is_some_and(|o| cmp.compare(o.roll as i64, *value)),
            Self::RollTotal { cmp, value } => ctx
                .outcome
                .is_some_and(|o| cmp.compare(o.total as i64, *value)),

            Self::PhaseIs { phase } => ctx.phase == *phase,
            Self::HasTarget => ctx.target_token().is_some(),
            Self::TargetCount { cmp, value } => {
                cmp.compare(ctx.state.targeting.selected.len() as i64, *value)
            }
            Self::TargetingLocked => ctx.state.targeting.locked,
            Self::Round { cmp, value } => cmp.compare(ctx.state.round as i64, *value),

            Self::HpPercent { subject, cmp, value } => ctx
                .token(*subject)
                .is_some_and(|t| cmp.compare(t.hp_percent() as i64, *value)),
            Self::Hp { subject, cmp, value } => ctx
                .token(*subject)
                .is_some_and(|t| cmp.compare(t.hp as i64, *value)),
            Self::TempHp { subject, cmp, value } => ctx
                .token(*subject)
                .is_some_and(|t| cmp.compare(t.temp_hp as i64, *value)),
            Self::Bloodied { subject } => ctx.token(*subject).is_some_and(p::bloodied),
            Self::IsAlive { subject } => ctx.token(*subject).is_some_and(Token::is_alive),

            Self::ImmuneTo { subject, damage } => {
                ctx.token(*subject).is_some_and(|t| t.immunities.contains(damage))
            }
            Self::ResistantTo { subject, damage } => {
                ctx.token(*subject).is_some_and(|t| t.resistances.contains(damage))
            }
            Self::VulnerableTo { subject, damage } => ctx
                .token(*subject)
                .is_some_and(|t| t.vulnerabilities.contains(damage)),

            Self::CanMove { subject, modes } => ctx
                .token(*subject)
                .is_some_and(|t| t.movement.modes.contains(*modes)),
            Self::SizeAtMost { subject, size } => {
                ctx.token(*subject).is_some_and(|t| t.movement.size <= *size)
            }

            Self::AbilityMod {
                subject,
                ability,
                cmp,
                value,
            } => ctx
                .token(*subject)
                .is_some_and(|t| cmp.compare(t.ability_mod(*ability) as i64, *value)),
            Self::Level { subject, cmp, value } => ctx.token(*subject).is_some_and(|t| {
                t.level()
                    .is_some_and(|level| cmp.compare(level as i64, *value))
            }),
            Self::ArmorClass { subject, cmp, value } => ctx.token(*subject).is_some_and(|t| {
                t.armor_class()
                    .is_some_and(|ac| cmp.compare(ac as i64, *value))
            }),
            Self::Value {
                subject,
                name,
                cmp,
                value,
            } => ctx.token(*subject).is_some_and(|t| {
                t.value(name)
                    .is_some_and(|v| cmp.compare(v as i64, *value))
            }),
            Self::Flag { subject, flag } => ctx
                .token(*subject)
                .is_some_and(|t| t.value(flag).is_some_and(|v| v != 0)),

            Self::TargetIsEnemy => ctx
                .target_token()
                .is_some_and(|t| ctx.state.are_hostile(ctx.actor, t.id)),
            Self::TargetIsAlly => ctx
                .target_token()
                .is_some_and(|t| t.id != ctx.actor && !ctx.state.are_hostile(ctx.actor, t.id)),
            Self::TargetIsSelf => ctx.target_token().is_some_and(|t| t.id == ctx.actor),
        }
    }
}

/// Everything a condition may read.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub state: &'a EngineState,
    pub actor: TokenId,
    pub target: Option<TokenId>,
    pub outcome: Option<&'a Outcome>,
    pub phase: Phase,
    pub action_tags: &'a [String],
    pub ledger: Option<&'a dyn ResourceLedger>,
}

impl<'a> EvalContext<'a> {
    pub fn new(state: &'a EngineState, actor: TokenId) -> Self {
        Self {
            state,
            actor,
            target: None,
            outcome: None,
            phase: state.phase,
            action_tags: &[],
            ledger: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: Option<TokenId>) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Option<&'a Outcome>) -> Self {
        self.outcome = outcome;
        self
    }

    #[must_use]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    #[must_use]
    pub fn with_action_tags(mut self, tags: &'a [String]) -> Self {
        self.action_tags = tags;
        self
    }

    #[must_use]
    pub fn with_ledger(mut self, ledger: Option<&'a dyn ResourceLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    fn subject_id(&self, subject: Subject) -> Option<TokenId> {
        match subject {
            Subject::Actor => Some(self.actor),
            Subject::Target => self.target,
        }
    }

    fn token(&self, subject: Subject) -> Option<&'a Token> {
        self.state.token(self.subject_id(subject)?)
    }

    fn target_token(&self) -> Option<&'a Token> {
        self.token(Subject::Target)
    }

    fn distance(&self) -> Option<u32> {
        self.state.distance(self.actor, self.target?)
    }
}

/// True if every condition holds. An empty list holds.
pub fn all_hold(conditions: &[Condition], ctx: &EvalContext<'_>) -> bool {
    conditions.iter().all(|c| c.evaluate(ctx))
}
