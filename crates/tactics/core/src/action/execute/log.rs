//! Typed execution log.

use std::fmt;

use crate::action::mastery::Mastery;
use crate::action::operation::{OpReport, OpStatus};
use crate::action::{Outcome, Phase};
use crate::env::ReactionWindow;
use crate::state::TokenId;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConcentrationEvent {
    Started,
    /// Damage save succeeded.
    Maintained { dc: i32, total: i32 },
    Broken,
}

/// One entry of the log returned with every execution.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "entry", content = "data", rename_all = "snake_case"))]
pub enum LogEntry {
    PhaseEntered {
        phase: Phase,
        target: Option<TokenId>,
    },
    Outcome(Outcome),
    Operation(OpReport),
    HookFired {
        phase: Phase,
        hook: String,
    },
    /// The hook's prompt was declined; none of its operations ran.
    HookRejected {
        phase: Phase,
        hook: String,
    },
    Mastery {
        mastery: Mastery,
        target: Option<TokenId>,
    },
    Concentration {
        token: TokenId,
        source_id: String,
        event: ConcentrationEvent,
    },
    Interrupted {
        window: ReactionWindow,
    },
    Message(String),
}

fn target(f: &mut fmt::Formatter<'_>, target: Option<TokenId>) -> fmt::Result {
    match target {
        Some(id) => write!(f, " -> {id}"),
        None => Ok(()),
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseEntered { phase, target: t } => {
                write!(f, "[{phase}]")?;
                target(f, *t)
            }
            Self::Outcome(outcome) => {
                write!(f, "outcome {} (roll {}, total {})", outcome.kind, outcome.roll, outcome.total)?;
                if let Some(against) = outcome.against {
                    write!(f, " vs {against}")?;
                }
                target(f, outcome.target)
            }
            Self::Operation(report) => {
                write!(f, "{}", report.op)?;
                target(f, report.target)?;
                match (report.status, report.amount) {
                    (OpStatus::Applied, Some(amount)) => write!(f, ": {amount}"),
                    (OpStatus::Applied, None) => Ok(()),
                    (OpStatus::Skipped(reason), _) => write!(f, " skipped ({reason})"),
                }
            }
            Self::HookFired { phase, hook } => write!(f, "hook {hook} fired at {phase}"),
            Self::HookRejected { phase, hook } => write!(f, "hook {hook} rejected at {phase}"),
            Self::Mastery { mastery, target: t } => {
                write!(f, "mastery {mastery}")?;
                target(f, *t)
            }
            Self::Concentration {
                token,
                source_id,
                event,
            } => match event {
                ConcentrationEvent::Started => write!(f, "{token} concentrates on {source_id}"),
                ConcentrationEvent::Maintained { dc, total } => {
                    write!(f, "{token} keeps {source_id} ({total} vs DC {dc})")
                }
                ConcentrationEvent::Broken => write!(f, "{token} loses {source_id}"),
            },
            Self::Interrupted { window } => write!(f, "interrupted in {window} window"),
            Self::Message(message) => f.write_str(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::operation::SkipReason;

    #[test]
    fn display_is_human_readable() {
        let skipped = LogEntry::Operation(OpReport {
            op: "deal_damage".into(),
            target: None,
            status: OpStatus::Skipped(SkipReason::UnresolvedTarget),
            amount: None,
        });
        assert_eq!(skipped.to_string(), "deal_damage skipped (unresolved_target)");

        let entered = LogEntry::PhaseEntered {
            phase: Phase::BeforeApply,
            target: Some(TokenId(3)),
        };
        assert_eq!(entered.to_string(), "[before-apply] -> #3");
    }
}
