//! Phase-bound hooks.

use tracing::{debug, trace};

use crate::env::{Decision, ExecutionEnv};

use super::condition::{Condition, all_hold};
use super::execute::{LogEntry, Transaction};
use super::operation::{OpContext, Operation, apply_all};
use super::{ActionPlan, ConfirmPrompt, HookSpec, Phase};

/// A hook with its phase already normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hook {
    /// Position in the authored hook list.
    pub index: usize,
    pub label: String,
    pub phase: Phase,
    pub conditions: Vec<Condition>,
    pub prompt: Option<ConfirmPrompt>,
    pub operations: Vec<Operation>,
}

impl Hook {
    /// `None` when the phase name is neither canonical nor a known alias.
    pub fn compile(index: usize, spec: &HookSpec) -> Option<Self> {
        let phase = Phase::normalize(&spec.phase)?;
        Some(Self {
            index,
            label: spec
                .label
                .clone()
                .unwrap_or_else(|| format!("hook#{index}")),
            phase,
            conditions: spec.conditions.clone(),
            prompt: spec.prompt.clone(),
            operations: spec.operations.clone(),
        })
    }
}

/// Fires every hook of `phase` whose conditions hold, in authored order.
pub(crate) fn fire_hooks(
    phase: Phase,
    plan: &ActionPlan,
    tx: &mut Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
) {
    let ctx = OpContext { phase, ..*ctx };
    for hook in plan.hooks.get(phase) {
        if !all_hold(&hook.conditions, &ctx.eval(tx, env)) {
            trace!(hook = %hook.label, %phase, "hook conditions not met");
            continue;
        }

        if let Some(prompt) = &hook.prompt {
            let decision = match env.confirmation() {
                Some(handler) => handler.confirm(prompt),
                None if prompt.default_accept => Decision::Accept,
                None => Decision::Reject,
            };
            if decision == Decision::Reject {
                debug!(hook = %hook.label, %phase, "hook rejected");
                tx.log.push(LogEntry::HookRejected {
                    phase,
                    hook: hook.label.clone(),
                });
                continue;
            }
        }

        debug!(hook = %hook.label, %phase, ops = hook.operations.len(), "hook fired");
        tx.log.push(LogEntry::HookFired {
            phase,
            hook: hook.label.clone(),
        });
        apply_all(&hook.operations, tx, env, &ctx);
    }
}
