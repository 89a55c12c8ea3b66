//! Presentation operations. They never touch the battle state.

use std::collections::BTreeMap;

use crate::action::execute::{LogEntry, Transaction};
use crate::env::ExecutionEnv;

use super::{OpContext, OpResult, SkipReason};

pub(super) fn visual(
    tx: &Transaction,
    env: &mut ExecutionEnv<'_>,
    ctx: &OpContext<'_>,
    id: &str,
) -> OpResult {
    let at = ctx
        .target
        .or(Some(ctx.actor))
        .and_then(|t| tx.state.token(t))
        .map(|t| t.position);
    let sink = env.presentation().ok_or(SkipReason::NoCollaborator)?;
    sink.visual(id, at);
    Ok(None)
}

/// Always lands in the execution log; forwarded to the sink when present.
pub(super) fn log(tx: &mut Transaction, env: &mut ExecutionEnv<'_>, message: &str) -> OpResult {
    tx.log.push(LogEntry::Message(message.to_string()));
    if let Some(sink) = env.presentation() {
        sink.log(message);
    }
    Ok(None)
}

pub(super) fn event(
    env: &mut ExecutionEnv<'_>,
    name: &str,
    payload: &BTreeMap<String, String>,
) -> OpResult {
    let sink = env.presentation().ok_or(SkipReason::NoCollaborator)?;
    sink.event(name, payload);
    Ok(None)
}
