//! Plan execution: transaction, pipeline and typed log.

mod log;
mod pipeline;
mod transaction;

pub use log::{ConcentrationEvent, LogEntry};
pub use pipeline::{ExecutionResult, execute};
pub use transaction::Transaction;
