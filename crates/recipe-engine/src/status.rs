//! Execution state of an entry

use serde::{Deserialize, Serialize};

/// State machine position of an entry
///
/// Entries start `Ready`, move to `Running` when `execute` is called, and
/// finish in `Completed` or `Error`. The status is overwritten on each
/// `execute` call; there is no separate reset transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Ready to execute
    Ready,
    /// Currently executing
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Error,
}

impl ExecutionStatus {
    /// Whether this is a finished state (completed or error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}
