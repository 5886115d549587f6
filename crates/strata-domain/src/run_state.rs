//! Run state of a sampling chain

use serde::{Deserialize, Serialize};

/// Lifecycle of a sampling run
///
/// Carried explicitly by the results handle; only `Completed` results may be
/// handed to persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Results allocated, chain not started
    #[default]
    NotStarted,

    /// Chain in progress; traces are partial
    Running,

    /// Chain reached its termination criterion
    Completed,
}

impl RunState {
    /// Whether the results are final
    pub fn is_complete(&self) -> bool {
        matches!(self, RunState::Completed)
    }
}
