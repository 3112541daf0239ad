//! Runtime process state models.
//!
//! This module defines the lifecycle state of a process while it drives its
//! steps.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Represents the current lifecycle state of a process.
///
/// The state progresses through these values during a run:
/// Idle -> Running -> (Done | Failed)
///
/// The state is not reset automatically; a process that finished keeps
/// reporting `Done` or `Failed` until it is run again.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    /// Process has been created but not run yet.
    #[default]
    Idle,

    /// Process is driving its steps.
    Running,

    /// Every step finished without failure.
    Done,

    /// A step failed and the run stopped.
    Failed,
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProcessingState::Idle => "idle",
            ProcessingState::Running => "running",
            ProcessingState::Done => "done",
            ProcessingState::Failed => "failed",
        };
        f.write_str(label)
    }
}
