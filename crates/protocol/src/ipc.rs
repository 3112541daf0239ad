//! Process lifecycle events.
//!
//! A running process notifies its listeners through these events. Ordering
//! is fixed: `start` precedes every step event, `step-start` precedes the
//! step's work, `step-done` or `step-error` follows it and `done` is last.
//!
//! Uses tagged enum serialization for TypeScript compatibility. Payload keys
//! are camelCase, like the persisted step records:
//! ```json
//! {
//!   "type": "step-done",
//!   "payload": {
//!     "processName": "onboarding",
//!     "stepName": "import-record",
//!     "itemIdentifier": "2",
//!     "state": { "success": true, "...": "..." }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::record_models::StepStateRecord;

/// Events sent from a process to its listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ProcessEvent {
    /// A full run has begun.
    #[serde(rename_all = "camelCase")]
    Start { process_name: String },

    /// A step is about to perform its work.
    #[serde(rename_all = "camelCase")]
    StepStart {
        process_name: String,
        step_name: String,
        item_identifier: Option<String>,
    },

    /// A step finished and its record was persisted.
    #[serde(rename_all = "camelCase")]
    StepDone {
        process_name: String,
        step_name: String,
        item_identifier: Option<String>,
        state: StepStateRecord,
    },

    /// A step failed; the message describes the failure.
    #[serde(rename_all = "camelCase")]
    StepError {
        process_name: String,
        step_name: String,
        item_identifier: Option<String>,
        error: String,
    },

    /// A full run has ended, whatever its outcome.
    #[serde(rename_all = "camelCase")]
    Done { process_name: String },
}

impl ProcessEvent {
    /// Name of the process that emitted the event.
    pub fn process_name(&self) -> &str {
        match self {
            ProcessEvent::Start { process_name }
            | ProcessEvent::StepStart { process_name, .. }
            | ProcessEvent::StepDone { process_name, .. }
            | ProcessEvent::StepError { process_name, .. }
            | ProcessEvent::Done { process_name } => process_name,
        }
    }

    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessEvent::Start { .. } => "start",
            ProcessEvent::StepStart { .. } => "step-start",
            ProcessEvent::StepDone { .. } => "step-done",
            ProcessEvent::StepError { .. } => "step-error",
            ProcessEvent::Done { .. } => "done",
        }
    }
}
