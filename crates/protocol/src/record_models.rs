//! Persisted step outcome models.
//!
//! A [`StepStateRecord`] is the unit exchanged between the engine and a state
//! provider. Its JSON shape uses camelCase keys so records written by other
//! tooling (or older versions) can be read back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// Opaque domain payload carried by a step.
pub type StateMap = Map<String, Value>;

/// Snapshot of one step outcome (or of one array-step instance).
///
/// A record is *terminal* when `success`, `skipped` or `disabled` is set.
/// `error` may be true on a non-terminal record, which marks the step as
/// eligible for a retry on the next run.
///
/// # Example
///
/// ```json
/// {
///   "state": { "clientId": 42 },
///   "success": true,
///   "skipped": false,
///   "disabled": false,
///   "error": false,
///   "errorMessage": null,
///   "itemIdentifier": null
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct StepStateRecord {
    /// Domain payload produced by the step, if any.
    #[serde(default)]
    #[ts(type = "Record<string, unknown> | null")]
    pub state: Option<StateMap>,

    /// Work completed; the step need not run again.
    pub success: bool,

    /// Step deliberately bypassed; also terminal.
    pub skipped: bool,

    /// Step excluded from running regardless of other flags.
    #[serde(default)]
    pub disabled: bool,

    /// Failure indicator.
    pub error: bool,

    /// Description of the failure when `error` is set.
    #[serde(default)]
    pub error_message: Option<String>,

    /// Present when the record belongs to an array-step instance.
    #[serde(default)]
    pub item_identifier: Option<String>,
}

impl StepStateRecord {
    /// Record of a step that completed with the given payload.
    pub fn succeeded(state: Option<StateMap>) -> Self {
        Self {
            state,
            success: true,
            ..Self::default()
        }
    }

    /// Record of a step that was skipped.
    pub fn skipped(state: Option<StateMap>) -> Self {
        Self {
            state,
            skipped: true,
            ..Self::default()
        }
    }

    /// Record of a step that failed with `message`.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: true,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Attach an array-item identifier to the record.
    pub fn with_item_identifier(mut self, item_identifier: impl Into<String>) -> Self {
        self.item_identifier = Some(item_identifier.into());
        self
    }

    /// True when the step must not be rerun.
    pub fn is_terminal(&self) -> bool {
        self.success || self.skipped || self.disabled
    }

    /// True when dependents of this step may proceed.
    ///
    /// Disabled steps are terminal but do not satisfy a dependency.
    pub fn is_satisfied(&self) -> bool {
        self.success || self.skipped
    }
}

/// Resolved state of a dependency or of a step family.
///
/// A plain step (or one specific array item) resolves to a single record; an
/// array-step family referenced by name resolves to every instance, in
/// declaration order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(untagged)]
pub enum ResolvedState {
    /// Record of a plain step or of a single array item.
    Single(StepStateRecord),

    /// Records of every instance of an array-step family.
    Items(Vec<StepStateRecord>),
}

impl ResolvedState {
    /// The single record, if this is not a family.
    pub fn as_single(&self) -> Option<&StepStateRecord> {
        match self {
            ResolvedState::Single(record) => Some(record),
            ResolvedState::Items(_) => None,
        }
    }

    /// The family records, if this is a family.
    pub fn as_items(&self) -> Option<&[StepStateRecord]> {
        match self {
            ResolvedState::Single(_) => None,
            ResolvedState::Items(records) => Some(records),
        }
    }

    /// Iterate over every record regardless of shape.
    pub fn records(&self) -> impl Iterator<Item = &StepStateRecord> {
        let records: &[StepStateRecord] = match self {
            ResolvedState::Single(record) => std::slice::from_ref(record),
            ResolvedState::Items(records) => records,
        };
        records.iter()
    }
}
