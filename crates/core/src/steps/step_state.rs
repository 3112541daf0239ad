//! In-memory step state machine.
//!
//! [`StepBase`] holds the identity, declared dependencies and current outcome
//! of a step. Step implementations embed one and drive it through
//! `on_success`, `on_skipped` and `on_error` from their `do_work`.

use crate::steps::base::StepError;
use seq_protocol::record_models::{ResolvedState, StateMap, StepStateRecord};
use seq_protocol::step_models::DependencyRef;
use indexmap::IndexMap;

/// Whether a step stands alone or is one instance of an array family.
///
/// Decided when the step is constructed and never inferred afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// A step that appears once per process.
    Plain,

    /// One instance of a family sharing a step name, keyed by identifier.
    ArrayItem(String),
}

/// Resolved dependency states keyed by step name, in `depends_on` order.
pub type DependencyStates = IndexMap<String, ResolvedState>;

/// Identity, dependencies and outcome of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepBase {
    name: String,
    kind: StepKind,
    depends_on: Vec<DependencyRef>,
    state: Option<StateMap>,
    success: bool,
    skipped: bool,
    disabled: bool,
    error: Option<String>,
    state_of_dependencies: DependencyStates,
}

impl StepBase {
    /// Create a plain step.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), StepKind::Plain)
    }

    /// Create one instance of an array-step family.
    ///
    /// The identifier is stringified on storage.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::MissingItemIdentifier`] when the identifier is
    /// empty.
    pub fn array_item(name: impl Into<String>, item_identifier: impl ToString) -> Result<Self, StepError> {
        let item_identifier = item_identifier.to_string();
        if item_identifier.is_empty() {
            return Err(StepError::MissingItemIdentifier);
        }
        Ok(Self::with_kind(name.into(), StepKind::ArrayItem(item_identifier)))
    }

    fn with_kind(name: String, kind: StepKind) -> Self {
        Self {
            name,
            kind,
            depends_on: Vec::new(),
            state: None,
            success: false,
            skipped: false,
            disabled: false,
            error: None,
            state_of_dependencies: DependencyStates::new(),
        }
    }

    /// Declare the steps this step depends on, in order.
    pub fn depends_on<I, D>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DependencyRef>,
    {
        self.depends_on = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the initial payload.
    pub fn with_state(mut self, state: Option<StateMap>) -> Self {
        self.state = state;
        self
    }

    /// Set the initial success flag.
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// Set the initial skipped flag.
    pub fn with_skipped(mut self, skipped: bool) -> Self {
        self.skipped = skipped;
        self
    }

    /// Set the initial disabled flag.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set the initial error message.
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    /// Item identifier of an array step, `None` for plain steps.
    pub fn item_identifier(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Plain => None,
            StepKind::ArrayItem(id) => Some(id),
        }
    }

    pub fn is_array_item(&self) -> bool {
        matches!(self.kind, StepKind::ArrayItem(_))
    }

    pub fn dependencies(&self) -> &[DependencyRef] {
        &self.depends_on
    }

    pub fn state(&self) -> Option<&StateMap> {
        self.state.as_ref()
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn skipped(&self) -> bool {
        self.skipped
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state_of_dependencies(&self) -> &DependencyStates {
        &self.state_of_dependencies
    }

    /// Resolved state of one dependency by step name.
    pub fn dependency(&self, step_name: &str) -> Option<&ResolvedState> {
        self.state_of_dependencies.get(step_name)
    }

    /// Human-readable label, `name[item]` for array steps.
    pub fn label(&self) -> String {
        match &self.kind {
            StepKind::Plain => self.name.clone(),
            StepKind::ArrayItem(id) => format!("{}[{}]", self.name, id),
        }
    }

    /// True when this step is addressed by `name` and, for array steps,
    /// by `item_identifier`.
    pub fn matches(&self, name: &str, item_identifier: Option<&str>) -> bool {
        if self.name != name {
            return false;
        }
        match &self.kind {
            StepKind::Plain => true,
            StepKind::ArrayItem(id) => item_identifier == Some(id.as_str()),
        }
    }

    /// The single rerun-suppression rule: an error alone never blocks a rerun.
    pub fn should_run(&self) -> bool {
        !(self.success || self.skipped || self.disabled)
    }

    pub fn on_success(&mut self, state: Option<StateMap>) {
        self.error = None;
        self.skipped = false;
        self.success = true;
        self.disabled = false;
        self.state = state;
    }

    /// Mark the step skipped, keeping its current payload.
    pub fn on_skipped(&mut self) {
        self.error = None;
        self.skipped = true;
        self.success = false;
        self.disabled = false;
    }

    /// Mark the step skipped and replace its payload (`None` clears it).
    pub fn on_skipped_with(&mut self, state: Option<StateMap>) {
        self.on_skipped();
        self.state = state;
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.skipped = false;
        self.success = false;
        self.disabled = false;
    }

    /// Hydrate the outcome from a previously persisted record.
    ///
    /// The error flag is not restored; a failed step starts its next attempt
    /// clean.
    ///
    /// # Errors
    ///
    /// Array steps return [`StepError::MissingItemIdentifier`] when the record
    /// carries no identifier. The step is left untouched in that case.
    pub fn set_initial_state(&mut self, record: &StepStateRecord) -> Result<(), StepError> {
        if let StepKind::ArrayItem(current) = &mut self.kind {
            match record.item_identifier.as_deref() {
                Some(id) if !id.is_empty() => *current = id.to_string(),
                _ => return Err(StepError::MissingItemIdentifier),
            }
        }
        self.state = record.state.clone();
        self.success = record.success;
        self.skipped = record.skipped;
        self.disabled = record.disabled;
        Ok(())
    }

    pub fn set_state_of_dependencies(&mut self, states: DependencyStates) {
        self.state_of_dependencies = states;
    }

    /// Serialize the current outcome.
    pub fn step_result(&self) -> StepStateRecord {
        StepStateRecord {
            state: self.state.clone(),
            success: self.success,
            skipped: self.skipped,
            disabled: self.disabled,
            error: self.error.is_some(),
            error_message: self.error.clone(),
            item_identifier: self.item_identifier().map(str::to_string),
        }
    }
}
