//! Error types for process validation and execution.

use crate::state::provider::ProviderError;
use crate::steps::base::StepError;
use thiserror::Error;

/// Structural problems in a step list, detected before anything runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid argument steps, step {step} is declared as both single and array item step.")]
    MixedStepKind { step: String },

    #[error("Invalid argument steps, step {step} depends on unknown step {dependency}.")]
    UnknownDependency { step: String, dependency: String },

    #[error("Invalid argument steps, step {step} is included multiple times.")]
    DuplicateStep { step: String },

    #[error("Invalid argument steps, step {step} contains duplicate itemIdentifier values.")]
    DuplicateItemIdentifier { step: String },
}

/// A declared dependency has no satisfied record.
#[derive(Error, Debug)]
pub enum DependencyError {
    /// Plain step dependency.
    #[error("Missing succeeded dependency state of step {step}.")]
    Unsatisfied { step: String },

    /// Dependency on one named array item.
    #[error("Missing succeeded dependency state of step {step} with itemIdentifier: {item_identifier}")]
    UnsatisfiedItem { step: String, item_identifier: String },

    /// Dependency on a whole array family; `item_identifier` is set when the
    /// instance has a record that is neither succeeded nor skipped.
    #[error("Missing succeeded dependency state of step {step}{}", item_suffix(.item_identifier))]
    UnsatisfiedFamilyItem {
        step: String,
        item_identifier: Option<String>,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

fn item_suffix(item_identifier: &Option<String>) -> String {
    item_identifier
        .as_ref()
        .map(|id| format!(", item identifier: {id}"))
        .unwrap_or_default()
}

/// Errors surfaced by [`crate::Process`] operations.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Step(#[from] StepError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// `do_work` of `step` returned an error.
    #[error("{cause}")]
    StepFailed { step: String, cause: anyhow::Error },

    #[error("Cannot change steps during run phase.")]
    StepsLocked,
}

/// Result type for process operations.
pub type ProcessResult<T> = Result<T, ProcessError>;
