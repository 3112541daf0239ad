//! Base Step trait and supporting types.

use crate::steps::step_state::StepBase;
use async_trait::async_trait;
use seq_protocol::record_models::StepStateRecord;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Read-only view of the owning process, handed to a step for one
/// invocation of [`Step::do_work`].
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    process_name: &'a str,
    process_input: Option<&'a Value>,
    extra_args: Option<&'a Value>,
}

impl<'a> StepContext<'a> {
    pub fn new(process_name: &'a str, process_input: Option<&'a Value>) -> Self {
        Self {
            process_name,
            process_input,
            extra_args: None,
        }
    }

    /// Attach caller-supplied arguments (targeted `run_step` invocations).
    pub fn with_extra_args(mut self, extra_args: Option<&'a Value>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn process_name(&self) -> &'a str {
        self.process_name
    }

    /// The process input, as given when the process was constructed.
    pub fn process_input(&self) -> Option<&'a Value> {
        self.process_input
    }

    /// Deserialize the process input into a concrete type.
    pub fn process_input_as<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        self.process_input.map(T::deserialize).transpose()
    }

    pub fn extra_args(&self) -> Option<&'a Value> {
        self.extra_args
    }
}

/// Errors raised by the step state machine itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// An array step was built or hydrated without an item identifier.
    #[error("Bad arguments: missing required identifier")]
    MissingItemIdentifier,
}

/// A unit of work driven by a process.
///
/// Implementors embed a [`StepBase`] and expose it through `base` and
/// `base_mut`. The engine hydrates that base from persisted state, injects
/// resolved dependencies and then calls `do_work`.
///
/// `do_work` decides for itself whether to act: it must check
/// [`StepBase::should_run`] and return the current result unchanged when the
/// step is already terminal. To fail, set the outcome with
/// [`StepBase::on_error`] and return an error; the engine persists
/// [`StepBase::step_result`] on failure, not the error value.
#[async_trait]
pub trait Step: Send + Sync {
    fn base(&self) -> &StepBase;

    fn base_mut(&mut self) -> &mut StepBase;

    /// Perform the unit of work and return the record to persist.
    async fn do_work(&mut self, ctx: &StepContext<'_>) -> anyhow::Result<StepStateRecord>;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn should_run(&self) -> bool {
        self.base().should_run()
    }

    fn step_result(&self) -> StepStateRecord {
        self.base().step_result()
    }
}
