//! Process execution engine.
//!
//! A [`Process`] owns an ordered list of steps and drives them against a
//! [`StateProvider`]: it hydrates each step from its persisted record,
//! resolves declared dependencies, runs the step's work, persists the
//! outcome and reports every transition to its event subscribers.
//!
//! Outcomes outlive the process. A new `Process` with the same name and step
//! declarations, sharing the provider, resumes where the previous run stopped.

pub mod catalog;
pub mod dependency;
pub mod error;

pub use catalog::StepCatalog;
pub use dependency::resolve_dependencies;
pub use error::{DependencyError, ProcessError, ProcessResult, ValidationError};

use crate::state::events::EventBus;
use crate::state::process::{complete_process, fail_process, finish_process, start_process, RunState};
use crate::state::provider::{ProviderError, StateProvider};
use crate::steps::base::{Step, StepContext};
use seq_protocol::ipc::ProcessEvent;
use seq_protocol::process_models::ProcessingState;
use seq_protocol::record_models::{ResolvedState, StepStateRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};

/// An ordered, validated collection of steps bound to a state provider.
pub struct Process {
    process_name: String,
    steps: Vec<Box<dyn Step>>,
    catalog: StepCatalog,
    provider: Arc<dyn StateProvider>,
    processed_input: Option<Value>,
    run: RunState,
    events: EventBus,
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("process_name", &self.process_name)
            .field("steps", &self.steps.iter().map(|s| s.base().label()).collect::<Vec<_>>())
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

impl Process {
    /// Create a process from its steps.
    ///
    /// # Arguments
    ///
    /// * `process_name` - Key under which every step outcome is persisted
    /// * `steps` - Steps in execution order
    /// * `provider` - Where outcomes are loaded from and stored to
    /// * `processed_input` - Opaque input made available to every step
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the step list is inconsistent.
    pub fn new(
        process_name: impl Into<String>,
        steps: Vec<Box<dyn Step>>,
        provider: Arc<dyn StateProvider>,
        processed_input: Option<Value>,
    ) -> Result<Self, ValidationError> {
        let catalog = StepCatalog::build(steps.iter().map(|step| step.base()))?;
        Ok(Self {
            process_name: process_name.into(),
            steps,
            catalog,
            provider,
            processed_input,
            run: RunState::default(),
            events: EventBus::new(),
        })
    }

    /// Receive every event emitted from now on.
    ///
    /// Delivery never waits on the receiver, so it may be read during the
    /// run or only after it.
    pub fn subscribe(&mut self) -> UnboundedReceiver<ProcessEvent> {
        self.events.subscribe()
    }

    /// Same as [`Process::subscribe`], wrapped as a `Stream`.
    pub fn event_stream(&mut self) -> UnboundedReceiverStream<ProcessEvent> {
        UnboundedReceiverStream::new(self.events.subscribe())
    }

    /// Forward events to an existing channel.
    pub fn add_listener(&mut self, listener: UnboundedSender<ProcessEvent>) {
        self.events.add_listener(listener);
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    pub fn process_input(&self) -> Option<&Value> {
        self.processed_input.as_ref()
    }

    /// Deserialize the process input into a concrete type.
    pub fn process_input_as<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        self.processed_input.as_ref().map(T::deserialize).transpose()
    }

    /// Message of the last failure, if the process failed.
    pub fn error(&self) -> Option<&str> {
        self.run.error.as_deref()
    }

    pub fn processing_state(&self) -> ProcessingState {
        self.run.processing_state
    }

    /// Replace the step list.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::StepsLocked`] while a run is in progress
    /// - [`ProcessError::Validation`] when the new list is inconsistent; the
    ///   current list is kept
    pub fn set_steps(&mut self, steps: Vec<Box<dyn Step>>) -> ProcessResult<()> {
        if self.run.is_running() {
            return Err(ProcessError::StepsLocked);
        }
        self.catalog = StepCatalog::build(steps.iter().map(|step| step.base()))?;
        self.steps = steps;
        Ok(())
    }

    /// Persisted state of a step.
    ///
    /// Plain steps resolve to their single record, array families to the
    /// records of every instance that has one, in declaration order. Returns
    /// `None` when nothing has been persisted.
    pub async fn get_step_state(&self, step_name: &str) -> ProcessResult<Option<ResolvedState>> {
        let mut records = Vec::new();
        for step in self.steps.iter().filter(|step| step.name() == step_name) {
            let record = self
                .provider
                .get_step_state(&self.process_name, step_name, step.base().item_identifier())
                .await?;
            records.extend(record);
        }

        if records.is_empty() {
            return Ok(None);
        }
        if self.catalog.is_array_family(step_name) {
            Ok(Some(ResolvedState::Items(records)))
        } else {
            Ok(records.into_iter().next().map(ResolvedState::Single))
        }
    }

    /// Run every step in order.
    ///
    /// Steps that already succeeded, were skipped or are disabled keep their
    /// outcome. The first failure stops the run: the step's record is
    /// persisted, the process becomes `Failed` and [`Process::error`] holds
    /// the message.
    ///
    /// # Errors
    ///
    /// With `throw_error` set, the first failure is returned (and `done` is
    /// not emitted). If persisting the failed step's record also fails, that
    /// provider error is returned instead. Without `throw_error` failures are
    /// only recorded.
    pub async fn run(&mut self, throw_error: bool) -> ProcessResult<()> {
        info!(process = %self.process_name, steps = self.steps.len(), "starting process");
        start_process(&mut self.run, &self.process_name, &mut self.events);

        for index in 0..self.steps.len() {
            if let Err(err) = self.execute_step(index, None).await {
                let persisted = self.handle_step_failure(index, &err).await;
                if throw_error {
                    persisted?;
                    return Err(err);
                }
                break;
            }
        }

        complete_process(&mut self.run);
        finish_process(&self.process_name, &mut self.events);
        info!(
            process = %self.process_name,
            state = %self.run.processing_state,
            "process finished"
        );
        Ok(())
    }

    /// Run one step, selected by name and, for array steps, by identifier.
    ///
    /// `extra_args` is passed to the step through its [`StepContext`].
    /// Returns `Ok(None)` when no step matches, otherwise the step's result
    /// after the attempt.
    ///
    /// # Errors
    ///
    /// With `throw_error` set, a failure is returned instead of the failed
    /// step's result, or the provider error when the failed record could not
    /// be persisted.
    pub async fn run_step(
        &mut self,
        step_name: &str,
        item_identifier: Option<&str>,
        throw_error: bool,
        extra_args: Option<&Value>,
    ) -> ProcessResult<Option<StepStateRecord>> {
        let Some(index) = self
            .steps
            .iter()
            .position(|step| step.base().matches(step_name, item_identifier))
        else {
            debug!(process = %self.process_name, step_name, ?item_identifier, "no matching step");
            return Ok(None);
        };

        match self.execute_step(index, extra_args).await {
            Ok(_) => Ok(Some(self.steps[index].step_result())),
            Err(err) => {
                let persisted = self.handle_step_failure(index, &err).await;
                if throw_error {
                    persisted?;
                    Err(err)
                } else {
                    Ok(Some(self.steps[index].step_result()))
                }
            }
        }
    }

    /// Load, resolve, work and persist a single step.
    async fn execute_step(
        &mut self,
        index: usize,
        extra_args: Option<&Value>,
    ) -> ProcessResult<StepStateRecord> {
        let Self {
            process_name,
            steps,
            catalog,
            provider,
            processed_input,
            events,
            ..
        } = self;
        let process_name = process_name.as_str();
        let step = &mut steps[index];
        let step_name = step.name().to_string();
        let item_identifier = step.base().item_identifier().map(str::to_string);

        if let Some(record) = provider
            .get_step_state(process_name, &step_name, item_identifier.as_deref())
            .await?
        {
            debug!(process = process_name, step = %step.base().label(), "hydrating step");
            step.base_mut().set_initial_state(&record)?;
        }

        if !step.base().dependencies().is_empty() {
            let states = resolve_dependencies(
                provider.as_ref(),
                process_name,
                catalog,
                step.base().dependencies(),
            )
            .await?;
            step.base_mut().set_state_of_dependencies(states);
        }

        events.emit(ProcessEvent::StepStart {
            process_name: process_name.to_string(),
            step_name: step_name.clone(),
            item_identifier: item_identifier.clone(),
        });

        let ctx = StepContext::new(process_name, processed_input.as_ref()).with_extra_args(extra_args);
        let record = step
            .do_work(&ctx)
            .await
            .map_err(|cause| ProcessError::StepFailed {
                step: step_name.clone(),
                cause,
            })?;

        provider
            .set_step_state(process_name, &step_name, item_identifier.as_deref(), &record)
            .await?;
        debug!(process = process_name, step = %step.base().label(), "step done");

        events.emit(ProcessEvent::StepDone {
            process_name: process_name.to_string(),
            step_name,
            item_identifier,
            state: record.clone(),
        });

        Ok(record)
    }

    /// Report a failed step, mark the process failed and persist the step.
    ///
    /// Failures raised by the engine itself are recorded on the step before
    /// persisting; work failures persist whatever the step recorded. A
    /// persistence failure is logged and handed back to the caller.
    async fn handle_step_failure(
        &mut self,
        index: usize,
        err: &ProcessError,
    ) -> Result<(), ProviderError> {
        let Self {
            process_name,
            steps,
            provider,
            run,
            events,
            ..
        } = self;
        let step = &mut steps[index];
        let message = err.to_string();
        let item_identifier = step.base().item_identifier().map(str::to_string);

        warn!(process = %process_name, step = %step.base().label(), error = %message, "step failed");

        events.emit(ProcessEvent::StepError {
            process_name: process_name.clone(),
            step_name: step.name().to_string(),
            item_identifier: item_identifier.clone(),
            error: message.clone(),
        });

        fail_process(run, message.clone());

        if !matches!(err, ProcessError::StepFailed { .. }) {
            step.base_mut().on_error(message);
        }

        let record = step.step_result();
        provider
            .set_step_state(process_name, step.name(), item_identifier.as_deref(), &record)
            .await
            .inspect_err(|persist_err| {
                error!(
                    process = %process_name,
                    step = %step.base().label(),
                    error = %persist_err,
                    "failed to persist failed step state"
                );
            })
    }
}
