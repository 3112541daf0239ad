//! Configuration-driven step implementation.
//!
//! A [`DeclaredStep`] performs no business logic of its own: its outcome is
//! fixed by the declaration it was built from. It lets whole processes be
//! described in YAML and exercised end to end.

use crate::steps::base::{Step, StepContext};
use crate::steps::step_state::StepBase;
use async_trait::async_trait;
use seq_protocol::record_models::{StateMap, StepStateRecord};
use serde_json::Value;

/// Outcome a declared step produces when it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredOutcome {
    /// Succeed, storing the declared payload (or keeping the current one).
    Succeed(Option<StateMap>),
    /// Mark the step skipped, keeping its current payload.
    Skip,
    /// Record the message as an error and fail.
    Fail(String),
}

#[derive(Debug, Clone)]
pub struct DeclaredStep {
    base: StepBase,
    outcome: DeclaredOutcome,
}

impl DeclaredStep {
    pub fn new(base: StepBase, outcome: DeclaredOutcome) -> Self {
        Self { base, outcome }
    }

    pub fn success(base: StepBase) -> Self {
        Self::new(base, DeclaredOutcome::Succeed(None))
    }

    pub fn failing(base: StepBase, message: impl Into<String>) -> Self {
        Self::new(base, DeclaredOutcome::Fail(message.into()))
    }

    pub fn outcome(&self) -> &DeclaredOutcome {
        &self.outcome
    }
}

/// Overlay the keys of an object-valued `extra` onto `state`.
fn merge_extra_args(state: Option<StateMap>, extra: Option<&Value>) -> Option<StateMap> {
    match extra {
        Some(Value::Object(extra)) => {
            let mut merged = state.unwrap_or_default();
            for (key, value) in extra {
                merged.insert(key.clone(), value.clone());
            }
            Some(merged)
        }
        _ => state,
    }
}

#[async_trait]
impl Step for DeclaredStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    async fn do_work(&mut self, ctx: &StepContext<'_>) -> anyhow::Result<StepStateRecord> {
        if !self.base.should_run() {
            return Ok(self.base.step_result());
        }

        match &self.outcome {
            DeclaredOutcome::Succeed(declared) => {
                let state = declared.clone().or_else(|| self.base.state().cloned());
                self.base.on_success(merge_extra_args(state, ctx.extra_args()));
            }
            DeclaredOutcome::Skip => self.base.on_skipped(),
            DeclaredOutcome::Fail(message) => {
                let message = message.clone();
                self.base.on_error(message.clone());
                anyhow::bail!(message);
            }
        }

        Ok(self.base.step_result())
    }
}
