//! Step implementations with scripted outcomes for deterministic testing.

use async_trait::async_trait;
use seq_core::steps::{Step, StepBase, StepContext};
use seq_protocol::record_models::{StateMap, StepStateRecord};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a [`ScriptedStep`] does when it is allowed to run.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Script {
    /// Succeed with the given payload.
    Succeed(Option<StateMap>),
    /// Record the message with `on_error` and fail.
    Fail(String),
    /// Fail without recording anything on the step.
    FailSilently(String),
    /// Succeed with the process input and extra arguments as payload.
    Echo,
    /// Sleep, then succeed.
    Sleep(Duration),
}

/// A step whose outcome is fixed up front and whose work calls are counted.
pub struct ScriptedStep {
    base: StepBase,
    script: Script,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl ScriptedStep {
    pub fn new(base: StepBase, script: Script) -> Self {
        Self {
            base,
            script,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of the times the step actually performed work.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn boxed(self) -> Box<dyn Step> {
        Box::new(self)
    }
}

#[async_trait]
impl Step for ScriptedStep {
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
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.script {
            Script::Succeed(state) => self.base.on_success(state.clone()),
            Script::Fail(message) => {
                let message = message.clone();
                self.base.on_error(message.clone());
                anyhow::bail!(message);
            }
            Script::FailSilently(message) => anyhow::bail!(message.clone()),
            Script::Echo => {
                let mut state = StateMap::new();
                state.insert("input".to_string(), ctx.process_input().cloned().unwrap_or(Value::Null));
                state.insert("extra".to_string(), ctx.extra_args().cloned().unwrap_or(Value::Null));
                state.insert("process".to_string(), json!(ctx.process_name()));
                self.base.on_success(Some(state));
            }
            Script::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                self.base.on_success(None);
            }
        }

        Ok(self.base.step_result())
    }
}

/// Payload `{ "result": value }`.
#[allow(dead_code)]
pub fn result_state(value: &str) -> Option<StateMap> {
    let mut state = StateMap::new();
    state.insert("result".to_string(), json!(value));
    Some(state)
}

#[allow(dead_code)]
pub fn succeeding(base: StepBase) -> Box<dyn Step> {
    ScriptedStep::new(base, Script::Succeed(None)).boxed()
}

#[allow(dead_code)]
pub fn failing(base: StepBase, message: &str) -> Box<dyn Step> {
    ScriptedStep::new(base, Script::Fail(message.to_string())).boxed()
}
