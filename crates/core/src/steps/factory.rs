//! Step factory for creating step instances from declarations.

use crate::steps::base::Step;
use crate::steps::declared::{DeclaredOutcome, DeclaredStep};
use crate::steps::step_state::StepBase;
use anyhow::{bail, Result};
use seq_protocol::record_models::StateMap;
use seq_protocol::step_models::{ProcessDefinition, StepDeclaration};
use serde_json::Value;

/// Factory for creating steps from `.sequencer/processes/*.yaml`
/// declarations.
///
/// A declaration with `items` expands into one array-step instance per
/// identifier; any other declaration yields a single plain step.
pub struct StepFactory;

impl StepFactory {
    /// Create the step instances described by one declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `state` is present but not a mapping
    /// - both `skip` and `fail-with` are set
    /// - an item identifier is empty
    pub fn create(declaration: &StepDeclaration) -> Result<Vec<Box<dyn Step>>> {
        let outcome = Self::outcome(declaration)?;

        if declaration.items.is_empty() {
            let base = Self::configure(StepBase::new(declaration.name.clone()), declaration);
            return Ok(vec![Box::new(DeclaredStep::new(base, outcome))]);
        }

        let mut steps: Vec<Box<dyn Step>> = Vec::with_capacity(declaration.items.len());
        for item in &declaration.items {
            let base = StepBase::array_item(declaration.name.clone(), item)
                .map_err(|e| anyhow::anyhow!("Step {}: {}", declaration.name, e))?;
            let base = Self::configure(base, declaration);
            steps.push(Box::new(DeclaredStep::new(base, outcome.clone())));
        }
        Ok(steps)
    }

    /// Create every step of a process definition, in declaration order.
    pub fn build_process_steps(definition: &ProcessDefinition) -> Result<Vec<Box<dyn Step>>> {
        let mut steps = Vec::new();
        for declaration in &definition.steps {
            steps.extend(Self::create(declaration)?);
        }
        Ok(steps)
    }

    fn configure(base: StepBase, declaration: &StepDeclaration) -> StepBase {
        base.depends_on(declaration.depends_on.iter().cloned())
            .with_disabled(declaration.disabled)
    }

    fn outcome(declaration: &StepDeclaration) -> Result<DeclaredOutcome> {
        let state = match &declaration.state {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(StateMap::clone(map)),
            Some(_) => bail!("State of step {} must be a mapping", declaration.name),
        };

        match (&declaration.fail_with, declaration.skip) {
            (Some(_), true) => bail!(
                "Step {} cannot declare both skip and fail-with",
                declaration.name
            ),
            (Some(message), false) => Ok(DeclaredOutcome::Fail(message.clone())),
            (None, true) => Ok(DeclaredOutcome::Skip),
            (None, false) => Ok(DeclaredOutcome::Succeed(state)),
        }
    }
}
