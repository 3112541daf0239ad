//! Step declaration models for `.sequencer/processes/*.yaml`.
//!
//! This module defines how steps refer to each other and how a whole process
//! is described in configuration files.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use ts_rs::TS;

/// Reference to one specific instance of an array-step family.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ItemRef {
    /// Name of the array-step family.
    pub step_name: String,

    /// Identifier of the instance within the family.
    pub item_identifier: String,
}

/// A declared dependency of a step.
///
/// The enum uses `#[serde(untagged)]` so declarations can be written either
/// as a bare step name or as a map naming one array item:
///
/// ```yaml
/// depends-on:
///   - "create-account"
///   - step-name: "import-record"
///     item-identifier: "42"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, TS)]
#[serde(untagged)]
pub enum DependencyRef {
    /// Depend on a plain step, or on every instance of an array-step family.
    Step(String),

    /// Depend on one instance of an array-step family.
    Item(ItemRef),
}

impl DependencyRef {
    /// Reference one instance of an array-step family.
    pub fn item(step_name: impl Into<String>, item_identifier: impl ToString) -> Self {
        DependencyRef::Item(ItemRef {
            step_name: step_name.into(),
            item_identifier: item_identifier.to_string(),
        })
    }

    /// Name of the referenced step.
    pub fn step_name(&self) -> &str {
        match self {
            DependencyRef::Step(name) => name,
            DependencyRef::Item(item) => &item.step_name,
        }
    }

    /// Identifier of the referenced item, when one instance is targeted.
    pub fn item_identifier(&self) -> Option<&str> {
        match self {
            DependencyRef::Step(_) => None,
            DependencyRef::Item(item) => Some(&item.item_identifier),
        }
    }
}

impl From<&str> for DependencyRef {
    fn from(name: &str) -> Self {
        DependencyRef::Step(name.to_string())
    }
}

impl From<String> for DependencyRef {
    fn from(name: String) -> Self {
        DependencyRef::Step(name)
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyRef::Step(name) => f.write_str(name),
            DependencyRef::Item(item) => write!(f, "{}[{}]", item.step_name, item.item_identifier),
        }
    }
}

/// Declares one step (or one array-step family) of a process.
///
/// When `items` is non-empty the declaration expands into one array-step
/// instance per identifier; otherwise it is a plain step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct StepDeclaration {
    /// Step name, shared by every instance of an array family.
    pub name: String,

    /// Item identifiers for an array-step family.
    ///
    /// Numbers are accepted and stored as strings.
    #[serde(default, deserialize_with = "stringify_items")]
    pub items: Vec<String>,

    /// Steps that must have succeeded (or been skipped) first.
    #[serde(default)]
    pub depends_on: Vec<DependencyRef>,

    /// Payload stored when the step succeeds.
    #[serde(default)]
    pub state: Option<Value>,

    /// Fail with this message instead of succeeding.
    #[serde(default)]
    pub fail_with: Option<String>,

    /// Mark the step as skipped instead of succeeding.
    #[serde(default)]
    pub skip: bool,

    /// Exclude the step from running.
    #[serde(default)]
    pub disabled: bool,
}

/// Defines a full process: a name, an optional input and its ordered steps.
///
/// # Example
///
/// ```yaml
/// name: onboarding
/// input:
///   customer: "ACME"
/// steps:
///   - name: "create-account"
///   - name: "import-record"
///     items: [1, 2, 3]
///     depends-on: ["create-account"]
///   - name: "notify"
///     depends-on: ["import-record"]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ProcessDefinition {
    /// Unique name identifying the process and its persisted records.
    pub name: String,

    /// Opaque input exposed to every step.
    #[serde(default)]
    pub input: Option<Value>,

    /// Ordered step declarations.
    pub steps: Vec<StepDeclaration>,
}

fn stringify_items<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|value| match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number item identifier, got {other}"
            ))),
        })
        .collect()
}
