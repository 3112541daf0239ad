//! Structural index of a step list.

use crate::engine::error::ValidationError;
use crate::steps::step_state::{StepBase, StepKind};
use std::collections::{HashMap, HashSet};

/// Shape of every step name declared in a process.
///
/// Built once per step list; a successfully built catalog guarantees the
/// list is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepCatalog {
    plain: HashSet<String>,
    families: HashMap<String, Vec<String>>,
}

impl StepCatalog {
    /// Index and validate a step list.
    ///
    /// Kind conflicts and unknown dependencies are checked per step in
    /// declaration order, then duplicate plain names, then duplicate item
    /// identifiers.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn build<'a, I>(steps: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = &'a StepBase>,
    {
        let steps: Vec<&StepBase> = steps.into_iter().collect();
        let mut catalog = Self::default();
        let mut plain_order: Vec<&str> = Vec::new();
        let mut family_order: Vec<&str> = Vec::new();

        for step in &steps {
            match step.kind() {
                StepKind::Plain => {
                    if catalog.plain.insert(step.name().to_string()) {
                        plain_order.push(step.name());
                    }
                }
                StepKind::ArrayItem(id) => {
                    let items = catalog.families.entry(step.name().to_string()).or_insert_with(|| {
                        family_order.push(step.name());
                        Vec::new()
                    });
                    items.push(id.clone());
                }
            }
        }

        for step in &steps {
            if catalog.plain.contains(step.name()) && catalog.families.contains_key(step.name()) {
                return Err(ValidationError::MixedStepKind {
                    step: step.name().to_string(),
                });
            }
            for dependency in step.dependencies() {
                if !catalog.contains(dependency.step_name()) {
                    return Err(ValidationError::UnknownDependency {
                        step: step.name().to_string(),
                        dependency: dependency.step_name().to_string(),
                    });
                }
            }
        }

        for name in plain_order {
            let count = steps
                .iter()
                .filter(|step| !step.is_array_item() && step.name() == name)
                .count();
            if count > 1 {
                return Err(ValidationError::DuplicateStep {
                    step: name.to_string(),
                });
            }
        }

        for name in family_order {
            let items = catalog.families.get(name).map(Vec::as_slice).unwrap_or_default();
            let unique: HashSet<&String> = items.iter().collect();
            if unique.len() != items.len() {
                return Err(ValidationError::DuplicateItemIdentifier {
                    step: name.to_string(),
                });
            }
        }

        Ok(catalog)
    }

    /// True when `name` is declared, as a plain step or an array family.
    pub fn contains(&self, name: &str) -> bool {
        self.plain.contains(name) || self.families.contains_key(name)
    }

    pub fn is_array_family(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    /// Item identifiers of an array family, in declaration order.
    pub fn family_items(&self, name: &str) -> Option<&[String]> {
        self.families.get(name).map(Vec::as_slice)
    }
}
