//! Dependency resolution against persisted state.

use crate::engine::catalog::StepCatalog;
use crate::engine::error::DependencyError;
use crate::state::provider::StateProvider;
use crate::steps::step_state::DependencyStates;
use seq_protocol::record_models::{ResolvedState, StepStateRecord};
use seq_protocol::step_models::DependencyRef;
use tracing::debug;

/// Fetch the state of every declared dependency from the provider.
///
/// - a plain step resolves to its single record;
/// - an item reference resolves to that instance's record;
/// - a family name resolves to every declared instance, in order.
///
/// Each fetched record must exist and be succeeded or skipped. The result is
/// keyed by dependency step name and keeps the order of `depends_on`.
///
/// # Errors
///
/// Returns a [`DependencyError`] naming the first unsatisfied dependency, or
/// wrapping a provider failure.
pub async fn resolve_dependencies(
    provider: &dyn StateProvider,
    process_name: &str,
    catalog: &StepCatalog,
    depends_on: &[DependencyRef],
) -> Result<DependencyStates, DependencyError> {
    let mut resolved = DependencyStates::with_capacity(depends_on.len());

    for dependency in depends_on {
        let step_name = dependency.step_name();
        debug!(process_name, %dependency, "resolving dependency");

        let state = match (catalog.family_items(step_name), dependency.item_identifier()) {
            (Some(_), Some(item_identifier)) => {
                let record = provider
                    .get_step_state(process_name, step_name, Some(item_identifier))
                    .await?;
                match satisfied(record) {
                    Some(record) => ResolvedState::Single(record),
                    None => {
                        return Err(DependencyError::UnsatisfiedItem {
                            step: step_name.to_string(),
                            item_identifier: item_identifier.to_string(),
                        })
                    }
                }
            }
            (Some(items), None) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    let record = provider
                        .get_step_state(process_name, step_name, Some(item))
                        .await?;
                    match record {
                        Some(record) if record.is_satisfied() => records.push(record),
                        Some(record) => {
                            return Err(DependencyError::UnsatisfiedFamilyItem {
                                step: step_name.to_string(),
                                item_identifier: record.item_identifier,
                            })
                        }
                        None => {
                            return Err(DependencyError::UnsatisfiedFamilyItem {
                                step: step_name.to_string(),
                                item_identifier: None,
                            })
                        }
                    }
                }
                ResolvedState::Items(records)
            }
            (None, _) => {
                let record = provider.get_step_state(process_name, step_name, None).await?;
                match satisfied(record) {
                    Some(record) => ResolvedState::Single(record),
                    None => {
                        return Err(DependencyError::Unsatisfied {
                            step: step_name.to_string(),
                        })
                    }
                }
            }
        };

        resolved.insert(step_name.to_string(), state);
    }

    Ok(resolved)
}

fn satisfied(record: Option<StepStateRecord>) -> Option<StepStateRecord> {
    record.filter(StepStateRecord::is_satisfied)
}
