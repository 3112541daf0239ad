//! Test fixtures for creating step lists, providers and sample configuration.

use async_trait::async_trait;
use seq_core::state::ProviderResult;
use seq_core::steps::StepBase;
use seq_core::{InMemoryStateProvider, ProviderError, StateProvider};
use seq_protocol::record_models::StepStateRecord;
use std::sync::Arc;
use tempfile::TempDir;

/// A plain step base.
#[allow(dead_code)]
pub fn plain(name: &str) -> StepBase {
    StepBase::new(name)
}

/// An array-step base; panics on an empty identifier.
#[allow(dead_code)]
pub fn item(name: &str, item_identifier: &str) -> StepBase {
    StepBase::array_item(name, item_identifier).expect("item identifier must not be empty")
}

/// A fresh in-memory store together with the trait object handed to a
/// process. Both share the same storage.
#[allow(dead_code)]
pub fn shared_store() -> (InMemoryStateProvider, Arc<dyn StateProvider>) {
    let store = InMemoryStateProvider::new();
    let provider: Arc<dyn StateProvider> = Arc::new(store.clone());
    (store, provider)
}

/// A provider backed by an in-memory store that refuses to write error
/// records, like a backend going away right after a step failed.
#[allow(dead_code)]
pub struct RejectingErrorsProvider {
    pub store: InMemoryStateProvider,
}

#[async_trait]
impl StateProvider for RejectingErrorsProvider {
    async fn get_step_state(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
    ) -> ProviderResult<Option<StepStateRecord>> {
        self.store.get_step_state(process_name, step_name, item_identifier).await
    }

    async fn set_step_state(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
        record: &StepStateRecord,
    ) -> ProviderResult<()> {
        if record.error {
            return Err(ProviderError::Backend("state store unavailable".to_string()));
        }
        self.store
            .set_step_state(process_name, step_name, item_identifier, record)
            .await
    }
}

/// Create a temporary project directory with `.sequencer` configuration.
///
/// The `onboarding` process declares a plain step, an array family of three
/// items depending on it and a final step depending on the whole family.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();

    std::fs::create_dir_all(root.join(".sequencer/processes"))?;

    let process_yaml = r#"
name: onboarding
input:
  customer: "ACME"
steps:
  - name: "create-account"
    state:
      plan: "gold"
  - name: "import-record"
    items: [1, 2, 3]
    depends-on: ["create-account"]
  - name: "notify"
    depends-on:
      - "import-record"
      - step-name: "import-record"
        item-identifier: "2"
"#;
    std::fs::write(root.join(".sequencer/processes/onboarding.yaml"), process_yaml)?;
    std::fs::write(
        root.join(".sequencer/config.toml"),
        "state_file = \".sequencer/state.json\"\n",
    )?;

    Ok(temp_dir)
}
