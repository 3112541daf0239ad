//! In-memory state provider.

use crate::state::provider::{ProviderResult, StateKey, StateProvider};
use async_trait::async_trait;
use seq_protocol::record_models::StepStateRecord;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local provider backed by a shared map.
///
/// Clones share the same storage, so several `Process` instances (or a test
/// and the process under test) can observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateProvider {
    records: Arc<RwLock<HashMap<StateKey, StepStateRecord>>>,
}

impl InMemoryStateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record directly, bypassing the trait.
    pub async fn seed(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
        record: StepStateRecord,
    ) {
        let key = StateKey::new(process_name, step_name, item_identifier);
        self.records.write().await.insert(key, record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All stored records, sorted by key.
    pub async fn snapshot(&self) -> Vec<(StateKey, StepStateRecord)> {
        let records = self.records.read().await;
        let mut entries: Vec<_> = records
            .iter()
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

#[async_trait]
impl StateProvider for InMemoryStateProvider {
    async fn get_step_state(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
    ) -> ProviderResult<Option<StepStateRecord>> {
        let key = StateKey::new(process_name, step_name, item_identifier);
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn set_step_state(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
        record: &StepStateRecord,
    ) -> ProviderResult<()> {
        debug!(process_name, step_name, ?item_identifier, "storing step state");
        let key = StateKey::new(process_name, step_name, item_identifier);
        self.records.write().await.insert(key, record.clone());
        Ok(())
    }
}
