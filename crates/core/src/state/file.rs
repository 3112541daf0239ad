//! JSON file state provider.
//!
//! Persists every record into a single JSON document so that a process can
//! be resumed by a later invocation of the binary:
//!
//! ```json
//! [
//!   {
//!     "processName": "onboarding",
//!     "stepName": "import-record",
//!     "itemIdentifier": "2",
//!     "record": { "success": true, "...": "..." },
//!     "lastChangedAt": "2024-05-01T10:00:00Z"
//!   }
//! ]
//! ```

use crate::state::provider::{ProviderError, ProviderResult, StateProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seq_protocol::record_models::StepStateRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// One persisted record with its key and modification time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
    pub process_name: String,
    pub step_name: String,
    #[serde(default)]
    pub item_identifier: Option<String>,
    pub record: StepStateRecord,
    pub last_changed_at: DateTime<Utc>,
}

impl StateEntry {
    fn matches(&self, process_name: &str, step_name: &str, item_identifier: Option<&str>) -> bool {
        self.process_name == process_name
            && self.step_name == step_name
            && self.item_identifier.as_deref() == item_identifier
    }
}

/// Provider that reads and rewrites a JSON document on every call.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// document. Calls through one instance are serialized; separate instances
/// on the same path are last-write-wins.
#[derive(Debug)]
pub struct JsonFileStateProvider {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStateProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored entry, in file order.
    pub async fn entries(&self) -> ProviderResult<Vec<StateEntry>> {
        let _guard = self.lock.lock().await;
        self.read_entries().await
    }

    async fn read_entries(&self) -> ProviderResult<Vec<StateEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ProviderError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| ProviderError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_entries(&self, entries: &[StateEntry]) -> ProviderResult<()> {
        let io_err = |source| ProviderError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await.map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl StateProvider for JsonFileStateProvider {
    async fn get_step_state(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
    ) -> ProviderResult<Option<StepStateRecord>> {
        let _guard = self.lock.lock().await;
        let entries = self.read_entries().await?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.matches(process_name, step_name, item_identifier))
            .map(|entry| entry.record))
    }

    async fn set_step_state(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
        record: &StepStateRecord,
    ) -> ProviderResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        let now = Utc::now();

        match entries
            .iter_mut()
            .find(|entry| entry.matches(process_name, step_name, item_identifier))
        {
            Some(entry) => {
                entry.record = record.clone();
                entry.last_changed_at = now;
            }
            None => entries.push(StateEntry {
                process_name: process_name.to_string(),
                step_name: step_name.to_string(),
                item_identifier: item_identifier.map(str::to_string),
                record: record.clone(),
                last_changed_at: now,
            }),
        }

        debug!(path = %self.path.display(), process_name, step_name, "writing state file");
        self.write_entries(&entries).await
    }
}
