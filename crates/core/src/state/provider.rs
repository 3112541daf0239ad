//! Persistence boundary for step outcomes.

use async_trait::async_trait;
use seq_protocol::record_models::StepStateRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a state provider backend.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize step state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("State backend error: {0}")]
    Backend(String),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Key-value store of step outcomes.
///
/// Records are keyed by `(process name, step name, item identifier)`; plain
/// steps use `None` as identifier. Writes replace the previous record for the
/// same key (last write wins).
#[async_trait]
pub trait StateProvider: Send + Sync {
    /// Fetch the record stored under the key, `None` when nothing was written.
    async fn get_step_state(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
    ) -> ProviderResult<Option<StepStateRecord>>;

    /// Store `record` under the key.
    async fn set_step_state(
        &self,
        process_name: &str,
        step_name: &str,
        item_identifier: Option<&str>,
        record: &StepStateRecord,
    ) -> ProviderResult<()>;
}

/// Lookup key shared by the bundled providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    pub process_name: String,
    pub step_name: String,
    pub item_identifier: Option<String>,
}

impl StateKey {
    pub fn new(process_name: &str, step_name: &str, item_identifier: Option<&str>) -> Self {
        Self {
            process_name: process_name.to_string(),
            step_name: step_name.to_string(),
            item_identifier: item_identifier.map(str::to_string),
        }
    }
}
