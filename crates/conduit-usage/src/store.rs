use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;
use tokio::sync::Mutex;

use crate::{UsageError, UsageRecord};

/// Append-only sink for usage records
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Persist one record
    async fn append(&self, record: &UsageRecord) -> Result<(), UsageError>;
}

/// In-memory usage log
#[derive(Debug, Default)]
pub struct MemoryUsageStore {
    records: Mutex<Vec<UsageRecord>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything appended so far, oldest first
    pub async fn records(&self) -> Vec<UsageRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn append(&self, record: &UsageRecord) -> Result<(), UsageError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// JSON-lines usage log on disk
///
/// Appends are serialized through a lock so concurrent writers never
/// interleave partial lines.
#[derive(Debug)]
pub struct JsonlUsageStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlUsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UsageStore for JsonlUsageStore {
    async fn append(&self, record: &UsageRecord) -> Result<(), UsageError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use conduit_core::{PowerLevel, RoutingDecision};

    use super::*;
    use crate::Outcome;

    fn record(user_id: &str) -> UsageRecord {
        let decision = RoutingDecision {
            provider_id: "anthropic".to_owned(),
            provider_name: "Anthropic".to_owned(),
            provider_type: "anthropic".to_owned(),
            model_id: "claude-haiku".to_owned(),
            power_level: PowerLevel::Balanced,
            cost_per_k_tokens_in: 0.001,
            cost_per_k_tokens_out: 0.005,
            used_byok: false,
        };
        UsageRecord::new(user_id, &decision, &Outcome::success(100, 50, Duration::from_millis(80)))
    }

    #[tokio::test]
    async fn memory_store_keeps_order() {
        let store = MemoryUsageStore::new();
        store.append(&record("a")).await.unwrap();
        store.append(&record("b")).await.unwrap();

        let users: Vec<_> = store.records().await.into_iter().map(|r| r.user_id).collect();
        assert_eq!(users, ["a", "b"]);
    }

    #[tokio::test]
    async fn jsonl_store_appends_lines_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/usage.jsonl");
        let store = JsonlUsageStore::new(&path);

        store.append(&record("a")).await.unwrap();
        store.append(&record("b")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<UsageRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].user_id, "a");
        assert_eq!(parsed[1].user_id, "b");
    }

    #[tokio::test]
    async fn jsonl_store_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let store = JsonlUsageStore::new(dir.path());

        assert!(matches!(store.append(&record("a")).await, Err(UsageError::Persistence(_))));
    }
}
