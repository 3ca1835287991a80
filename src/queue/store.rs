use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage boundary for the queue between application runs.
pub trait QueueStore: Send + Sync {
    /// Previously stored URLs, in queue order. Missing storage yields an empty list.
    fn load(&self) -> Result<Vec<String>>;

    /// Replaces the stored URLs with `urls`.
    fn save(&self, urls: &[String]) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredQueue {
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Keeps the queue in a single JSON document. An empty queue removes the file.
#[derive(Debug, Clone)]
pub struct JsonQueueStore {
    path: PathBuf,
}

impl JsonQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueueStore for JsonQueueStore {
    fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            debug!("No stored queue at {:?}", self.path);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let stored: StoredQueue = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} urls stored at {}",
            stored.urls.len(),
            stored.saved_at
        );
        Ok(stored.urls)
    }

    fn save(&self, urls: &[String]) -> Result<()> {
        if urls.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
                debug!("Removed stored queue at {:?}", self.path);
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredQueue {
            saved_at: Utc::now(),
            urls: urls.to_vec(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        info!("Saved {} urls to {:?}", urls.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonQueueStore::new(dir.path().join("queue.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_keeps_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonQueueStore::new(dir.path().join("nested").join("queue.json"));
        let urls = vec!["https://a.test/2".to_string(), "https://a.test/1".to_string()];

        store.save(&urls).unwrap();
        assert_eq!(store.load().unwrap(), urls);
    }

    #[test]
    fn test_saving_empty_queue_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonQueueStore::new(dir.path().join("queue.json"));

        store.save(&["https://a.test/1".to_string()]).unwrap();
        assert!(store.path().exists());

        store.save(&[]).unwrap();
        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonQueueStore::new(dir.path().join("queue.json"));
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_err());
    }
}
