pub mod store;
pub mod url;

pub use store::{JsonQueueStore, QueueStore, StoredQueue};
pub use url::{fully_decode, is_possible_playlist, is_valid_url};

use crate::error::{DupesError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Pending => write!(f, "pending"),
            EntryStatus::Running => write!(f, "running"),
            EntryStatus::Succeeded => write!(f, "succeeded"),
            EntryStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub url: String,
    pub status: EntryStatus,
}

impl QueueEntry {
    fn new(url: String) -> Self {
        Self {
            url,
            status: EntryStatus::Pending,
        }
    }

    pub fn is_possible_playlist(&self) -> bool {
        is_possible_playlist(&self.url)
    }
}

/// Result of a successful [`UrlQueue::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedUrl {
    pub url: String,
    pub possible_playlist: bool,
}

/// Ordered list of unique, fully decoded URLs.
#[derive(Debug, Default, Clone)]
pub struct UrlQueue {
    entries: Vec<QueueEntry>,
}

impl UrlQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends a URL. The trimmed input must match the URL
    /// grammar; uniqueness is checked on the decoded form.
    pub fn add(&mut self, raw_url: &str) -> Result<AddedUrl> {
        let trimmed = raw_url.trim();
        if trimmed.is_empty() || !is_valid_url(trimmed) {
            return Err(DupesError::InvalidUrl(trimmed.to_string()));
        }

        let url = fully_decode(trimmed);
        if self.contains(&url) {
            debug!("Ignoring duplicate url '{}'", url);
            return Err(DupesError::DuplicateUrl(url));
        }

        info!("Adding url '{}' to the queue", url);
        self.entries.push(QueueEntry::new(url.clone()));
        Ok(AddedUrl {
            possible_playlist: is_possible_playlist(&url),
            url,
        })
    }

    /// Re-inserts a URL that was already accepted by [`UrlQueue::add`] in an
    /// earlier session. Stored URLs are decoded, so they are not matched
    /// against the URL grammar again; only emptiness and duplicates reject.
    pub fn restore(&mut self, stored_url: &str) -> Result<AddedUrl> {
        let url = fully_decode(stored_url.trim());
        if url.is_empty() {
            return Err(DupesError::InvalidUrl(url));
        }
        if self.contains(&url) {
            return Err(DupesError::DuplicateUrl(url));
        }

        debug!("Restoring url '{}'", url);
        self.entries.push(QueueEntry::new(url.clone()));
        Ok(AddedUrl {
            possible_playlist: is_possible_playlist(&url),
            url,
        })
    }

    /// Removes the first entry matching `url`, comparing on the decoded form.
    pub fn remove(&mut self, url: &str) -> bool {
        let url = fully_decode(url.trim());
        match self.entries.iter().position(|entry| entry.url == url) {
            Some(index) => {
                self.entries.remove(index);
                info!("Removed url '{}' from the queue", url);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|entry| entry.url == url)
    }

    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.url.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn set_status(&mut self, url: &str, status: EntryStatus) -> bool {
        match self.entries.iter_mut().find(|entry| entry.url == url) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_all_status(&mut self, status: EntryStatus) {
        for entry in &mut self.entries {
            entry.status = status;
        }
    }

    pub(crate) fn all_have_status(&self, status: EntryStatus) -> bool {
        self.entries.iter().all(|entry| entry.status == status)
    }
}
