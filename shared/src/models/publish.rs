//! Publish report types

use serde::{Deserialize, Serialize};

/// Which publish step an item failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
    /// Permanent deletion of a pending-deletion row
    Delete,
    /// Removal of a live row replaced by its draft copy
    Supersede,
    /// Draft → live partition flip
    Promote,
}

/// A single item that could not be processed during publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishFailure {
    pub id: String,
    pub step: PublishStep,
    pub reason: String,
    /// Tracker entries for this id were kept so a later publish retries it
    pub retryable: bool,
}

/// Outcome of a publish pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishReport {
    /// Rows permanently deleted (pending deletions)
    pub applied_deletions: Vec<String>,
    /// Live rows removed because a draft copy replaced them
    pub superseded: Vec<String>,
    /// Draft rows now live
    pub promoted: Vec<String>,
    pub failures: Vec<PublishFailure>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Counts shown to the administrator
    pub fn summary(&self) -> PublishSummary {
        PublishSummary {
            deleted: self.applied_deletions.len(),
            superseded: self.superseded.len(),
            promoted: self.promoted.len(),
            failed: self.failures.len(),
        }
    }
}

/// User-visible publish counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSummary {
    pub deleted: usize,
    pub superseded: usize,
    pub promoted: usize,
    pub failed: usize,
}

/// Draft status shown next to the publish button
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftStatus {
    pub has_unpublished_changes: bool,
    pub pending_deletions: usize,
    pub pending_copies: usize,
    pub draft_rows: usize,
    pub live_rows: usize,
}
