//! Repository Module
//!
//! The catalog store is an external collaborator of the reconciliation
//! engine: the engine only talks to it through [`CatalogRecordStore`].
//! [`RedbCatalogStore`] is the embedded implementation the server ships with.

pub mod catalog_item;

// Re-exports
pub use catalog_item::RedbCatalogStore;

use async_trait::async_trait;
use shared::models::{CatalogItem, CatalogItemCreate, CatalogItemUpdate, Partition};
use std::collections::HashSet;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl RepoError {
    /// Whether retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound(_))
    }
}

impl From<redb::DatabaseError> for RepoError {
    fn from(err: redb::DatabaseError) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for RepoError {
    fn from(err: redb::TransactionError) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<redb::TableError> for RepoError {
    fn from(err: redb::TableError) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<redb::StorageError> for RepoError {
    fn from(err: redb::StorageError) -> Self {
        match err {
            // disk or handle trouble, worth retrying
            redb::StorageError::Io(e) => RepoError::Unavailable(e.to_string()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<redb::CommitError> for RepoError {
    fn from(err: redb::CommitError) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Durable storage of catalog rows, each tagged draft or live
#[async_trait]
pub trait CatalogRecordStore: Send + Sync {
    /// All rows of one partition, oldest first
    async fn list_items(&self, partition: Partition) -> RepoResult<Vec<CatalogItem>>;

    /// A single row by id, in either partition
    async fn get_item(&self, id: &str) -> RepoResult<Option<CatalogItem>>;

    /// Insert a new row; the store assigns a fresh id
    async fn create_item(
        &self,
        data: CatalogItemCreate,
        partition: Partition,
    ) -> RepoResult<CatalogItem>;

    /// Merge `data` into an existing row. `RepoError::NotFound` if absent.
    async fn update_item(&self, id: &str, data: CatalogItemUpdate) -> RepoResult<CatalogItem>;

    /// Permanently delete a row. `RepoError::NotFound` if absent.
    async fn delete_item(&self, id: &str) -> RepoResult<()>;

    /// Move every listed row into `partition` in one operation; returns how
    /// many of the ids were found
    async fn set_partition_bulk(&self, ids: &[String], partition: Partition) -> RepoResult<usize>;
}

/// Read-only source of the per-user specialized drink list
#[async_trait]
pub trait AssignmentSource: Send + Sync {
    /// Ids of `specific_users` items assigned to `user_id`
    async fn assigned_item_ids(&self, user_id: &str) -> RepoResult<HashSet<String>>;
}
