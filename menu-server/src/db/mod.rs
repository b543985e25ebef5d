//! Database Module
//!
//! Opens the embedded redb catalog store

pub mod repository;

use crate::utils::AppError;
use repository::RedbCatalogStore;
use std::path::Path;

/// Marker accepted in `DATABASE_FILE` for a non-persistent store
pub const IN_MEMORY: &str = ":memory:";

/// Database service, owns the catalog store handle
#[derive(Clone, Debug)]
pub struct DbService {
    pub store: RedbCatalogStore,
}

impl DbService {
    /// Open the catalog database at `db_path` (or in memory for `:memory:`)
    pub fn new(db_path: &str) -> Result<Self, AppError> {
        let store = if db_path == IN_MEMORY {
            tracing::warn!("Catalog store is in memory, data will not survive a restart");
            RedbCatalogStore::open_in_memory()
        } else {
            if let Some(parent) = Path::new(db_path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::database(format!("Failed to create database directory: {e}"))
                })?;
            }
            RedbCatalogStore::open(db_path)
        }
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!(path = %db_path, "Catalog database opened (redb)");
        Ok(Self { store })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        assert!(DbService::new(IN_MEMORY).is_ok());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.redb");
        DbService::new(path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }
}
