//! redb-backed catalog store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `catalog_items` | `item_id` | JSON `CatalogItem` | Draft and live rows (partition is a field) |
//! | `drink_assignments` | `(user_id, item_id)` | `()` | Specialized drink list |
//!
//! redb is synchronous; every call runs its transaction on the blocking pool.
//! Each write commits before returning, so a bulk partition flip is atomic.

use super::{AssignmentSource, CatalogRecordStore, RepoError, RepoResult};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{CatalogItem, CatalogItemCreate, CatalogItemUpdate, DrinkAssignment, Partition};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// key = item_id, value = JSON-serialized CatalogItem
const CATALOG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("catalog_items");

/// key = (user_id, item_id), value = empty (existence check)
const ASSIGNMENTS_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("drink_assignments");

/// Catalog store backed by redb
#[derive(Clone)]
pub struct RedbCatalogStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbCatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbCatalogStore").finish_non_exhaustive()
    }
}

impl RedbCatalogStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and throwaway dev servers)
    pub fn open_in_memory() -> RepoResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> RepoResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CATALOG_TABLE)?;
            let _ = write_txn.open_table(ASSIGNMENTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Run a synchronous redb closure on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> RepoResult<T>
    where
        F: FnOnce(&Database) -> RepoResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| RepoError::Unavailable(format!("store task failed: {e}")))?
    }

    // ========== Assignments ==========

    /// Grant a user access to a specific-users item
    pub async fn assign(&self, assignment: DrinkAssignment) -> RepoResult<()> {
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(ASSIGNMENTS_TABLE)?;
                table.insert((assignment.user_id.as_str(), assignment.item_id.as_str()), ())?;
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }

    /// Revoke a grant; returns whether it existed
    pub async fn unassign(&self, assignment: DrinkAssignment) -> RepoResult<bool> {
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            let existed = {
                let mut table = txn.open_table(ASSIGNMENTS_TABLE)?;
                let removed = table
                    .remove((assignment.user_id.as_str(), assignment.item_id.as_str()))?
                    .is_some();
                removed
            };
            txn.commit()?;
            Ok(existed)
        })
        .await
    }
}

fn read_all(db: &Database) -> RepoResult<Vec<CatalogItem>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(CATALOG_TABLE)?;

    let mut items = Vec::new();
    for result in table.iter()? {
        let (_key, value) = result?;
        let item: CatalogItem = serde_json::from_slice(value.value())?;
        items.push(item);
    }
    Ok(items)
}

#[async_trait]
impl CatalogRecordStore for RedbCatalogStore {
    async fn list_items(&self, partition: Partition) -> RepoResult<Vec<CatalogItem>> {
        self.blocking(move |db| {
            let mut items: Vec<CatalogItem> = read_all(db)?
                .into_iter()
                .filter(|item| item.partition == partition)
                .collect();
            items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
            Ok(items)
        })
        .await
    }

    async fn get_item(&self, id: &str) -> RepoResult<Option<CatalogItem>> {
        let id = id.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(CATALOG_TABLE)?;
            match table.get(id.as_str())? {
                Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn create_item(
        &self,
        data: CatalogItemCreate,
        partition: Partition,
    ) -> RepoResult<CatalogItem> {
        let id = uuid::Uuid::new_v4().to_string();
        let item = data.into_item(id, shared::util::now_millis(), partition);

        let created = self
            .blocking(move |db| {
                let txn = db.begin_write()?;
                {
                    let mut table = txn.open_table(CATALOG_TABLE)?;
                    let value = serde_json::to_vec(&item)?;
                    table.insert(item.id.as_str(), value.as_slice())?;
                }
                txn.commit()?;
                Ok(item)
            })
            .await?;

        tracing::debug!(item_id = %created.id, partition = %partition, "catalog item created");
        Ok(created)
    }

    async fn update_item(&self, id: &str, data: CatalogItemUpdate) -> RepoResult<CatalogItem> {
        let id = id.to_string();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            let item = {
                let mut table = txn.open_table(CATALOG_TABLE)?;
                let mut item: CatalogItem = match table.get(id.as_str())? {
                    Some(value) => serde_json::from_slice(value.value())?,
                    None => return Err(RepoError::NotFound(format!("Catalog item {} not found", id))),
                };
                data.apply_to(&mut item);
                let value = serde_json::to_vec(&item)?;
                table.insert(id.as_str(), value.as_slice())?;
                item
            };
            txn.commit()?;
            Ok(item)
        })
        .await
    }

    async fn delete_item(&self, id: &str) -> RepoResult<()> {
        let id = id.to_string();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            let removed = {
                let mut table = txn.open_table(CATALOG_TABLE)?;
                let removed = table.remove(id.as_str())?.is_some();
                removed
            };
            if !removed {
                return Err(RepoError::NotFound(format!("Catalog item {} not found", id)));
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn set_partition_bulk(&self, ids: &[String], partition: Partition) -> RepoResult<usize> {
        let ids = ids.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            let mut found = 0usize;
            {
                let mut table = txn.open_table(CATALOG_TABLE)?;
                for id in &ids {
                    let existing: Option<CatalogItem> = match table.get(id.as_str())? {
                        Some(value) => Some(serde_json::from_slice(value.value())?),
                        None => None,
                    };
                    let Some(mut item) = existing else {
                        continue;
                    };
                    found += 1;
                    if item.partition != partition {
                        item.partition = partition;
                        let value = serde_json::to_vec(&item)?;
                        table.insert(id.as_str(), value.as_slice())?;
                    }
                }
            }
            txn.commit()?;
            Ok(found)
        })
        .await
    }
}

#[async_trait]
impl AssignmentSource for RedbCatalogStore {
    async fn assigned_item_ids(&self, user_id: &str) -> RepoResult<HashSet<String>> {
        let user_id = user_id.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(ASSIGNMENTS_TABLE)?;

            let mut ids = HashSet::new();
            for result in table.range((user_id.as_str(), "")..)? {
                let (key, _value) = result?;
                let (owner, item_id) = key.value();
                if owner != user_id {
                    break;
                }
                ids.insert(item_id.to_string());
            }
            Ok(ids)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn mojito() -> CatalogItemCreate {
        CatalogItemCreate {
            name: "Mojito".into(),
            description: Some("rum, mint, lime, soda".into()),
            size: Some("300ml".into()),
            abv: Some(Decimal::from(13)),
            price: Decimal::from(10),
            image: None,
            category: None,
            in_stock: Some(true),
            assignment_type: None,
        }
    }

    #[tokio::test]
    async fn test_create_list_by_partition() {
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let live = store.create_item(mojito(), Partition::Live).await.unwrap();
        let draft = store.create_item(mojito(), Partition::Draft).await.unwrap();

        assert_ne!(live.id, draft.id);
        let lives = store.list_items(Partition::Live).await.unwrap();
        let drafts = store.list_items(Partition::Draft).await.unwrap();
        assert_eq!(lives.len(), 1);
        assert_eq!(lives[0].id, live.id);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, draft.id);
    }

    #[tokio::test]
    async fn test_update_and_missing_row() {
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let item = store.create_item(mojito(), Partition::Draft).await.unwrap();

        let updated = store
            .update_item(
                &item.id,
                CatalogItemUpdate {
                    price: Some(Decimal::from(12)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, Decimal::from(12));
        assert_eq!(updated.name, "Mojito");

        let err = store
            .update_item("missing", CatalogItemUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let item = store.create_item(mojito(), Partition::Live).await.unwrap();

        store.delete_item(&item.id).await.unwrap();
        assert!(store.get_item(&item.id).await.unwrap().is_none());
        assert!(store.delete_item(&item.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_set_partition_bulk_counts_found_rows() {
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let a = store.create_item(mojito(), Partition::Draft).await.unwrap();
        let b = store.create_item(mojito(), Partition::Draft).await.unwrap();

        let ids = vec![a.id.clone(), b.id.clone(), "ghost".to_string()];
        let count = store.set_partition_bulk(&ids, Partition::Live).await.unwrap();

        assert_eq!(count, 2);
        assert!(store.list_items(Partition::Draft).await.unwrap().is_empty());
        assert_eq!(store.list_items(Partition::Live).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.redb");

        let id = {
            let store = RedbCatalogStore::open(&path).unwrap();
            store.create_item(mojito(), Partition::Live).await.unwrap().id
        };

        let store = RedbCatalogStore::open(&path).unwrap();
        let item = store.get_item(&id).await.unwrap().unwrap();
        assert_eq!(item.name, "Mojito");
        assert!(item.is_live());
    }

    #[tokio::test]
    async fn test_assignments_scoped_per_user() {
        let store = RedbCatalogStore::open_in_memory().unwrap();
        for (user, item) in [("alice", "i1"), ("alice", "i2"), ("bob", "i3")] {
            store
                .assign(DrinkAssignment {
                    user_id: user.into(),
                    item_id: item.into(),
                })
                .await
                .unwrap();
        }

        let alice = store.assigned_item_ids("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.contains("i1") && alice.contains("i2"));
        assert!(store.assigned_item_ids("carol").await.unwrap().is_empty());

        let removed = store
            .unassign(DrinkAssignment {
                user_id: "bob".into(),
                item_id: "i3".into(),
            })
            .await
            .unwrap();
        assert!(removed);
        assert!(store.assigned_item_ids("bob").await.unwrap().is_empty());
    }
}
