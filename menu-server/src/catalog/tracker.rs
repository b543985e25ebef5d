//! Change tracker
//!
//! Session-scoped state layered on top of the persisted rows:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `pending_deletions` | current row ids (draft-first) to delete at publish |
//! | `auto_created_for_deletion` | draft copies that exist only to carry a deletion |
//! | `draft_to_live` | draft copy id → live id it supersedes at publish |
//!
//! Every mutator calls the store first and only touches local state once the
//! store call succeeded, so a failed call leaves the tracker unchanged.

use super::error::{CatalogError, CatalogResult};
use super::view::CatalogRows;
use crate::db::repository::CatalogRecordStore;
use shared::models::{CatalogItem, Partition};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    pending_deletions: HashSet<String>,
    auto_created_for_deletion: HashSet<String>,
    draft_to_live: HashMap<String, String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_deletions(&self) -> &HashSet<String> {
        &self.pending_deletions
    }

    pub fn auto_created_for_deletion(&self) -> &HashSet<String> {
        &self.auto_created_for_deletion
    }

    pub fn draft_to_live(&self) -> &HashMap<String, String> {
        &self.draft_to_live
    }

    pub fn is_empty(&self) -> bool {
        self.pending_deletions.is_empty()
            && self.auto_created_for_deletion.is_empty()
            && self.draft_to_live.is_empty()
    }

    /// Draft row standing in for `live_id`: a draft with the same id, or a mapped copy
    pub fn draft_counterpart<'a>(
        &self,
        rows: &'a CatalogRows,
        live_id: &str,
    ) -> Option<&'a CatalogItem> {
        rows.find_draft(live_id).or_else(|| {
            self.draft_to_live
                .iter()
                .filter(|(_, l)| l.as_str() == live_id)
                .find_map(|(d, _)| rows.find_draft(d))
        })
    }

    /// Mark a product for deletion at next publish; returns the pending row id
    ///
    /// A live-only product first gets a draft copy so the deletion shows up
    /// (and can be cancelled) in the draft view. Marking twice is a no-op.
    pub async fn mark_for_deletion(
        &mut self,
        store: &dyn CatalogRecordStore,
        rows: &mut CatalogRows,
        id: &str,
    ) -> CatalogResult<String> {
        if rows.find_draft(id).is_some() {
            self.pending_deletions.insert(id.to_string());
            return Ok(id.to_string());
        }

        let live = rows
            .find_live(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        // carried on the live id after a partially failed publish
        if self.pending_deletions.contains(&live.id) {
            return Ok(live.id);
        }

        if let Some(existing) = self.draft_counterpart(rows, &live.id) {
            let draft_id = existing.id.clone();
            self.pending_deletions.insert(draft_id.clone());
            return Ok(draft_id);
        }

        let copy = store
            .create_item(live.to_create(), Partition::Draft)
            .await
            .map_err(|e| CatalogError::from_store(e, id))?;
        let draft_id = copy.id.clone();

        tracing::debug!(item_id = %live.id, draft_id = %draft_id, "draft copy created for deletion");

        rows.upsert_draft(copy);
        self.draft_to_live.insert(draft_id.clone(), live.id);
        self.auto_created_for_deletion.insert(draft_id.clone());
        self.pending_deletions.insert(draft_id.clone());
        Ok(draft_id)
    }

    /// Cancel a pending deletion by the pending row id or the live id it supersedes
    ///
    /// A copy that was auto-created for the deletion is deleted again, so the
    /// product reverts to live-only. Copies carrying other edits are kept.
    pub async fn cancel_deletion(
        &mut self,
        store: &dyn CatalogRecordStore,
        rows: &mut CatalogRows,
        id: &str,
    ) -> CatalogResult<()> {
        let target = self
            .resolve_pending(id)
            .ok_or_else(|| CatalogError::DeletionNotPending(id.to_string()))?;

        if self.auto_created_for_deletion.contains(&target) {
            match store.delete_item(&target).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    tracing::debug!(item_id = %target, "auto-created copy already gone");
                }
                Err(e) => return Err(CatalogError::Store(e)),
            }
            rows.remove_draft(&target);
            self.auto_created_for_deletion.remove(&target);
            self.draft_to_live.remove(&target);
        }

        self.pending_deletions.remove(&target);
        Ok(())
    }

    fn resolve_pending(&self, id: &str) -> Option<String> {
        if self.pending_deletions.contains(id) {
            return Some(id.to_string());
        }
        self.draft_to_live
            .iter()
            .find(|(d, l)| l.as_str() == id && self.pending_deletions.contains(d.as_str()))
            .map(|(d, _)| d.clone())
    }

    /// Draft row to edit in place of `live_item`, cloned on first use
    ///
    /// A second call before publish reuses the existing copy.
    pub async fn record_copy_for_edit(
        &mut self,
        store: &dyn CatalogRecordStore,
        rows: &mut CatalogRows,
        live_item: &CatalogItem,
    ) -> CatalogResult<CatalogItem> {
        if let Some(existing) = self.draft_counterpart(rows, &live_item.id) {
            return Ok(existing.clone());
        }

        let copy = store
            .create_item(live_item.to_create(), Partition::Draft)
            .await
            .map_err(|e| CatalogError::from_store(e, &live_item.id))?;

        tracing::debug!(item_id = %live_item.id, draft_id = %copy.id, "draft copy created for edit");

        rows.upsert_draft(copy.clone());
        self.draft_to_live
            .insert(copy.id.clone(), live_item.id.clone());
        Ok(copy)
    }

    /// An edited copy is no longer a deletion-only copy
    pub fn note_edited(&mut self, draft_id: &str) {
        self.auto_created_for_deletion.remove(draft_id);
    }

    /// Clear state after publish, keeping entries for ids that should be retried
    ///
    /// `retry_deletions` keeps pending deletions; `retry_supersessions` keeps
    /// mappings whose live row could not be removed. A copy stays marked as
    /// auto-created only while its live row still exists, so cancelling the
    /// deletion later cannot lose the product.
    ///
    /// When a deletion copy is gone but its live row survived, the live id
    /// itself becomes the pending deletion.
    pub fn reset_after_publish(
        &mut self,
        retry_deletions: &HashSet<String>,
        retry_supersessions: &HashSet<String>,
    ) {
        let deleted: HashSet<String> = self
            .pending_deletions
            .iter()
            .filter(|id| !retry_deletions.contains(*id))
            .cloned()
            .collect();
        self.pending_deletions
            .retain(|id| retry_deletions.contains(id));

        let mut orphaned_live = Vec::new();
        self.draft_to_live.retain(|draft_id, live_id| {
            if !retry_supersessions.contains(draft_id) {
                return false;
            }
            if deleted.contains(draft_id) {
                orphaned_live.push(live_id.clone());
                return false;
            }
            true
        });
        for live_id in orphaned_live {
            tracing::debug!(item_id = %live_id, "deletion carried on live row for retry");
            self.pending_deletions.insert(live_id);
        }

        let mapping = &self.draft_to_live;
        self.auto_created_for_deletion
            .retain(|id| retry_deletions.contains(id) && mapping.contains_key(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RedbCatalogStore;
    use rust_decimal::Decimal;
    use shared::models::CatalogItemCreate;

    fn mojito() -> CatalogItemCreate {
        CatalogItemCreate {
            name: "Mojito".into(),
            description: None,
            size: None,
            abv: None,
            price: Decimal::from(10),
            image: None,
            category: None,
            in_stock: Some(true),
            assignment_type: None,
        }
    }

    async fn seeded() -> (RedbCatalogStore, CatalogRows, CatalogItem) {
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let live = store.create_item(mojito(), Partition::Live).await.unwrap();
        let rows = CatalogRows::new(vec![live.clone()], vec![]);
        (store, rows, live)
    }

    #[tokio::test]
    async fn test_mark_live_only_creates_copy() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();

        let draft_id = tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();

        assert_ne!(draft_id, live.id);
        assert!(tracker.pending_deletions().contains(&draft_id));
        assert!(tracker.auto_created_for_deletion().contains(&draft_id));
        assert_eq!(tracker.draft_to_live().get(&draft_id), Some(&live.id));
        assert_eq!(rows.draft.len(), 1);
        assert_eq!(store.list_items(Partition::Draft).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_is_idempotent() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();

        let first = tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();
        let snapshot = tracker.clone();
        let again_by_live = tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();
        let again_by_draft = tracker
            .mark_for_deletion(&store, &mut rows, &first)
            .await
            .unwrap();

        assert_eq!(first, again_by_live);
        assert_eq!(first, again_by_draft);
        assert_eq!(tracker, snapshot);
        assert_eq!(store.list_items(Partition::Draft).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_unknown_id() {
        let (store, mut rows, _) = seeded().await;
        let mut tracker = ChangeTracker::new();
        let err = tracker
            .mark_for_deletion(&store, &mut rows, "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_auto_created_removes_copy() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();
        tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();

        // cancel by the live id
        tracker
            .cancel_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();

        assert!(tracker.is_empty());
        assert!(rows.draft.is_empty());
        assert!(store.list_items(Partition::Draft).await.unwrap().is_empty());
        assert_eq!(store.list_items(Partition::Live).await.unwrap(), vec![live]);
    }

    #[tokio::test]
    async fn test_cancel_keeps_edit_copy() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();

        let copy = tracker
            .record_copy_for_edit(&store, &mut rows, &live)
            .await
            .unwrap();
        let pending = tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();
        assert_eq!(pending, copy.id);
        assert!(!tracker.auto_created_for_deletion().contains(&copy.id));

        tracker
            .cancel_deletion(&store, &mut rows, &copy.id)
            .await
            .unwrap();

        assert!(tracker.pending_deletions().is_empty());
        assert_eq!(tracker.draft_to_live().get(&copy.id), Some(&live.id));
        assert!(store.get_item(&copy.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancel_edited_auto_copy_keeps_it() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();
        let draft_id = tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();

        tracker.note_edited(&draft_id);
        tracker
            .cancel_deletion(&store, &mut rows, &draft_id)
            .await
            .unwrap();

        assert!(store.get_item(&draft_id).await.unwrap().is_some());
        assert_eq!(tracker.draft_to_live().get(&draft_id), Some(&live.id));
    }

    #[tokio::test]
    async fn test_cancel_not_pending() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();
        let err = tracker
            .cancel_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DeletionNotPending(_)));
    }

    #[tokio::test]
    async fn test_cancel_tolerates_missing_copy() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();
        let draft_id = tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();
        store.delete_item(&draft_id).await.unwrap();

        tracker
            .cancel_deletion(&store, &mut rows, &draft_id)
            .await
            .unwrap();
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_copy_for_edit_reused() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();

        let first = tracker
            .record_copy_for_edit(&store, &mut rows, &live)
            .await
            .unwrap();
        let second = tracker
            .record_copy_for_edit(&store, &mut rows, &live)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.name, live.name);
        assert!(first.is_draft());
        assert_eq!(store.list_items(Partition::Draft).await.unwrap().len(), 1);
    }

    #[test]
    fn test_reset_keeps_retry_entries() {
        let mut tracker = ChangeTracker::new();
        tracker.pending_deletions.extend(["a".to_string(), "b".to_string()]);
        tracker.auto_created_for_deletion.insert("a".into());
        tracker.draft_to_live.insert("a".into(), "la".into());
        tracker.draft_to_live.insert("c".into(), "lc".into());
        tracker.draft_to_live.insert("e".into(), "le".into());

        let retry_del: HashSet<String> = ["a".to_string()].into();
        let retry_sup: HashSet<String> = ["a".to_string(), "c".to_string()].into();
        tracker.reset_after_publish(&retry_del, &retry_sup);

        assert_eq!(tracker.pending_deletions().len(), 1);
        assert!(tracker.auto_created_for_deletion().contains("a"));
        assert_eq!(tracker.draft_to_live().len(), 2);
        assert!(!tracker.draft_to_live().contains_key("e"));

        // live row of "a" superseded: the copy is no longer deletion-only
        let retry_sup: HashSet<String> = ["c".to_string()].into();
        tracker.reset_after_publish(&retry_del, &retry_sup);
        assert!(tracker.pending_deletions().contains("a"));
        assert!(tracker.auto_created_for_deletion().is_empty());
        assert_eq!(tracker.draft_to_live().len(), 1);

        tracker.reset_after_publish(&HashSet::new(), &HashSet::new());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_reset_moves_deletion_to_surviving_live_row() {
        let mut tracker = ChangeTracker::new();
        tracker.pending_deletions.insert("d1".into());
        tracker.auto_created_for_deletion.insert("d1".into());
        tracker.draft_to_live.insert("d1".into(), "1".into());

        // copy deleted, live row delete failed transiently
        let retry_sup: HashSet<String> = ["d1".to_string()].into();
        tracker.reset_after_publish(&HashSet::new(), &retry_sup);

        assert!(tracker.pending_deletions().contains("1"));
        assert_eq!(tracker.pending_deletions().len(), 1);
        assert!(tracker.draft_to_live().is_empty());
        assert!(tracker.auto_created_for_deletion().is_empty());

        // a later success clears it
        tracker.reset_after_publish(&HashSet::new(), &HashSet::new());
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_live_id_pending_mark_and_cancel() {
        let (store, mut rows, live) = seeded().await;
        let mut tracker = ChangeTracker::new();
        tracker.pending_deletions.insert(live.id.clone());

        let pending = tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();
        assert_eq!(pending, live.id);
        assert!(rows.draft.is_empty());
        assert!(store.list_items(Partition::Draft).await.unwrap().is_empty());

        tracker
            .cancel_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();
        assert!(tracker.is_empty());
        assert!(store.get_item(&live.id).await.unwrap().is_some());
    }
}
