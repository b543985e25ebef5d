//! Publish coordinator
//!
//! Folds draft + live + tracker state back into a live-only catalog.
//!
//! # Steps
//!
//! 1. Delete every pending-deletion row
//! 2. Delete every live row superseded by a mapped draft copy
//! 3. Promote the remaining draft rows with one bulk partition flip
//! 4. Reload both partitions
//! 5. Reset the tracker, keeping entries that failed transiently
//!
//! Deletions run before promotion so a removed product is never promoted and
//! a superseded live row is gone before its replacement goes live. Per-item
//! calls inside steps 1 and 2 run concurrently; the steps themselves are
//! sequential. Per-item failures are recorded in the report and never abort
//! the pass.
//!
//! Only one publish may run at a time: [`PublishCoordinator::try_begin`]
//! takes a latch that the returned [`PublishGuard`] releases on drop. The
//! guard is owned, so it can travel with a publish moved onto its own task.

use super::error::{CatalogError, CatalogResult};
use super::tracker::ChangeTracker;
use super::view::CatalogRows;
use crate::db::repository::{CatalogRecordStore, RepoError};
use futures::future::join_all;
use shared::models::{CatalogItem, Partition, PublishFailure, PublishReport, PublishStep};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight publish latch, shared by every edit session
#[derive(Debug, Default)]
pub struct PublishCoordinator {
    in_flight: AtomicBool,
}

/// Proof that the latch is held; releases it on drop (every exit path)
#[derive(Debug)]
pub struct PublishGuard {
    coordinator: Arc<PublishCoordinator>,
}

impl Drop for PublishGuard {
    fn drop(&mut self) {
        self.coordinator.in_flight.store(false, Ordering::Release);
    }
}

/// Report plus the reloaded rows (`None` if the reload failed)
#[derive(Debug)]
pub struct PublishOutcome {
    pub report: PublishReport,
    pub rows: Option<CatalogRows>,
}

impl PublishCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_publishing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Take the latch, or `PublishInProgress` if another publish holds it
    pub fn try_begin(self: &Arc<Self>) -> CatalogResult<PublishGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CatalogError::PublishInProgress)?;
        Ok(PublishGuard {
            coordinator: Arc::clone(self),
        })
    }
}

fn failure(id: &str, step: PublishStep, err: &RepoError) -> PublishFailure {
    PublishFailure {
        id: id.to_string(),
        step,
        reason: err.to_string(),
        retryable: err.is_transient(),
    }
}

impl PublishGuard {
    /// Run the publish pass over `draft` (the session's current draft rows)
    pub async fn run(
        &self,
        store: &dyn CatalogRecordStore,
        draft: &[CatalogItem],
        tracker: &mut ChangeTracker,
    ) -> PublishOutcome {
        let mut report = PublishReport::default();
        let mut retry_deletions = HashSet::new();
        let mut retry_supersessions = HashSet::new();

        let mut pending: Vec<String> = tracker.pending_deletions().iter().cloned().collect();
        pending.sort();
        let mut mapping: Vec<(String, String)> = tracker
            .draft_to_live()
            .iter()
            .map(|(d, l)| (d.clone(), l.clone()))
            .collect();
        mapping.sort();

        tracing::info!(
            pending_deletions = pending.len(),
            mapped_copies = mapping.len(),
            draft_rows = draft.len(),
            "Publish started"
        );

        // 1. Pending deletions
        let results = join_all(pending.iter().map(|id| store.delete_item(id))).await;
        for (id, result) in pending.iter().zip(results) {
            match result {
                Ok(()) => report.applied_deletions.push(id.clone()),
                Err(e) => {
                    tracing::warn!(item_id = %id, error = %e, "Publish: delete failed");
                    if e.is_transient() {
                        retry_deletions.insert(id.clone());
                    }
                    report.failures.push(failure(id, PublishStep::Delete, &e));
                }
            }
        }

        // 2. Superseded live rows
        let mut blocked: HashSet<String> = HashSet::new();
        let results = join_all(mapping.iter().map(|(_, live_id)| store.delete_item(live_id))).await;
        for ((draft_id, live_id), result) in mapping.iter().zip(results) {
            match result {
                Ok(()) => report.superseded.push(live_id.clone()),
                Err(e) => {
                    tracing::warn!(item_id = %live_id, draft_id = %draft_id, error = %e, "Publish: supersede failed");
                    if e.is_transient() {
                        // promoting now would leave two live rows for one product
                        blocked.insert(draft_id.clone());
                        retry_supersessions.insert(draft_id.clone());
                    }
                    report.failures.push(failure(live_id, PublishStep::Supersede, &e));
                }
            }
        }

        // 3. Promote
        let pending_set = tracker.pending_deletions();
        let promote: Vec<String> = draft
            .iter()
            .map(|d| d.id.clone())
            .filter(|id| !pending_set.contains(id) && !blocked.contains(id))
            .collect();

        let mut promote_error: Option<RepoError> = None;
        let mut promoted_count = 0usize;
        if !promote.is_empty() {
            match store.set_partition_bulk(&promote, Partition::Live).await {
                Ok(count) => promoted_count = count,
                Err(e) => {
                    tracing::error!(count = promote.len(), error = %e, "Publish: bulk promote failed");
                    promote_error = Some(e);
                }
            }
        }

        // 4. Reload ground truth
        let rows = match reload(store).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::error!(error = %e, "Publish: reload failed");
                None
            }
        };

        match (&promote_error, &rows) {
            (Some(e), _) => {
                for id in &promote {
                    report.failures.push(failure(id, PublishStep::Promote, e));
                }
            }
            (None, Some(rows)) => {
                for id in &promote {
                    if rows.find_live(id).is_some() && rows.find_draft(id).is_none() {
                        report.promoted.push(id.clone());
                    } else {
                        report.failures.push(PublishFailure {
                            id: id.clone(),
                            step: PublishStep::Promote,
                            reason: "row not live after promotion".to_string(),
                            retryable: false,
                        });
                    }
                }
            }
            (None, None) if promoted_count == promote.len() => {
                report.promoted.extend(promote.iter().cloned());
            }
            (None, None) => {
                for id in &promote {
                    report.failures.push(PublishFailure {
                        id: id.clone(),
                        step: PublishStep::Promote,
                        reason: format!(
                            "promotion unverified ({promoted_count} of {} rows found)",
                            promote.len()
                        ),
                        retryable: false,
                    });
                }
            }
        }

        // 5. Reset
        tracker.reset_after_publish(&retry_deletions, &retry_supersessions);

        let summary = report.summary();
        if report.is_clean() {
            tracing::info!(
                deleted = summary.deleted,
                superseded = summary.superseded,
                promoted = summary.promoted,
                "Publish completed"
            );
        } else {
            tracing::warn!(
                deleted = summary.deleted,
                superseded = summary.superseded,
                promoted = summary.promoted,
                failed = summary.failed,
                "Publish completed with failures"
            );
        }

        PublishOutcome { report, rows }
    }
}

/// Load both partitions from the store
pub async fn reload(store: &dyn CatalogRecordStore) -> Result<CatalogRows, RepoError> {
    let live = store.list_items(Partition::Live).await?;
    let draft = store.list_items(Partition::Draft).await?;
    Ok(CatalogRows::new(live, draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RedbCatalogStore;
    use rust_decimal::Decimal;
    use shared::models::{CatalogItemCreate, CatalogItemUpdate};

    fn drink(name: &str, price: i64) -> CatalogItemCreate {
        CatalogItemCreate {
            name: name.into(),
            description: None,
            size: None,
            abv: None,
            price: Decimal::from(price),
            image: None,
            category: None,
            in_stock: Some(true),
            assignment_type: None,
        }
    }

    #[test]
    fn test_latch_single_flight() {
        let coordinator = Arc::new(PublishCoordinator::new());
        let guard = coordinator.try_begin().unwrap();
        assert!(coordinator.is_publishing());
        assert!(matches!(
            coordinator.try_begin(),
            Err(CatalogError::PublishInProgress)
        ));
        drop(guard);
        assert!(!coordinator.is_publishing());
        assert!(coordinator.try_begin().is_ok());
    }

    #[tokio::test]
    async fn test_delete_live_only_item() {
        // Scenario A
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let live = store.create_item(drink("Mojito", 10), Partition::Live).await.unwrap();
        let mut rows = reload(&store).await.unwrap();
        let mut tracker = ChangeTracker::new();
        tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();

        let coordinator = Arc::new(PublishCoordinator::new());
        let guard = coordinator.try_begin().unwrap();
        let outcome = guard.run(&store, &rows.draft, &mut tracker).await;

        assert!(outcome.report.is_clean());
        assert_eq!(outcome.report.applied_deletions.len(), 1);
        assert_eq!(outcome.report.superseded, vec![live.id.clone()]);
        assert!(outcome.report.promoted.is_empty());
        let rows = outcome.rows.unwrap();
        assert!(rows.live.is_empty());
        assert!(rows.draft.is_empty());
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_edit_supersedes_live_row() {
        // Scenario B
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let live = store.create_item(drink("Mojito", 10), Partition::Live).await.unwrap();
        let mut rows = reload(&store).await.unwrap();
        let mut tracker = ChangeTracker::new();
        let copy = tracker
            .record_copy_for_edit(&store, &mut rows, &live)
            .await
            .unwrap();
        let edited = store
            .update_item(
                &copy.id,
                CatalogItemUpdate {
                    price: Some(Decimal::from(12)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        rows.upsert_draft(edited);

        let coordinator = Arc::new(PublishCoordinator::new());
        let guard = coordinator.try_begin().unwrap();
        let outcome = guard.run(&store, &rows.draft, &mut tracker).await;

        assert!(outcome.report.is_clean());
        assert_eq!(outcome.report.promoted, vec![copy.id.clone()]);
        let rows = outcome.rows.unwrap();
        assert_eq!(rows.live.len(), 1);
        assert_eq!(rows.live[0].id, copy.id);
        assert_eq!(rows.live[0].price, Decimal::from(12));
        assert!(store.get_item(&live.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_item_promoted() {
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let draft = store.create_item(drink("Spritz", 9), Partition::Draft).await.unwrap();
        let mut tracker = ChangeTracker::new();

        let coordinator = Arc::new(PublishCoordinator::new());
        let guard = coordinator.try_begin().unwrap();
        let outcome = guard.run(&store, &[draft.clone()], &mut tracker).await;

        assert_eq!(outcome.report.promoted, vec![draft.id.clone()]);
        assert!(store.get_item(&draft.id).await.unwrap().unwrap().is_live());
    }

    #[tokio::test]
    async fn test_missing_pending_row_reported_not_retained() {
        let store = RedbCatalogStore::open_in_memory().unwrap();
        let live = store.create_item(drink("Mojito", 10), Partition::Live).await.unwrap();
        let mut rows = reload(&store).await.unwrap();
        let mut tracker = ChangeTracker::new();
        let draft_id = tracker
            .mark_for_deletion(&store, &mut rows, &live.id)
            .await
            .unwrap();
        // another session removed the copy
        store.delete_item(&draft_id).await.unwrap();

        let coordinator = Arc::new(PublishCoordinator::new());
        let guard = coordinator.try_begin().unwrap();
        let outcome = guard.run(&store, &rows.draft, &mut tracker).await;

        assert_eq!(outcome.report.failures.len(), 1);
        let f = &outcome.report.failures[0];
        assert_eq!(f.id, draft_id);
        assert_eq!(f.step, PublishStep::Delete);
        assert!(!f.retryable);
        // the supersession still ran
        assert_eq!(outcome.report.superseded, vec![live.id]);
        assert!(tracker.is_empty());
    }
}
