//! Edit sessions
//!
//! An [`EditSession`] lives from "administrator opened the inventory view" to
//! "view closed". It owns one [`ChangeTracker`] and a cached copy of both
//! partitions; reads recompute the view from that cache, mutations patch it.
//!
//! [`SessionRegistry`] keeps open sessions addressable by id for the HTTP
//! layer and drops sessions left idle. Sessions are not synchronized with
//! each other.

use super::error::{CatalogError, CatalogResult};
use super::publish::{PublishGuard, reload};
use super::tracker::ChangeTracker;
use super::view::{self, CatalogRows, ItemChange};
use crate::db::repository::CatalogRecordStore;
use crate::utils::validation;
use dashmap::DashMap;
use shared::models::{
    CatalogItem, CatalogItemCreate, CatalogItemUpdate, DraftStatus, DraftViewItem, Partition,
    PublishReport,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;

pub struct EditSession {
    id: String,
    store: Arc<dyn CatalogRecordStore>,
    tracker: ChangeTracker,
    rows: CatalogRows,
    opened_at: i64,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("id", &self.id)
            .field("tracker", &self.tracker)
            .field("live_rows", &self.rows.live.len())
            .field("draft_rows", &self.rows.draft.len())
            .finish_non_exhaustive()
    }
}

impl EditSession {
    /// Open a session and load both partitions
    pub async fn open(id: impl Into<String>, store: Arc<dyn CatalogRecordStore>) -> CatalogResult<Self> {
        let rows = reload(store.as_ref()).await?;
        Ok(Self {
            id: id.into(),
            store,
            tracker: ChangeTracker::new(),
            rows,
            opened_at: shared::util::now_millis(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn opened_at(&self) -> i64 {
        self.opened_at
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn rows(&self) -> &CatalogRows {
        &self.rows
    }

    /// Reload both partitions from the store
    pub async fn refresh(&mut self) -> CatalogResult<()> {
        self.rows = reload(self.store.as_ref()).await?;
        Ok(())
    }

    // ========== Reads ==========

    pub fn draft_view(&self) -> Vec<DraftViewItem> {
        view::compute_draft_view(
            &self.rows.live,
            &self.rows.draft,
            self.tracker.pending_deletions(),
            self.tracker.draft_to_live(),
        )
    }

    pub fn has_unpublished_changes(&self) -> bool {
        let catalog = view::draft_catalog(&self.rows.live, &self.rows.draft, self.tracker.draft_to_live());
        view::compute_has_unpublished_changes(&self.rows.live, &catalog)
            || !self.tracker.pending_deletions().is_empty()
    }

    pub fn status(&self) -> DraftStatus {
        DraftStatus {
            has_unpublished_changes: self.has_unpublished_changes(),
            pending_deletions: self.tracker.pending_deletions().len(),
            pending_copies: self.tracker.draft_to_live().len(),
            draft_rows: self.rows.draft.len(),
            live_rows: self.rows.live.len(),
        }
    }

    pub fn changes(&self) -> Vec<ItemChange> {
        view::summarize_changes(
            &self.rows.live,
            &self.rows.draft,
            self.tracker.pending_deletions(),
            self.tracker.draft_to_live(),
        )
    }

    // ========== Mutations ==========

    /// Create a new draft-only item
    pub async fn stage_new(&mut self, data: CatalogItemCreate) -> CatalogResult<CatalogItem> {
        validation::validate_create(&data)?;

        let item = self.store.create_item(data, Partition::Draft).await?;
        tracing::info!(session_id = %self.id, item_id = %item.id, "Staged new item");
        self.rows.upsert_draft(item.clone());
        Ok(item)
    }

    /// Apply `changes` to the draft row of `id`, creating a copy for live-only items
    ///
    /// `id` may be a draft row id or a live row id.
    pub async fn stage_edit(
        &mut self,
        id: &str,
        changes: CatalogItemUpdate,
    ) -> CatalogResult<CatalogItem> {
        validation::validate_update(&changes)?;

        let target = self.resolve_draft_for_edit(id).await?;
        let updated = self
            .store
            .update_item(&target, changes)
            .await
            .map_err(|e| CatalogError::from_store(e, &target))?;

        self.tracker.note_edited(&target);
        tracing::info!(session_id = %self.id, item_id = %target, "Staged edit");
        self.rows.upsert_draft(updated.clone());
        Ok(updated)
    }

    /// Flip availability of the product shown as `id`
    pub async fn toggle_stock(&mut self, id: &str) -> CatalogResult<CatalogItem> {
        let current = self
            .rows
            .find_draft(id)
            .or_else(|| self.tracker.draft_counterpart(&self.rows, id))
            .or_else(|| self.rows.find_live(id))
            .map(|item| item.in_stock)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        self.stage_edit(
            id,
            CatalogItemUpdate {
                in_stock: Some(!current),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn mark_for_deletion(&mut self, id: &str) -> CatalogResult<String> {
        let pending = self
            .tracker
            .mark_for_deletion(self.store.as_ref(), &mut self.rows, id)
            .await?;
        tracing::info!(session_id = %self.id, item_id = %pending, "Marked for deletion");
        Ok(pending)
    }

    pub async fn cancel_deletion(&mut self, id: &str) -> CatalogResult<()> {
        self.tracker
            .cancel_deletion(self.store.as_ref(), &mut self.rows, id)
            .await?;
        tracing::info!(session_id = %self.id, item_id = %id, "Deletion cancelled");
        Ok(())
    }

    /// Publish this session's changes; the caller holds the publish latch
    pub async fn publish(&mut self, guard: &PublishGuard) -> CatalogResult<PublishReport> {
        // fresh draft set; an error here aborts before anything is touched
        self.refresh().await?;

        let outcome = guard
            .run(self.store.as_ref(), &self.rows.draft, &mut self.tracker)
            .await;

        match outcome.rows {
            Some(rows) => self.rows = rows,
            None => {
                if let Err(e) = self.refresh().await {
                    tracing::warn!(session_id = %self.id, error = %e, "Rows stale after publish");
                }
            }
        }
        Ok(outcome.report)
    }

    async fn resolve_draft_for_edit(&mut self, id: &str) -> CatalogResult<String> {
        if self.rows.find_draft(id).is_some() {
            return Ok(id.to_string());
        }
        let live = self
            .rows
            .find_live(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        let copy = self
            .tracker
            .record_copy_for_edit(self.store.as_ref(), &mut self.rows, &live)
            .await?;
        Ok(copy.id)
    }
}

/// Publish `session` on a task of its own and wait for the report
///
/// Dropping the returned future (request timeout, client gone) does not stop
/// the pass: the task keeps the session and the latch until reload and
/// tracker reset are done.
pub async fn publish_to_completion(
    session: Arc<Mutex<EditSession>>,
    guard: PublishGuard,
) -> CatalogResult<PublishReport> {
    let task = tokio::spawn(async move {
        let mut session = session.lock().await;
        let result = session.publish(&guard).await;
        drop(guard);
        result
    });
    task.await
        .map_err(|e| CatalogError::Internal(format!("publish task failed: {e}")))?
}

struct SessionEntry {
    session: Arc<Mutex<EditSession>>,
    last_used: AtomicI64,
}

impl SessionEntry {
    fn new(session: EditSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_used: AtomicI64::new(shared::util::now_millis()),
        }
    }
}

/// Open edit sessions by id
pub struct SessionRegistry {
    store: Arc<dyn CatalogRecordStore>,
    sessions: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn CatalogRecordStore>) -> Self {
        Self {
            store,
            sessions: DashMap::new(),
        }
    }

    /// Open a new session; returns its id
    pub async fn open(&self) -> CatalogResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = EditSession::open(id.clone(), self.store.clone()).await?;
        self.sessions.insert(id.clone(), SessionEntry::new(session));
        tracing::info!(session_id = %id, open_sessions = self.sessions.len(), "Edit session opened");
        Ok(id)
    }

    /// Look up a session and mark it as used
    pub fn get(&self, id: &str) -> CatalogResult<Arc<Mutex<EditSession>>> {
        let entry = self
            .sessions
            .get(id)
            .ok_or_else(|| CatalogError::SessionNotFound(id.to_string()))?;
        entry
            .last_used
            .store(shared::util::now_millis(), Ordering::Relaxed);
        Ok(entry.session.clone())
    }

    /// Drop a session; unpublished tracker state is discarded (draft rows stay in the store)
    pub fn close(&self, id: &str) -> CatalogResult<()> {
        if self.sessions.remove(id).is_none() {
            return Err(CatalogError::SessionNotFound(id.to_string()));
        }
        tracing::info!(session_id = %id, "Edit session closed");
        Ok(())
    }

    /// Drop sessions unused for longer than `max_idle_ms`; returns how many
    pub fn sweep_idle(&self, max_idle_ms: i64) -> usize {
        self.sweep_idle_at(shared::util::now_millis(), max_idle_ms)
    }

    /// Sessions busy with a request (including a running publish) are kept.
    fn sweep_idle_at(&self, now: i64, max_idle_ms: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            let idle = now - entry.last_used.load(Ordering::Relaxed) > max_idle_ms;
            if idle && entry.session.try_lock().is_ok() {
                tracing::info!(session_id = %id, "Edit session expired");
                return false;
            }
            true
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}
