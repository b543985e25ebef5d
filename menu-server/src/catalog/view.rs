//! Reconciliation view
//!
//! Pure functions over the live rows, draft rows and the tracker's side
//! tables. Nothing here touches the store; the same inputs always give the
//! same output.

use super::snapshot::{FieldChange, diff_items, same_content};
use serde::{Deserialize, Serialize};
use shared::models::{CatalogItem, DraftViewItem};
use std::collections::{HashMap, HashSet};

/// Cached copy of both partitions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRows {
    pub live: Vec<CatalogItem>,
    pub draft: Vec<CatalogItem>,
}

impl CatalogRows {
    pub fn new(live: Vec<CatalogItem>, draft: Vec<CatalogItem>) -> Self {
        Self { live, draft }
    }

    pub fn find_live(&self, id: &str) -> Option<&CatalogItem> {
        self.live.iter().find(|item| item.id == id)
    }

    pub fn find_draft(&self, id: &str) -> Option<&CatalogItem> {
        self.draft.iter().find(|item| item.id == id)
    }

    /// Replace the draft row with the same id, or append it
    pub fn upsert_draft(&mut self, item: CatalogItem) {
        match self.draft.iter_mut().find(|row| row.id == item.id) {
            Some(row) => *row = item,
            None => self.draft.push(item),
        }
    }

    pub fn remove_draft(&mut self, id: &str) -> Option<CatalogItem> {
        let pos = self.draft.iter().position(|row| row.id == id)?;
        Some(self.draft.remove(pos))
    }
}

/// Live ids that are represented by a draft row (same id, or mapped from a present draft row)
fn represented_live_ids<'a>(
    draft: &'a [CatalogItem],
    draft_to_live: &'a HashMap<String, String>,
) -> HashSet<&'a str> {
    let mut ids: HashSet<&str> = draft.iter().map(|d| d.id.as_str()).collect();
    for d in draft {
        if let Some(live_id) = draft_to_live.get(&d.id) {
            ids.insert(live_id.as_str());
        }
    }
    ids
}

/// The list an administrator sees in draft mode
///
/// Draft rows first (input order), then live rows with no draft counterpart.
/// Pending-deletion rows stay visible and carry `pending_delete`.
pub fn compute_draft_view(
    live: &[CatalogItem],
    draft: &[CatalogItem],
    pending_deletions: &HashSet<String>,
    draft_to_live: &HashMap<String, String>,
) -> Vec<DraftViewItem> {
    let live_ids: HashSet<&str> = live.iter().map(|l| l.id.as_str()).collect();
    let represented = represented_live_ids(draft, draft_to_live);

    let mut view = Vec::with_capacity(draft.len() + live.len());

    for d in draft {
        let live_present = live_ids.contains(d.id.as_str())
            || draft_to_live
                .get(&d.id)
                .is_some_and(|live_id| live_ids.contains(live_id.as_str()));
        view.push(DraftViewItem {
            item: d.clone(),
            live_present,
            pending_delete: pending_deletions.contains(&d.id),
        });
    }

    for l in live {
        if represented.contains(l.id.as_str()) {
            continue;
        }
        view.push(DraftViewItem {
            item: l.clone(),
            live_present: true,
            pending_delete: pending_deletions.contains(&l.id),
        });
    }

    view
}

/// Draft rows plus live rows without a draft counterpart
pub fn draft_catalog(
    live: &[CatalogItem],
    draft: &[CatalogItem],
    draft_to_live: &HashMap<String, String>,
) -> Vec<CatalogItem> {
    let represented = represented_live_ids(draft, draft_to_live);
    draft
        .iter()
        .chain(live.iter().filter(|l| !represented.contains(l.id.as_str())))
        .cloned()
        .collect()
}

/// Whether the draft catalog differs from live
///
/// Rows are matched by id. Any id present on only one side, or any shared id
/// whose normalized snapshots differ, counts as a change. Row order is irrelevant.
pub fn compute_has_unpublished_changes(live: &[CatalogItem], draft: &[CatalogItem]) -> bool {
    let live_by_id: HashMap<&str, &CatalogItem> =
        live.iter().map(|l| (l.id.as_str(), l)).collect();
    let draft_by_id: HashMap<&str, &CatalogItem> =
        draft.iter().map(|d| (d.id.as_str(), d)).collect();

    if live_by_id.keys().any(|id| !draft_by_id.contains_key(id)) {
        return true;
    }

    draft_by_id.iter().any(|(id, d)| match live_by_id.get(id) {
        Some(l) => !same_content(l, d),
        None => true,
    })
}

/// Kind of pending change for one product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One product's pending change, as shown before publishing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemChange {
    /// Current row id (draft-first)
    pub id: String,
    /// Live row that publish will replace or remove
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_id: Option<String>,
    pub name: String,
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldChange>,
}

/// Per-product list of what the next publish would do
pub fn summarize_changes(
    live: &[CatalogItem],
    draft: &[CatalogItem],
    pending_deletions: &HashSet<String>,
    draft_to_live: &HashMap<String, String>,
) -> Vec<ItemChange> {
    let live_by_id: HashMap<&str, &CatalogItem> =
        live.iter().map(|l| (l.id.as_str(), l)).collect();
    let represented = represented_live_ids(draft, draft_to_live);

    let mut changes = Vec::new();

    for d in draft {
        let counterpart = live_by_id.get(d.id.as_str()).copied().or_else(|| {
            draft_to_live
                .get(&d.id)
                .and_then(|live_id| live_by_id.get(live_id.as_str()).copied())
        });
        let live_id = counterpart.map(|l| l.id.clone());

        if pending_deletions.contains(&d.id) {
            changes.push(ItemChange {
                id: d.id.clone(),
                live_id,
                name: d.name.clone(),
                kind: ChangeKind::Removed,
                fields: Vec::new(),
            });
            continue;
        }

        match counterpart {
            Some(l) => {
                let fields = diff_items(l, d);
                if !fields.is_empty() {
                    changes.push(ItemChange {
                        id: d.id.clone(),
                        live_id,
                        name: d.name.clone(),
                        kind: ChangeKind::Modified,
                        fields,
                    });
                }
            }
            None => changes.push(ItemChange {
                id: d.id.clone(),
                live_id: None,
                name: d.name.clone(),
                kind: ChangeKind::Added,
                fields: Vec::new(),
            }),
        }
    }

    // Live rows marked directly (no draft copy)
    for l in live {
        if !represented.contains(l.id.as_str()) && pending_deletions.contains(&l.id) {
            changes.push(ItemChange {
                id: l.id.clone(),
                live_id: Some(l.id.clone()),
                name: l.name.clone(),
                kind: ChangeKind::Removed,
                fields: Vec::new(),
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::Partition;

    fn item(id: &str, name: &str, price: i64, partition: Partition) -> CatalogItem {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "price": price,
            "partition": partition,
        }))
        .unwrap()
    }

    fn mapping(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(d, l)| (d.to_string(), l.to_string()))
            .collect()
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_view_draft_first_then_unrepresented_live() {
        let live = vec![
            item("1", "Mojito", 10, Partition::Live),
            item("2", "Lager", 5, Partition::Live),
        ];
        let draft = vec![
            item("d1", "Mojito", 12, Partition::Draft),
            item("n1", "Spritz", 9, Partition::Draft),
        ];
        let view = compute_draft_view(&live, &draft, &HashSet::new(), &mapping(&[("d1", "1")]));

        let ids: Vec<&str> = view.iter().map(|v| v.item.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "n1", "2"]);
        assert!(view[0].live_present);
        assert!(!view[1].live_present);
        assert!(view[2].live_present);
        assert!(view.iter().all(|v| !v.pending_delete));
    }

    #[test]
    fn test_view_pending_copy_appears_once_with_marker() {
        let live = vec![item("1", "Mojito", 10, Partition::Live)];
        let draft = vec![item("d1", "Mojito", 10, Partition::Draft)];
        let view = compute_draft_view(&live, &draft, &set(&["d1"]), &mapping(&[("d1", "1")]));

        assert_eq!(view.len(), 1);
        assert_eq!(view[0].item.id, "d1");
        assert!(view[0].pending_delete);
        assert!(view[0].live_present);
    }

    #[test]
    fn test_view_live_row_pending_without_copy_stays_visible() {
        let live = vec![item("1", "Mojito", 10, Partition::Live)];
        let view = compute_draft_view(&live, &[], &set(&["1"]), &HashMap::new());
        assert_eq!(view.len(), 1);
        assert!(view[0].pending_delete);
    }

    #[test]
    fn test_view_same_id_in_both_partitions_not_duplicated() {
        let live = vec![item("1", "Mojito", 10, Partition::Live)];
        let draft = vec![item("1", "Mojito", 10, Partition::Draft)];
        let view = compute_draft_view(&live, &draft, &HashSet::new(), &HashMap::new());
        assert_eq!(view.len(), 1);
        assert!(view[0].item.is_draft());
        assert!(view[0].live_present);
    }

    #[test]
    fn test_view_mapping_to_missing_draft_keeps_live_row() {
        let live = vec![item("1", "Mojito", 10, Partition::Live)];
        let view = compute_draft_view(&live, &[], &HashSet::new(), &mapping(&[("gone", "1")]));
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].item.id, "1");
    }

    #[test]
    fn test_view_is_idempotent() {
        let live = vec![
            item("1", "Mojito", 10, Partition::Live),
            item("2", "Lager", 5, Partition::Live),
        ];
        let draft = vec![item("d2", "Lager", 6, Partition::Draft)];
        let pending = set(&["1"]);
        let map = mapping(&[("d2", "2")]);

        let first = compute_draft_view(&live, &draft, &pending, &map);
        for _ in 0..5 {
            assert_eq!(compute_draft_view(&live, &draft, &pending, &map), first);
        }
    }

    #[test]
    fn test_no_changes_when_identical() {
        // Scenario C
        let live = vec![item("1", "Mojito", 10, Partition::Live)];
        let draft = vec![item("1", "Mojito", 10, Partition::Draft)];
        assert!(!compute_has_unpublished_changes(&live, &draft));
    }

    #[test]
    fn test_no_changes_with_mixed_types() {
        // Scenario D
        let draft: Vec<CatalogItem> = vec![
            serde_json::from_str(
                r#"{"id":"1","name":"Mojito","price":10,"in_stock":"true","partition":"draft"}"#,
            )
            .unwrap(),
        ];
        let live: Vec<CatalogItem> = vec![
            serde_json::from_str(
                r#"{"id":"1","name":"Mojito","price":"10","in_stock":true,"partition":"live"}"#,
            )
            .unwrap(),
        ];
        assert!(!compute_has_unpublished_changes(&live, &draft));
    }

    #[test]
    fn test_changes_detected() {
        let live = vec![item("1", "Mojito", 10, Partition::Live)];

        // new draft id
        let added = vec![
            item("1", "Mojito", 10, Partition::Draft),
            item("n1", "Spritz", 9, Partition::Draft),
        ];
        assert!(compute_has_unpublished_changes(&live, &added));

        // live id missing from draft
        assert!(compute_has_unpublished_changes(&live, &[]));

        // content differs
        let mut edited = item("1", "Mojito", 10, Partition::Draft);
        edited.price = Decimal::from(12);
        assert!(compute_has_unpublished_changes(&live, &[edited]));
    }

    #[test]
    fn test_changes_independent_of_order() {
        let live = vec![
            item("1", "Mojito", 10, Partition::Live),
            item("2", "Lager", 5, Partition::Live),
        ];
        let draft = vec![
            item("2", "Lager", 5, Partition::Draft),
            item("1", "Mojito", 10, Partition::Draft),
        ];
        assert!(!compute_has_unpublished_changes(&live, &draft));
    }

    #[test]
    fn test_draft_catalog_replaces_represented_live_rows() {
        let live = vec![
            item("1", "Mojito", 10, Partition::Live),
            item("2", "Lager", 5, Partition::Live),
        ];
        let draft = vec![item("d1", "Mojito", 12, Partition::Draft)];
        let catalog = draft_catalog(&live, &draft, &mapping(&[("d1", "1")]));
        let ids: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "2"]);

        // after publish with nothing staged the draft catalog is the live set
        assert!(!compute_has_unpublished_changes(
            &live,
            &draft_catalog(&live, &[], &HashMap::new())
        ));
    }

    #[test]
    fn test_summarize_changes() {
        let live = vec![
            item("1", "Mojito", 10, Partition::Live),
            item("2", "Lager", 5, Partition::Live),
            item("3", "Cola", 3, Partition::Live),
        ];
        let draft = vec![
            item("d1", "Mojito", 12, Partition::Draft),
            item("d2", "Lager", 5, Partition::Draft),
            item("n1", "Spritz", 9, Partition::Draft),
        ];
        let changes = summarize_changes(
            &live,
            &draft,
            &set(&["d2"]),
            &mapping(&[("d1", "1"), ("d2", "2")]),
        );

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].kind, ChangeKind::Modified);
        assert_eq!(changes[0].live_id.as_deref(), Some("1"));
        assert_eq!(changes[0].fields.len(), 1);
        assert_eq!(changes[1].kind, ChangeKind::Removed);
        assert_eq!(changes[1].live_id.as_deref(), Some("2"));
        assert_eq!(changes[2].kind, ChangeKind::Added);
        assert_eq!(changes[2].name, "Spritz");
    }

    #[test]
    fn test_rows_upsert_and_remove() {
        let mut rows = CatalogRows::default();
        rows.upsert_draft(item("d1", "Mojito", 10, Partition::Draft));
        rows.upsert_draft(item("d1", "Mojito", 12, Partition::Draft));
        assert_eq!(rows.draft.len(), 1);
        assert_eq!(rows.find_draft("d1").unwrap().price, Decimal::from(12));
        assert!(rows.remove_draft("d1").is_some());
        assert!(rows.remove_draft("d1").is_none());
    }
}
