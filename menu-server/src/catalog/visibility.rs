//! Customer-facing catalog
//!
//! `all_users` items are visible to everyone; `specific_users` items only to
//! customers on the item's assignment list. Draft rows are never visible.

use super::error::CatalogResult;
use crate::db::repository::{AssignmentSource, CatalogRecordStore};
use shared::models::{AssignmentType, CatalogItem, Partition};
use std::collections::HashSet;

/// Filter live rows down to what one customer may order
pub fn visible_items(live: &[CatalogItem], assigned_ids: &HashSet<String>) -> Vec<CatalogItem> {
    live.iter()
        .filter(|item| item.is_live())
        .filter(|item| match item.assignment_type {
            AssignmentType::AllUsers => true,
            AssignmentType::SpecificUsers => assigned_ids.contains(&item.id),
        })
        .cloned()
        .collect()
}

/// Live catalog for `user_id`; anonymous callers only see `all_users` items
pub async fn customer_catalog(
    store: &dyn CatalogRecordStore,
    assignments: &dyn AssignmentSource,
    user_id: Option<&str>,
) -> CatalogResult<Vec<CatalogItem>> {
    let live = store.list_items(Partition::Live).await?;
    let assigned = match user_id {
        Some(user_id) => assignments.assigned_item_ids(user_id).await?,
        None => HashSet::new(),
    };
    Ok(visible_items(&live, &assigned))
}
