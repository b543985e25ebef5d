//! Specialized drink assignment Model

use serde::{Deserialize, Serialize};

/// Grants one customer access to a `specific_users` catalog item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrinkAssignment {
    pub user_id: String,
    pub item_id: String,
}
