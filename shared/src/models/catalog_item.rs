//! Catalog Item Model
//!
//! One row of the drinks/food catalog. The same shape is used for draft rows
//! (visible only to administrators while editing) and live rows (visible to
//! ordering customers); [`Partition`] tells them apart.

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which copy of the catalog a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Draft,
    Live,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Draft => "draft",
            Partition::Live => "live",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Menu category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cocktail,
    Beer,
    Wine,
    Spirit,
    SoftDrink,
    Coffee,
    Food,
    #[default]
    Other,
}

/// Who may see and order an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    /// Visible to every customer
    #[default]
    AllUsers,
    /// Visible only to customers on the item's assignment list
    SpecificUsers,
}

/// Catalog item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Ingredients / description text
    #[serde(default)]
    pub description: String,
    /// Unit size, e.g. "330ml"
    #[serde(default)]
    pub size: String,
    /// Alcohol by volume in percent (0-100)
    #[serde(default, with = "serde_helpers::flexible_decimal")]
    pub abv: Decimal,
    #[serde(with = "serde_helpers::flexible_decimal")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_true", with = "serde_helpers::flexible_bool")]
    pub in_stock: bool,
    #[serde(default)]
    pub assignment_type: AssignmentType,
    /// Creation time (epoch millis)
    #[serde(default)]
    pub created_at: i64,
    pub partition: Partition,
}

fn default_true() -> bool {
    true
}

impl CatalogItem {
    pub fn is_draft(&self) -> bool {
        self.partition == Partition::Draft
    }

    pub fn is_live(&self) -> bool {
        self.partition == Partition::Live
    }

    /// Attributes of this row as a create payload (used for copy-on-write clones)
    pub fn to_create(&self) -> CatalogItemCreate {
        CatalogItemCreate {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            size: Some(self.size.clone()),
            abv: Some(self.abv),
            price: self.price,
            image: Some(self.image.clone()),
            category: Some(self.category),
            in_stock: Some(self.in_stock),
            assignment_type: Some(self.assignment_type),
        }
    }
}

/// Create catalog item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItemCreate {
    pub name: String,
    pub description: Option<String>,
    pub size: Option<String>,
    #[serde(default, with = "serde_helpers::option_flexible_decimal")]
    pub abv: Option<Decimal>,
    #[serde(with = "serde_helpers::flexible_decimal")]
    pub price: Decimal,
    pub image: Option<String>,
    pub category: Option<Category>,
    #[serde(default, with = "serde_helpers::option_flexible_bool")]
    pub in_stock: Option<bool>,
    pub assignment_type: Option<AssignmentType>,
}

impl CatalogItemCreate {
    /// Build a full row from this payload; the store supplies id, timestamp and partition
    pub fn into_item(self, id: String, created_at: i64, partition: Partition) -> CatalogItem {
        CatalogItem {
            id,
            name: self.name.trim().to_string(),
            description: self.description.unwrap_or_default(),
            size: self.size.unwrap_or_default(),
            abv: self.abv.unwrap_or_default(),
            price: self.price,
            image: self.image.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            in_stock: self.in_stock.unwrap_or(true),
            assignment_type: self.assignment_type.unwrap_or_default(),
            created_at,
            partition,
        }
    }
}

/// Update catalog item payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    #[serde(default, with = "serde_helpers::option_flexible_decimal")]
    pub abv: Option<Decimal>,
    #[serde(default, with = "serde_helpers::option_flexible_decimal")]
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub category: Option<Category>,
    #[serde(default, with = "serde_helpers::option_flexible_bool")]
    pub in_stock: Option<bool>,
    pub assignment_type: Option<AssignmentType>,
}

impl CatalogItemUpdate {
    /// Whether the payload changes nothing
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge the present fields into `item`
    pub fn apply_to(&self, item: &mut CatalogItem) {
        if let Some(v) = &self.name {
            item.name = v.trim().to_string();
        }
        if let Some(v) = &self.description {
            item.description = v.clone();
        }
        if let Some(v) = &self.size {
            item.size = v.clone();
        }
        if let Some(v) = self.abv {
            item.abv = v;
        }
        if let Some(v) = self.price {
            item.price = v;
        }
        if let Some(v) = &self.image {
            item.image = v.clone();
        }
        if let Some(v) = self.category {
            item.category = v;
        }
        if let Some(v) = self.in_stock {
            item.in_stock = v;
        }
        if let Some(v) = self.assignment_type {
            item.assignment_type = v;
        }
    }
}

/// A row of the administrator's draft view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftViewItem {
    #[serde(flatten)]
    pub item: CatalogItem,
    /// A live row exists for this product
    pub live_present: bool,
    /// The product is marked for deletion at next publish
    pub pending_delete: bool,
}
