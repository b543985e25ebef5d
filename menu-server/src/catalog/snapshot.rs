//! 商品快照与字段差异
//!
//! 变更检测只比较业务字段：`id`、`created_at`、`partition` 不参与比较。
//! 字符串去除首尾空白，Decimal 归一化（`5` / `"5"` / `"5.0"` 视为相同），
//! 布尔值在反序列化时已统一。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::{AssignmentType, CatalogItem, Category};

/// Normalized comparable view of a catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSnapshot {
    pub name: String,
    pub description: String,
    pub size: String,
    pub abv: Decimal,
    pub price: Decimal,
    pub image: String,
    pub category: Category,
    pub in_stock: bool,
    pub assignment_type: AssignmentType,
}

impl ItemSnapshot {
    pub fn of(item: &CatalogItem) -> Self {
        Self {
            name: item.name.trim().to_string(),
            description: item.description.trim().to_string(),
            size: item.size.trim().to_string(),
            abv: item.abv.normalize(),
            price: item.price.normalize(),
            image: item.image.trim().to_string(),
            category: item.category,
            in_stock: item.in_stock,
            assignment_type: item.assignment_type,
        }
    }

    /// Field name → JSON value, in declaration order
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::from(self.name.as_str())),
            ("description", Value::from(self.description.as_str())),
            ("size", Value::from(self.size.as_str())),
            ("abv", Value::from(self.abv.to_string())),
            ("price", Value::from(self.price.to_string())),
            ("image", Value::from(self.image.as_str())),
            ("category", enum_value(&self.category)),
            ("in_stock", Value::from(self.in_stock)),
            ("assignment_type", enum_value(&self.assignment_type)),
        ]
    }
}

fn enum_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// 字段变更记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// 字段名
    pub field: String,
    /// 变更前的值
    pub from: Value,
    /// 变更后的值
    pub to: Value,
}

/// Whether two rows carry the same business content
pub fn same_content(a: &CatalogItem, b: &CatalogItem) -> bool {
    ItemSnapshot::of(a) == ItemSnapshot::of(b)
}

/// Field-level changes going from `from` to `to`; empty when equal after normalization
pub fn diff_items(from: &CatalogItem, to: &CatalogItem) -> Vec<FieldChange> {
    let before = ItemSnapshot::of(from).fields();
    let after = ItemSnapshot::of(to).fields();

    before
        .into_iter()
        .zip(after)
        .filter(|((_, a), (_, b))| a != b)
        .map(|((field, a), (_, b))| FieldChange {
            field: field.to_string(),
            from: a,
            to: b,
        })
        .collect()
}
