//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Stage/edit payloads are checked here before any tracker or store mutation.

use crate::catalog::{CatalogError, CatalogResult};
use rust_decimal::Decimal;
use shared::models::{CatalogItemCreate, CatalogItemUpdate};

// ── Text length limits ──────────────────────────────────────────────

/// Item names
pub const MAX_NAME_LEN: usize = 200;

/// Descriptions / ingredients
pub const MAX_NOTE_LEN: usize = 500;

/// Short text: unit size
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Alcohol by volume upper bound (percent)
pub const MAX_ABV: Decimal = Decimal::ONE_HUNDRED;

// ── Generic helpers ─────────────────────────────────────────────────

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(value: Option<&str>, field: &str, max_len: usize) -> CatalogResult<()> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(CatalogError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> CatalogResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidName("name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CatalogError::InvalidName(format!(
            "name is too long ({} chars, max {MAX_NAME_LEN})",
            trimmed.chars().count()
        )));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> CatalogResult<()> {
    if price <= Decimal::ZERO {
        return Err(CatalogError::InvalidPrice(format!(
            "price must be positive, got {price}"
        )));
    }
    Ok(())
}

fn validate_abv(abv: Decimal) -> CatalogResult<()> {
    if abv < Decimal::ZERO || abv > MAX_ABV {
        return Err(CatalogError::InvalidAbv(format!(
            "abv must be between 0 and 100, got {abv}"
        )));
    }
    Ok(())
}

// ── Catalog payloads ────────────────────────────────────────────────

pub fn validate_create(data: &CatalogItemCreate) -> CatalogResult<()> {
    validate_name(&data.name)?;
    validate_price(data.price)?;
    if let Some(abv) = data.abv {
        validate_abv(abv)?;
    }
    validate_optional_text(data.description.as_deref(), "description", MAX_NOTE_LEN)?;
    validate_optional_text(data.size.as_deref(), "size", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(data.image.as_deref(), "image", MAX_URL_LEN)?;
    Ok(())
}

pub fn validate_update(data: &CatalogItemUpdate) -> CatalogResult<()> {
    if data.is_empty() {
        return Err(CatalogError::Validation("no changes given".into()));
    }
    if let Some(name) = &data.name {
        validate_name(name)?;
    }
    if let Some(price) = data.price {
        validate_price(price)?;
    }
    if let Some(abv) = data.abv {
        validate_abv(abv)?;
    }
    validate_optional_text(data.description.as_deref(), "description", MAX_NOTE_LEN)?;
    validate_optional_text(data.size.as_deref(), "size", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(data.image.as_deref(), "image", MAX_URL_LEN)?;
    Ok(())
}
