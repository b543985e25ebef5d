//! Lenient serde helpers for catalog rows
//!
//! Rows can be written by older admin clients that send numbers as strings
//! (`"10"`, `"5.0"`) and booleans as strings or 0/1. These helpers accept
//! all of those shapes on the way in and always write the canonical form.

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decimal that accepts JSON numbers or numeric strings, serialized as a string
pub mod flexible_decimal {
    use super::*;

    pub fn serialize<S>(value: &Decimal, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&value.normalize().to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

/// `Option<Decimal>` variant of [`flexible_decimal`], for update payloads
pub mod option_flexible_decimal {
    use super::*;

    pub fn serialize<S>(value: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => s.serialize_str(&v.normalize().to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<FlexibleDecimal>::deserialize(deserializer).map(|opt| opt.map(|d| d.0))
    }
}

/// Bool that accepts `true`, `"true"`, `"1"`, `1` and their negatives
pub mod flexible_bool {
    use super::*;

    pub fn serialize<S>(value: &bool, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_bool(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BoolVisitor)
    }
}

/// `Option<bool>` variant of [`flexible_bool`]
pub mod option_flexible_bool {
    use super::*;

    pub fn serialize<S>(value: &Option<bool>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => s.serialize_bool(*v),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<FlexibleBool>::deserialize(deserializer).map(|opt| opt.map(|b| b.0))
    }
}

/// Parse a decimal from loosely formatted text (`" 5 "`, `"5.0"`, `"1e2"`)
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
        .map(|d| d.normalize())
}

/// Parse a bool from loosely formatted text
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}

struct FlexibleDecimal(Decimal);

impl<'de> Deserialize<'de> for FlexibleDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DecimalVisitor).map(FlexibleDecimal)
    }
}

struct FlexibleBool(bool);

impl<'de> Deserialize<'de> for FlexibleBool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BoolVisitor).map(FlexibleBool)
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number or a numeric string")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Decimal::from(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Decimal::from(value))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Decimal::try_from(value)
            .map(|d| d.normalize())
            .map_err(|_| de::Error::custom(format!("invalid decimal: {}", value)))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        parse_decimal(value).ok_or_else(|| de::Error::custom(format!("invalid decimal: {}", value)))
    }
}

struct BoolVisitor;

impl<'de> Visitor<'de> for BoolVisitor {
    type Value = bool;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a bool, 0/1 or \"true\"/\"false\"")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value != 0)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value != 0)
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        parse_bool(value).ok_or_else(|| de::Error::custom(format!("invalid bool: {}", value)))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Row {
        #[serde(with = "flexible_decimal")]
        price: Decimal,
        #[serde(with = "flexible_bool")]
        in_stock: bool,
    }

    #[test]
    fn test_decimal_accepts_numbers_and_strings() {
        let a: Row = serde_json::from_str(r#"{"price": 5, "in_stock": true}"#).unwrap();
        let b: Row = serde_json::from_str(r#"{"price": "5.0", "in_stock": "true"}"#).unwrap();
        let c: Row = serde_json::from_str(r#"{"price": 5.0, "in_stock": 1}"#).unwrap();
        assert_eq!(a.price, b.price);
        assert_eq!(b.price, c.price);
        assert!(a.in_stock && b.in_stock && c.in_stock);
    }

    #[test]
    fn test_decimal_serializes_normalized() {
        let row = Row {
            price: Decimal::new(1250, 2),
            in_stock: false,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["price"], "12.5");
        assert_eq!(json["in_stock"], false);
    }

    #[test]
    fn test_rejects_garbage() {
        let bad: Result<Row, _> = serde_json::from_str(r#"{"price": "ten", "in_stock": true}"#);
        assert!(bad.is_err());
        let bad: Result<Row, _> = serde_json::from_str(r#"{"price": 1, "in_stock": "maybe"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_decimal(" 7 "), Some(Decimal::from(7)));
        assert_eq!(parse_decimal("7.50"), Some(Decimal::new(75, 1)));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("nope"), None);
    }
}
