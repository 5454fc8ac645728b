//! MySQL column decoding.
//!
//! Result rows are rendered as JSON objects keyed by column name. Conversion is two-phase:
//! 1. `categorize_type` classifies the column's type name into a `TypeCategory`
//! 2. a per-category decoder extracts the value
//!
//! Values a category decoder cannot read fall back to their raw text representation, so an
//! unusual column type never turns a successful query into an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Json,
    Binary,
    Date,
    Time,
    DateTime,
    Timestamp,
    Text,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.to_ascii_uppercase();

    // Decimal first: "DECIMAL" must not fall into the float checks
    if upper.contains("DECIMAL") || upper.contains("NUMERIC") {
        return TypeCategory::Decimal;
    }

    if upper == "BOOLEAN" || upper == "BOOL" {
        return TypeCategory::Boolean;
    }

    if upper.contains("INT") || upper == "YEAR" {
        return TypeCategory::Integer;
    }

    if upper.contains("FLOAT") || upper.contains("DOUBLE") || upper == "REAL" {
        return TypeCategory::Float;
    }

    match upper.as_str() {
        "JSON" => TypeCategory::Json,
        "DATE" => TypeCategory::Date,
        "TIME" => TypeCategory::Time,
        "DATETIME" => TypeCategory::DateTime,
        "TIMESTAMP" => TypeCategory::Timestamp,
        _ if upper.contains("BLOB") || upper.contains("BINARY") || upper == "BIT" => {
            TypeCategory::Binary
        }
        _ => TypeCategory::Text,
    }
}

/// Raw DECIMAL value, kept as the exact string the server sent.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_ascii_uppercase();
        name.contains("DECIMAL") || name.contains("NUMERIC")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Render binary data as text when it is valid UTF-8, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue>;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), decode_column(self, idx, category))
            })
            .collect()
    }
}

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    if let Ok(None) = row.try_get_unchecked::<Option<&[u8]>, _>(idx) {
        return JsonValue::Null;
    }

    let value = match category {
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Decimal => row
            .try_get::<RawDecimal, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.0)),
        TypeCategory::Boolean => row.try_get::<bool, _>(idx).ok().map(JsonValue::Bool),
        TypeCategory::Json => row.try_get::<JsonValue, _>(idx).ok(),
        TypeCategory::Binary => row
            .try_get::<Vec<u8>, _>(idx)
            .ok()
            .map(|v| decode_binary_value(&v)),
        TypeCategory::Date => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.to_string())),
        TypeCategory::Time => row
            .try_get::<NaiveTime, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.to_string())),
        TypeCategory::DateTime => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        TypeCategory::Timestamp => row
            .try_get::<DateTime<Utc>, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.to_rfc3339())),
        TypeCategory::Text => None,
    };

    value.unwrap_or_else(|| decode_raw(row, idx))
}

fn decode_integer(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    // Narrow column types are only compatible with their exact Rust width
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u32, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u16, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<i8, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    if let Ok(v) = row.try_get::<u8, _>(idx) {
        return Some(JsonValue::Number(v.into()));
    }
    None
}

fn decode_float(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    let v = row
        .try_get::<f64, _>(idx)
        .or_else(|_| row.try_get::<f32, _>(idx).map(f64::from))
        .ok()?;
    Some(
        serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string())),
    )
}

/// Last resort: the value's bytes as sent by the server.
fn decode_raw(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(s) = row.try_get_unchecked::<String, _>(idx) {
        return JsonValue::String(s);
    }
    match row.try_get_unchecked::<Vec<u8>, _>(idx) {
        Ok(bytes) => decode_binary_value(&bytes),
        Err(e) => {
            tracing::error!(column = idx, error = %e, "Failed to decode column");
            JsonValue::Null
        }
    }
}
