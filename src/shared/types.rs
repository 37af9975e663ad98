use serde::{Deserialize, Deserializer, Serialize};

/// Envelope used for error bodies
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<serde_json::Value>,
    pub errors: Option<Vec<String>>,
}

impl ApiResponse<()> {
    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// 1-indexed page number for an offset/limit pair
pub fn page_number(skip: i64, limit: i64) -> i64 {
    skip / limit.max(1) + 1
}

/// Number of pages needed to hold `total` rows, `limit` per page
pub fn total_pages(total: i64, limit: i64) -> i64 {
    let limit = limit.max(1);
    (total + limit - 1) / limit
}

// =============================================================================
// SERDE HELPERS
// =============================================================================

/// Distinguishes an explicit `null` from a missing field.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>`: missing → `None`, `null` → `Some(None)`,
/// value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse a query-string boolean: true/false, 1/0, yes/no, on/off, t/f, y/n
/// in any case.
pub fn parse_flexible_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// `deserialize_with` adapter for [`parse_flexible_bool`]
pub fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_bool(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean value `{}`", raw)))
}

/// Round to two decimal places (prices, tax rates, aggregates)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
