//! SQL access. Functions take the pool (or an open transaction) and return raw
//! `sqlx` results; handlers lift them into `AppError` with `?`.

pub mod articles;
pub mod users;

/// Timestamp format used for every TEXT date column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Decodes a JSON array column, treating NULL or garbage as empty.
pub(crate) fn json_list<T: serde::de::DeserializeOwned>(raw: Option<String>) -> Vec<T> {
    raw.and_then(|s| serde_json::from_str(&s).ok()).unwrap_or_default()
}
