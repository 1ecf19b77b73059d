//! Shape reconciliation and ordering for stored records.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::record::UploadRecord;

const FILENAME_FIELDS: [&str; 2] = ["filename", "original_filename"];
const URL_FIELDS: [&str; 2] = ["url", "public_url"];
const KEY_FIELDS: [&str; 3] = ["b2_filename", "object_key", "objectKey"];
const TIMESTAMP_FIELDS: [&str; 2] = ["timestamp", "created_at"];

/// Map any stored record shape onto [`UploadRecord`].
///
/// The first non-empty alias wins for each field and absent fields become
/// empty strings. `fallback_key` (the map key or document id the record
/// was stored under) fills in a missing object key.
#[must_use]
pub fn normalize_record(fields: &Map<String, Value>, fallback_key: &str) -> UploadRecord {
    let object_key = first_text(fields, &KEY_FIELDS);

    UploadRecord {
        original_filename: first_text(fields, &FILENAME_FIELDS),
        public_url: first_text(fields, &URL_FIELDS),
        object_key: if object_key.is_empty() {
            fallback_key.to_string()
        } else {
            object_key
        },
        timestamp: first_text(fields, &TIMESTAMP_FIELDS),
    }
}

fn first_text(fields: &Map<String, Value>, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find_map(text)
        .unwrap_or_default()
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC, the shape older
/// records were written in).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Order records newest first.
///
/// Unparseable timestamps sort last. Equal keys keep their input order.
pub fn sort_newest_first(records: &mut [UploadRecord]) {
    records.sort_by_cached_key(|record| Reverse(parse_timestamp(&record.timestamp)));
}
