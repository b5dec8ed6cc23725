use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use uuid::Uuid;

use crate::saved::{SavedRequest, normalize_method};

/// Parses a legacy blob into current records. `None` when the blob is not a JSON array.
pub(crate) fn migrate(raw: &str, now_ms: i64) -> Option<Vec<SavedRequest>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let entries = value.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| coerce_entry(entry, now_ms))
            .collect(),
    )
}

/// Coerces one loosely shaped entry into a record, or drops it when it has no url.
pub(crate) fn coerce_entry(entry: &Value, now_ms: i64) -> Option<SavedRequest> {
    let object = entry.as_object()?;
    let url = object
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())?;

    let id = object
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ts = object
        .get("ts")
        .and_then(Value::as_i64)
        .or_else(|| {
            object
                .get("createdAt")
                .and_then(Value::as_str)
                .and_then(parse_timestamp)
        })
        .unwrap_or(now_ms);

    let method = normalize_method(object.get("method").and_then(Value::as_str).unwrap_or(""));

    let headers = object
        .get("headers")
        .and_then(Value::as_object)
        .map(|headers| {
            headers
                .iter()
                .filter(|(name, _)| !name.trim().is_empty())
                .filter_map(|(name, value)| header_value(value).map(|value| (name.clone(), value)))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    let body = object
        .get("body")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(SavedRequest {
        id,
        ts,
        method,
        url: url.to_string(),
        headers,
        body,
    })
}

fn header_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}
