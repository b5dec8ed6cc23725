use std::collections::BTreeMap;

use crate::diff::normalize_line_endings;

/// Parses editor text of `Name: value` lines. Lines without a name before the
/// first colon are skipped; a repeated name keeps the last value.
pub fn parse_raw_headers(text: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for line in normalize_line_endings(text).lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(idx) = line.find(':') else {
            continue;
        };
        if idx == 0 {
            continue;
        }
        let name = line[..idx].trim();
        if name.is_empty() {
            continue;
        }
        headers.insert(name.to_string(), line[idx + 1..].trim().to_string());
    }
    headers
}

pub fn headers_to_text(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
