use std::collections::BTreeMap;

use webbench_storage::ExtenderConfig;

use crate::model::{ExecutedResponse, RequestSpec};

/// Pre- and post-processing applied around one exchange.
pub trait ExchangeHooks: Send + Sync {
    fn on_request(&self, request: &mut RequestSpec);
    fn on_response(&self, response: &mut ExecutedResponse);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ExchangeHooks for NoHooks {
    fn on_request(&self, _request: &mut RequestSpec) {}
    fn on_response(&self, _response: &mut ExecutedResponse) {}
}

impl ExchangeHooks for ExtenderConfig {
    fn on_request(&self, request: &mut RequestSpec) {
        if self.trim_headers {
            request.headers = trim_header_entries(std::mem::take(&mut request.headers));
        }
        if self.lowercase_header_keys {
            request.headers = lowercase_header_keys(std::mem::take(&mut request.headers));
        }
    }

    fn on_response(&self, response: &mut ExecutedResponse) {
        if self.trim_headers {
            strip_volatile_headers(&mut response.headers);
        }
        if self.pretty_json {
            let pretty = pretty_json(&response.body_text, response.content_type());
            response.body_text = pretty;
        }
    }
}

pub fn trim_header_entries(headers: BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .into_iter()
        .filter_map(|(name, value)| {
            let name = name.trim();
            if name.is_empty() {
                None
            } else {
                Some((name.to_string(), value.trim().to_string()))
            }
        })
        .collect()
}

/// On a case-insensitive collision the entry sorting last wins.
pub fn lowercase_header_keys(headers: BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .into_iter()
        .map(|(name, value)| (name.to_lowercase(), value))
        .collect()
}

/// Drops headers that change on every response and would add diff noise.
pub fn strip_volatile_headers(headers: &mut BTreeMap<String, String>) {
    headers.retain(|name, _| {
        !name.eq_ignore_ascii_case("date") && !name.eq_ignore_ascii_case("server")
    });
}

pub fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// Re-indents JSON bodies with two spaces; anything unparsable is returned as is.
pub fn pretty_json(text: &str, content_type: Option<&str>) -> String {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    let is_json = content_type.contains("application/json")
        || content_type.contains("+json")
        || looks_like_json(text);
    if !is_json {
        return text.to_string();
    }
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| text.to_string())
}
