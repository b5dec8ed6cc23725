use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use webbench_storage::SavedRequest;

use crate::headers::headers_to_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSpec {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl From<&SavedRequest> for RequestSpec {
    fn from(record: &SavedRequest) -> Self {
        Self {
            method: record.method.clone(),
            url: record.url.clone(),
            headers: record.headers.clone(),
            body: record.body.clone(),
        }
    }
}

impl RequestSpec {
    pub fn allows_body(&self) -> bool {
        method_allows_body(&self.method)
    }
}

pub fn method_allows_body(method: &str) -> bool {
    !matches!(method, "GET" | "HEAD")
}

/// What a transport hands back before hooks run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedResponse {
    /// Status is 2xx.
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body_text: String,
    pub elapsed_ms: u64,
}

impl ExecutedResponse {
    pub fn from_raw(raw: RawResponse, elapsed: Duration) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in raw.headers {
            headers
                .entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        Self {
            ok: (200..300).contains(&raw.status),
            status: raw.status,
            status_text: raw.status_text,
            url: raw.url,
            headers,
            body_text: String::from_utf8_lossy(&raw.body).into_owned(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    pub fn status_line(&self) -> String {
        format!("{} {}", self.status, self.status_text).trim().to_string()
    }

    /// Status line with the elapsed time, e.g. `200 OK • 12ms`.
    pub fn summary_line(&self) -> String {
        format!("{} • {}ms", self.status_line(), self.elapsed_ms)
    }

    /// Summary line, headers and body separated by blank lines.
    pub fn raw_text(&self) -> String {
        [
            self.summary_line(),
            String::new(),
            headers_to_text(&self.headers),
            String::new(),
            self.body_text.clone(),
        ]
        .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success(ExecutedResponse),
    Failure { message: String },
}

impl ExecutionOutcome {
    pub fn response(&self) -> Option<&ExecutedResponse> {
        match self {
            ExecutionOutcome::Success(response) => Some(response),
            ExecutionOutcome::Failure { .. } => None,
        }
    }
}
