use serde::{Deserialize, Serialize};
use url::Url;

/// Host and path filters applied to saved traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scope {
    pub enabled: bool,
    pub hosts: Vec<String>,
    pub path_prefixes: Vec<String>,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            enabled: true,
            hosts: Vec::new(),
            path_prefixes: Vec::new(),
        }
    }
}

impl Scope {
    pub fn has_rules(&self) -> bool {
        !self.hosts.is_empty() || !self.path_prefixes.is_empty()
    }

    /// Disabled scopes and scopes without rules accept everything. With
    /// rules present an unparsable url is out of scope.
    pub fn is_in_scope(&self, url: &str) -> bool {
        if !self.enabled || !self.has_rules() {
            return true;
        }
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let host = url_host(&parsed);
        let path = parsed.path();

        if !self.hosts.is_empty()
            && !self
                .hosts
                .iter()
                .any(|rule| rule.to_lowercase() == host)
        {
            return false;
        }

        if !self.path_prefixes.is_empty()
            && !self
                .path_prefixes
                .iter()
                .map(|prefix| normalize_path_prefix(prefix))
                .any(|prefix| prefix == "/" || path.starts_with(&prefix))
        {
            return false;
        }

        true
    }

    /// Trims and de-duplicates the rule lists, lowercasing hosts.
    pub fn normalized(self) -> Self {
        Self {
            enabled: self.enabled,
            hosts: unique(self.hosts.iter().map(|host| host.trim().to_lowercase())),
            path_prefixes: unique(self.path_prefixes.iter().map(|prefix| prefix.trim().to_string())),
        }
    }
}

/// `host[:port]` in lowercase; default ports are omitted.
pub fn url_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

/// Accepts a full url, `host/path`, or a bare `host[:port]`.
pub fn normalize_host(input: &str) -> String {
    let raw = input.trim();
    if raw.is_empty() {
        return String::new();
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        if let Ok(url) = Url::parse(raw) {
            return url_host(&url);
        }
    }
    if raw.contains('/') {
        if let Ok(url) = Url::parse(&format!("https://{raw}")) {
            return url_host(&url);
        }
    }
    raw.to_lowercase()
}

pub fn normalize_path_prefix(input: &str) -> String {
    let raw = input.trim();
    if raw.is_empty() {
        return String::new();
    }
    let mut prefix = if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    };
    if prefix.len() > 1 && prefix.ends_with('/') {
        prefix.pop();
    }
    prefix
}

fn unique(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
