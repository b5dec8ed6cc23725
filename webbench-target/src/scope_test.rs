use crate::{Scope, normalize_host, normalize_path_prefix};

fn scope(hosts: &[&str], paths: &[&str]) -> Scope {
    Scope {
        enabled: true,
        hosts: hosts.iter().map(|host| host.to_string()).collect(),
        path_prefixes: paths.iter().map(|path| path.to_string()).collect(),
    }
}

#[test]
fn no_rules_or_disabled_accepts_everything() {
    assert!(Scope::default().is_in_scope("not a url"));

    let mut disabled = scope(&["example.com"], &[]);
    disabled.enabled = false;
    assert!(disabled.is_in_scope("https://other.org/"));
}

#[test]
fn unparsable_url_is_out_when_rules_exist() {
    assert!(!scope(&["example.com"], &[]).is_in_scope("/relative/path"));
}

#[test]
fn host_must_match_exactly_including_port() {
    let rules = scope(&["Example.com", "localhost:8080"], &[]);
    assert!(rules.is_in_scope("https://EXAMPLE.com/a"));
    assert!(rules.is_in_scope("http://localhost:8080/"));
    assert!(!rules.is_in_scope("http://localhost:9090/"));
    assert!(!rules.is_in_scope("https://api.example.com/"));
    assert!(rules.is_in_scope("https://example.com:443/"));
}

#[test]
fn path_prefix_rules() {
    let rules = scope(&[], &["api/", "/v2"]);
    assert!(rules.is_in_scope("https://example.com/api/users"));
    assert!(rules.is_in_scope("https://example.com/v2"));
    assert!(!rules.is_in_scope("https://example.com/web"));

    assert!(scope(&[], &["/"]).is_in_scope("https://example.com/anything"));
}

#[test]
fn host_and_path_rules_both_apply() {
    let rules = scope(&["example.com"], &["/api"]);
    assert!(rules.is_in_scope("https://example.com/api/x"));
    assert!(!rules.is_in_scope("https://example.com/web"));
    assert!(!rules.is_in_scope("https://other.com/api/x"));
}

#[test]
fn host_normalization_accepts_urls_and_paths() {
    assert_eq!(normalize_host("  https://API.Example.com:8443/x?y=1 "), "api.example.com:8443");
    assert_eq!(normalize_host("example.com/some/path"), "example.com");
    assert_eq!(normalize_host("LocalHost:3000"), "localhost:3000");
    assert_eq!(normalize_host("   "), "");
}

#[test]
fn path_prefix_normalization() {
    assert_eq!(normalize_path_prefix("api/"), "/api");
    assert_eq!(normalize_path_prefix("/"), "/");
    assert_eq!(normalize_path_prefix(" /v1/users/ "), "/v1/users");
    assert_eq!(normalize_path_prefix(""), "");
}

#[test]
fn normalized_deduplicates() {
    let normalized = scope(&["A.com", "a.com ", ""], &["/x", "/x"]).normalized();
    assert_eq!(normalized.hosts, vec!["a.com".to_string()]);
    assert_eq!(normalized.path_prefixes, vec!["/x".to_string()]);
}
