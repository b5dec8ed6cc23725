use webbench_storage::SavedRequest;

use crate::{ROOT_SEGMENT, SiteMap};

fn record(url: &str, ts: i64) -> SavedRequest {
    let mut record = SavedRequest::new("GET", url, Default::default(), String::new()).unwrap();
    record.ts = ts;
    record
}

#[test]
fn groups_by_host_and_segment() {
    let records = vec![
        record("https://example.com/api/users", 10),
        record("https://example.com/api/users/7", 30),
        record("https://example.com/", 20),
        record("http://localhost:8080/health", 5),
        record("not a url", 99),
    ];

    let map = SiteMap::build(&records);

    assert_eq!(map.request_count, 4);
    assert_eq!(map.host_count(), 2);
    let host = &map.hosts["example.com"];
    assert_eq!(host.count, 3);
    assert_eq!(host.last_ts, 30);
    assert_eq!(host.children[ROOT_SEGMENT].count, 1);
    let api = &host.children["api"];
    assert_eq!(api.count, 2);
    assert_eq!(api.children["users"].count, 2);
    assert_eq!(api.children["users"].children["7"].last_ts, 30);
    assert!(map.hosts.contains_key("localhost:8080"));
}

#[test]
fn flatten_lists_children_in_name_order_with_depth() {
    let records = vec![
        record("https://example.com/b/x", 1),
        record("https://example.com/a", 2),
    ];
    let map = SiteMap::build(&records);

    let rows: Vec<(usize, &str)> = map.hosts["example.com"]
        .flatten()
        .into_iter()
        .map(|row| (row.depth, row.node.name.as_str()))
        .collect();

    assert_eq!(rows, vec![(0, "a"), (0, "b"), (1, "x")]);
}

#[test]
fn deep_paths_are_capped() {
    let path: Vec<String> = (0..60).map(|i| format!("s{i}")).collect();
    let records = vec![record(&format!("https://example.com/{}", path.join("/")), 1)];
    let map = SiteMap::build(&records);

    let depth = map.hosts["example.com"]
        .flatten()
        .iter()
        .map(|row| row.depth)
        .max()
        .unwrap();
    assert_eq!(depth, 49);
}

#[test]
fn empty_input_builds_empty_map() {
    let map = SiteMap::build(&Vec::<SavedRequest>::new());
    assert!(map.is_empty());
    assert_eq!(map.request_count, 0);
}
