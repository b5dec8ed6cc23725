use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;
use webbench_storage::SavedRequest;

use crate::scope::url_host;

pub const MAX_PATH_SEGMENTS: usize = 50;
pub const ROOT_SEGMENT: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteNode {
    pub name: String,
    pub count: usize,
    pub last_ts: i64,
    pub children: BTreeMap<String, SiteNode>,
}

impl SiteNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            count: 0,
            last_ts: 0,
            children: BTreeMap::new(),
        }
    }

    fn hit(&mut self, ts: i64) {
        self.count += 1;
        self.last_ts = self.last_ts.max(ts);
    }

    fn child(&mut self, name: &str) -> &mut SiteNode {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| SiteNode::new(name))
    }

    /// Descendants in name order, depth-first; direct children have depth 0.
    pub fn flatten(&self) -> Vec<SiteRow<'_>> {
        let mut rows = Vec::new();
        flatten_into(self, 0, &mut rows);
        rows
    }
}

fn flatten_into<'a>(node: &'a SiteNode, depth: usize, rows: &mut Vec<SiteRow<'a>>) {
    for child in node.children.values() {
        rows.push(SiteRow { depth, node: child });
        flatten_into(child, depth + 1, rows);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteRow<'a> {
    pub depth: usize,
    pub node: &'a SiteNode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteMap {
    pub hosts: BTreeMap<String, SiteNode>,
    pub request_count: usize,
}

impl SiteMap {
    /// Groups records by host and path segment. Records whose url does not
    /// parse are skipped.
    pub fn build<'a>(records: impl IntoIterator<Item = &'a SavedRequest>) -> Self {
        let mut map = SiteMap::default();
        for record in records {
            let Ok(url) = Url::parse(&record.url) else {
                continue;
            };
            map.request_count += 1;
            let host = url_host(&url);
            let host_node = map
                .hosts
                .entry(host.clone())
                .or_insert_with(|| SiteNode::new(&host));
            host_node.hit(record.ts);

            let segments: Vec<&str> = url
                .path()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .take(MAX_PATH_SEGMENTS)
                .collect();
            if segments.is_empty() {
                host_node.child(ROOT_SEGMENT).hit(record.ts);
                continue;
            }
            let mut cursor = host_node;
            for segment in segments {
                cursor = cursor.child(segment);
                cursor.hit(record.ts);
            }
        }
        map
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
