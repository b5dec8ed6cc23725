mod error;
mod scope;
#[cfg(test)]
mod scope_test;
mod scope_store;
mod sitemap;
#[cfg(test)]
mod sitemap_test;

pub use error::ScopeError;
pub use scope::{Scope, normalize_host, normalize_path_prefix, url_host};
pub use scope_store::{SCOPE_KEY, ScopeEvent, ScopeStore};
pub use sitemap::{MAX_PATH_SEGMENTS, ROOT_SEGMENT, SiteMap, SiteNode, SiteRow};
