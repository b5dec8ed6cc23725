mod blob;
mod error;
mod events;
mod legacy;
mod project;
mod saved;
mod schema;
mod sqlite;

pub use blob::{BlobStore, MemoryBlobStore};
pub use error::{StorageError, StoreError};
pub use events::{ChangeKind, EventBus, StoreEvent};
pub use project::{
    DiffConfig, ExtenderConfig, HttpConfig, ProjectConfig, ProjectLayout, ProjectPaths,
    ReplayConfig, ReplayPolicy,
};
pub use saved::{
    LEGACY_SAVED_REQUESTS_KEY, RecordPatch, SAVED_REQUESTS_KEY, SavedRequest, SavedRequestStore,
    WriteOutcome, normalize_method, now_millis,
};
pub use schema::{SchemaCatalog, SchemaSpec, TableSpec};
pub use sqlite::SqliteBlobStore;
