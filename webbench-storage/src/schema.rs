#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub create_sql: &'static str,
    pub indices: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSpec {
    pub version: u32,
    pub tables: Vec<TableSpec>,
}

pub struct SchemaCatalog;

impl SchemaCatalog {
    pub fn v1() -> SchemaSpec {
        SchemaSpec {
            version: 1,
            tables: vec![TableSpec {
                name: "kv_blobs",
                create_sql: "CREATE TABLE IF NOT EXISTS kv_blobs (\
    key TEXT PRIMARY KEY,\
    value TEXT NOT NULL,\
    updated_at TEXT NOT NULL\
)",
                indices: vec!["CREATE INDEX IF NOT EXISTS idx_kv_blobs_updated_at ON kv_blobs(updated_at)"],
            }],
        }
    }
}
