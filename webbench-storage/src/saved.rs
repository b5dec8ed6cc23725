use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::blob::BlobStore;
use crate::events::{ChangeKind, EventBus, StoreEvent};
use crate::legacy;
use crate::{StorageError, StoreError};

pub const SAVED_REQUESTS_KEY: &str = "wbs.savedRequests.v1";
pub const LEGACY_SAVED_REQUESTS_KEY: &str = "wbs.savedRequests";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedRequest {
    pub id: String,
    pub ts: i64,
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

fn default_method() -> String {
    "GET".to_string()
}

impl SavedRequest {
    pub fn new(
        method: &str,
        url: &str,
        headers: BTreeMap<String, String>,
        body: String,
    ) -> Result<Self, StoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::InvalidRecord("url is required".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            ts: now_millis(),
            method: normalize_method(method),
            url: url.to_string(),
            headers,
            body,
        })
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.ts)
    }

    pub fn title(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    fn is_valid(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

pub fn normalize_method(method: &str) -> String {
    let method = method.trim();
    if method.is_empty() {
        default_method()
    } else {
        method.to_uppercase()
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Fields to merge into an existing record; `id` is never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub method: Option<String>,
    pub url: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<String>,
    pub ts: Option<i64>,
}

impl RecordPatch {
    fn apply(self, record: &mut SavedRequest) {
        if let Some(method) = self.method {
            record.method = normalize_method(&method);
        }
        if let Some(url) = self.url {
            record.url = url.trim().to_string();
        }
        if let Some(headers) = self.headers {
            record.headers = headers;
        }
        if let Some(body) = self.body {
            record.body = body;
        }
        if let Some(ts) = self.ts {
            record.ts = ts;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    /// The change is visible through this store but did not reach the blob store.
    InMemoryOnly(StorageError),
}

impl WriteOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, WriteOutcome::Persisted)
    }
}

pub struct SavedRequestStore<B: BlobStore> {
    blobs: B,
    mirror: Option<Vec<SavedRequest>>,
    events: EventBus<StoreEvent>,
}

impl<B: BlobStore> SavedRequestStore<B> {
    pub fn new(blobs: B) -> Self {
        Self {
            blobs,
            mirror: None,
            events: EventBus::new(),
        }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// True while the last write failed and reads are served from memory.
    pub fn is_degraded(&self) -> bool {
        self.mirror.is_some()
    }

    pub fn load_all(&mut self) -> Vec<SavedRequest> {
        self.read_current().unwrap_or_else(|err| {
            warn!(error = %err, "failed to read saved requests");
            Vec::new()
        })
    }

    pub fn get(&mut self, id: &str) -> Option<SavedRequest> {
        self.load_all().into_iter().find(|record| record.id == id)
    }

    pub fn save_all(&mut self, records: Vec<SavedRequest>) -> WriteOutcome {
        let before = records.len();
        let records: Vec<SavedRequest> = records.into_iter().filter(SavedRequest::is_valid).collect();
        if records.len() != before {
            debug!(dropped = before - records.len(), "dropped records without url");
        }
        let outcome = self.persist(&records);
        self.notify(ChangeKind::Saved, records.len());
        outcome
    }

    /// Replaces the collection from arbitrary JSON; anything but an array is empty.
    pub fn save_all_json(&mut self, value: &serde_json::Value) -> WriteOutcome {
        let now = now_millis();
        let records = match value.as_array() {
            Some(entries) => entries
                .iter()
                .filter_map(|entry| legacy::coerce_entry(entry, now))
                .collect(),
            None => Vec::new(),
        };
        self.save_all(records)
    }

    pub fn prepend(&mut self, record: SavedRequest) -> Result<WriteOutcome, StoreError> {
        if !record.is_valid() {
            return Err(StoreError::InvalidRecord("url is required".to_string()));
        }
        let (mut records, read_error) = self.read_for_update();
        records.insert(0, record);
        let outcome = self.commit(&records, read_error);
        self.notify(ChangeKind::Added, records.len());
        Ok(outcome)
    }

    pub fn upsert_by_id(
        &mut self,
        id: &str,
        patch: RecordPatch,
    ) -> Result<WriteOutcome, StoreError> {
        let (mut records, read_error) = self.read_for_update();
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut updated = record.clone();
        patch.apply(&mut updated);
        if !updated.is_valid() {
            return Err(StoreError::InvalidRecord("url is required".to_string()));
        }
        *record = updated;
        let outcome = self.commit(&records, read_error);
        self.notify(ChangeKind::Updated, records.len());
        Ok(outcome)
    }

    pub fn remove_by_id(&mut self, id: &str) -> Result<WriteOutcome, StoreError> {
        let (mut records, read_error) = self.read_for_update();
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let outcome = self.commit(&records, read_error);
        self.notify(ChangeKind::Removed, records.len());
        Ok(outcome)
    }

    pub fn clear_all(&mut self) -> WriteOutcome {
        // An explicit empty array keeps a leftover legacy blob from being migrated back.
        let outcome = self.persist(&[]);
        if let Err(err) = self.blobs.remove(LEGACY_SAVED_REQUESTS_KEY) {
            warn!(error = %err, "failed to remove legacy saved requests");
        }
        self.notify(ChangeKind::Cleared, 0);
        outcome
    }

    fn read_current(&mut self) -> Result<Vec<SavedRequest>, StorageError> {
        if let Some(mirror) = &self.mirror {
            return Ok(mirror.clone());
        }
        let Some(raw) = self.blobs.get(SAVED_REQUESTS_KEY)? else {
            return Ok(self.migrate_legacy());
        };
        let Some((records, repaired)) = parse_current(&raw, now_millis()) else {
            warn!("saved requests are malformed");
            return Ok(Vec::new());
        };
        if repaired {
            // Pin generated ids so later lookups see the same records.
            debug!(count = records.len(), "rewriting repaired saved requests");
            self.persist(&records);
        }
        Ok(records)
    }

    /// The unreadable case yields an empty list plus the error, so the
    /// following write stays in memory instead of replacing the stored blob.
    fn read_for_update(&mut self) -> (Vec<SavedRequest>, Option<StorageError>) {
        match self.read_current() {
            Ok(records) => (records, None),
            Err(err) => {
                warn!(error = %err, "failed to read saved requests before update");
                (Vec::new(), Some(err))
            }
        }
    }

    fn commit(&mut self, records: &[SavedRequest], read_error: Option<StorageError>) -> WriteOutcome {
        match read_error {
            Some(err) => {
                self.mirror = Some(records.to_vec());
                WriteOutcome::InMemoryOnly(err)
            }
            None => self.persist(records),
        }
    }

    fn migrate_legacy(&mut self) -> Vec<SavedRequest> {
        let raw = match self.blobs.get(LEGACY_SAVED_REQUESTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read legacy saved requests");
                return Vec::new();
            }
        };
        let Some(records) = legacy::migrate(&raw, now_millis()) else {
            warn!("legacy saved requests are malformed, leaving them in place");
            return Vec::new();
        };
        if self.persist(&records).is_persisted() {
            if let Err(err) = self.blobs.remove(LEGACY_SAVED_REQUESTS_KEY) {
                warn!(error = %err, "failed to remove legacy saved requests");
            }
        }
        debug!(count = records.len(), "migrated legacy saved requests");
        records
    }

    fn persist(&mut self, records: &[SavedRequest]) -> WriteOutcome {
        let result = serde_json::to_string(records)
            .map_err(StorageError::from)
            .and_then(|raw| self.blobs.set(SAVED_REQUESTS_KEY, &raw));
        match result {
            Ok(()) => {
                self.mirror = None;
                WriteOutcome::Persisted
            }
            Err(err) => {
                warn!(error = %err, "saved requests kept in memory only");
                self.mirror = Some(records.to_vec());
                WriteOutcome::InMemoryOnly(err)
            }
        }
    }

    fn notify(&self, kind: ChangeKind, count: usize) {
        self.events.publish(StoreEvent { kind, count });
    }
}

/// Coerces each element on its own so one odd entry cannot hide the rest.
/// `None` when the blob is not a JSON array. The flag is set when any element
/// needed coercion or was dropped.
fn parse_current(raw: &str, now_ms: i64) -> Option<(Vec<SavedRequest>, bool)> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let entries = value.as_array()?;
    let mut repaired = false;
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<SavedRequest>(entry.clone()) {
            Ok(record) if record.is_valid() => records.push(record),
            _ => {
                repaired = true;
                match legacy::coerce_entry(entry, now_ms) {
                    Some(record) => records.push(record),
                    None => debug!("dropped saved request without url"),
                }
            }
        }
    }
    Some((records, repaired))
}
