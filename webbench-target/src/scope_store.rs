use crossbeam_channel::Receiver;
use tracing::{debug, warn};
use webbench_storage::{BlobStore, EventBus, StorageError, WriteOutcome};

use crate::error::ScopeError;
use crate::scope::{Scope, normalize_host, normalize_path_prefix};

pub const SCOPE_KEY: &str = "wbs_scope_v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeEvent {
    pub scope: Scope,
}

/// The persisted scope. Writes are best effort: a failed write keeps the
/// change in memory and reports `WriteOutcome::InMemoryOnly`.
pub struct ScopeStore<B: BlobStore> {
    blobs: B,
    scope: Scope,
    events: EventBus<ScopeEvent>,
}

impl<B: BlobStore> ScopeStore<B> {
    pub fn open(blobs: B) -> Self {
        let scope = load(&blobs);
        Self {
            blobs,
            scope,
            events: EventBus::new(),
        }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn subscribe(&self) -> Receiver<ScopeEvent> {
        self.events.subscribe()
    }

    pub fn set(&mut self, scope: Scope) -> WriteOutcome {
        self.scope = scope.normalized();
        self.commit()
    }

    pub fn set_enabled(&mut self, enabled: bool) -> WriteOutcome {
        self.scope.enabled = enabled;
        self.commit()
    }

    pub fn add_host(&mut self, input: &str) -> Result<WriteOutcome, ScopeError> {
        let host = normalize_host(input);
        if host.is_empty() {
            return Err(ScopeError::EmptyHost);
        }
        if !self.scope.hosts.contains(&host) {
            self.scope.hosts.push(host);
        }
        Ok(self.commit())
    }

    pub fn add_path_prefix(&mut self, input: &str) -> Result<WriteOutcome, ScopeError> {
        let prefix = normalize_path_prefix(input);
        if prefix.is_empty() {
            return Err(ScopeError::EmptyPathPrefix);
        }
        if !self.scope.path_prefixes.contains(&prefix) {
            self.scope.path_prefixes.push(prefix);
        }
        Ok(self.commit())
    }

    pub fn remove_host(&mut self, value: &str) -> WriteOutcome {
        self.scope.hosts.retain(|host| host != value);
        self.commit()
    }

    pub fn remove_path_prefix(&mut self, value: &str) -> WriteOutcome {
        self.scope.path_prefixes.retain(|prefix| prefix != value);
        self.commit()
    }

    /// Back to defaults: enabled with no rules.
    pub fn clear(&mut self) -> WriteOutcome {
        self.scope = Scope::default();
        self.commit()
    }

    fn commit(&mut self) -> WriteOutcome {
        let result = serde_json::to_string(&self.scope)
            .map_err(StorageError::from)
            .and_then(|raw| self.blobs.set(SCOPE_KEY, &raw));
        let outcome = match result {
            Ok(()) => WriteOutcome::Persisted,
            Err(err) => {
                warn!(error = %err, "scope kept in memory only");
                WriteOutcome::InMemoryOnly(err)
            }
        };
        debug!(
            enabled = self.scope.enabled,
            hosts = self.scope.hosts.len(),
            paths = self.scope.path_prefixes.len(),
            "scope changed"
        );
        self.events.publish(ScopeEvent {
            scope: self.scope.clone(),
        });
        outcome
    }
}

fn load<B: BlobStore>(blobs: &B) -> Scope {
    match blobs.get(SCOPE_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<Scope>(&raw) {
            Ok(scope) => scope.normalized(),
            Err(err) => {
                warn!(error = %err, "scope is malformed, using defaults");
                Scope::default()
            }
        },
        Ok(None) => Scope::default(),
        Err(err) => {
            warn!(error = %err, "failed to read scope");
            Scope::default()
        }
    }
}
