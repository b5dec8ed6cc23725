use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;
use webbench_storage::{
    BlobStore, ProjectConfig, ReplayPolicy, SavedRequest, SavedRequestStore, WriteOutcome,
};

use crate::diff::{DiffOptions, DiffOutcome, compute_diff};
use crate::error::ReplayError;
use crate::execute::{Transport, execute};
use crate::hooks::ExchangeHooks;
use crate::model::{ExecutionOutcome, RequestSpec};

pub const REPLAY_FAILED_PREFIX: &str = "Replay failed (likely CORS / network).";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReplayPhase {
    Idle,
    Selected,
    Replaying,
    Replayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Raw,
    Diff,
}

/// What the repeater shows after a replay completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayView {
    pub record_id: String,
    pub title: String,
    pub outcome: ExecutionOutcome,
    pub diff: Option<DiffOutcome>,
}

impl ReplayView {
    pub fn raw_text(&self) -> String {
        match &self.outcome {
            ExecutionOutcome::Success(response) => response.raw_text(),
            ExecutionOutcome::Failure { message } => {
                format!("{REPLAY_FAILED_PREFIX}\n\n{message}")
            }
        }
    }

    /// Falls back to the raw text when the replay failed.
    pub fn diff_text(&self) -> String {
        match &self.diff {
            Some(diff) => diff.render(),
            None => self.raw_text(),
        }
    }

    pub fn render(&self, mode: ViewMode) -> String {
        match mode {
            ViewMode::Raw => self.raw_text(),
            ViewMode::Diff => self.diff_text(),
        }
    }
}

/// A replay that has been issued but whose I/O has not run yet.
#[derive(Debug, Clone)]
pub struct ReplayTicket {
    ticket: u64,
    record_id: String,
    title: String,
    request: RequestSpec,
}

impl ReplayTicket {
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn request(&self) -> &RequestSpec {
        &self.request
    }

    pub async fn run(self, hooks: &dyn ExchangeHooks, transport: &dyn Transport) -> CompletedReplay {
        let outcome = execute(&self.request, hooks, transport).await;
        CompletedReplay {
            ticket: self.ticket,
            record_id: self.record_id,
            title: self.title,
            outcome,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletedReplay {
    ticket: u64,
    record_id: String,
    title: String,
    outcome: ExecutionOutcome,
}

impl CompletedReplay {
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn outcome(&self) -> &ExecutionOutcome {
        &self.outcome
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct InFlight {
    pending: usize,
    latest: u64,
}

#[derive(Debug, Default)]
pub struct ReplayController {
    selected_id: Option<String>,
    last_body_by_record_id: HashMap<String, String>,
    display: Option<ReplayView>,
    view_mode: ViewMode,
    policy: ReplayPolicy,
    diff_options: DiffOptions,
    in_flight: HashMap<String, InFlight>,
    next_ticket: u64,
}

impl ReplayController {
    pub fn new(policy: ReplayPolicy, diff_options: DiffOptions) -> Self {
        Self {
            policy,
            diff_options,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(
            config.replay.policy,
            DiffOptions {
                max_lines_per_side: config.diff.max_lines_per_side,
            },
        )
    }

    pub fn phase(&self) -> ReplayPhase {
        let Some(selected) = self.selected_id.as_deref() else {
            return ReplayPhase::Idle;
        };
        if self
            .in_flight
            .get(selected)
            .is_some_and(|flight| flight.pending > 0)
        {
            return ReplayPhase::Replaying;
        }
        match &self.display {
            Some(view) if view.record_id == selected => ReplayPhase::Replayed,
            _ => ReplayPhase::Selected,
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn display(&self) -> Option<&ReplayView> {
        self.display.as_ref()
    }

    pub fn rendered(&self) -> Option<String> {
        self.display.as_ref().map(|view| view.render(self.view_mode))
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    /// Body of the last successful replay of `record_id`.
    pub fn baseline(&self, record_id: &str) -> Option<&str> {
        self.last_body_by_record_id.get(record_id).map(String::as_str)
    }

    pub fn select<B: BlobStore>(
        &mut self,
        store: &mut SavedRequestStore<B>,
        id: &str,
    ) -> Result<SavedRequest, ReplayError> {
        let records = store.load_all();
        if records.is_empty() {
            self.deselect();
            return Err(ReplayError::EmptyStore);
        }
        let Some(record) = records.into_iter().find(|record| record.id == id) else {
            self.deselect();
            return Err(ReplayError::RecordNotFound(id.to_string()));
        };
        if self.selected_id.as_deref() != Some(id) {
            self.display = None;
        }
        self.selected_id = Some(record.id.clone());
        Ok(record)
    }

    /// Reloads the list, dropping a vanished selection and selecting the
    /// first record when nothing is selected.
    pub fn refresh<B: BlobStore>(&mut self, store: &mut SavedRequestStore<B>) -> Vec<SavedRequest> {
        let records = store.load_all();
        let still_present = self
            .selected_id
            .as_deref()
            .is_some_and(|id| records.iter().any(|record| record.id == id));
        if !still_present {
            self.deselect();
            if let Some(first) = records.first() {
                self.selected_id = Some(first.id.clone());
            }
        }
        records
    }

    pub fn begin_replay<B: BlobStore>(
        &mut self,
        store: &mut SavedRequestStore<B>,
    ) -> Result<ReplayTicket, ReplayError> {
        let id = self.selected_id.clone().ok_or(ReplayError::NoSelection)?;
        let record = store
            .get(&id)
            .ok_or_else(|| ReplayError::RecordNotFound(id.clone()))?;

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let flight = self.in_flight.entry(id.clone()).or_default();
        flight.pending += 1;
        flight.latest = ticket;
        debug!(record_id = %id, ticket, "replay started");

        Ok(ReplayTicket {
            ticket,
            record_id: id,
            title: record.title(),
            request: RequestSpec::from(&record),
        })
    }

    pub fn complete_replay(&mut self, completed: CompletedReplay) -> Result<ReplayView, ReplayError> {
        let CompletedReplay {
            ticket,
            record_id,
            title,
            outcome,
        } = completed;

        let Some(flight) = self.in_flight.get_mut(&record_id) else {
            debug!(record_id = %record_id, ticket, "discarding replay of removed record");
            return Err(ReplayError::RecordNotFound(record_id));
        };
        flight.pending = flight.pending.saturating_sub(1);
        let superseded = self.policy == ReplayPolicy::LatestWins && flight.latest > ticket;
        if flight.pending == 0 {
            self.in_flight.remove(&record_id);
        }
        if superseded {
            debug!(record_id = %record_id, ticket, "discarding superseded replay");
            return Err(ReplayError::Superseded(record_id));
        }

        let diff = match &outcome {
            ExecutionOutcome::Success(response) => {
                let diff = compute_diff(
                    self.baseline(&record_id),
                    &response.body_text,
                    &self.diff_options,
                );
                self.last_body_by_record_id
                    .insert(record_id.clone(), response.body_text.clone());
                Some(diff)
            }
            ExecutionOutcome::Failure { .. } => None,
        };

        let view = ReplayView {
            record_id,
            title,
            outcome,
            diff,
        };
        self.display = Some(view.clone());
        Ok(view)
    }

    pub async fn replay_selected<B: BlobStore>(
        &mut self,
        store: &mut SavedRequestStore<B>,
        hooks: &dyn ExchangeHooks,
        transport: &dyn Transport,
    ) -> Result<ReplayView, ReplayError> {
        let ticket = self.begin_replay(store)?;
        let completed = ticket.run(hooks, transport).await;
        self.complete_replay(completed)
    }

    pub fn clear_all<B: BlobStore>(&mut self, store: &mut SavedRequestStore<B>) -> WriteOutcome {
        let outcome = store.clear_all();
        self.last_body_by_record_id.clear();
        self.in_flight.clear();
        self.deselect();
        outcome
    }

    pub fn remove<B: BlobStore>(
        &mut self,
        store: &mut SavedRequestStore<B>,
        id: &str,
    ) -> Result<WriteOutcome, ReplayError> {
        let outcome = store.remove_by_id(id)?;
        self.last_body_by_record_id.remove(id);
        self.in_flight.remove(id);
        if self.selected_id.as_deref() == Some(id) {
            self.deselect();
        }
        if self.display.as_ref().is_some_and(|view| view.record_id == id) {
            self.display = None;
        }
        Ok(outcome)
    }

    fn deselect(&mut self) {
        self.selected_id = None;
        self.display = None;
    }
}
