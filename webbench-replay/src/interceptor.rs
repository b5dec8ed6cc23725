use std::collections::BTreeMap;

use tracing::debug;
use webbench_storage::{
    BlobStore, RecordPatch, SavedRequest, SavedRequestStore, StoreError, WriteOutcome,
    normalize_method, now_millis,
};

use crate::error::ReplayError;
use crate::execute::{HttpTransport, Transport, execute, prepare};
use crate::hooks::ExchangeHooks;
use crate::model::{ExecutionOutcome, RequestSpec};

/// The editable request fields as the user left them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestForm {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RequestForm {
    pub fn from_record(record: &SavedRequest) -> Self {
        Self {
            method: record.method.clone(),
            url: record.url.clone(),
            headers: record.headers.clone(),
            body: record.body.clone(),
        }
    }

    pub fn build_request(&self) -> Result<RequestSpec, ReplayError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ReplayError::Validation("URL is required".to_string()));
        }
        Ok(RequestSpec {
            method: normalize_method(&self.method),
            url: url.to_string(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }
}

#[derive(Debug, Default)]
pub struct InterceptorController {
    editing_id: Option<String>,
}

impl InterceptorController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn load_for_editing<B: BlobStore>(
        &mut self,
        store: &mut SavedRequestStore<B>,
        id: &str,
    ) -> Result<RequestForm, ReplayError> {
        let record = store
            .get(id)
            .ok_or_else(|| ReplayError::RecordNotFound(id.to_string()))?;
        self.editing_id = Some(record.id.clone());
        Ok(RequestForm::from_record(&record))
    }

    pub fn load_for_viewing<B: BlobStore>(
        &mut self,
        store: &mut SavedRequestStore<B>,
        id: &str,
    ) -> Result<RequestForm, ReplayError> {
        let record = store
            .get(id)
            .ok_or_else(|| ReplayError::RecordNotFound(id.to_string()))?;
        self.editing_id = None;
        Ok(RequestForm::from_record(&record))
    }

    pub fn cancel_editing(&mut self) {
        self.editing_id = None;
    }

    pub fn save_as_new<B: BlobStore>(
        &mut self,
        store: &mut SavedRequestStore<B>,
        form: &RequestForm,
    ) -> Result<(SavedRequest, WriteOutcome), ReplayError> {
        let spec = form.build_request()?;
        let record = SavedRequest::new(&spec.method, &spec.url, spec.headers, spec.body)?;
        let outcome = store.prepend(record.clone())?;
        debug!(id = %record.id, "saved new request");
        Ok((record, outcome))
    }

    /// Replaces every field of the record being edited except its id.
    pub fn overwrite_existing<B: BlobStore>(
        &mut self,
        store: &mut SavedRequestStore<B>,
        form: &RequestForm,
    ) -> Result<(SavedRequest, WriteOutcome), ReplayError> {
        let id = self.editing_id.clone().ok_or(ReplayError::NotEditing)?;
        let spec = form.build_request()?;
        let patch = RecordPatch {
            method: Some(spec.method),
            url: Some(spec.url),
            headers: Some(spec.headers),
            body: Some(spec.body),
            ts: Some(now_millis()),
        };
        let outcome = match store.upsert_by_id(&id, patch) {
            Ok(outcome) => outcome,
            Err(StoreError::NotFound(_)) => {
                self.editing_id = None;
                return Err(ReplayError::StaleReference(id));
            }
            Err(err) => return Err(err.into()),
        };
        let record = store
            .get(&id)
            .ok_or_else(|| ReplayError::StaleReference(id.clone()))?;
        debug!(id = %id, "overwrote saved request");
        Ok((record, outcome))
    }

    /// Executes the form as-is without saving it.
    pub async fn send(
        &self,
        form: &RequestForm,
        hooks: &dyn ExchangeHooks,
        transport: &dyn Transport,
    ) -> Result<ExecutionOutcome, ReplayError> {
        let spec = form.build_request()?;
        Ok(execute(&spec, hooks, transport).await)
    }

    pub fn preview(
        &self,
        form: &RequestForm,
        hooks: &dyn ExchangeHooks,
        transport: &HttpTransport,
    ) -> Result<String, ReplayError> {
        let spec = prepare(&form.build_request()?, hooks);
        Ok(transport.preview(&spec)?)
    }
}
