#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use webbench_replay::{RawResponse, RequestSpec, Transport, TransportError};
use webbench_storage::{MemoryBlobStore, SavedRequest, SavedRequestStore};
use webbench_web::RequestError;

/// Hands out canned responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    seen: Mutex<Vec<RequestSpec>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, body: &str) -> Self {
        self.reply_with(ok_response(body))
    }

    pub fn reply_with(self, response: RawResponse) -> Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Request(RequestError::Connect(
                message.to_string(),
            ))));
        self
    }

    pub fn seen(&self) -> Vec<RequestSpec> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request(RequestError::Connect("no reply scripted".to_string()))))
    }
}

pub fn ok_response(body: &str) -> RawResponse {
    RawResponse {
        status: 200,
        status_text: "OK".to_string(),
        url: "http://example.com/".to_string(),
        headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        body: body.as_bytes().to_vec(),
    }
}

pub fn memory_store() -> SavedRequestStore<MemoryBlobStore> {
    SavedRequestStore::new(MemoryBlobStore::new())
}

pub fn save(store: &mut SavedRequestStore<MemoryBlobStore>, method: &str, url: &str) -> SavedRequest {
    let record = SavedRequest::new(method, url, Default::default(), String::new()).unwrap();
    store.prepend(record.clone()).unwrap();
    record
}
