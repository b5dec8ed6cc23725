use thiserror::Error;
use webbench_storage::StoreError;
use webbench_web::RequestError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no request selected")]
    NoSelection,
    #[error("no saved requests")]
    EmptyStore,
    #[error("saved request not found: {0}")]
    RecordNotFound(String),
    #[error("not editing a saved request")]
    NotEditing,
    #[error("saved request {0} no longer exists; edit mode cleared")]
    StaleReference(String),
    #[error("replay of {0} was superseded by a newer replay")]
    Superseded(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid method: {0}")]
    InvalidMethod(String),
    #[error("invalid header {0}")]
    InvalidHeader(String),
    #[error(transparent)]
    Request(#[from] RequestError),
}
