use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("host is empty")]
    EmptyHost,
    #[error("path prefix is empty")]
    EmptyPathPrefix,
}
