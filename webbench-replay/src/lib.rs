mod controller;
mod diff;
mod error;
mod execute;
pub mod headers;
pub mod hooks;
mod interceptor;
mod model;

pub use controller::{
    CompletedReplay, REPLAY_FAILED_PREFIX, ReplayController, ReplayPhase, ReplayTicket,
    ReplayView, ViewMode,
};
pub use diff::{
    DEFAULT_MAX_LINES_PER_SIDE, DiffLine, DiffOp, DiffOptions, DiffOutcome, compute_diff,
    normalize_line_endings,
};
pub use error::{ReplayError, TransportError};
pub use execute::{HttpTransport, Transport, execute, prepare};
pub use hooks::{ExchangeHooks, NoHooks};
pub use interceptor::{InterceptorController, RequestForm};
pub use model::{ExecutedResponse, ExecutionOutcome, RawResponse, RequestSpec, method_allows_body};
