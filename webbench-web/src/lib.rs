mod client;
mod request;
mod response;

pub use client::{Client, ClientConfig, RequestError};
pub use request::{Request, RequestBuilder};
pub use response::Response;
