use std::sync::Arc;
use std::time::Duration;

use http::HeaderValue;
use http::header::{CONNECTION, CONTENT_LENGTH, HOST, USER_AGENT};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::request::Request;
use crate::response::Response;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: Some(concat!("webbench/", env!("CARGO_PKG_VERSION")).to_string()),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid url: {0}")]
    InvalidUri(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("tls handshake failed: {0}")]
    Tls(String),
    #[error("i/o error: {0}")]
    Io(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The exact bytes [`Client::request`] would write for `request`.
    pub fn wire_bytes(&self, request: &Request) -> Vec<u8> {
        let authority = request
            .uri
            .authority()
            .map(|authority| authority.as_str().to_string())
            .unwrap_or_default();
        serialize_request(request, &authority, self.config.user_agent.as_deref())
    }

    pub async fn request(&self, request: Request) -> Result<Response, RequestError> {
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.execute(request)).await {
            Ok(result) => result,
            Err(_) => Err(RequestError::Timeout(timeout)),
        }
    }

    async fn execute(&self, request: Request) -> Result<Response, RequestError> {
        let uri = request.uri.clone();
        let secure = match uri.scheme_str() {
            Some("http") => false,
            Some("https") => true,
            Some(other) => {
                return Err(RequestError::InvalidUri(format!("unsupported scheme {other}")));
            }
            None => return Err(RequestError::InvalidUri(format!("{uri} has no scheme"))),
        };
        let host = uri
            .host()
            .ok_or_else(|| RequestError::InvalidUri(format!("{uri} has no host")))?
            .to_string();
        let port = uri.port_u16().unwrap_or(if secure { 443 } else { 80 });
        let authority = uri
            .authority()
            .map(|authority| authority.as_str().to_string())
            .unwrap_or_else(|| host.clone());

        debug!(method = %request.method, %uri, "sending request");
        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|err| RequestError::Connect(err.to_string()))?;
        let request_bytes = serialize_request(&request, &authority, self.config.user_agent.as_deref());

        let response_bytes = if secure {
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(self.config.accept_invalid_certs)
                .build()
                .map_err(|err| RequestError::Tls(err.to_string()))?;
            let connector = tokio_native_tls::TlsConnector::from(connector);
            let stream = connector
                .connect(&host, stream)
                .await
                .map_err(|err| RequestError::Tls(err.to_string()))?;
            exchange(stream, &request_bytes).await?
        } else {
            exchange(stream, &request_bytes).await?
        };

        Response::parse(&response_bytes)
    }
}

async fn exchange<S>(mut stream: S, request_bytes: &[u8]) -> Result<Vec<u8>, RequestError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(request_bytes)
        .await
        .map_err(|err| RequestError::Io(err.to_string()))?;
    stream
        .flush()
        .await
        .map_err(|err| RequestError::Io(err.to_string()))?;

    let mut buffer = vec![0u8; 8192];
    let mut response_bytes = Vec::new();
    loop {
        let n = stream
            .read(&mut buffer)
            .await
            .map_err(|err| RequestError::Io(err.to_string()))?;
        if n == 0 {
            break;
        }
        response_bytes.extend_from_slice(&buffer[..n]);
    }
    Ok(response_bytes)
}

pub(crate) fn serialize_request(
    request: &Request,
    authority: &str,
    user_agent: Option<&str>,
) -> Vec<u8> {
    let mut headers = request.headers.clone();
    if !headers.contains_key(HOST) {
        if let Ok(value) = HeaderValue::from_str(authority) {
            headers.insert(HOST, value);
        }
    }
    if let Some(user_agent) = user_agent {
        if !headers.contains_key(USER_AGENT) {
            if let Ok(value) = HeaderValue::from_str(user_agent) {
                headers.insert(USER_AGENT, value);
            }
        }
    }
    // One request per connection; the body is read until the peer closes.
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    if !request.body.is_empty() || method_expects_body(&request.method) {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(request.body.len()));
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(
        format!("{} {} HTTP/1.1\r\n", request.method, request.path_and_query()).as_bytes(),
    );
    for (name, value) in headers.iter() {
        bytes.extend_from_slice(name.as_str().as_bytes());
        bytes.extend_from_slice(b": ");
        bytes.extend_from_slice(value.as_bytes());
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(b"\r\n");
    bytes.extend_from_slice(&request.body);
    bytes
}

fn method_expects_body(method: &http::Method) -> bool {
    matches!(
        *method,
        http::Method::POST | http::Method::PUT | http::Method::PATCH
    )
}
