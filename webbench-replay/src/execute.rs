use std::time::Instant;

use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use tracing::{debug, warn};
use url::Url;
use webbench_storage::{HttpConfig, normalize_method};
use webbench_web::{Client, ClientConfig, Request};

use crate::error::TransportError;
use crate::hooks::ExchangeHooks;
use crate::model::{ExecutedResponse, ExecutionOutcome, RawResponse, RequestSpec};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse, TransportError>;
}

/// Sends requests with [`webbench_web::Client`], one connection per request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = Client::new(ClientConfig {
            timeout: std::time::Duration::from_secs(config.timeout_secs),
            ..ClientConfig::default()
        });
        let mut transport = Self::new(client);
        if let Some(base) = config.base_url.as_deref() {
            let base = Url::parse(base).map_err(|err| TransportError::InvalidUrl {
                url: base.to_string(),
                reason: err.to_string(),
            })?;
            transport = transport.with_base_url(base);
        }
        Ok(transport)
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn resolve(&self, raw: &str) -> Result<Url, TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(raw).map_err(|err| invalid(err.to_string())),
                None => Err(invalid("relative url and no base url configured".to_string())),
            },
            Err(err) => Err(invalid(err.to_string())),
        }
    }

    pub fn build_request(&self, spec: &RequestSpec) -> Result<(Url, Request), TransportError> {
        let url = self.resolve(&spec.url)?;
        let uri: Uri = url.as_str().parse().map_err(|err: http::uri::InvalidUri| {
            TransportError::InvalidUrl {
                url: url.to_string(),
                reason: err.to_string(),
            }
        })?;
        let method = Method::from_bytes(spec.method.as_bytes())
            .map_err(|_| TransportError::InvalidMethod(spec.method.clone()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &spec.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader(format!("{name}: {value}")))?;
            headers.append(header_name, header_value);
        }

        let mut builder = Request::builder(uri).method(method).headers(headers);
        if spec.allows_body() && !spec.body.is_empty() {
            builder = builder.body(spec.body.clone().into_bytes());
        }
        Ok((url, builder.build()))
    }

    /// HTTP/1.1 text of what [`Transport::send`] would write.
    pub fn preview(&self, spec: &RequestSpec) -> Result<String, TransportError> {
        let (_, request) = self.build_request(spec)?;
        Ok(String::from_utf8_lossy(&self.client.wire_bytes(&request)).into_owned())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, spec: &RequestSpec) -> Result<RawResponse, TransportError> {
        let (url, request) = self.build_request(spec)?;
        let response = self.client.request(request).await?;
        let headers = response
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Ok(RawResponse {
            status: response.status,
            status_text: response.reason,
            url: url.to_string(),
            headers,
            body: response.body,
        })
    }
}

/// Normalizes `request` and runs the request hooks on a copy.
pub fn prepare(request: &RequestSpec, hooks: &dyn ExchangeHooks) -> RequestSpec {
    let mut prepared = request.clone();
    prepared.method = normalize_method(&prepared.method);
    prepared.url = prepared.url.trim().to_string();
    hooks.on_request(&mut prepared);
    if !prepared.allows_body() {
        prepared.body.clear();
    }
    prepared
}

pub async fn execute(
    request: &RequestSpec,
    hooks: &dyn ExchangeHooks,
    transport: &dyn Transport,
) -> ExecutionOutcome {
    let prepared = prepare(request, hooks);
    let started = Instant::now();
    match transport.send(&prepared).await {
        Ok(raw) => {
            let mut response = ExecutedResponse::from_raw(raw, started.elapsed());
            hooks.on_response(&mut response);
            debug!(
                method = %prepared.method,
                url = %prepared.url,
                status = response.status,
                elapsed_ms = response.elapsed_ms,
                "request completed"
            );
            ExecutionOutcome::Success(response)
        }
        Err(err) => {
            warn!(method = %prepared.method, url = %prepared.url, error = %err, "request failed");
            ExecutionOutcome::Failure {
                message: err.to_string(),
            }
        }
    }
}
