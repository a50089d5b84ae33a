//! Rest Runner
//!
//! The one capability every poller depends on: perform a single
//! authenticated HTTP call and hand back status and body, or a terminal error.

use async_trait::async_trait;
use cfops_core::dto::rest::{HttpMethod, RestRequest};
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use crate::error::RestError;

/// Buffered HTTP response
///
/// The body is read in full once and owned by whoever holds the response.
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RestResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Drain a reqwest response into memory
    pub async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            status,
            headers,
            body,
        })
    }
}

/// Executes one authenticated HTTP call
///
/// An `Err` means the call is a terminal failure for any consumer.
/// Implementations hold no per-call state and are shared freely.
#[async_trait]
pub trait RestRunner: Send + Sync {
    async fn run(&self, request: &RestRequest) -> Result<RestResponse, RestError>;
}

pub(crate) fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// reqwest-backed Rest Runner
///
/// Any non-2xx answer is reported as [`RestError::Status`] with the body kept.
#[derive(Debug, Clone)]
pub struct HttpRestRunner {
    client: Client,
}

impl HttpRestRunner {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Build a client, optionally accepting self-signed certificates
    pub fn build(skip_tls_verify: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()?;
        Ok(Self { client })
    }

    /// Use a pre-configured client (TLS, timeouts, proxies)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpRestRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RestRunner for HttpRestRunner {
    async fn run(&self, request: &RestRequest) -> Result<RestResponse, RestError> {
        debug!("{} {}", request.method, request.url);

        let response = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .basic_auth(&request.username, Some(&request.password))
            .header(CONTENT_TYPE, request.body_format.content_type())
            .send()
            .await?;

        let response = RestResponse::read(response).await?;
        if !response.status.is_success() {
            return Err(RestError::Status {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }
}

/// Adapts a plain function into a [`RestRunner`]
///
/// Handy for scripted fakes and for wrapping a synchronous transport.
pub struct RestAdapter<F>(pub F);

impl<F> RestAdapter<F>
where
    F: Fn(&RestRequest) -> Result<RestResponse, RestError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> RestRunner for RestAdapter<F>
where
    F: Fn(&RestRequest) -> Result<RestResponse, RestError> + Send + Sync,
{
    async fn run(&self, request: &RestRequest) -> Result<RestResponse, RestError> {
        (self.0)(request)
    }
}
