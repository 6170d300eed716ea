//! Network transports that execute a built `HttpRequest`.

use std::future::Future;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpVersion};

/// Performs exactly one HTTP round-trip.
///
/// Implementations return any status as data; only failures to complete the
/// exchange are errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing client, e.g. one with custom TLS or proxy settings.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

impl From<HttpVersion> for reqwest::Version {
    fn from(version: HttpVersion) -> Self {
        match version {
            HttpVersion::Http11 => reqwest::Version::HTTP_11,
            HttpVersion::Http2 => reqwest::Version::HTTP_2,
        }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.inner.request(request.method.into(), &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(version) = request.options.version {
            builder = builder.version(version.into());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse { status, headers, body })
    }
}
