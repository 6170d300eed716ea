//! The request dispatcher: one descriptor in, one network call, one outcome.
//!
//! # Design
//! `Dispatcher` carries only immutable configuration, an optional credential
//! store and a transport. A call is split into `build` (URL, headers, body),
//! the transport round-trip, and `parse` (status branching and decoding).
//! `build` and `parse` are pure so the policy around the network call can be
//! tested on plain data.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, ACCESS_TOKEN_KEY};
use crate::endpoint::{self, Query, QueryValue};
use crate::error::ApiError;
use crate::http::{reason_phrase, HttpMethod, HttpRequest, HttpResponse, TransportOptions};
use crate::transport::{ReqwestTransport, Transport};

const CONTENT_TYPE: &str = "Content-Type";
const AUTHORIZATION: &str = "Authorization";
const JSON_MIME: &str = "application/json";

/// Message used when an error response names no cause.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Describes one call: endpoint, method, and the optional parts.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    endpoint: String,
    method: HttpMethod,
    query: Option<Query>,
    body: Option<Result<String, String>>,
    headers: Vec<(String, String)>,
    options: TransportOptions,
}

impl ApiRequest {
    pub fn new(endpoint: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            ..Self::default()
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, HttpMethod::Get)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, HttpMethod::Post)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, HttpMethod::Put)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, HttpMethod::Delete)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, HttpMethod::Patch)
    }

    /// Replace the query parameters.
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Append one query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.get_or_insert_with(Query::new).push(key, value);
        self
    }

    /// Set the JSON body. Serialization failures surface when the request
    /// is dispatched.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = Some(serde_json::to_string(body).map_err(|e| e.to_string()));
        self
    }

    /// Add a header that overrides any default of the same name.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }
}

/// Turns `ApiRequest`s into network calls and normalized outcomes.
#[derive(Clone)]
pub struct Dispatcher<T = ReqwestTransport> {
    config: ClientConfig,
    storage: Option<Arc<dyn CredentialStore>>,
    transport: T,
}

impl Dispatcher<ReqwestTransport> {
    /// Dispatcher over a default `reqwest` client, without credential storage.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            storage: None,
            transport,
        }
    }

    /// Read the bearer token from `storage` on every call.
    ///
    /// Without storage the dispatcher behaves like a non-browser context and
    /// sends every request anonymously.
    pub fn with_storage(mut self, storage: impl CredentialStore + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve the URL, merge headers and encode the body.
    pub fn build(&self, request: &ApiRequest) -> Result<HttpRequest, ApiError> {
        let url = endpoint::resolve(&self.config, &request.endpoint, request.query.as_ref())?;

        let mut headers = vec![(CONTENT_TYPE.to_string(), JSON_MIME.to_string())];
        if let Some(token) = self.token() {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }
        for (key, value) in &request.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(key));
            headers.push((key.clone(), value.clone()));
        }

        let body = match &request.body {
            Some(Ok(text)) => Some(text.clone()),
            Some(Err(msg)) => return Err(ApiError::Serialization(msg.clone())),
            None => None,
        };

        Ok(HttpRequest {
            method: request.method,
            url: url.into(),
            headers,
            body,
            options: request.options.clone(),
        })
    }

    /// Branch on status and decode the body into `R`.
    ///
    /// A 204 decodes `R` from an empty JSON object whatever the body says.
    pub fn parse<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                message: error_message(&response),
            });
        }
        if response.status == 204 {
            return serde_json::from_value(Value::Object(Map::new()))
                .map_err(|e| ApiError::Decode(e.to_string()));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Dispatch `request` and decode the outcome.
    ///
    /// Every failure is logged with the method and resolved URL before it is
    /// returned.
    pub async fn request<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let method = request.method;
        let http_request = match self.build(&request) {
            Ok(built) => built,
            Err(err) => {
                tracing::error!(%method, url = %request.endpoint, error = %err, "API request failed");
                return Err(err);
            }
        };

        let url = http_request.url.clone();
        tracing::debug!(
            %method,
            %url,
            authenticated = http_request.header(AUTHORIZATION).is_some(),
            "sending API request"
        );

        let result = match self.transport.send(http_request).await {
            Ok(response) => self.parse(response),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            tracing::error!(%method, %url, error = %err, "API request failed");
        }
        result
    }

    fn token(&self) -> Option<String> {
        self.storage
            .as_ref()?
            .get_item(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }
}

impl<T: fmt::Debug> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("storage", &self.storage.is_some())
            .field("transport", &self.transport)
            .finish()
    }
}

/// Pick the message for a non-2xx response: `detail`, then `message`, then
/// the status reason phrase when the body is not JSON.
fn error_message(response: &HttpResponse) -> String {
    match serde_json::from_str::<Value>(&response.body) {
        Ok(body) => ["detail", "message"]
            .iter()
            .find_map(|field| body.get(field).and_then(field_text))
            .unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
        Err(_) => reason_phrase(response.status)
            .unwrap_or(UNEXPECTED_ERROR)
            .to_string(),
    }
}

/// Falsy values (`null`, `false`, `0`, `""`) count as absent.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
