//! Async HTTP client core for the task service.
//!
//! # Overview
//! Centralizes outbound calls to the task backend: URL construction, bearer
//! token attachment, JSON encoding/decoding and error normalization all live
//! in [`Dispatcher`]. [`TasksApi`] maps the task operations onto it.
//!
//! # Design
//! - Configuration is resolved once ([`ClientConfig`]) and injected; the
//!   environment mode is derived in the constructor, not per call.
//! - Each call is `build` (pure) -> [`Transport::send`] -> `parse` (pure), so
//!   the I/O boundary stays explicit and the policy is testable on plain data.
//! - Failures come back as [`ApiError`] after being logged; nothing is
//!   retried, cached or swallowed.
//! - The dispatcher holds no mutable state, so concurrent calls are
//!   independent.

pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod routing;
pub mod tasks;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, EnvironmentMode};
pub use credentials::{CredentialStore, FileStore, MemoryStore, ACCESS_TOKEN_KEY};
pub use dispatcher::{ApiRequest, Dispatcher};
pub use endpoint::{Query, QueryValue};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpVersion, TransportOptions};
pub use routing::{route, RouteDecision, SkipReason};
pub use tasks::TasksApi;
pub use transport::{ReqwestTransport, Transport};
pub use types::{CompletionToggle, NewTask, NoContent, Task, TaskFilter, TaskUpdate};
