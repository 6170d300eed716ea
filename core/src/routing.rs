//! Pass-through route filter for the web front end.
//!
//! Decides which request paths skip further processing. The decision never
//! changes the request: skipped and passed-through paths both continue
//! unmodified, and authentication stays a client-side concern.

/// File extensions served as static assets.
pub const STATIC_EXTENSIONS: &[&str] = &["css", "js", "png", "jpg", "jpeg", "gif", "ico", "svg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Api,
    BuildInternal,
    StaticAsset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Skip(SkipReason),
    PassThrough,
}

impl RouteDecision {
    pub fn is_skipped(&self) -> bool {
        matches!(self, RouteDecision::Skip(_))
    }
}

pub fn route(path: &str) -> RouteDecision {
    if path.starts_with("/api/") {
        return RouteDecision::Skip(SkipReason::Api);
    }
    if path.starts_with("/_next/") {
        return RouteDecision::Skip(SkipReason::BuildInternal);
    }
    let is_asset = path
        .rsplit_once('.')
        .is_some_and(|(_, ext)| STATIC_EXTENSIONS.contains(&ext));
    if is_asset {
        return RouteDecision::Skip(SkipReason::StaticAsset);
    }
    RouteDecision::PassThrough
}
