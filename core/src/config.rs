//! Client configuration: the backend base address and the environment mode
//! derived from it.

use std::net::IpAddr;

/// Environment variable holding the backend origin.
pub const BASE_URL_ENV: &str = "TASK_API_URL";

/// Origin used when `TASK_API_URL` is unset or blank.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Whether the backend is reached directly or behind the `/api` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentMode {
    /// Loopback backend, paths are used as given.
    Local,
    /// Deployed backend, paths live under `/api`.
    Remote,
}

/// Backend address plus the mode derived from it. Built once and handed to
/// the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    mode: EnvironmentMode,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let mode = if is_loopback(&base_url) {
            EnvironmentMode::Local
        } else {
            EnvironmentMode::Remote
        };
        Self { base_url, mode }
    }

    /// Read `TASK_API_URL`, falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl FnOnce(&str) -> Option<String>) -> Self {
        let base = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(&base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mode(&self) -> EnvironmentMode {
        self.mode
    }

    pub fn is_local(&self) -> bool {
        self.mode == EnvironmentMode::Local
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn is_loopback(base_url: &str) -> bool {
    let Ok(url) = url::Url::parse(base_url) else {
        return false;
    };
    match url.host() {
        Some(url::Host::Domain(host)) => {
            let host = host.to_ascii_lowercase();
            host == "localhost" || host.ends_with(".localhost")
        }
        Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_is_local() {
        let config = ClientConfig::new("http://localhost:8000");
        assert_eq!(config.mode(), EnvironmentMode::Local);
        assert!(config.is_local());
    }

    #[test]
    fn loopback_literals_are_local() {
        assert!(ClientConfig::new("http://127.0.0.1:8000").is_local());
        assert!(ClientConfig::new("http://127.1.2.3").is_local());
        assert!(ClientConfig::new("http://[::1]:8000").is_local());
        assert!(ClientConfig::new("http://app.localhost:3000").is_local());
    }

    #[test]
    fn public_hosts_are_remote() {
        let config = ClientConfig::new("https://tasks.example.com");
        assert_eq!(config.mode(), EnvironmentMode::Remote);
        assert!(!ClientConfig::new("https://localhost.example.com").is_local());
        assert!(!ClientConfig::new("http://10.0.0.5:8000").is_local());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("https://tasks.example.com/");
        assert_eq!(config.base_url(), "https://tasks.example.com");
    }

    #[test]
    fn unparseable_base_is_remote() {
        assert_eq!(ClientConfig::new("not a url").mode(), EnvironmentMode::Remote);
    }

    #[test]
    fn lookup_reads_base_url_variable() {
        let config = ClientConfig::from_lookup(|key| {
            assert_eq!(key, BASE_URL_ENV);
            Some("https://tasks.example.com/".to_string())
        });
        assert_eq!(config.base_url(), "https://tasks.example.com");
        assert_eq!(config.mode(), EnvironmentMode::Remote);
    }

    #[test]
    fn blank_or_missing_variable_falls_back_to_default() {
        assert_eq!(
            ClientConfig::from_lookup(|_| Some("  ".to_string())),
            ClientConfig::default()
        );
        assert_eq!(ClientConfig::from_lookup(|_| None), ClientConfig::default());
    }

    #[test]
    fn default_points_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert!(config.is_local());
    }
}
