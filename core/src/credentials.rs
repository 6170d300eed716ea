//! Read-only access to the locally stored bearer token.
//!
//! The token lives under a single named entry in client-local storage. This
//! crate only ever reads it; whoever logs the user in owns writing and
//! refreshing it.

use std::collections::HashMap;
use std::path::PathBuf;

/// Storage entry holding the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Client-local key/value storage.
pub trait CredentialStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
}

/// In-memory storage with entries fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage holding only `token` under [`ACCESS_TOKEN_KEY`].
    pub fn with_token(token: &str) -> Self {
        Self::new().with_item(ACCESS_TOKEN_KEY, token)
    }

    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl CredentialStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Directory-backed storage: each entry is a file named after its key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CredentialStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        // Keys are plain entry names, never paths.
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return None;
        }
        match std::fs::read_to_string(self.dir.join(key)) {
            Ok(contents) => Some(contents.trim().to_string()),
            Err(err) => {
                tracing::trace!(key, error = %err, "storage entry unavailable");
                None
            }
        }
    }
}
