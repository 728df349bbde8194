//! Bearer-token sources.
//!
//! The controllers never read ambient state for credentials; an [`AuthProvider`] is injected
//! and asked for the token right before each request. `None` means the session has no token
//! and the request must not be sent.

use std::{fs, path::PathBuf};

use shared::error::ClientError;
use tracing::debug;

pub trait AuthProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    /// Token or the precondition failure every request path reports when it is absent.
    fn require_token(&self) -> Result<String, ClientError> {
        self.bearer_token()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(ClientError::missing_token)
    }
}

/// Token fixed at construction, e.g. from configuration or a CLI flag.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn missing() -> Self {
        Self { token: None }
    }
}

impl AuthProvider for StaticTokenProvider {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Session token persisted in a file. Re-read on every call so a sign-in elsewhere is picked up.
#[derive(Debug, Clone)]
pub struct FileTokenProvider {
    path: PathBuf,
}

impl FileTokenProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl AuthProvider for FileTokenProvider {
    fn bearer_token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(err) => {
                debug!(path = %self.path.display(), %err, "session token file unreadable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorKind;

    #[test]
    fn missing_and_blank_tokens_are_preconditions() {
        let err = StaticTokenProvider::missing()
            .require_token()
            .expect_err("missing");
        assert_eq!(err.kind, ErrorKind::Precondition);

        let err = StaticTokenProvider::new(Some("  ".into()))
            .require_token()
            .expect_err("blank");
        assert_eq!(err.kind, ErrorKind::Precondition);
    }

    #[test]
    fn file_provider_reads_trimmed_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.token");
        let provider = FileTokenProvider::new(&path);
        assert_eq!(provider.bearer_token(), None);

        fs::write(&path, "abc123\n").expect("write token");
        assert_eq!(provider.require_token().expect("token"), "abc123");
    }
}
