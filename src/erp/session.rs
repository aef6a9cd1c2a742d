//! Persisted login session
//!
//! The authenticate endpoint hands back a session cookie and a user id.
//! Both are written to a JSON file in the data directory so a restart
//! picks the session back up without logging in again.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identity persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    /// Raw session cookie returned by the authenticate endpoint
    pub session_id: String,

    /// Numeric Odoo user id
    pub user_id: i64,
}

/// File-backed store for the login session
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store the session under the given data directory
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("session.json"),
        }
    }

    /// Load the persisted session, if any
    ///
    /// A missing or unparseable file yields `None`.
    #[must_use]
    pub fn load(&self) -> Option<StoredSession> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => {
                tracing::debug!(path = %self.path.display(), "loaded persisted session");
                Some(session)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to parse session file"
                );
                None
            }
        }
    }

    /// Write the session to disk
    pub fn save(&self, session: &StoredSession) {
        match serde_json::to_string_pretty(session) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "failed to save session"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize session");
            }
        }
    }

    /// Remove the persisted session
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove session file"
            );
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        assert!(store.load().is_none());

        let session = StoredSession {
            session_id: "session_id=abc123".to_string(),
            user_id: 7,
        };
        store.save(&session);
        assert_eq!(store.load(), Some(session));

        store.clear();
        assert!(store.load().is_none());

        // Clearing again is a no-op
        store.clear();
    }

    #[test]
    fn test_corrupt_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        std::fs::write(store.path(), "not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_wire_keys_are_camel_case() {
        let session = StoredSession {
            session_id: "cookie".to_string(),
            user_id: 2,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["sessionId"], "cookie");
        assert_eq!(json["userId"], 2);
    }
}
