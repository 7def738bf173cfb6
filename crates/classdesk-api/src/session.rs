// Session store
//
// Single source of truth for the current credentials. Readers take a
// lock-free snapshot; writers swap the whole session in one step, so no
// reader ever observes a half-updated token pair. The optional session
// file mirrors the in-memory state across restarts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Credentials held by the [`SessionStore`].
///
/// All fields are `None` when logged out.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user_id: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// On-disk shape of a persisted session.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl From<PersistedSession> for Session {
    fn from(p: PersistedSession) -> Self {
        Self {
            access_token: Some(SecretString::from(p.access_token)),
            refresh_token: p.refresh_token.map(SecretString::from),
            user_id: p.user_id,
        }
    }
}

/// Process-wide holder of the current [`Session`].
///
/// Construct one per dashboard and hand it to the transport client by
/// `Arc`; there is no global instance.
pub struct SessionStore {
    current: ArcSwap<Session>,
    file: Option<PathBuf>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// An empty, memory-only store.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Session::default()),
            file: None,
        }
    }

    /// A store mirrored to `path`. Any session already saved there is
    /// restored; an unreadable file is ignored and starts logged out.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = load_session_file(&path).unwrap_or_default();
        debug!(
            path = %path.display(),
            authenticated = session.is_authenticated(),
            "session store initialized"
        );
        Self {
            current: ArcSwap::from_pointee(session),
            file: Some(path),
        }
    }

    /// Point-in-time copy of the whole session.
    pub fn snapshot(&self) -> Arc<Session> {
        self.current.load_full()
    }

    pub fn access_token(&self) -> Option<SecretString> {
        self.current.load().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        self.current.load().refresh_token.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.current.load().user_id.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_authenticated()
    }

    /// Replace all three credential fields at once.
    pub fn set_tokens(
        &self,
        access_token: SecretString,
        refresh_token: Option<SecretString>,
        user_id: Option<String>,
    ) {
        let session = Session {
            access_token: Some(access_token),
            refresh_token,
            user_id,
        };
        self.persist(&session);
        self.current.store(Arc::new(session));
        debug!("session tokens replaced");
    }

    /// Like [`set_tokens`](Self::set_tokens), but only if the store still
    /// holds `expected`. Returns `false` and leaves the store untouched when
    /// another login, refresh or logout got there first.
    pub fn replace_if_current(
        &self,
        expected: &Arc<Session>,
        access_token: SecretString,
        refresh_token: Option<SecretString>,
        user_id: Option<String>,
    ) -> bool {
        let session = Arc::new(Session {
            access_token: Some(access_token),
            refresh_token,
            user_id,
        });
        let previous = self.current.compare_and_swap(expected, Arc::clone(&session));
        if !Arc::ptr_eq(&previous, expected) {
            debug!("session changed concurrently, tokens not replaced");
            return false;
        }
        self.persist(&session);
        debug!("session tokens replaced");
        true
    }

    /// Reset every field to `None` and drop the session file.
    pub fn clear(&self) {
        self.current.store(Arc::new(Session::default()));
        if let Some(ref path) = self.file {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(error = %e, path = %path.display(), "failed to remove session file");
                }
            }
        }
        debug!("session cleared");
    }

    fn persist(&self, session: &Session) {
        let Some(ref path) = self.file else { return };
        let Some(ref access) = session.access_token else {
            return;
        };
        let persisted = PersistedSession {
            access_token: access.expose_secret().to_owned(),
            refresh_token: session
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            user_id: session.user_id.clone(),
        };
        if let Err(e) = write_session_file(path, &persisted) {
            warn!(error = %e, path = %path.display(), "failed to persist session");
        }
    }
}

fn load_session_file(path: &Path) -> Option<Session> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<PersistedSession>(&contents) {
        Ok(p) => Some(p.into()),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "ignoring unreadable session file");
            None
        }
    }
}

fn write_session_file(path: &Path, session: &PersistedSession) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(session)?;
    std::fs::write(path, contents)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn new_store_is_logged_out() {
        let store = SessionStore::new();
        assert!(!store.is_authenticated());
        assert!(store.access_token().is_none());
        assert!(store.user_id().is_none());
    }

    #[test]
    fn set_tokens_replaces_all_fields() {
        let store = SessionStore::new();
        store.set_tokens(secret("a1"), Some(secret("r1")), Some("u1".into()));
        store.set_tokens(secret("a2"), None, Some("u2".into()));

        let snap = store.snapshot();
        assert_eq!(snap.access_token.as_ref().unwrap().expose_secret(), "a2");
        assert!(snap.refresh_token.is_none());
        assert_eq!(snap.user_id.as_deref(), Some("u2"));
    }

    #[test]
    fn snapshot_is_unaffected_by_later_writes() {
        let store = SessionStore::new();
        store.set_tokens(secret("old"), None, None);
        let before = store.snapshot();
        store.set_tokens(secret("new"), None, None);

        assert_eq!(before.access_token.as_ref().unwrap().expose_secret(), "old");
        assert_eq!(store.access_token().unwrap().expose_secret(), "new");
    }

    #[test]
    fn replace_if_current_refuses_after_clear() {
        let store = SessionStore::new();
        store.set_tokens(secret("a"), Some(secret("r")), Some("7".into()));
        let seen = store.snapshot();
        store.clear();

        assert!(!store.replace_if_current(&seen, secret("b"), None, None));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn replace_if_current_swaps_unchanged_session() {
        let store = SessionStore::new();
        store.set_tokens(secret("a"), Some(secret("r")), None);
        let seen = store.snapshot();

        assert!(store.replace_if_current(&seen, secret("b"), Some(secret("r2")), None));
        assert_eq!(store.access_token().unwrap().expose_secret(), "b");
        assert_eq!(store.refresh_token().unwrap().expose_secret(), "r2");
    }

    #[test]
    fn clear_resets_everything() {
        let store = SessionStore::new();
        store.set_tokens(secret("a"), Some(secret("r")), Some("7".into()));
        store.clear();
        let snap = store.snapshot();
        assert!(snap.access_token.is_none());
        assert!(snap.refresh_token.is_none());
        assert!(snap.user_id.is_none());
    }

    #[test]
    fn persistent_store_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::persistent(&path);
        assert!(!store.is_authenticated());
        store.set_tokens(secret("a"), Some(secret("r")), Some("42".into()));
        assert!(path.exists());

        let restored = SessionStore::persistent(&path);
        assert_eq!(restored.access_token().unwrap().expose_secret(), "a");
        assert_eq!(restored.refresh_token().unwrap().expose_secret(), "r");
        assert_eq!(restored.user_id().as_deref(), Some("42"));

        restored.clear();
        assert!(!path.exists());
        assert!(!SessionStore::persistent(&path).is_authenticated());
    }

    #[test]
    fn corrupt_session_file_starts_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::persistent(&path);
        assert!(!store.is_authenticated());
    }
}
