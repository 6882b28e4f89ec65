//! Session credential handling.
//!
//! The backend hands out a bearer token at login. It is kept in two places:
//! a durable key-value [`CredentialStore`] (so the next run is still logged
//! in) and an in-memory [`Session`] that the HTTP client reads on every
//! request. The session is passed explicitly to [`crate::api::HttpStore`];
//! nothing reads the token from ambient global state.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::RwLock;

use floricultura_core::{RoleClaim, decode_role_claim};

/// Key under which the session token is stored.
pub const TOKEN_KEY: &str = "token";

/// Errors from the durable credential store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the backing file failed.
    #[error("credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("credential store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable key-value storage for session data.
pub trait CredentialStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// In-memory store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Store backed by a small JSON object on disk.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Use `path` as the backing file. It is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// The current-session credential.
///
/// Cheap to clone; clones share the same token.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn CredentialStore>,
    token: RwLock<Option<SecretString>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a logged-out session over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                token: RwLock::new(None),
            }),
        }
    }

    /// Session that only lives in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::new()))
    }

    /// Open a session over `store`, picking up a previously saved token.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be read.
    pub fn restore(store: Arc<dyn CredentialStore>) -> Result<Self, SessionError> {
        let saved = store
            .get(TOKEN_KEY)?
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);
        Ok(Self {
            inner: Arc::new(SessionInner {
                store,
                token: RwLock::new(saved),
            }),
        })
    }

    /// Store a new token (login).
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the token cannot be persisted. The in-memory
    /// token is only replaced once persisting succeeded.
    pub async fn set_token(&self, token: SecretString) -> Result<(), SessionError> {
        let stored = token.clone();
        self.with_store(move |store| store.set(TOKEN_KEY, stored.expose_secret()))
            .await?;
        *self.inner.token.write().await = Some(token);
        Ok(())
    }

    /// Forget the token (logout or expiry).
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the stored token cannot be removed. The
    /// in-memory token is cleared regardless.
    pub async fn clear(&self) -> Result<(), SessionError> {
        *self.inner.token.write().await = None;
        self.with_store(|store| store.remove(TOKEN_KEY)).await
    }

    /// Run a store call on the blocking pool; file-backed stores do sync I/O.
    async fn with_store<T, F>(&self, f: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CredentialStore) -> Result<T, SessionError> + Send + 'static,
    {
        let store = Arc::clone(&self.inner.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| SessionError::Io(std::io::Error::other(e)))?
    }

    /// The current token, if logged in.
    pub async fn token(&self) -> Option<SecretString> {
        self.inner.token.read().await.clone()
    }

    /// Whether a token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Advisory role claim decoded from the current token.
    pub async fn role_claim(&self) -> Option<RoleClaim> {
        let token = self.inner.token.read().await;
        token
            .as_ref()
            .and_then(|t| decode_role_claim(t.expose_secret()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "floricultura-session-{name}-{}.json",
            std::process::id()
        ))
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = temp_path("roundtrip");
        let store = FileCredentialStore::new(&path);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);

        store.set(TOKEN_KEY, "abc").unwrap();
        store.set("other", "x").unwrap();
        assert_eq!(FileCredentialStore::new(&path).get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        store.remove(TOKEN_KEY).unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get("other").unwrap().as_deref(), Some("x"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let path = temp_path("garbage");
        std::fs::write(&path, "[not, json").unwrap();
        let store = FileCredentialStore::new(&path);
        assert!(matches!(store.get(TOKEN_KEY), Err(SessionError::Corrupt(_))));
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = Arc::new(MemoryCredentialStore::new());
        let session = Session::new(store.clone());
        assert!(!session.is_authenticated().await);

        session.set_token(SecretString::from("t1")).await.unwrap();
        assert!(session.is_authenticated().await);
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));

        let restored = Session::restore(store.clone()).unwrap();
        assert_eq!(
            restored.token().await.unwrap().expose_secret(),
            "t1"
        );

        session.clear().await.unwrap();
        assert!(!session.is_authenticated().await);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_session_persists_and_reports_write_failure() {
        let path = temp_path("file-session");
        let session = Session::new(Arc::new(FileCredentialStore::new(&path)));
        session.set_token(SecretString::from("t2")).await.unwrap();
        let restored = Session::restore(Arc::new(FileCredentialStore::new(&path))).unwrap();
        assert!(restored.is_authenticated().await);
        session.clear().await.unwrap();
        assert_eq!(FileCredentialStore::new(&path).get(TOKEN_KEY).unwrap(), None);
        std::fs::remove_file(&path).unwrap();

        // parent is a regular file, so the write cannot succeed
        let blocker = temp_path("blocker");
        std::fs::write(&blocker, "").unwrap();
        let broken = Session::new(Arc::new(FileCredentialStore::new(blocker.join("s.json"))));
        assert!(matches!(
            broken.set_token(SecretString::from("t3")).await,
            Err(SessionError::Io(_))
        ));
        assert!(!broken.is_authenticated().await);
        std::fs::remove_file(&blocker).unwrap();
    }

    #[tokio::test]
    async fn test_role_claim_of_opaque_token_is_none() {
        let session = Session::in_memory();
        session
            .set_token(SecretString::from("opaque"))
            .await
            .unwrap();
        assert_eq!(session.role_claim().await, None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", Session::in_memory());
        assert!(debug.contains("REDACTED"));
    }
}
