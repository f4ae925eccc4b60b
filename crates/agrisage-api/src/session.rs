// Session context: the bearer token and where it is persisted.
//
// The token lives in memory behind an `ArcSwapOption` so request builders
// read it without locking. Persistence goes through the `TokenStore`
// trait; the in-memory store here is used by tests and one-shot callers,
// keyring and file stores live in `agrisage-config`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Failure reported by a [`TokenStore`] backend.
#[derive(Debug, Error)]
#[error("token store ({backend}): {message}")]
pub struct TokenStoreError {
    pub backend: &'static str,
    pub message: String,
}

impl TokenStoreError {
    pub fn new(backend: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend,
            message: message.into(),
        }
    }
}

/// Where a bearer token is persisted between process runs.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Load a previously saved token, if any.
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError>;

    /// Persist a token, replacing any previous one.
    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError>;

    /// Remove the persisted token. Removing an absent token is not an error.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Process-local token store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<SecretString>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a token (tests, `--token` style overrides).
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Authentication state observable by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token held.
    SignedOut,
    /// A token is held and attached to requests.
    SignedIn,
    /// The server rejected the token; credentials were removed. Callers
    /// decide how to send the user back to login.
    Expired,
}

/// Explicit authentication context shared by every request of a client.
///
/// Cheaply cloneable; clones share the same token and state channel.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: ArcSwapOption<SecretString>,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    expirations: AtomicU64,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.inner.state.borrow())
            .field("store", &self.inner.store)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a signed-out session backed by `store`. The store is not read.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionState::SignedOut);
        Self {
            inner: Arc::new(SessionInner {
                token: ArcSwapOption::empty(),
                store,
                state,
                expirations: AtomicU64::new(0),
            }),
        }
    }

    /// Create a session and load any token persisted in `store`.
    pub fn restore(store: Arc<dyn TokenStore>) -> Result<Self, TokenStoreError> {
        let session = Self::new(store);
        if let Some(token) = session.inner.store.load()? {
            debug!("restored persisted session token");
            session.inner.token.store(Some(Arc::new(token)));
            session.inner.state.send_replace(SessionState::SignedIn);
        }
        Ok(session)
    }

    /// In-memory session, optionally seeded with a token.
    pub fn in_memory(token: Option<&str>) -> Self {
        let store = token.map_or_else(MemoryTokenStore::new, MemoryTokenStore::with_token);
        let session = Self::new(Arc::new(store));
        if let Some(t) = token {
            session
                .inner
                .token
                .store(Some(Arc::new(SecretString::from(t.to_owned()))));
            session.inner.state.send_replace(SessionState::SignedIn);
        }
        session
    }

    /// The current bearer token, if signed in.
    pub fn token(&self) -> Option<Arc<SecretString>> {
        self.inner.token.load_full()
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.token.load().is_some()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Number of times the server has expired this session.
    pub fn expirations(&self) -> u64 {
        self.inner.expirations.load(Ordering::Relaxed)
    }

    /// Adopt a freshly issued token and persist it.
    pub fn sign_in(&self, token: SecretString) -> Result<(), TokenStoreError> {
        self.inner.store.save(&token)?;
        self.inner.token.store(Some(Arc::new(token)));
        self.inner.state.send_replace(SessionState::SignedIn);
        debug!("session signed in");
        Ok(())
    }

    /// Drop the token on user request.
    pub fn sign_out(&self) -> Result<(), TokenStoreError> {
        self.inner.token.store(None);
        self.inner.store.clear()?;
        self.inner.state.send_replace(SessionState::SignedOut);
        debug!("session signed out");
        Ok(())
    }

    /// Drop the token because the server rejected it.
    ///
    /// Called once per 401 response. A failing store is logged, not
    /// propagated: the caller is already handling an auth error.
    pub(crate) fn expire(&self) {
        self.inner.token.store(None);
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "failed to remove persisted token");
        }
        self.inner.expirations.fetch_add(1, Ordering::Relaxed);
        self.inner.state.send_replace(SessionState::Expired);
        warn!("session expired, credentials removed");
    }
}
