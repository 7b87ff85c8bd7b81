//! Session token access for remote calls.

use std::sync::{Arc, PoisonError, RwLock};

/// Supplies the authentication token for remote API calls.
///
/// Read once per listener iteration, right before the remote call. The
/// dashboard never caches or refreshes the token itself.
pub trait SessionProvider: Send + Sync + 'static {
    /// The current token. An empty string means "not signed in".
    fn token(&self) -> String;
}

/// A shared, refreshable token string.
///
/// Cloning shares the underlying lock, so the session layer can rotate the
/// token with [`set`](SharedToken::set) and the next remote call picks it up.
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    token: Arc<RwLock<String>>,
}

impl SharedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token.into())),
        }
    }

    /// Wrap a lock owned by the session layer.
    pub fn from_shared(token: Arc<RwLock<String>>) -> Self {
        Self { token }
    }

    /// Replace the token for all clones of this handle.
    pub fn set(&self, token: impl Into<String>) {
        // A writer cannot leave a `String` half-written, so a poisoned lock
        // still holds a usable value.
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.into();
    }
}

impl SessionProvider for SharedToken {
    fn token(&self) -> String {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
