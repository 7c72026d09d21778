//! Provider scope and the `use_auth` accessor.
//!
//! A provider makes one [`AuthStore`] the ambient store for a task (or a
//! synchronous closure). Orchestrators normally receive their store
//! explicitly; the scope exists for code deep in a call tree that only needs
//! the token and base URL.
//!
//! Task-local scopes do not follow `tokio::spawn`; re-enter the provider in
//! the spawned task.

use std::future::Future;

use crate::{AuthError, AuthStore};

tokio::task_local! {
    static CURRENT_STORE: AuthStore;
}

/// Makes a store the ambient store for a subtree of work.
#[derive(Debug, Clone)]
pub struct AuthProvider {
    store: AuthStore,
}

impl AuthProvider {
    /// Create a provider for a store.
    pub fn new(store: AuthStore) -> Self {
        Self { store }
    }

    /// The provided store.
    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    /// Run a future with this provider's store in scope.
    pub async fn scope<F>(&self, f: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_STORE.scope(self.store.clone(), f).await
    }

    /// Run a closure with this provider's store in scope.
    pub fn sync_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT_STORE.sync_scope(self.store.clone(), f)
    }
}

/// The store of the innermost active provider, if any.
pub fn current_store() -> Option<AuthStore> {
    CURRENT_STORE.try_with(AuthStore::clone).ok()
}

/// Token and base URL accessors for the ambient store.
///
/// # Errors
///
/// Returns [`AuthError::OutsideProvider`] when no provider scope is active.
pub fn use_auth() -> Result<AuthHandle, AuthError> {
    match current_store() {
        Some(store) => Ok(AuthHandle { store }),
        None => {
            tracing::warn!("use_auth called outside an AuthProvider");
            Err(AuthError::OutsideProvider)
        }
    }
}

/// Token and base URL view of a store, as returned by [`use_auth`].
#[derive(Debug, Clone)]
pub struct AuthHandle {
    store: AuthStore,
}

impl AuthHandle {
    /// Current bearer token.
    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    /// Replace the bearer token.
    pub fn set_token(&self, token: impl Into<String>) {
        self.store.set_token(token);
    }

    /// Current base URL.
    pub fn base_url(&self) -> Option<String> {
        self.store.base_url()
    }

    /// Replace the base URL.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        self.store.set_base_url(base_url);
    }
}
