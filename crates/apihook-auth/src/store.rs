//! The shared auth store.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use apihook_data::SharedExecutor;

use crate::action::{find_action, Callback, CustomAction};
use crate::config::AuthConfig;

/// Subtree-scoped holder of the bearer token, base URL and override hooks.
///
/// Cloning an `AuthStore` yields another handle to the same store; setters
/// on one handle are observed by the next read through any other. The
/// logout callback, custom actions and custom executor are fixed at build
/// time; token and base URL change through [`AuthStore::set_token`] and
/// [`AuthStore::set_base_url`].
#[derive(Clone, Default)]
pub struct AuthStore {
    inner: Arc<RwLock<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    token: Option<String>,
    base_url: Option<String>,
    logout: Option<Callback>,
    custom_actions: Vec<CustomAction>,
    custom_executor: Option<SharedExecutor>,
}

impl AuthStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a store.
    pub fn builder() -> AuthStoreBuilder {
        AuthStoreBuilder::default()
    }

    /// Create a store seeded from configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut builder = Self::builder();
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url.clone());
        }
        if let Some(token) = &config.token {
            builder = builder.token(token.clone());
        }
        builder.build()
    }

    /// Create a store holding only a logout callback.
    pub fn with_logout<F>(logout: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::builder().logout(logout).build()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current bearer token.
    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    /// Replace the bearer token.
    pub fn set_token(&self, token: impl Into<String>) {
        self.write().token = Some(token.into());
        tracing::debug!("auth store token updated");
    }

    /// Remove the bearer token.
    pub fn clear_token(&self) {
        self.write().token = None;
    }

    /// Current base URL.
    pub fn base_url(&self) -> Option<String> {
        self.read().base_url.clone()
    }

    /// Replace the base URL.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        tracing::debug!(base_url = %base_url, "auth store base url updated");
        self.write().base_url = Some(base_url);
    }

    /// Logout callback.
    pub fn logout(&self) -> Option<Callback> {
        self.read().logout.clone()
    }

    /// Custom status actions, in evaluation order.
    pub fn custom_actions(&self) -> Vec<CustomAction> {
        self.read().custom_actions.clone()
    }

    /// First custom action that handles `status`.
    pub fn find_custom_action(&self, status: Option<u16>) -> Option<CustomAction> {
        find_action(&self.read().custom_actions, status).cloned()
    }

    /// Executor that replaces the default one, if any.
    pub fn custom_executor(&self) -> Option<SharedExecutor> {
        self.read().custom_executor.clone()
    }

    /// Check whether two handles point at the same store.
    pub fn ptr_eq(&self, other: &AuthStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("AuthStore")
            .field("has_token", &state.token.is_some())
            .field("base_url", &state.base_url)
            .field("has_logout", &state.logout.is_some())
            .field("custom_actions", &state.custom_actions)
            .field("has_custom_executor", &state.custom_executor.is_some())
            .finish()
    }
}

/// Builder for [`AuthStore`].
#[derive(Default)]
pub struct AuthStoreBuilder {
    state: StoreState,
}

impl AuthStoreBuilder {
    /// Set the initial bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.state.token = Some(token.into());
        self
    }

    /// Set the initial base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.state.base_url = Some(base_url.into());
        self
    }

    /// Set the logout callback.
    pub fn logout<F>(mut self, logout: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.state.logout = Some(Arc::new(logout));
        self
    }

    /// Append a custom status action. Earlier actions win.
    pub fn custom_action(mut self, action: CustomAction) -> Self {
        self.state.custom_actions.push(action);
        self
    }

    /// Append a custom status action from codes and a callback.
    pub fn on_status<F>(self, codes: impl IntoIterator<Item = u16>, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.custom_action(CustomAction::new(codes, action))
    }

    /// Replace the default executor for every orchestrator using this store.
    pub fn custom_executor(mut self, executor: SharedExecutor) -> Self {
        self.state.custom_executor = Some(executor);
        self
    }

    /// Build the store.
    pub fn build(self) -> AuthStore {
        AuthStore {
            inner: Arc::new(RwLock::new(self.state)),
        }
    }
}
