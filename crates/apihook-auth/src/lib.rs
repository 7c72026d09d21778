//! Shared auth store for apihook.
//!
//! Provides the subtree-scoped store read by every orchestrator, the
//! provider scope, and custom status-code actions.

mod action;
mod config;
mod error;
mod provider;
mod store;

pub use action::{Callback, CustomAction};
pub use config::AuthConfig;
pub use error::AuthError;
pub use provider::{current_store, use_auth, AuthHandle, AuthProvider};
pub use store::{AuthStore, AuthStoreBuilder};
