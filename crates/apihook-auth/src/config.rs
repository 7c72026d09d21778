//! Store seed configuration.

use serde::{Deserialize, Serialize};

/// Initial values for an [`crate::AuthStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Prefix prepended to every relative endpoint.
    pub base_url: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
}

impl AuthConfig {
    /// Create a configuration with a base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            token: None,
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
