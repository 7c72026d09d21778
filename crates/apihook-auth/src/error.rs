//! Auth store errors.

use thiserror::Error;

/// Auth store error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// `use_auth` was called with no provider scope active.
    #[error("use_auth must be used within an AuthProvider")]
    OutsideProvider,
}

impl AuthError {
    /// Check if this is a usage error (a programming mistake at the call site).
    pub fn is_usage_error(&self) -> bool {
        matches!(self, AuthError::OutsideProvider)
    }
}
