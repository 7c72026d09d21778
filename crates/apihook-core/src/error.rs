//! Orchestrator errors and failure reports.

use apihook_data::{NormalizedResponse, FALLBACK_ERROR_MESSAGE};

/// Errors raised while building an orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HookError {
    pub(crate) fn conflicting_sources() -> Self {
        Self::Configuration("provide either api_calling_function or api_config, not both".into())
    }

    pub(crate) fn missing_source() -> Self {
        Self::Configuration("one of api_calling_function or api_config is required".into())
    }

    /// Check if this is a construction-time configuration error.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// What the `on_error` callback receives.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    /// A response outside the success range, or a transport failure.
    Response(NormalizedResponse),
    /// The calling function returned an error.
    Fault(String),
}

impl FetchFailure {
    /// Human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Response(response) => response
                .message()
                .or(response.error.as_deref())
                .unwrap_or(FALLBACK_ERROR_MESSAGE),
            Self::Fault(message) => message,
        }
    }

    /// Status code, when the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response(response) => response.status_code,
            Self::Fault(_) => None,
        }
    }
}
