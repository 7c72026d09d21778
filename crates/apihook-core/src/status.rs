//! Status code classification.

use std::fmt;

/// Outcome class of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// 100-103.
    Informational,
    /// 200-208 and 226.
    Success,
    /// 300-308.
    Redirect,
    /// 400, 402, 404-431 and 451.
    ClientError,
    /// 401 and 403.
    AuthFailure,
    /// 500-511.
    ServerError,
    /// Anything else, including a missing status.
    Unknown,
}

/// Inclusive ranges, checked in order.
const STATUS_TABLE: &[(u16, u16, StatusClass)] = &[
    (100, 103, StatusClass::Informational),
    (200, 208, StatusClass::Success),
    (226, 226, StatusClass::Success),
    (300, 308, StatusClass::Redirect),
    (401, 401, StatusClass::AuthFailure),
    (403, 403, StatusClass::AuthFailure),
    (400, 431, StatusClass::ClientError),
    (451, 451, StatusClass::ClientError),
    (500, 511, StatusClass::ServerError),
];

impl StatusClass {
    /// Classify a status code.
    pub fn of(status: Option<u16>) -> Self {
        let Some(code) = status else {
            return Self::Unknown;
        };
        STATUS_TABLE
            .iter()
            .find(|(low, high, _)| (*low..=*high).contains(&code))
            .map_or(Self::Unknown, |(_, _, class)| *class)
    }

    /// Error message used when the response body carries none.
    ///
    /// `None` for classes that never produce an error state.
    pub fn fallback_message(self) -> Option<&'static str> {
        match self {
            Self::ClientError => Some("Client error"),
            Self::ServerError => Some("Server error"),
            Self::Unknown => Some("Unexpected status code"),
            Self::Informational | Self::Success | Self::Redirect | Self::AuthFailure => None,
        }
    }

    /// Short name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Informational => "informational",
            Self::Success => "success",
            Self::Redirect => "redirect",
            Self::ClientError => "client_error",
            Self::AuthFailure => "auth_failure",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
