//! Normalized responses.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::FetchError;

/// Message used when a failure carries no message of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

/// The uniform `{data, statusCode, error}` shape returned by every executor.
///
/// A response either carries a status code (the server answered) or an
/// error message with no status code (the transport failed). `data` is null
/// on transport failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    /// Decoded JSON body.
    #[serde(default)]
    pub data: Value,
    /// HTTP status code.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Transport failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NormalizedResponse {
    /// Create a response the server answered.
    pub fn new(status_code: u16, data: Value) -> Self {
        Self {
            data,
            status_code: Some(status_code),
            error: None,
        }
    }

    /// Create a response with a status code and no body.
    pub fn status(status_code: u16) -> Self {
        Self::new(status_code, Value::Null)
    }

    /// Create a transport failure.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            data: Value::Null,
            status_code: None,
            error: Some(if message.is_empty() {
                FALLBACK_ERROR_MESSAGE.to_string()
            } else {
                message
            }),
        }
    }

    /// Fold an executor error into a transport failure.
    pub fn from_error(error: &FetchError) -> Self {
        Self::failure(error.to_string())
    }

    /// Check if the transport failed before a status was received.
    pub fn is_transport_failure(&self) -> bool {
        self.status_code.is_none()
    }

    /// The `msg` field of the body, when it is a string.
    pub fn message(&self) -> Option<&str> {
        self.data.get("msg").and_then(Value::as_str)
    }

    /// Deserialize the body.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_value(self.data.clone()).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// The whole response as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === Constructor Tests ===

    #[test]
    fn test_new_response() {
        let resp = NormalizedResponse::new(200, json!({"id": 1}));
        assert_eq!(resp.status_code, Some(200));
        assert!(resp.error.is_none());
        assert!(!resp.is_transport_failure());
    }

    #[test]
    fn test_failure_has_no_status_or_data() {
        let resp = NormalizedResponse::failure("connection refused");
        assert!(resp.is_transport_failure());
        assert_eq!(resp.data, Value::Null);
        assert_eq!(resp.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_failure_empty_message_falls_back() {
        let resp = NormalizedResponse::failure("");
        assert_eq!(resp.error.as_deref(), Some(FALLBACK_ERROR_MESSAGE));
    }

    #[test]
    fn test_from_error() {
        let resp = NormalizedResponse::from_error(&FetchError::Timeout);
        assert_eq!(resp.error.as_deref(), Some("Request timed out"));
    }

    // === Body Tests ===

    #[test]
    fn test_message() {
        let resp = NormalizedResponse::new(500, json!({"msg": "boom"}));
        assert_eq!(resp.message(), Some("boom"));

        let resp = NormalizedResponse::new(500, json!({"msg": 5}));
        assert_eq!(resp.message(), None);

        assert_eq!(NormalizedResponse::status(404).message(), None);
    }

    #[test]
    fn test_data_as() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct User {
            id: i32,
        }

        let resp = NormalizedResponse::new(200, json!({"id": 7}));
        assert_eq!(resp.data_as::<User>().unwrap(), User { id: 7 });
        assert!(NormalizedResponse::status(200).data_as::<User>().is_err());
    }

    // === Serialization Tests ===

    #[test]
    fn test_wire_shape() {
        let value = NormalizedResponse::new(201, json!({"id": 1})).to_value();
        assert_eq!(value, json!({"data": {"id": 1}, "statusCode": 201}));

        let value = NormalizedResponse::failure("offline").to_value();
        assert_eq!(
            value,
            json!({"data": null, "statusCode": null, "error": "offline"})
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let resp: NormalizedResponse = serde_json::from_value(json!({"statusCode": 403})).unwrap();
        assert_eq!(resp.status_code, Some(403));
        assert_eq!(resp.data, Value::Null);
    }
}
