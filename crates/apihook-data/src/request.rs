//! Request descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP methods accepted by a request descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Convert to HTTP method string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Convert to the `http` crate's method type.
    pub fn to_http(self) -> http::Method {
        match self {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RequestBody {
    /// Serialized as JSON; the executor sets `Content-Type: application/json`.
    Json(Value),
    /// Pre-encoded form or multipart payload, sent as-is. The caller owns the
    /// `Content-Type` header (multipart boundaries live there).
    Form(Vec<u8>),
}

impl RequestBody {
    /// Check if this is a raw form payload.
    pub fn is_form(&self) -> bool {
        matches!(self, RequestBody::Form(_))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

/// Structured description of an HTTP request before execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    /// Path appended to `url`.
    pub endpoint: String,
    /// Base URL; overrides the store's base URL when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// HTTP method.
    #[serde(default)]
    pub method: Method,
    /// Request payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
    /// Bearer token; overrides the store's token when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Attach `Authorization: Bearer <token>` when a token is present.
    #[serde(default)]
    pub is_authentication_required: bool,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// Create a GET descriptor for an endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set a JSON body.
    pub fn with_json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    /// Set a raw form body.
    pub fn with_form(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(RequestBody::Form(bytes.into()));
        self
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Require authentication.
    pub fn with_authentication(mut self, required: bool) -> Self {
        self.is_authentication_required = required;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Final URL: plain concatenation of `url` and `endpoint`.
    pub fn full_url(&self) -> String {
        format!("{}{}", self.url.as_deref().unwrap_or_default(), self.endpoint)
    }

    /// Headers as they go on the wire.
    ///
    /// Caller headers first, then `Content-Type: application/json` unless the
    /// body is a form payload, then the bearer header when authentication is
    /// required and a non-empty token is present.
    pub fn outgoing_headers(&self) -> BTreeMap<String, String> {
        let mut headers = self.headers.clone();

        let is_form = self.body.as_ref().is_some_and(RequestBody::is_form);
        if !is_form {
            set_header(&mut headers, "Content-Type", "application/json".to_string());
        }

        if self.is_authentication_required {
            if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
                set_header(&mut headers, "Authorization", format!("Bearer {token}"));
            }
        }

        headers
    }

    /// Body bytes as they go on the wire.
    pub fn body_bytes(&self) -> Result<Option<Vec<u8>>, crate::FetchError> {
        match &self.body {
            None | Some(RequestBody::Json(Value::Null)) => Ok(None),
            Some(RequestBody::Json(value)) => Ok(Some(serde_json::to_vec(value)?)),
            Some(RequestBody::Form(bytes)) => Ok(Some(bytes.clone())),
        }
    }
}

/// Replace a header regardless of the caller's key casing.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === Method Tests ===

    #[test]
    fn test_method_default_is_get() {
        assert_eq!(Method::default(), Method::Get);
        assert_eq!(RequestDescriptor::new("/x").method, Method::Get);
    }

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
        assert!("HEAD".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_to_http() {
        assert_eq!(Method::Post.to_http(), http::Method::POST);
    }

    // === URL Tests ===

    #[test]
    fn test_full_url_is_plain_concatenation() {
        let req = RequestDescriptor::new("users").with_url("https://api.test/");
        assert_eq!(req.full_url(), "https://api.test/users");

        let req = RequestDescriptor::new("/users").with_url("https://api.test/");
        assert_eq!(req.full_url(), "https://api.test//users");
    }

    #[test]
    fn test_full_url_without_base() {
        assert_eq!(RequestDescriptor::new("/users").full_url(), "/users");
    }

    // === Header Tests ===

    #[test]
    fn test_json_content_type_overrides_caller() {
        let req = RequestDescriptor::new("/x").with_header("Content-Type", "text/plain");
        assert_eq!(
            req.outgoing_headers().get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_content_type_override_ignores_key_case() {
        let req = RequestDescriptor::new("/x").with_header("content-type", "text/plain");
        let headers = req.outgoing_headers();
        assert!(!headers.contains_key("content-type"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_form_body_keeps_caller_content_type() {
        let req = RequestDescriptor::new("/upload")
            .with_header("Content-Type", "multipart/form-data; boundary=xyz")
            .with_form(b"--xyz--".to_vec());
        let headers = req.outgoing_headers();
        assert_eq!(
            headers.get("Content-Type").map(String::as_str),
            Some("multipart/form-data; boundary=xyz")
        );
    }

    #[test]
    fn test_bearer_only_when_required_and_present() {
        let req = RequestDescriptor::new("/x").with_token("abc");
        assert!(!req.outgoing_headers().contains_key("Authorization"));

        let req = req.with_authentication(true);
        assert_eq!(
            req.outgoing_headers().get("Authorization").map(String::as_str),
            Some("Bearer abc")
        );

        let req = RequestDescriptor::new("/x")
            .with_authentication(true)
            .with_token("");
        assert!(!req.outgoing_headers().contains_key("Authorization"));
    }

    // === Body Tests ===

    #[test]
    fn test_body_bytes() {
        let req = RequestDescriptor::new("/x").with_json(json!({"a": 1}));
        assert_eq!(req.body_bytes().unwrap(), Some(br#"{"a":1}"#.to_vec()));

        let req = RequestDescriptor::new("/x").with_json(Value::Null);
        assert_eq!(req.body_bytes().unwrap(), None);

        assert_eq!(RequestDescriptor::new("/x").body_bytes().unwrap(), None);
    }

    #[test]
    fn test_descriptor_deserialize_defaults() {
        let req: RequestDescriptor = serde_json::from_value(json!({
            "endpoint": "/users",
            "isAuthenticationRequired": true
        }))
        .unwrap();
        assert_eq!(req.method, Method::Get);
        assert!(req.is_authentication_required);
        assert!(req.url.is_none());
        assert!(req.headers.is_empty());
    }
}
