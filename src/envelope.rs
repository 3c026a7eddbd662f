//! Immutable request and response envelopes.
//!
//! Wrappers over raw message data flowing through the pipeline. Envelopes are
//! created per call and discarded; neither type exposes mutation once built.

use crate::codec::ProtocolCodec;
use crate::error::SoapError;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Body content for a canned response.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    /// Plain text body
    Text { content: String },
    /// JSON body
    Json { content: Value },
    /// Base64 encoded binary
    Base64 { content: String },
    /// Load from file
    File { path: String },
}

impl ResponseBody {
    /// Get the body content as bytes.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        match self {
            ResponseBody::Text { content } => Ok(content.as_bytes().to_vec()),
            ResponseBody::Json { content } => Ok(serde_json::to_string(content)?.into_bytes()),
            ResponseBody::Base64 { content } => {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD
                    .decode(content)
                    .map_err(|e| anyhow::anyhow!("Invalid base64: {}", e))
            }
            ResponseBody::File { path } => std::fs::read(path)
                .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path, e)),
        }
    }

    /// Get the content type for this body.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseBody::Text { .. } => "text/plain",
            ResponseBody::Json { .. } => "application/json",
            ResponseBody::Base64 { .. } => "application/octet-stream",
            ResponseBody::File { .. } => "application/octet-stream",
        }
    }
}

/// An outgoing RPC request snapshot.
///
/// The envelope owns the raw body bytes; `action()` and `arguments()` are
/// derived through the codec on every call. Decoding is pure, so repeated
/// `arguments()` calls yield equal results without caching.
#[derive(Clone)]
pub struct RequestEnvelope {
    method: String,
    uri: String,
    headers: HashMap<String, Vec<String>>,
    body: Vec<u8>,
    codec: Arc<dyn ProtocolCodec>,
    wrap_arguments_in_array: bool,
}

impl RequestEnvelope {
    pub fn new(
        method: impl Into<String>,
        uri: impl Into<String>,
        headers: HashMap<String, Vec<String>>,
        body: Vec<u8>,
        codec: Arc<dyn ProtocolCodec>,
        wrap_arguments_in_array: bool,
    ) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers,
            body,
            codec,
            wrap_arguments_in_array,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The URL the request is addressed to.
    pub fn url(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &HashMap<String, Vec<String>> {
        &self.headers
    }

    /// Values for the header with the given name, empty when absent.
    ///
    /// Header lookup is case-insensitive.
    pub fn header(&self, name: &str) -> &[String] {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the request carries the given header with at least one value.
    pub fn has_header(&self, name: &str) -> bool {
        !self.header(name).is_empty()
    }

    /// Whether the header is present and carries the given value.
    pub fn has_header_value(&self, name: &str, value: &str) -> bool {
        self.header(name).iter().any(|v| v == value)
    }

    /// Whether the header is present and carries every one of the given values.
    pub fn has_header_values(&self, name: &str, values: &[&str]) -> bool {
        values.iter().all(|v| self.has_header_value(name, v))
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body bytes rendered as text.
    pub fn body_string(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The normalized RPC action, as detected by the codec.
    ///
    /// Surrounding quoting is stripped, so a `SOAPAction: "GetWeather"` header
    /// yields `GetWeather`.
    pub fn action(&self) -> Option<String> {
        self.codec
            .detect_action(self)
            .map(|raw| raw.replace('"', ""))
    }

    /// Decode the body into an ordered argument map.
    pub fn arguments(&self) -> Result<Map<String, Value>, SoapError> {
        self.codec.decode(&self.body, self.wrap_arguments_in_array)
    }

    /// Read-only access to a single decoded argument.
    pub fn argument(&self, name: &str) -> Result<Option<Value>, SoapError> {
        Ok(self.arguments()?.get(name).cloned())
    }
}

impl fmt::Debug for RequestEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEnvelope")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// A received (or canned) RPC response.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    /// JSON decode of the body, computed once on first access.
    decoded: OnceLock<Option<Value>>,
}

impl ResponseEnvelope {
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            decoded: OnceLock::new(),
        }
    }

    /// The default empty response: status 200 with an empty JSON object body.
    pub fn empty() -> Self {
        Self::new(200, HashMap::new(), b"{}".to_vec())
    }

    /// A 200 response carrying the given JSON value as its body.
    pub fn from_json(value: &Value) -> Self {
        let body = serde_json::to_vec(value).expect("serializing a JSON value does not fail");
        Self::new(200, HashMap::new(), body)
    }

    /// A 200 response wrapping plain text as `{"response": text}`.
    pub fn from_text(text: &str) -> Self {
        Self::from_json(&serde_json::json!({ "response": text }))
    }

    /// Build a response from a [`ResponseBody`] definition.
    pub fn from_body(body: &ResponseBody, status: u16) -> anyhow::Result<Self> {
        Ok(Self::new(status, HashMap::new(), body.to_bytes()?))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Value of the header with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_string(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Whether the status code is exactly 200.
    pub fn ok(&self) -> bool {
        self.status == 200
    }

    /// Whether the status code is in the 2xx range.
    pub fn successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status code is in the 3xx range.
    pub fn redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Whether the status code is in the 4xx range.
    pub fn client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Whether the status code is 500 or above.
    pub fn server_error(&self) -> bool {
        self.status >= 500
    }

    /// Whether a client or server error occurred.
    pub fn failed(&self) -> bool {
        self.client_error() || self.server_error()
    }

    /// The JSON decoded body, memoized on first access.
    ///
    /// Returns `None` when the body is not valid JSON.
    pub fn json(&self) -> Option<&Value> {
        self.decoded
            .get_or_init(|| serde_json::from_slice(&self.body).ok())
            .as_ref()
    }

    /// Dotted-path lookup into the decoded JSON body.
    ///
    /// Path segments traverse object keys and numeric array indices, e.g.
    /// `"users.0.name"`.
    pub fn json_path(&self, path: &str) -> Option<&Value> {
        let mut current = self.json()?;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Dotted-path lookup with a default fallback.
    pub fn json_path_or(&self, path: &str, default: Value) -> Value {
        self.json_path(path).cloned().unwrap_or(default)
    }

    /// Decode the body into a structured JSON value, fresh on every call.
    pub fn object(&self) -> Result<Value, SoapError> {
        serde_json::from_slice(&self.body).map_err(|e| SoapError::decode(e.to_string()))
    }

    /// Return the response, or a `RequestFailed` error when the status is
    /// 4xx/5xx.
    pub fn error_for_status(self) -> Result<Self, SoapError> {
        self.error_for_status_with(|_| {})
    }

    /// Like [`error_for_status`](Self::error_for_status), invoking `callback`
    /// with the offending response before the error is raised.
    pub fn error_for_status_with(
        self,
        callback: impl FnOnce(&ResponseEnvelope),
    ) -> Result<Self, SoapError> {
        if self.failed() {
            callback(&self);
            return Err(SoapError::RequestFailed {
                response: Box::new(self),
            });
        }
        Ok(self)
    }

    /// Conditional variant of [`error_for_status`](Self::error_for_status).
    pub fn error_for_status_if(self, condition: bool) -> Result<Self, SoapError> {
        if condition {
            self.error_for_status()
        } else {
            Ok(self)
        }
    }

    /// Invoke the callback when the response failed, returning self unchanged.
    pub fn on_error(self, callback: impl FnOnce(&ResponseEnvelope)) -> Self {
        if self.failed() {
            callback(&self);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonEnvelopeCodec;
    use serde_json::json;

    fn make_request(headers: HashMap<String, Vec<String>>, body: Vec<u8>) -> RequestEnvelope {
        RequestEnvelope::new(
            "POST",
            "https://weather.example/soap",
            headers,
            body,
            Arc::new(JsonEnvelopeCodec),
            true,
        )
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert(
            "Content-Type".to_string(),
            vec!["application/soap+xml".to_string()],
        );
        let request = make_request(headers, Vec::new());

        assert!(request.has_header("content-type"));
        assert!(request.has_header_value("CONTENT-TYPE", "application/soap+xml"));
        assert!(!request.has_header("authorization"));
        assert!(request.header("missing").is_empty());
    }

    #[test]
    fn test_has_header_values_requires_every_value() {
        let mut headers = HashMap::new();
        headers.insert(
            "Accept".to_string(),
            vec!["text/xml".to_string(), "application/json".to_string()],
        );
        let request = make_request(headers, Vec::new());

        assert!(request.has_header_values("Accept", &["text/xml"]));
        assert!(request.has_header_values("Accept", &["text/xml", "application/json"]));
        assert!(!request.has_header_values("Accept", &["text/xml", "text/html"]));
    }

    #[test]
    fn test_action_strips_quoting() {
        let mut headers = HashMap::new();
        headers.insert(
            "SOAPAction".to_string(),
            vec!["\"GetWeather\"".to_string()],
        );
        let request = make_request(headers, Vec::new());

        assert_eq!(request.action().as_deref(), Some("GetWeather"));
    }

    #[test]
    fn test_arguments_decode_is_deterministic() {
        let body = serde_json::to_vec(&json!({
            "Body": { "Submit_User": [{ "prename": "Corona", "lastname": "Pandemic" }] }
        }))
        .unwrap();
        let request = make_request(HashMap::new(), body);

        let first = request.arguments().unwrap();
        let second = request.arguments().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            request.argument("prename").unwrap(),
            Some(json!("Corona"))
        );
    }

    #[test]
    fn test_arguments_decode_failure_is_an_error() {
        let request = make_request(HashMap::new(), b"not json".to_vec());
        assert!(matches!(
            request.arguments(),
            Err(SoapError::Decode { .. })
        ));
    }

    #[test]
    fn test_status_predicates() {
        assert!(ResponseEnvelope::empty().ok());
        assert!(ResponseEnvelope::empty().successful());
        assert!(ResponseEnvelope::empty().with_status(302).redirect());
        assert!(ResponseEnvelope::empty().with_status(404).client_error());
        assert!(ResponseEnvelope::empty().with_status(503).server_error());
        assert!(ResponseEnvelope::empty().with_status(404).failed());
        assert!(!ResponseEnvelope::empty().with_status(204).failed());
    }

    #[test]
    fn test_json_is_memoized_and_path_lookup_works() {
        let response = ResponseEnvelope::from_json(&json!({
            "users": [{ "name": "test", "field": "bla" }]
        }));

        let first = response.json().unwrap() as *const Value;
        let second = response.json().unwrap() as *const Value;
        assert_eq!(first, second);

        assert_eq!(
            response.json_path("users.0.name"),
            Some(&json!("test"))
        );
        assert_eq!(response.json_path("users.7.name"), None);
        assert_eq!(
            response.json_path_or("users.0.missing", json!("fallback")),
            json!("fallback")
        );
    }

    #[test]
    fn test_object_decodes_fresh_each_call() {
        let response = ResponseEnvelope::from_json(&json!({ "a": 1 }));
        assert_eq!(response.object().unwrap(), json!({ "a": 1 }));
        assert_eq!(response.object().unwrap(), json!({ "a": 1 }));

        let invalid = ResponseEnvelope::new(200, HashMap::new(), b"<oops>".to_vec());
        assert!(invalid.object().is_err());
    }

    #[test]
    fn test_from_text_wraps_body() {
        let response = ResponseEnvelope::from_text("Test");
        assert_eq!(response.json().unwrap(), &json!({ "response": "Test" }));
    }

    #[test]
    fn test_error_for_status_invokes_callback_and_carries_response() {
        let mut seen = None;
        let result = ResponseEnvelope::empty()
            .with_status(500)
            .error_for_status_with(|response| seen = Some(response.status()));

        assert_eq!(seen, Some(500));
        match result {
            Err(SoapError::RequestFailed { response }) => assert_eq!(response.status(), 500),
            other => panic!("expected RequestFailed, got {other:?}"),
        }

        assert!(ResponseEnvelope::empty().error_for_status().is_ok());
        assert!(ResponseEnvelope::empty()
            .with_status(500)
            .error_for_status_if(false)
            .is_ok());
    }

    #[test]
    fn test_response_body_to_bytes() {
        let text = ResponseBody::Text {
            content: "hello".to_string(),
        };
        assert_eq!(text.to_bytes().unwrap(), b"hello");

        let json = ResponseBody::Json {
            content: json!({"key": "value"}),
        };
        assert!(String::from_utf8(json.to_bytes().unwrap())
            .unwrap()
            .contains("key"));

        let b64 = ResponseBody::Base64 {
            content: "aGVsbG8=".to_string(),
        };
        assert_eq!(b64.to_bytes().unwrap(), b"hello");
        assert_eq!(b64.content_type(), "application/octet-stream");
    }
}
