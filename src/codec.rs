//! Protocol codec seam.
//!
//! The pipeline treats message bodies as opaque bytes; a [`ProtocolCodec`]
//! owns the wire shape. Implementations must be pure and deterministic so
//! repeated decodes of the same body always agree.

use crate::envelope::RequestEnvelope;
use crate::error::SoapError;
use serde_json::{json, Map, Value};

/// Encodes arguments into message bodies and back, and identifies the RPC
/// action a request targets.
pub trait ProtocolCodec: Send + Sync {
    /// Encode the call arguments into a message body.
    ///
    /// When `wrap_arguments_in_array` is set, the operation payload is the
    /// single-element array `[arguments]`.
    fn encode(
        &self,
        action: &str,
        arguments: &Value,
        wrap_arguments_in_array: bool,
    ) -> Result<Vec<u8>, SoapError>;

    /// Decode a message body back into an ordered argument map.
    fn decode(
        &self,
        body: &[u8],
        wrap_arguments_in_array: bool,
    ) -> Result<Map<String, Value>, SoapError>;

    /// Detect the raw action identifier for a request, if any.
    ///
    /// The returned value may still carry protocol quoting; normalization
    /// happens in [`RequestEnvelope::action`].
    fn detect_action(&self, request: &RequestEnvelope) -> Option<String>;
}

/// Reference codec using a JSON rendition of the envelope/body/operation
/// nesting. XML codecs live outside this crate and plug in through
/// [`ProtocolCodec`].
///
/// Wire shape: `{"Body": {"<action>": <payload>}}` where `<payload>` is the
/// argument object, wrapped in a single-element array when configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEnvelopeCodec;

impl ProtocolCodec for JsonEnvelopeCodec {
    fn encode(
        &self,
        action: &str,
        arguments: &Value,
        wrap_arguments_in_array: bool,
    ) -> Result<Vec<u8>, SoapError> {
        let payload = if wrap_arguments_in_array {
            json!({ "Body": { action: [arguments] } })
        } else {
            json!({ "Body": { action: arguments } })
        };
        serde_json::to_vec(&payload).map_err(|e| SoapError::decode(e.to_string()))
    }

    fn decode(
        &self,
        body: &[u8],
        wrap_arguments_in_array: bool,
    ) -> Result<Map<String, Value>, SoapError> {
        let document: Value =
            serde_json::from_slice(body).map_err(|e| SoapError::decode(e.to_string()))?;

        let operations = document
            .get("Body")
            .and_then(Value::as_object)
            .ok_or_else(|| SoapError::decode("message has no Body element"))?;

        let (_, payload) = operations
            .iter()
            .next()
            .ok_or_else(|| SoapError::decode("message Body carries no operation"))?;

        let arguments = if wrap_arguments_in_array {
            payload
                .get(0)
                .ok_or_else(|| SoapError::decode("operation payload is not a wrapped array"))?
        } else {
            payload
        };

        arguments
            .as_object()
            .cloned()
            .ok_or_else(|| SoapError::decode("operation arguments are not a map"))
    }

    fn detect_action(&self, request: &RequestEnvelope) -> Option<String> {
        // SOAP 1.1 carries the action in its own header, 1.2 as a
        // content-type parameter.
        if let Some(action) = request.header("SOAPAction").first() {
            return Some(action.clone());
        }
        request
            .header("Content-Type")
            .iter()
            .find_map(|value| action_parameter(value))
    }
}

fn action_parameter(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("action=")
            .map(|action| action.to_string())
    })
}
