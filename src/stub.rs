//! Stub rules and pattern-matched resolution.
//!
//! Rules are consulted in registration order; the first rule producing a
//! response wins. A rule that declines (pattern mismatch or a handler
//! returning `None`) is a normal continuation signal, not an error.

use crate::client::CallOptions;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::SoapError;
use crate::sequence::ResponseSequence;
use globset::{Glob, GlobMatcher};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Callback form of a stub: inspects the request and may produce a response.
pub type StubHandler =
    Arc<dyn Fn(&RequestEnvelope, &CallOptions) -> Option<ResponseEnvelope> + Send + Sync>;

/// Pattern matched against the request's RPC action.
#[derive(Clone)]
pub enum ActionPattern {
    /// Exact action match
    Exact(String),
    /// Glob pattern match, `*` wildcard, case-sensitive
    Glob(GlobMatcher),
    /// Regex pattern match
    Regex(Regex),
}

impl ActionPattern {
    pub fn exact(action: impl Into<String>) -> Self {
        Self::Exact(action.into())
    }

    /// Compile a glob pattern.
    ///
    /// A leading `*` is prepended when not already present, so the short
    /// pattern `GetWeather` matches a full action URI ending in that
    /// operation name.
    pub fn glob(pattern: &str) -> Result<Self, SoapError> {
        let expanded = if pattern.starts_with('*') {
            pattern.to_string()
        } else {
            format!("*{pattern}")
        };
        let glob =
            Glob::new(&expanded).map_err(|e| SoapError::invalid_pattern(pattern, e))?;
        Ok(Self::Glob(glob.compile_matcher()))
    }

    pub fn regex(pattern: &str) -> Result<Self, SoapError> {
        let regex = Regex::new(pattern).map_err(|e| SoapError::invalid_pattern(pattern, e))?;
        Ok(Self::Regex(regex))
    }

    pub fn matches(&self, action: &str) -> bool {
        match self {
            Self::Exact(value) => action == value,
            Self::Glob(glob) => glob.is_match(action),
            Self::Regex(regex) => regex.is_match(action),
        }
    }
}

/// Anything acceptable where a canned response is expected: a literal
/// envelope, a callback, or a response sequence.
#[derive(Clone)]
pub enum Responder {
    Envelope(ResponseEnvelope),
    Handler(StubHandler),
    Sequence(ResponseSequence),
}

impl Responder {
    pub fn handler(
        handler: impl Fn(&RequestEnvelope, &CallOptions) -> Option<ResponseEnvelope>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self::Handler(Arc::new(handler))
    }

    /// Resolve this responder for a matched request.
    ///
    /// Only sequences can fail here, by exhausting in strict mode.
    pub fn resolve(
        &self,
        request: &RequestEnvelope,
        options: &CallOptions,
    ) -> Result<Option<ResponseEnvelope>, SoapError> {
        match self {
            Self::Envelope(response) => Ok(Some(response.clone())),
            Self::Handler(handler) => Ok(handler(request, options)),
            Self::Sequence(sequence) => sequence.next_response().map(Some),
        }
    }
}

impl From<ResponseEnvelope> for Responder {
    fn from(response: ResponseEnvelope) -> Self {
        Self::Envelope(response)
    }
}

impl From<ResponseSequence> for Responder {
    fn from(sequence: ResponseSequence) -> Self {
        Self::Sequence(sequence)
    }
}

impl From<Value> for Responder {
    fn from(value: Value) -> Self {
        Self::Envelope(ResponseEnvelope::from_json(&value))
    }
}

/// A registered stub: an optional action pattern plus a responder.
#[derive(Clone)]
pub struct StubRule {
    pattern: Option<ActionPattern>,
    responder: Responder,
}

impl StubRule {
    /// Rule gated on an action pattern.
    pub fn for_pattern(pattern: ActionPattern, responder: impl Into<Responder>) -> Self {
        Self {
            pattern: Some(pattern),
            responder: responder.into(),
        }
    }

    /// Rule consulted for every request.
    pub fn any(responder: impl Into<Responder>) -> Self {
        Self {
            pattern: None,
            responder: responder.into(),
        }
    }

    fn resolve(
        &self,
        request: &RequestEnvelope,
        options: &CallOptions,
    ) -> Result<Option<ResponseEnvelope>, SoapError> {
        if let Some(pattern) = &self.pattern {
            let action = request.action().unwrap_or_default();
            if !pattern.matches(&action) {
                return Ok(None);
            }
        }
        self.responder.resolve(request, options)
    }
}

/// Ordered collection of stub rules owned by one session.
#[derive(Default)]
pub struct StubRegistry {
    rules: Mutex<Vec<StubRule>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StubRule>> {
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a rule. Registration order is resolution order.
    pub fn push(&self, rule: StubRule) {
        self.lock().push(rule);
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Resolve the first rule producing a response, FIFO precedence.
    pub fn resolve(
        &self,
        request: &RequestEnvelope,
        options: &CallOptions,
    ) -> Result<Option<ResponseEnvelope>, SoapError> {
        let rules = self.lock().clone();
        for rule in &rules {
            if let Some(response) = rule.resolve(request, options)? {
                debug!(
                    action = request.action().as_deref().unwrap_or(""),
                    status = response.status(),
                    "Request matched stub"
                );
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonEnvelopeCodec;
    use serde_json::json;
    use std::collections::HashMap;

    fn request_for(action: &str) -> RequestEnvelope {
        let mut headers = HashMap::new();
        headers.insert("SOAPAction".to_string(), vec![action.to_string()]);
        RequestEnvelope::new(
            "POST",
            "https://weather.example/soap",
            headers,
            Vec::new(),
            Arc::new(JsonEnvelopeCodec),
            true,
        )
    }

    #[test]
    fn test_glob_pattern_gets_leading_wildcard() {
        let pattern = ActionPattern::glob("GetWeather").unwrap();
        assert!(pattern.matches("GetWeather"));
        assert!(pattern.matches("http://ns.example/GetWeather"));
        assert!(!pattern.matches("GetWeatherByZIP"));

        let prefix = ActionPattern::glob("Get*").unwrap();
        assert!(prefix.matches("GetWeather"));
        assert!(prefix.matches("http://ns.example/GetWeather"));
        assert!(!prefix.matches("SetWeather"));
    }

    #[test]
    fn test_glob_matching_is_case_sensitive() {
        let pattern = ActionPattern::glob("Get*").unwrap();
        assert!(!pattern.matches("getWeather"));
    }

    #[test]
    fn test_catch_all_glob_matches_everything() {
        let pattern = ActionPattern::glob("*").unwrap();
        assert!(pattern.matches("Anything"));
        assert!(pattern.matches(""));
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        assert!(matches!(
            ActionPattern::glob("Get[Weather"),
            Err(SoapError::InvalidPattern { .. })
        ));
        assert!(ActionPattern::regex("Get(").is_err());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let registry = StubRegistry::new();
        registry.push(StubRule::for_pattern(
            ActionPattern::glob("Get*").unwrap(),
            Responder::from(json!({ "from": "A" })),
        ));
        registry.push(StubRule::for_pattern(
            ActionPattern::glob("GetWeather").unwrap(),
            Responder::from(json!({ "from": "B" })),
        ));
        registry.push(StubRule::for_pattern(
            ActionPattern::glob("*").unwrap(),
            Responder::from(json!({ "from": "fallback" })),
        ));

        let options = CallOptions::default();
        let matched = registry
            .resolve(&request_for("GetWeather"), &options)
            .unwrap()
            .unwrap();
        assert_eq!(matched.json().unwrap(), &json!({ "from": "A" }));

        let fallback = registry
            .resolve(&request_for("Unrelated"), &options)
            .unwrap()
            .unwrap();
        assert_eq!(fallback.json().unwrap(), &json!({ "from": "fallback" }));
    }

    #[test]
    fn test_no_rule_matches_resolves_to_none() {
        let registry = StubRegistry::new();
        registry.push(StubRule::for_pattern(
            ActionPattern::glob("Get*").unwrap(),
            Responder::from(json!({})),
        ));

        let result = registry
            .resolve(&request_for("SetWeather"), &CallOptions::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_declining_handlers_stack() {
        let registry = StubRegistry::new();
        registry.push(StubRule::any(Responder::handler(|_, _| None)));
        registry.push(StubRule::any(Responder::handler(|request, _| {
            (request.action().as_deref() == Some("Ping"))
                .then(|| ResponseEnvelope::from_json(&json!({ "pong": true })))
        })));

        let options = CallOptions::default();
        let hit = registry
            .resolve(&request_for("Ping"), &options)
            .unwrap()
            .unwrap();
        assert_eq!(hit.json().unwrap(), &json!({ "pong": true }));

        assert!(registry
            .resolve(&request_for("Other"), &options)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_sequence_responder_propagates_exhaustion() {
        let sequence = ResponseSequence::new();
        sequence.push(json!({ "n": 1 }));

        let registry = StubRegistry::new();
        registry.push(StubRule::for_pattern(
            ActionPattern::glob("*").unwrap(),
            Responder::from(sequence),
        ));

        let options = CallOptions::default();
        let first = registry
            .resolve(&request_for("Ping"), &options)
            .unwrap()
            .unwrap();
        assert_eq!(first.json().unwrap(), &json!({ "n": 1 }));

        assert!(matches!(
            registry.resolve(&request_for("Ping"), &options),
            Err(SoapError::SequenceExhausted)
        ));
    }

    #[test]
    fn test_exact_and_regex_patterns() {
        assert!(ActionPattern::exact("GetWeather").matches("GetWeather"));
        assert!(!ActionPattern::exact("GetWeather").matches("http://ns/GetWeather"));

        let regex = ActionPattern::regex(r"^Get\w+$").unwrap();
        assert!(regex.matches("GetWeather"));
        assert!(!regex.matches("SetWeather"));
    }
}
