//! Ordered queues of canned responses.

use crate::envelope::{ResponseBody, ResponseEnvelope};
use crate::error::SoapError;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An ordered FIFO queue of canned responses, consumed one per invocation.
///
/// A sequence starts strict: invoking it when depleted raises
/// [`SoapError::SequenceExhausted`]. [`when_empty`](Self::when_empty) switches
/// it permanently to lenient mode, where the configured fallback is returned
/// indefinitely without touching the queue. Handles are cheap clones sharing
/// one queue, and popping is atomic, so two consumers never receive the same
/// queued item.
#[derive(Debug, Clone)]
pub struct ResponseSequence {
    inner: Arc<Mutex<SequenceState>>,
}

impl Default for ResponseSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct SequenceState {
    responses: VecDeque<ResponseEnvelope>,
    /// Cleared once by `when_empty`, never set again.
    fail_when_empty: bool,
    empty_fallback: Option<ResponseEnvelope>,
}

impl ResponseSequence {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SequenceState {
                responses: VecDeque::new(),
                fail_when_empty: true,
                empty_fallback: None,
            })),
        }
    }

    /// Build a sequence preloaded with the given responses, in order.
    pub fn from_responses(responses: impl IntoIterator<Item = ResponseEnvelope>) -> Self {
        let sequence = Self::new();
        for response in responses {
            sequence.push_response(response);
        }
        sequence
    }

    fn lock(&self) -> MutexGuard<'_, SequenceState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a 200 response carrying the given JSON value.
    pub fn push(&self, value: Value) -> &Self {
        self.push_response(ResponseEnvelope::from_json(&value))
    }

    /// Append a 200 response wrapping plain text as `{"response": text}`.
    pub fn push_text(&self, text: &str) -> &Self {
        self.push_response(ResponseEnvelope::from_text(text))
    }

    /// Append a bodiless response with the given status code.
    pub fn push_status(&self, status: u16) -> &Self {
        self.push_response(ResponseEnvelope::new(
            status,
            Default::default(),
            Vec::new(),
        ))
    }

    /// Append a 200 response with the contents of a file as its body.
    pub fn push_file(&self, path: impl Into<String>) -> anyhow::Result<&Self> {
        let body = ResponseBody::File { path: path.into() }.to_bytes()?;
        Ok(self.push_response(ResponseEnvelope::new(200, Default::default(), body)))
    }

    /// Append a fully built response.
    pub fn push_response(&self, response: ResponseEnvelope) -> &Self {
        self.lock().responses.push_back(response);
        self
    }

    /// Switch permanently to lenient mode, returning `response` whenever the
    /// queue is empty.
    pub fn when_empty(&self, response: ResponseEnvelope) -> &Self {
        let mut state = self.lock();
        state.fail_when_empty = false;
        state.empty_fallback = Some(response);
        self
    }

    /// Lenient mode with the default empty response as fallback.
    pub fn dont_fail_when_empty(&self) -> &Self {
        self.when_empty(ResponseEnvelope::empty())
    }

    /// Whether the queue is currently depleted, independent of mode.
    pub fn is_empty(&self) -> bool {
        self.lock().responses.is_empty()
    }

    /// Number of responses still queued.
    pub fn len(&self) -> usize {
        self.lock().responses.len()
    }

    /// Pop the next response in push order.
    ///
    /// Depleted strict sequences raise [`SoapError::SequenceExhausted`];
    /// depleted lenient sequences return the fallback without mutating the
    /// queue.
    pub fn next_response(&self) -> Result<ResponseEnvelope, SoapError> {
        let mut state = self.lock();
        match state.responses.pop_front() {
            Some(response) => Ok(response),
            None if state.fail_when_empty => Err(SoapError::SequenceExhausted),
            None => Ok(state
                .empty_fallback
                .clone()
                .unwrap_or_else(ResponseEnvelope::empty)),
        }
    }
}
