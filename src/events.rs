//! Lifecycle event notifications.
//!
//! Fire-and-forget hooks emitted by the pipeline: one `RequestSending` and one
//! `ResponseReceived` (or `ConnectionFailed`) per call, stubbed or not.

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Receiver for pipeline lifecycle notifications.
pub trait EventSink: Send + Sync {
    fn request_sending(&self, request: &RequestEnvelope);
    fn response_received(&self, request: &RequestEnvelope, response: &ResponseEnvelope);
    fn connection_failed(&self, request: &RequestEnvelope);
}

/// Sink that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn request_sending(&self, _request: &RequestEnvelope) {}
    fn response_received(&self, _request: &RequestEnvelope, _response: &ResponseEnvelope) {}
    fn connection_failed(&self, _request: &RequestEnvelope) {}
}

/// Sink that logs notifications through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn request_sending(&self, request: &RequestEnvelope) {
        debug!(
            action = request.action().as_deref().unwrap_or(""),
            url = request.url(),
            "Sending request"
        );
    }

    fn response_received(&self, request: &RequestEnvelope, response: &ResponseEnvelope) {
        debug!(
            action = request.action().as_deref().unwrap_or(""),
            status = response.status(),
            "Response received"
        );
    }

    fn connection_failed(&self, request: &RequestEnvelope) {
        warn!(
            action = request.action().as_deref().unwrap_or(""),
            url = request.url(),
            "Connection failed"
        );
    }
}

/// A lightweight record of an emitted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    RequestSending { action: String },
    ResponseReceived { action: String, status: u16 },
    ConnectionFailed { action: String },
}

/// Sink that records notifications for later inspection in tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<ClientEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notifications seen so far, in emission order.
    pub fn events(&self) -> Vec<ClientEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: ClientEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}

impl EventSink for CollectingEventSink {
    fn request_sending(&self, request: &RequestEnvelope) {
        self.push(ClientEvent::RequestSending {
            action: request.action().unwrap_or_default(),
        });
    }

    fn response_received(&self, request: &RequestEnvelope, response: &ResponseEnvelope) {
        self.push(ClientEvent::ResponseReceived {
            action: request.action().unwrap_or_default(),
            status: response.status(),
        });
    }

    fn connection_failed(&self, request: &RequestEnvelope) {
        self.push(ClientEvent::ConnectionFailed {
            action: request.action().unwrap_or_default(),
        });
    }
}
