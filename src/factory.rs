//! Client factory and shared session state.
//!
//! The factory owns one [`Session`]: the stub registry, the recording store,
//! and every response sequence it created. Clients built from the factory
//! share that session, which lives for the test or application session and is
//! never persisted. Concurrent calls sharing one factory must be externally
//! serialized, or use one factory per test.

use crate::client::{CallOptions, Client};
use crate::config::ClientConfig;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::SoapError;
use crate::recording::{RecordedPair, RecordingStore};
use crate::sequence::ResponseSequence;
use crate::stub::{ActionPattern, Responder, StubRegistry, StubRule};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Shared per-session state: stubs, recordings, and created sequences.
#[derive(Default)]
pub struct Session {
    pub(crate) recordings: RecordingStore,
    pub(crate) stubs: StubRegistry,
    sequences: Mutex<Vec<ResponseSequence>>,
}

impl Session {
    fn register_sequence(&self, sequence: ResponseSequence) {
        self.sequences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sequence);
    }

    /// Handles to every sequence created through this session.
    pub fn sequences(&self) -> Vec<ResponseSequence> {
        self.sequences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset(&self) {
        self.recordings.clear();
        self.stubs.clear();
        self.sequences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Creates clients and manages the faking/recording session they share.
#[derive(Clone, Default)]
pub struct ClientFactory {
    session: Arc<Session>,
    config: ClientConfig,
}

impl ClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose clients start from the given configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            session: Arc::new(Session::default()),
            config,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Build a new client sharing this factory's session.
    pub fn client(&self) -> Client {
        Client::new(Arc::clone(&self.session), self.config.clone())
    }

    /// Enter fake mode with a single catch-all stub returning the default
    /// empty response. Activates recording.
    pub fn fake(&self) {
        self.session.recordings.activate();
        self.session
            .stubs
            .push(StubRule::any(ResponseEnvelope::empty()));
        debug!("Registered catch-all fake");
    }

    /// Enter fake mode with one stub rule per `(pattern, responder)` entry,
    /// in iteration order.
    ///
    /// Patterns are globs matched against the request action. When no entry's
    /// pattern is exactly `*`, a trailing catch-all returning the default
    /// empty response is appended.
    pub fn fake_responses<I, S>(&self, responses: I) -> Result<(), SoapError>
    where
        I: IntoIterator<Item = (S, Responder)>,
        S: AsRef<str>,
    {
        self.session.recordings.activate();

        let mut has_catch_all = false;
        let mut count = 0usize;
        for (pattern, responder) in responses {
            let pattern = pattern.as_ref();
            has_catch_all |= pattern == "*";
            self.session
                .stubs
                .push(StubRule::for_pattern(ActionPattern::glob(pattern)?, responder));
            count += 1;
        }
        if !has_catch_all {
            self.session.stubs.push(StubRule::for_pattern(
                catch_all_pattern(),
                ResponseEnvelope::empty(),
            ));
        }
        debug!(stubs = count, "Registered fakes");
        Ok(())
    }

    /// Enter fake mode with a callback stub consulted for every request.
    ///
    /// A callback returning `None` passes resolution on to the next rule, so
    /// fakes stack.
    pub fn fake_callback(
        &self,
        handler: impl Fn(&RequestEnvelope, &CallOptions) -> Option<ResponseEnvelope>
            + Send
            + Sync
            + 'static,
    ) {
        self.session.recordings.activate();
        self.session
            .stubs
            .push(StubRule::any(Responder::handler(handler)));
    }

    /// Register a stub callback without entering fake mode (no recording).
    pub fn stub(
        &self,
        handler: impl Fn(&RequestEnvelope, &CallOptions) -> Option<ResponseEnvelope>
            + Send
            + Sync
            + 'static,
    ) {
        self.session
            .stubs
            .push(StubRule::any(Responder::handler(handler)));
    }

    /// Create a response sequence tracked by this session.
    pub fn sequence(&self) -> ResponseSequence {
        let sequence = ResponseSequence::new();
        self.session.register_sequence(sequence.clone());
        sequence
    }

    /// Register a catch-all response sequence and return a handle to it.
    pub fn fake_sequence(&self) -> ResponseSequence {
        self.session.recordings.activate();
        let sequence = self.sequence();
        self.session
            .stubs
            .push(StubRule::for_pattern(catch_all_pattern(), sequence.clone()));
        sequence
    }

    /// Register a response sequence for the given action pattern.
    pub fn fake_sequence_for(&self, pattern: &str) -> Result<ResponseSequence, SoapError> {
        let sequence = self.sequence();
        self.fake_responses([(pattern, Responder::from(sequence.clone()))])?;
        Ok(sequence)
    }

    pub fn is_recording(&self) -> bool {
        self.session.recordings.is_recording()
    }

    /// Recorded pairs matching the given truth test, in insertion order.
    pub fn recorded<F>(&self, predicate: F) -> Vec<RecordedPair>
    where
        F: Fn(&RequestEnvelope, &ResponseEnvelope) -> bool,
    {
        self.session.recordings.recorded(predicate)
    }

    /// Every recorded pair, in insertion order.
    pub fn recorded_all(&self) -> Vec<RecordedPair> {
        self.session.recordings.all()
    }

    /// Clear stubs, recordings, and sequences, and stop recording.
    pub fn reset(&self) {
        self.session.reset();
    }
}

fn catch_all_pattern() -> ActionPattern {
    ActionPattern::glob("*").expect("the catch-all pattern compiles")
}
