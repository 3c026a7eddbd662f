//! Append-only log of request/response pairs.

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A logged request/response snapshot.
#[derive(Debug, Clone)]
pub struct RecordedPair {
    pub request: RequestEnvelope,
    pub response: ResponseEnvelope,
}

/// Append-only store of recorded pairs, owned by one session.
///
/// Recording starts inactive; [`activate`](Self::activate) is a one-way
/// switch flipped when a session enters fake mode. Appends while inactive are
/// silently dropped.
#[derive(Default)]
pub struct RecordingStore {
    recording: AtomicBool,
    pairs: Mutex<Vec<RecordedPair>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedPair>> {
        self.pairs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin recording request/response pairs.
    pub fn activate(&self) {
        self.recording.store(true, Ordering::Relaxed);
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    /// Append a pair. No-op unless recording is active.
    pub fn record_pair(&self, request: RequestEnvelope, response: ResponseEnvelope) {
        if !self.is_recording() {
            return;
        }
        self.lock().push(RecordedPair { request, response });
    }

    /// Pairs matching the given truth test, in insertion order.
    ///
    /// An empty store returns empty without invoking the predicate.
    pub fn recorded<F>(&self, predicate: F) -> Vec<RecordedPair>
    where
        F: Fn(&RequestEnvelope, &ResponseEnvelope) -> bool,
    {
        let pairs = self.lock();
        if pairs.is_empty() {
            return Vec::new();
        }
        pairs
            .iter()
            .filter(|pair| predicate(&pair.request, &pair.response))
            .cloned()
            .collect()
    }

    /// Every recorded pair, in insertion order.
    pub fn all(&self) -> Vec<RecordedPair> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all recorded pairs and stop recording.
    pub fn clear(&self) {
        self.lock().clear();
        self.recording.store(false, Ordering::Relaxed);
    }
}
