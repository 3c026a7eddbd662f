//! Assertions over the recorded call history.
//!
//! These read the session's recording store and panic with a descriptive
//! message on mismatch, so they plug directly into `#[test]` functions. They
//! only see calls made while recording was active (any of the `fake*` entry
//! points).

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::factory::ClientFactory;

/// One step of an in-order expectation: either a request URL or a truth test
/// over the recorded pair.
pub enum SentExpectation {
    Url(String),
    Predicate(Box<dyn Fn(&RequestEnvelope, &ResponseEnvelope) -> bool>),
}

impl SentExpectation {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn matching(
        predicate: impl Fn(&RequestEnvelope, &ResponseEnvelope) -> bool + 'static,
    ) -> Self {
        Self::Predicate(Box::new(predicate))
    }

    fn matches(&self, request: &RequestEnvelope, response: &ResponseEnvelope) -> bool {
        match self {
            Self::Url(url) => request.url() == url,
            Self::Predicate(predicate) => predicate(request, response),
        }
    }
}

impl From<&str> for SentExpectation {
    fn from(url: &str) -> Self {
        Self::url(url)
    }
}

impl From<String> for SentExpectation {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl ClientFactory {
    /// Assert that at least one recorded call matches the truth test.
    #[track_caller]
    pub fn assert_sent(
        &self,
        predicate: impl Fn(&RequestEnvelope, &ResponseEnvelope) -> bool,
    ) {
        assert!(
            !self.recorded(predicate).is_empty(),
            "An expected request was not recorded."
        );
    }

    /// Assert that no recorded call matches the truth test.
    #[track_caller]
    pub fn assert_not_sent(
        &self,
        predicate: impl Fn(&RequestEnvelope, &ResponseEnvelope) -> bool,
    ) {
        assert!(
            self.recorded(predicate).is_empty(),
            "Unexpected request was recorded."
        );
    }

    /// Assert that no calls were recorded at all.
    #[track_caller]
    pub fn assert_nothing_sent(&self) {
        assert!(self.recorded_all().is_empty(), "Requests were recorded.");
    }

    /// Assert the exact number of recorded calls.
    #[track_caller]
    pub fn assert_sent_count(&self, count: usize) {
        let actual = self.recorded_all().len();
        assert_eq!(
            actual, count,
            "Expected {count} recorded requests, found {actual}."
        );
    }

    /// Assert that a call for the given action was recorded.
    #[track_caller]
    pub fn assert_action_called(&self, action: &str) {
        self.assert_sent(|request, _| request.action().as_deref() == Some(action));
    }

    /// Assert that exactly these calls were recorded, in this order.
    ///
    /// The count is checked first; then each expectation is compared against
    /// the recorded pair at its position.
    #[track_caller]
    pub fn assert_sent_in_order(&self, expectations: Vec<SentExpectation>) {
        self.assert_sent_count(expectations.len());

        let recorded = self.recorded_all();
        for (index, expectation) in expectations.iter().enumerate() {
            let pair = &recorded[index];
            assert!(
                expectation.matches(&pair.request, &pair.response),
                "An expected request (#{}) was not recorded.",
                index + 1
            );
        }
    }

    /// Assert that every response sequence created through this factory has
    /// been fully consumed.
    #[track_caller]
    pub fn assert_sequences_are_empty(&self) {
        assert!(
            self.session()
                .sequences()
                .iter()
                .all(|sequence| sequence.is_empty()),
            "Not all response sequences are empty."
        );
    }
}
