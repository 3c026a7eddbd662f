//! Error taxonomy for the interception layer.

use crate::envelope::ResponseEnvelope;
use thiserror::Error;

/// Errors surfaced by the client pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum SoapError {
    /// A message body could not be decoded into arguments.
    #[error("failed to decode message payload: {message}")]
    Decode { message: String },

    /// A strict response sequence was invoked after depletion.
    #[error("a request was made, but the response sequence is empty")]
    SequenceExhausted,

    /// The transport rejected the request. Terminal for the call, no retry.
    #[error("connection to the remote service failed")]
    Connection {
        #[source]
        source: TransportError,
    },

    /// The caller opted into failure checking on a 4xx/5xx response.
    #[error("request failed with status {}", .response.status())]
    RequestFailed { response: Box<ResponseEnvelope> },

    /// A stub pattern could not be compiled.
    #[error("invalid stub pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl SoapError {
    /// Shorthand for a decode failure with the given message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The response carried by a `RequestFailed` error, if any.
    pub fn response(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::RequestFailed { response } => Some(response),
            _ => None,
        }
    }
}

/// Failure reported by a [`Transport`](crate::client::Transport) implementation.
///
/// Wraps the original cause so callers can inspect the underlying I/O or
/// protocol error through the standard `source` chain.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }
}
