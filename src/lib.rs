//! SOAP Intercept
//!
//! A client-side interception and verification layer for RPC-style SOAP
//! clients. Calls flow through an ordered pipeline that can record them,
//! answer them from stubs, or hand them to a pluggable transport. Perfect for
//! testing service integrations without touching the network.
//!
//! # Features
//!
//! - **Faking**: Catch-all fakes, glob-pattern stubs, callback stubs
//! - **Response Sequences**: FIFO queues of canned responses, strict or lenient
//! - **Recording**: Append-only request/response history while faking
//! - **Assertions**: Sent/not-sent/in-order checks over the recorded history
//! - **Lifecycle Hooks**: Before-sending hooks and event notifications
//! - **Pluggable Seams**: Bring your own transport and protocol codec
//!
//! # Example
//!
//! ```
//! use soap_intercept::ClientFactory;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), soap_intercept::SoapError> {
//! let factory = ClientFactory::new();
//! factory.fake();
//!
//! let client = factory.client().endpoint("https://weather.example/soap");
//! let response = client.call("GetWeather", json!({ "zip": "10115" })).await?;
//! assert!(response.ok());
//!
//! factory.assert_action_called("GetWeather");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod events;
pub mod factory;
pub mod recording;
pub mod sequence;
pub mod stub;
pub mod testing;

pub use client::{BeforeSendingHook, CallOptions, Client, Transport, UnroutableTransport};
pub use codec::{JsonEnvelopeCodec, ProtocolCodec};
pub use config::ClientConfig;
pub use envelope::{RequestEnvelope, ResponseBody, ResponseEnvelope};
pub use error::{SoapError, TransportError};
pub use events::{ClientEvent, CollectingEventSink, EventSink, NullEventSink, TracingEventSink};
pub use factory::{ClientFactory, Session};
pub use recording::{RecordedPair, RecordingStore};
pub use sequence::ResponseSequence;
pub use stub::{ActionPattern, Responder, StubHandler, StubRegistry, StubRule};
pub use testing::SentExpectation;
