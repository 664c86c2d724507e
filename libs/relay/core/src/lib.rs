//! # VMC Bridge Relay Core
//!
//! ## Purpose
//! Relays real-time motion-capture telemetry between a local capture
//! application and a remote network transport, so multiple participants can
//! exchange live performance data over a channel the capture tool does not
//! natively speak.
//!
//! ## Architecture Role
//! ```text
//! Local source → Publisher → Transport.send → network
//!                                                ↓
//! Local sink  ← Subscriber ← Transport inbound frames
//! ```
//!
//! Both directions sit on the same seams: the [`Transport`] capability, the
//! [`MessageSerializer`](codec::MessageSerializer) codec boundary, and the
//! [`MessageSource`]/[`MessageSink`] endpoints of the capture application.
//! The [`PublisherContext`]/[`SubscriberContext`] pair owns session
//! lifecycle, counters and the bounded diagnostic ring log for one direction.
//!
//! The relay core routes; it never interprets payload semantics, never
//! transforms or resamples, and persists nothing beyond the in-memory ring
//! log.

pub mod config;
pub mod context;
pub mod endpoint;
pub mod log;
pub mod publisher;
pub mod ring;
pub mod subscriber;
pub mod test_utils;
pub mod transport;

pub use config::BridgeConfig;
pub use context::{PublisherContext, SubscriberContext};
pub use endpoint::{MessageSink, MessageSource, SinkEvent};
pub use log::{MessageLog, TransportedMessageLog, DEFAULT_LOG_CAPACITY};
pub use publisher::{Publisher, SentMessage};
pub use ring::RingLog;
pub use subscriber::{Subscriber, TransportedMessage};
pub use transport::{ClientId, InboundFrame, Transport, TransportError, UNASSIGNED_CLIENT_ID};

use codec::CodecError;

/// Relay-specific errors
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport already attached; remove the active transport first")]
    TransportAttached,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Endpoint error: {0}")]
    Endpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for relay operations
pub type RelayResult<T> = std::result::Result<T, RelayError>;
