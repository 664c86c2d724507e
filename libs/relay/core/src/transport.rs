//! # Transport Capability
//!
//! ## Purpose
//! The abstraction both relay directions depend on. A transport is one
//! network channel (gRPC stream, relay-room session, loopback pair in
//! tests): connect/disconnect lifecycle, a connected-state flag, a stable
//! local client identity assigned by the network layer, and a byte-oriented
//! send/receive primitive keyed by message kind and an optional origin.
//!
//! The relay core treats every concrete transport uniformly through this
//! contract. It assumes nothing about ordering or reliability beyond
//! "frames arrive in the order the underlying channel delivers them"; no
//! cross-transport ordering is required.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use tokio::sync::broadcast;
use types::MessageKind;

/// Stable network participant identity, assigned by the transport layer.
pub type ClientId = i32;

/// Identity value before a transport has connected, and the "no transport"
/// answer for diagnostic queries.
pub const UNASSIGNED_CLIENT_ID: ClientId = -1;

/// One inbound payload delivered by a transport.
#[derive(Debug, Clone)]
pub struct InboundFrame {
    /// Catalog kind the payload was framed under.
    pub kind: MessageKind,
    /// Identity of the participant that sent the frame.
    pub origin: ClientId,
    /// Serialized payload, opaque to the transport.
    pub payload: Bytes,
}

/// Transport layer errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Transport closed")]
    Closed,
}

/// Pluggable network channel consumed by publisher and subscriber.
///
/// Inbound traffic surfaces on the broadcast channel returned by
/// [`Transport::subscribe`]; callbacks therefore run on whatever task drains
/// that receiver, and implementations may deliver frames from their own I/O
/// task at any time while connected.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Establish the channel. Idempotent when already connected.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tear the channel down. Idempotent when already disconnected.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Observable connected state.
    fn is_connected(&self) -> bool;

    /// Local client identity; stable once connected,
    /// [`UNASSIGNED_CLIENT_ID`] before.
    fn client_id(&self) -> ClientId;

    /// Transport kind label for diagnostics ("grpc", "realtime-relay", ...).
    fn kind(&self) -> &str;

    /// Send one serialized payload framed under `kind`. `origin` is only
    /// set when re-relaying a frame on behalf of another participant.
    async fn send(
        &self,
        kind: MessageKind,
        origin: Option<ClientId>,
        payload: Bytes,
    ) -> Result<(), TransportError>;

    /// Subscribe to inbound frames in channel arrival order.
    fn subscribe(&self) -> broadcast::Receiver<InboundFrame>;
}
