//! Local capture application boundary.
//!
//! The bridge consumes the capture tool through two seams: a
//! [`MessageSource`] (the tool's outgoing telemetry, e.g. an OSC listener)
//! and a [`MessageSink`] (delivery back into a tool, e.g. an OSC sender).
//! Concrete wire codecs live behind these traits; the relay core only sees
//! decoded [`VmcMessage`] values on tokio broadcast channels — one typed
//! channel instead of one event per cataloged kind.

use crate::transport::ClientId;
use crate::RelayResult;
use async_trait::async_trait;
use tokio::sync::broadcast;
use types::VmcMessage;

/// Local producer of cataloged messages.
#[async_trait]
pub trait MessageSource: Send + Sync {
    fn is_running(&self) -> bool;

    /// Port the source is listening on (last started port when stopped).
    fn port(&self) -> u16;

    async fn start(&self, port: u16) -> RelayResult<()>;

    async fn stop(&self);

    /// Subscribe to decoded local messages in arrival order.
    fn subscribe(&self) -> broadcast::Receiver<VmcMessage>;
}

/// One delivery performed by a [`MessageSink`], for instrumentation.
///
/// `Local` deliveries originate on this machine; `Transported` deliveries
/// crossed a transport and carry the origin participant's identity.
#[derive(Debug, Clone)]
pub enum SinkEvent {
    Local(VmcMessage),
    Transported(VmcMessage, ClientId),
}

/// Local consumer of cataloged messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    fn is_running(&self) -> bool;

    fn destination_address(&self) -> String;

    fn destination_port(&self) -> u16;

    async fn start(&self, address: &str, port: u16) -> RelayResult<()>;

    async fn stop(&self);

    /// Deliver a locally-originated message.
    async fn send(&self, message: &VmcMessage) -> RelayResult<()>;

    /// Deliver a message that crossed a transport, tagged with its origin.
    async fn send_transported(&self, message: &VmcMessage, origin: ClientId) -> RelayResult<()>;

    /// Subscribe to the sink's delivery events, in delivery order.
    fn subscribe_sent(&self) -> broadcast::Receiver<SinkEvent>;
}
