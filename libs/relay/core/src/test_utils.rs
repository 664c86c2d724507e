//! Test doubles for the relay seams.
//!
//! [`LoopbackTransport`] stands in for a real network channel: it records
//! outbound frames, lets tests inject inbound frames, and two instances can
//! be linked into an in-process pair. [`ChannelSource`] and [`CollectorSink`]
//! are programmable local endpoints. All of them honor the same contracts
//! production implementations do, so they exercise the real pipelines.

use crate::endpoint::{MessageSink, MessageSource, SinkEvent};
use crate::transport::{ClientId, InboundFrame, Transport, TransportError};
use crate::RelayResult;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use types::{MessageKind, VmcMessage};

const CHANNEL_CAPACITY: usize = 1024;
const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const WAIT_POLL: Duration = Duration::from_millis(2);

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {WAIT_TIMEOUT:?}");
        }
        tokio::time::sleep(WAIT_POLL).await;
    }
}

/// One frame handed to a [`LoopbackTransport`] for sending.
#[derive(Debug, Clone)]
pub struct SentFrame {
    pub kind: MessageKind,
    pub origin: Option<ClientId>,
    pub payload: Bytes,
}

/// In-process [`Transport`]: records sends, replays injected frames, and
/// forwards to a linked peer when one is attached.
#[derive(Debug)]
pub struct LoopbackTransport {
    client_id: ClientId,
    connected: AtomicBool,
    fail_next_send: AtomicBool,
    sent: Mutex<Vec<SentFrame>>,
    inbound_tx: broadcast::Sender<InboundFrame>,
    peer: Mutex<Option<Weak<LoopbackTransport>>>,
}

impl LoopbackTransport {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            connected: AtomicBool::new(false),
            fail_next_send: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            inbound_tx: broadcast::channel(CHANNEL_CAPACITY).0,
            peer: Mutex::new(None),
        }
    }

    /// Wire two transports into a pair: frames sent through one arrive on
    /// the other's inbound channel, stamped with the sender's identity.
    pub fn link(a: &Arc<Self>, b: &Arc<Self>) {
        *a.peer.lock() = Some(Arc::downgrade(b));
        *b.peer.lock() = Some(Arc::downgrade(a));
    }

    /// Deliver one frame to this transport's subscribers, as if it arrived
    /// off the wire.
    pub fn inject(&self, frame: InboundFrame) {
        let _ = self.inbound_tx.send(frame);
    }

    /// Make the next `send` fail with [`TransportError::SendFailed`].
    pub fn fail_next_send(&self) {
        self.fail_next_send.store(true, Ordering::SeqCst);
    }

    /// Every frame sent so far, in send order.
    pub fn sent_frames(&self) -> Vec<SentFrame> {
        self.sent.lock().clone()
    }

    pub async fn wait_for_sent(&self, count: usize) {
        wait_until(|| self.sent.lock().len() >= count).await;
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn client_id(&self) -> ClientId {
        self.client_id
    }

    fn kind(&self) -> &str {
        "loopback"
    }

    async fn send(
        &self,
        kind: MessageKind,
        origin: Option<ClientId>,
        payload: Bytes,
    ) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(TransportError::SendFailed("injected failure".to_string()));
        }

        self.sent.lock().push(SentFrame {
            kind,
            origin,
            payload: payload.clone(),
        });

        let peer = self.peer.lock().as_ref().and_then(Weak::upgrade);
        if let Some(peer) = peer {
            peer.inject(InboundFrame {
                kind,
                origin: origin.unwrap_or(self.client_id),
                payload,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<InboundFrame> {
        self.inbound_tx.subscribe()
    }
}

/// [`MessageSource`] driven by the test body via [`ChannelSource::emit`].
pub struct ChannelSource {
    running: AtomicBool,
    port: AtomicU16,
    tx: broadcast::Sender<VmcMessage>,
}

impl ChannelSource {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            port: AtomicU16::new(0),
            tx: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Emit one message as if the local capture tool produced it.
    pub fn emit(&self, message: VmcMessage) {
        let _ = self.tx.send(message);
    }
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    async fn start(&self, port: u16) -> RelayResult<()> {
        self.port.store(port, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn subscribe(&self) -> broadcast::Receiver<VmcMessage> {
        self.tx.subscribe()
    }
}

/// [`MessageSink`] that collects deliveries for assertion.
pub struct CollectorSink {
    running: AtomicBool,
    address: Mutex<String>,
    port: AtomicU16,
    local: Mutex<Vec<VmcMessage>>,
    transported: Mutex<Vec<(VmcMessage, ClientId)>>,
    sent_tx: broadcast::Sender<SinkEvent>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            address: Mutex::new(String::new()),
            port: AtomicU16::new(0),
            local: Mutex::new(Vec::new()),
            transported: Mutex::new(Vec::new()),
            sent_tx: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Locally-originated deliveries in arrival order.
    pub fn local_messages(&self) -> Vec<VmcMessage> {
        self.local.lock().clone()
    }

    /// Transported deliveries in arrival order, paired with their origins.
    pub fn transported_messages(&self) -> Vec<(VmcMessage, ClientId)> {
        self.transported.lock().clone()
    }

    pub async fn wait_for_transported(&self, count: usize) {
        wait_until(|| self.transported.lock().len() >= count).await;
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSink for CollectorSink {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn destination_address(&self) -> String {
        self.address.lock().clone()
    }

    fn destination_port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    async fn start(&self, address: &str, port: u16) -> RelayResult<()> {
        *self.address.lock() = address.to_string();
        self.port.store(port, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn send(&self, message: &VmcMessage) -> RelayResult<()> {
        self.local.lock().push(message.clone());
        let _ = self.sent_tx.send(SinkEvent::Local(message.clone()));
        Ok(())
    }

    async fn send_transported(&self, message: &VmcMessage, origin: ClientId) -> RelayResult<()> {
        self.transported.lock().push((message.clone(), origin));
        let _ = self
            .sent_tx
            .send(SinkEvent::Transported(message.clone(), origin));
        Ok(())
    }

    fn subscribe_sent(&self) -> broadcast::Receiver<SinkEvent> {
        self.sent_tx.subscribe()
    }
}
