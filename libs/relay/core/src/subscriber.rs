//! # Subscriber - Transport to Local Sink Bridge
//!
//! ## Purpose
//! Bridges one active transport to the local message sink. Every inbound
//! frame is announced on the observed channel (accounting happens whether or
//! not the frame is later suppressed), deserialized by kind, run through the
//! client-origin filter, and — if permitted — announced on the delivered
//! channel and forwarded to the sink with its origin identity.
//!
//! ## Data Flow
//! ```text
//! Transport inbound → observed event → deserialize → origin filter
//!                                                        ↓ pass
//!                                    delivered event + MessageSink.send_transported
//! ```
//!
//! Filtering only suppresses delivery; it never reorders, and suppressed
//! frames still count as observed. Filter changes take effect on the next
//! inbound frame.

use crate::endpoint::MessageSink;
use crate::transport::{ClientId, InboundFrame, Transport, UNASSIGNED_CLIENT_ID};
use crate::RelayResult;
use codec::MessageSerializer;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use types::VmcMessage;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// A message that crossed the transport, tagged with its origin identity.
#[derive(Debug, Clone)]
pub struct TransportedMessage {
    pub message: VmcMessage,
    pub origin: ClientId,
}

struct SubscriberInner {
    transport: Arc<dyn Transport>,
    serializer: Arc<dyn MessageSerializer>,
    sink: Arc<dyn MessageSink>,
    /// Permitted origin; `None` disables filtering.
    filter: Mutex<Option<ClientId>>,
    observed_tx: broadcast::Sender<InboundFrame>,
    delivered_tx: broadcast::Sender<TransportedMessage>,
}

impl SubscriberInner {
    async fn handle_inbound(&self, frame: InboundFrame) -> RelayResult<()> {
        // Observed accounting fires for all traffic, filtered or not.
        let _ = self.observed_tx.send(frame.clone());

        let message = self.serializer.deserialize(frame.kind, &frame.payload)?;

        if let Some(allowed) = *self.filter.lock() {
            if frame.origin != allowed {
                debug!(
                    origin = frame.origin,
                    allowed,
                    kind = ?frame.kind,
                    "inbound frame suppressed by origin filter"
                );
                return Ok(());
            }
        }

        let _ = self.delivered_tx.send(TransportedMessage {
            message: message.clone(),
            origin: frame.origin,
        });
        self.sink.send_transported(&message, frame.origin).await?;
        Ok(())
    }
}

/// Subscriber path of the relay: transport → deserialization → local sink.
pub struct Subscriber {
    inner: Arc<SubscriberInner>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Subscriber {
    /// Bind a subscriber to `transport`, delivering into `sink`.
    ///
    /// The transport subscription is taken synchronously; frames delivered
    /// after this call are not missed by the pump.
    pub fn new(
        transport: Arc<dyn Transport>,
        serializer: Arc<dyn MessageSerializer>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let mut inbound_rx = transport.subscribe();
        let inner = Arc::new(SubscriberInner {
            transport,
            serializer,
            sink,
            filter: Mutex::new(None),
            observed_tx: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
            delivered_tx: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
        });

        let pump_inner = Arc::clone(&inner);
        let pump = tokio::spawn(async move {
            loop {
                match inbound_rx.recv().await {
                    Ok(frame) => {
                        if let Err(err) = pump_inner.handle_inbound(frame).await {
                            // Corrupt payloads and sink faults are surfaced,
                            // never retried here.
                            error!(%err, "failed to handle inbound frame");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber pump lagged behind transport");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("transport inbound channel closed, subscriber pump exiting");
                        break;
                    }
                }
            }
        });

        Self {
            inner,
            pump: Mutex::new(Some(pump)),
        }
    }

    /// Directly run one inbound frame through the pipeline (the same path
    /// the pump takes). Decode and sink failures propagate to the caller.
    pub async fn handle_inbound(&self, frame: InboundFrame) -> RelayResult<()> {
        self.inner.handle_inbound(frame).await
    }

    /// Only deliver frames whose origin matches `client_id`, starting with
    /// the next inbound frame.
    pub fn enable_message_filter(&self, client_id: ClientId) {
        *self.inner.filter.lock() = Some(client_id);
    }

    /// Deliver frames from every origin again.
    pub fn disable_message_filter(&self) {
        *self.inner.filter.lock() = None;
    }

    pub fn message_filter_is_enabled(&self) -> bool {
        self.inner.filter.lock().is_some()
    }

    /// Permitted origin, or [`UNASSIGNED_CLIENT_ID`] when the filter is off.
    pub fn message_filter_client_id(&self) -> ClientId {
        self.inner.filter.lock().unwrap_or(UNASSIGNED_CLIENT_ID)
    }

    /// Local identity of the bound transport.
    pub fn client_id(&self) -> ClientId {
        self.inner.transport.client_id()
    }

    /// Subscribe to every observed inbound frame, filtered or not
    /// (the generic "transported message observed" event).
    pub fn subscribe_observed(&self) -> broadcast::Receiver<InboundFrame> {
        self.inner.observed_tx.subscribe()
    }

    /// Subscribe to messages that passed the filter and reached the sink.
    pub fn subscribe_delivered(&self) -> broadcast::Receiver<TransportedMessage> {
        self.inner.delivered_tx.subscribe()
    }

    /// Stop consuming the transport and release the binding.
    /// Safe to call any number of times.
    pub fn shutdown(&self) {
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.shutdown();
    }
}
