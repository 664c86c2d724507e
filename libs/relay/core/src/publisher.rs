//! # Publisher - Local Source to Transport Bridge
//!
//! ## Purpose
//! Bridges one local message source to one active transport: every locally
//! received cataloged message is serialized and pushed through
//! [`Transport::send`], and every frame actually sent is announced on the
//! publisher's sent-message channel.
//!
//! ## Data Flow
//! ```text
//! MessageSource → pump task → serialize → Transport.send → SentMessage event
//! ```
//!
//! A publisher is bound to exactly one transport and one source subscription
//! for its lifetime; swapping transports means tearing the publisher down
//! and building a new one (the contexts enforce that).

use crate::endpoint::MessageSource;
use crate::transport::Transport;
use crate::RelayResult;
use bytes::Bytes;
use codec::MessageSerializer;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use types::{MessageKind, VmcMessage};

const SENT_CHANNEL_CAPACITY: usize = 1024;

/// One frame actually handed to the transport.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub kind: MessageKind,
    pub payload: Bytes,
}

struct PublisherInner {
    transport: Arc<dyn Transport>,
    serializer: Arc<dyn MessageSerializer>,
    sent_tx: broadcast::Sender<SentMessage>,
}

impl PublisherInner {
    /// Run one message through the publish pipeline.
    ///
    /// Returns `Ok(false)` when the transport is not connected: unconnected
    /// local traffic is silently skipped, not an error.
    async fn publish(&self, message: &VmcMessage) -> RelayResult<bool> {
        if !self.transport.is_connected() {
            return Ok(false);
        }

        let kind = message.kind();
        let payload = self.serializer.serialize(message)?;
        self.transport.send(kind, None, payload.clone()).await?;

        let _ = self.sent_tx.send(SentMessage { kind, payload });
        Ok(true)
    }
}

/// Publisher path of the relay: local source → serialization → transport.
pub struct Publisher {
    inner: Arc<PublisherInner>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Publisher {
    /// Bind a publisher to `transport`, consuming messages from `source`.
    ///
    /// The source subscription is taken synchronously, so no message emitted
    /// after this call is missed by the pump.
    pub fn new(
        transport: Arc<dyn Transport>,
        serializer: Arc<dyn MessageSerializer>,
        source: &dyn MessageSource,
    ) -> Self {
        let inner = Arc::new(PublisherInner {
            transport,
            serializer,
            sent_tx: broadcast::channel(SENT_CHANNEL_CAPACITY).0,
        });

        let mut local_rx = source.subscribe();
        let pump_inner = Arc::clone(&inner);
        let pump = tokio::spawn(async move {
            loop {
                match local_rx.recv().await {
                    Ok(message) => {
                        if let Err(error) = pump_inner.publish(&message).await {
                            warn!(%error, kind = ?message.kind(), "publish failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "publisher pump lagged behind local source");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("local source channel closed, publisher pump exiting");
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

    /// Directly run one message through the publish pipeline (the same path
    /// the pump takes). Returns whether the frame was actually sent.
    pub async fn publish(&self, message: &VmcMessage) -> RelayResult<bool> {
        self.inner.publish(message).await
    }

    /// Subscribe to frames actually sent (the `OnSendMessage` event).
    pub fn subscribe_sent(&self) -> broadcast::Receiver<SentMessage> {
        self.inner.sent_tx.subscribe()
    }

    /// Stop consuming the source and release the transport binding.
    /// Safe to call any number of times.
    pub fn shutdown(&self) {
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
