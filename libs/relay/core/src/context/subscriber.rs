//! Subscriber-side session context: transport → local sink.

use crate::endpoint::{MessageSink, SinkEvent};
use crate::log::{TransportedMessageLog, DEFAULT_LOG_CAPACITY};
use crate::ring::RingLog;
use crate::subscriber::Subscriber;
use crate::transport::{ClientId, Transport, UNASSIGNED_CLIENT_ID};
use crate::{RelayError, RelayResult};
use codec::MessageSerializer;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Shared diagnostic state: written by pump tasks, read from anywhere.
struct SubscriberDiagnostics {
    transport: RwLock<Option<Arc<dyn Transport>>>,
    message_count: AtomicU64,
    transported_message_count: AtomicU64,
    logging_enabled: AtomicBool,
    logs: Mutex<RingLog<TransportedMessageLog>>,
}

impl SubscriberDiagnostics {
    fn local_client_id(&self) -> ClientId {
        self.transport
            .read()
            .as_ref()
            .map(|t| t.client_id())
            .unwrap_or(UNASSIGNED_CLIENT_ID)
    }

    /// Instrument one sink delivery. Unlike the publisher side, every
    /// delivery counts whether or not a transport is connected.
    fn record_sink_event(&self, event: &SinkEvent) {
        self.message_count.fetch_add(1, Ordering::Relaxed);
        if !self.logging_enabled.load(Ordering::Relaxed) {
            return;
        }

        let client_id = self.local_client_id();
        let entry = match event {
            SinkEvent::Local(message) => {
                TransportedMessageLog::new(message.tag(), message.summary(), client_id)
            }
            SinkEvent::Transported(message, _origin) => {
                TransportedMessageLog::new(message.transported_tag(), message.summary(), client_id)
            }
        };
        self.logs.lock().enqueue(entry);
    }
}

enum Attachment {
    Detached,
    Attached {
        subscriber: Subscriber,
        observed_pump: JoinHandle<()>,
    },
}

/// Session manager for the subscriber direction.
///
/// Owns the ring log, the delivered/observed counters, the origin filter
/// surface and the single-active-transport state machine. Filter queries
/// answer their defined "disabled" values while no subscriber exists.
pub struct SubscriberContext {
    serializer: Arc<dyn MessageSerializer>,
    sink: Arc<dyn MessageSink>,
    diagnostics: Arc<SubscriberDiagnostics>,
    attachment: Mutex<Attachment>,
    sink_pump: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriberContext {
    pub fn new(serializer: Arc<dyn MessageSerializer>, sink: Arc<dyn MessageSink>) -> Self {
        Self::with_log_capacity(serializer, sink, DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(
        serializer: Arc<dyn MessageSerializer>,
        sink: Arc<dyn MessageSink>,
        log_capacity: usize,
    ) -> Self {
        let diagnostics = Arc::new(SubscriberDiagnostics {
            transport: RwLock::new(None),
            message_count: AtomicU64::new(0),
            transported_message_count: AtomicU64::new(0),
            logging_enabled: AtomicBool::new(false),
            logs: Mutex::new(RingLog::with_capacity(log_capacity)),
        });

        // Delivery pump: instruments every sink delivery for the lifetime of
        // the context, independent of which transport is attached.
        let mut sent_rx = sink.subscribe_sent();
        let pump_diagnostics = Arc::clone(&diagnostics);
        let sink_pump = tokio::spawn(async move {
            loop {
                match sent_rx.recv().await {
                    Ok(event) => pump_diagnostics.record_sink_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber context lagged behind sink deliveries");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("sink closed, subscriber delivery pump exiting");
                        break;
                    }
                }
            }
        });

        Self {
            serializer,
            sink,
            diagnostics,
            attachment: Mutex::new(Attachment::Detached),
            sink_pump: Mutex::new(Some(sink_pump)),
        }
    }

    /// Attach `transport` and bring up the subscriber bound to it.
    ///
    /// Rejected with [`RelayError::TransportAttached`] while another
    /// transport is active.
    pub fn add_transport(&self, transport: Arc<dyn Transport>) -> RelayResult<()> {
        let mut attachment = self.attachment.lock();
        if matches!(*attachment, Attachment::Attached { .. }) {
            return Err(RelayError::TransportAttached);
        }

        let subscriber = Subscriber::new(
            Arc::clone(&transport),
            Arc::clone(&self.serializer),
            Arc::clone(&self.sink),
        );

        let mut observed_rx = subscriber.subscribe_observed();
        let pump_diagnostics = Arc::clone(&self.diagnostics);
        let observed_pump = tokio::spawn(async move {
            loop {
                match observed_rx.recv().await {
                    Ok(_) => {
                        pump_diagnostics
                            .transported_message_count
                            .fetch_add(1, Ordering::Relaxed);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Skipped events were still observed frames.
                        pump_diagnostics
                            .transported_message_count
                            .fetch_add(skipped, Ordering::Relaxed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        *self.diagnostics.transport.write() = Some(transport);
        *attachment = Attachment::Attached {
            subscriber,
            observed_pump,
        };
        Ok(())
    }

    /// Tear down the active subscriber and release the transport.
    /// A no-op when nothing is attached.
    pub fn remove_transport(&self) {
        let mut attachment = self.attachment.lock();
        if let Attachment::Attached {
            subscriber,
            observed_pump,
        } = std::mem::replace(&mut *attachment, Attachment::Detached)
        {
            subscriber.shutdown();
            observed_pump.abort();
        }
        *self.diagnostics.transport.write() = None;
    }

    /// Start the local sink, resetting the delivered-message counter.
    pub async fn start_message_sender(&self, address: &str, port: u16) -> RelayResult<()> {
        self.diagnostics.message_count.store(0, Ordering::Relaxed);
        self.sink.start(address, port).await
    }

    /// Stop the local sink. Counters keep their values.
    pub async fn stop_message_sender(&self) {
        self.sink.stop().await;
    }

    /// Only deliver transported messages from `client_id`, starting with
    /// the next inbound frame. A no-op while no transport is attached.
    pub fn enable_message_filter(&self, client_id: ClientId) {
        if let Attachment::Attached { subscriber, .. } = &*self.attachment.lock() {
            subscriber.enable_message_filter(client_id);
        }
    }

    /// Deliver messages from every origin again. A no-op while detached.
    pub fn disable_message_filter(&self) {
        if let Attachment::Attached { subscriber, .. } = &*self.attachment.lock() {
            subscriber.disable_message_filter();
        }
    }

    pub fn message_filter_is_enabled(&self) -> bool {
        match &*self.attachment.lock() {
            Attachment::Attached { subscriber, .. } => subscriber.message_filter_is_enabled(),
            Attachment::Detached => false,
        }
    }

    /// Permitted origin, or [`UNASSIGNED_CLIENT_ID`] when disabled or
    /// detached.
    pub fn message_filter_client_id(&self) -> ClientId {
        match &*self.attachment.lock() {
            Attachment::Attached { subscriber, .. } => subscriber.message_filter_client_id(),
            Attachment::Detached => UNASSIGNED_CLIENT_ID,
        }
    }

    /// Clear the ring log, then accept new entries.
    pub fn enable_message_logging(&self) {
        self.clear_message_logs();
        self.diagnostics
            .logging_enabled
            .store(true, Ordering::Relaxed);
    }

    /// Stop accepting new entries; existing entries remain readable.
    pub fn disable_message_logging(&self) {
        self.diagnostics
            .logging_enabled
            .store(false, Ordering::Relaxed);
    }

    pub fn clear_message_logs(&self) {
        self.diagnostics.logs.lock().clear();
    }

    // Diagnostics surface (read-only).

    pub fn transport_is_connected(&self) -> bool {
        self.diagnostics
            .transport
            .read()
            .as_ref()
            .map(|t| t.is_connected())
            .unwrap_or(false)
    }

    pub fn message_sender_is_running(&self) -> bool {
        self.sink.is_running()
    }

    pub fn destination_address(&self) -> String {
        self.sink.destination_address()
    }

    pub fn destination_port(&self) -> u16 {
        self.sink.destination_port()
    }

    /// Messages delivered through the local sink (local and transported).
    pub fn message_count(&self) -> u64 {
        self.diagnostics.message_count.load(Ordering::Relaxed)
    }

    /// Inbound frames observed on the transport, including suppressed ones.
    pub fn transported_message_count(&self) -> u64 {
        self.diagnostics
            .transported_message_count
            .load(Ordering::Relaxed)
    }

    pub fn message_logging_is_enabled(&self) -> bool {
        self.diagnostics.logging_enabled.load(Ordering::Relaxed)
    }

    /// Snapshot of the ring log in arrival order.
    pub fn message_logs(&self) -> Vec<TransportedMessageLog> {
        self.diagnostics.logs.lock().snapshot()
    }
}

impl Drop for SubscriberContext {
    fn drop(&mut self) {
        self.remove_transport();
        if let Some(pump) = self.sink_pump.lock().take() {
            pump.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{wait_until, CollectorSink, LoopbackTransport};
    use crate::transport::InboundFrame;
    use codec::{BincodeSerializer, MessageSerializer};
    use types::{BoneTransform, DeviceTransform, DeviceType, MessageKind, Time, VmcMessage};

    fn context_fixture() -> (SubscriberContext, Arc<CollectorSink>, Arc<LoopbackTransport>) {
        let sink = Arc::new(CollectorSink::new());
        let context = SubscriberContext::new(Arc::new(BincodeSerializer::new()), sink.clone());
        let transport = Arc::new(LoopbackTransport::new(10));
        (context, sink, transport)
    }

    fn frame_of(message: &VmcMessage, origin: ClientId) -> InboundFrame {
        InboundFrame {
            kind: message.kind(),
            origin,
            payload: BincodeSerializer::new().serialize(message).unwrap(),
        }
    }

    fn head_bone() -> VmcMessage {
        VmcMessage::BoneTransform(BoneTransform {
            name: "Head".to_string(),
            position_x: 0.1,
            position_y: 1.7,
            position_z: -0.2,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn filter_queries_answer_disabled_values_when_detached() {
        let (context, _sink, _transport) = context_fixture();

        assert!(!context.message_filter_is_enabled());
        assert_eq!(context.message_filter_client_id(), UNASSIGNED_CLIENT_ID);

        // Mutations while detached must not fault.
        context.enable_message_filter(5);
        assert!(!context.message_filter_is_enabled());
        context.disable_message_filter();
    }

    #[tokio::test]
    async fn second_add_transport_is_rejected() {
        let (context, _sink, transport) = context_fixture();

        context.add_transport(transport).unwrap();
        let other = Arc::new(LoopbackTransport::new(11));
        assert!(matches!(
            context.add_transport(other),
            Err(RelayError::TransportAttached)
        ));
    }

    #[tokio::test]
    async fn remove_transport_without_attachment_is_a_noop() {
        let (context, _sink, transport) = context_fixture();

        context.remove_transport();
        context.add_transport(transport).unwrap();
        context.remove_transport();
        context.remove_transport();
    }

    #[tokio::test]
    async fn start_message_sender_resets_delivered_counter() {
        let (context, _sink, transport) = context_fixture();
        context.add_transport(transport.clone()).unwrap();
        context
            .start_message_sender("127.0.0.1", 39540)
            .await
            .unwrap();

        transport.inject(frame_of(&head_bone(), 3));
        wait_until(|| context.message_count() == 1).await;

        context
            .start_message_sender("127.0.0.1", 39540)
            .await
            .unwrap();
        assert_eq!(context.message_count(), 0);
        assert!(context.message_sender_is_running());
        assert_eq!(context.destination_address(), "127.0.0.1");
        assert_eq!(context.destination_port(), 39540);
    }

    #[tokio::test]
    async fn filter_suppression_counts_observed_but_not_delivered() {
        let (context, sink, transport) = context_fixture();
        context.add_transport(transport.clone()).unwrap();
        context
            .start_message_sender("127.0.0.1", 39540)
            .await
            .unwrap();

        context.enable_message_filter(1);
        assert!(context.message_filter_is_enabled());
        assert_eq!(context.message_filter_client_id(), 1);

        transport.inject(frame_of(&head_bone(), 2));
        wait_until(|| context.transported_message_count() == 1).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(context.message_count(), 0);
        assert!(sink.transported_messages().is_empty());

        transport.inject(frame_of(&head_bone(), 1));
        wait_until(|| context.transported_message_count() == 2).await;
        wait_until(|| context.message_count() == 1).await;
        assert_eq!(sink.transported_messages().len(), 1);
        assert_eq!(sink.transported_messages()[0].1, 1);
    }

    #[tokio::test]
    async fn transported_delivery_logs_transported_tag_with_local_identity() {
        let (context, _sink, transport) = context_fixture();
        transport.connect().await.unwrap();
        context.add_transport(transport.clone()).unwrap();
        context.enable_message_logging();
        context
            .start_message_sender("127.0.0.1", 39540)
            .await
            .unwrap();

        transport.inject(frame_of(&head_bone(), 3));
        wait_until(|| context.message_logs().len() == 1).await;

        let logs = context.message_logs();
        assert_eq!(logs[0].tag, "TransportedBoneTransform");
        assert_eq!(logs[0].detail.as_deref(), Some("Head, 0.1, 1.7, -0.2"));
        // Stamped with the local transport identity, not the origin.
        assert_eq!(logs[0].client_id, 10);
    }

    #[tokio::test]
    async fn local_sink_deliveries_log_plain_tags() {
        let (context, sink, transport) = context_fixture();
        transport.connect().await.unwrap();
        context.add_transport(transport).unwrap();
        context.enable_message_logging();

        sink.send(&VmcMessage::Time(Time { time: 4.5 })).await.unwrap();
        wait_until(|| context.message_logs().len() == 1).await;

        let logs = context.message_logs();
        assert_eq!(logs[0].tag, "Time");
        assert_eq!(logs[0].detail, None);
        assert_eq!(context.message_count(), 1);
        assert_eq!(sink.local_messages(), vec![VmcMessage::Time(Time { time: 4.5 })]);
    }

    #[tokio::test]
    async fn transported_device_kinds_resolve_device_tags() {
        let (context, _sink, transport) = context_fixture();
        context.add_transport(transport.clone()).unwrap();
        context.enable_message_logging();

        for device_type in [
            DeviceType::HeadMountedDisplay,
            DeviceType::Controller,
            DeviceType::Tracker,
            DeviceType::Unknown,
        ] {
            let message = VmcMessage::DeviceTransform(DeviceTransform {
                device_type,
                serial: "S-1".to_string(),
                ..Default::default()
            });
            transport.inject(frame_of(&message, 2));
        }

        wait_until(|| context.message_logs().len() == 4).await;
        let tags: Vec<&str> = context.message_logs().iter().map(|l| l.tag).collect();
        assert_eq!(
            tags,
            vec![
                "TransportedHmdDeviceTransform",
                "TransportedControllerDeviceTransform",
                "TransportedTrackerDeviceTransform",
                "TransportedUnknownDeviceTransform",
            ]
        );
    }

    #[tokio::test]
    async fn logging_toggle_clears_on_enable_and_freezes_on_disable() {
        let (context, _sink, transport) = context_fixture();
        context.add_transport(transport.clone()).unwrap();
        context.enable_message_logging();

        transport.inject(frame_of(&head_bone(), 1));
        wait_until(|| context.message_logs().len() == 1).await;

        context.disable_message_logging();
        transport.inject(frame_of(&head_bone(), 1));
        wait_until(|| context.message_count() == 2).await;
        assert_eq!(context.message_logs().len(), 1);

        context.enable_message_logging();
        assert!(context.message_logs().is_empty());
        assert!(context.message_logging_is_enabled());
    }

    #[tokio::test]
    async fn observed_counter_includes_corrupt_frames() {
        let (context, _sink, transport) = context_fixture();
        context.add_transport(transport.clone()).unwrap();

        transport.inject(InboundFrame {
            kind: MessageKind::LocalVrm,
            origin: 2,
            payload: bytes::Bytes::from_static(&[0xFF; 9]),
        });

        // Observed before the decode failure; nothing delivered.
        wait_until(|| context.transported_message_count() == 1).await;
        assert_eq!(context.message_count(), 0);
    }
}
