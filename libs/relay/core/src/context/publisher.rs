//! Publisher-side session context: local source → transport.

use crate::endpoint::MessageSource;
use crate::log::{MessageLog, DEFAULT_LOG_CAPACITY};
use crate::publisher::Publisher;
use crate::ring::RingLog;
use crate::transport::Transport;
use crate::{RelayError, RelayResult};
use codec::MessageSerializer;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use types::VmcMessage;

/// Shared diagnostic state: written by pump tasks, read from anywhere.
struct PublisherDiagnostics {
    transport: RwLock<Option<Arc<dyn Transport>>>,
    message_count: AtomicU64,
    published_message_count: AtomicU64,
    logging_enabled: AtomicBool,
    logs: Mutex<RingLog<MessageLog>>,
}

impl PublisherDiagnostics {
    /// Instrument one locally observed message.
    ///
    /// Local traffic with no connected transport is deliberately left out of
    /// the counter: the publisher side measures traffic the bridge could
    /// actually carry.
    fn record_local(&self, message: &VmcMessage) {
        let connected = self
            .transport
            .read()
            .as_ref()
            .map(|t| t.is_connected())
            .unwrap_or(false);
        if !connected {
            return;
        }

        self.message_count.fetch_add(1, Ordering::Relaxed);
        if self.logging_enabled.load(Ordering::Relaxed) {
            self.logs
                .lock()
                .enqueue(MessageLog::new(message.tag(), message.summary()));
        }
    }
}

enum Attachment {
    Detached,
    Attached {
        publisher: Publisher,
        published_pump: JoinHandle<()>,
    },
}

/// Session manager for the publisher direction.
///
/// Owns the ring log, the observed/published counters and the single-active-
/// transport state machine. The ring log and counters survive transport
/// swaps; only [`PublisherContext::start_message_receiver`] resets the
/// observed counter and only explicit log operations touch the log.
pub struct PublisherContext {
    serializer: Arc<dyn MessageSerializer>,
    source: Arc<dyn MessageSource>,
    diagnostics: Arc<PublisherDiagnostics>,
    attachment: Mutex<Attachment>,
    observe_pump: Mutex<Option<JoinHandle<()>>>,
}

impl PublisherContext {
    pub fn new(serializer: Arc<dyn MessageSerializer>, source: Arc<dyn MessageSource>) -> Self {
        Self::with_log_capacity(serializer, source, DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(
        serializer: Arc<dyn MessageSerializer>,
        source: Arc<dyn MessageSource>,
        log_capacity: usize,
    ) -> Self {
        let diagnostics = Arc::new(PublisherDiagnostics {
            transport: RwLock::new(None),
            message_count: AtomicU64::new(0),
            published_message_count: AtomicU64::new(0),
            logging_enabled: AtomicBool::new(false),
            logs: Mutex::new(RingLog::with_capacity(log_capacity)),
        });

        // Observation pump: counts/logs every local message for the lifetime
        // of the context, independent of which transport is attached.
        let mut local_rx = source.subscribe();
        let pump_diagnostics = Arc::clone(&diagnostics);
        let observe_pump = tokio::spawn(async move {
            loop {
                match local_rx.recv().await {
                    Ok(message) => pump_diagnostics.record_local(&message),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "publisher context lagged behind local source");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("local source closed, publisher observation pump exiting");
                        break;
                    }
                }
            }
        });

        Self {
            serializer,
            source,
            diagnostics,
            attachment: Mutex::new(Attachment::Detached),
            observe_pump: Mutex::new(Some(observe_pump)),
        }
    }

    /// Attach `transport` and bring up the publisher bound to it.
    ///
    /// Rejected with [`RelayError::TransportAttached`] while another
    /// transport is active; swapping requires an explicit
    /// [`PublisherContext::remove_transport`] first.
    pub fn add_transport(&self, transport: Arc<dyn Transport>) -> RelayResult<()> {
        let mut attachment = self.attachment.lock();
        if matches!(*attachment, Attachment::Attached { .. }) {
            return Err(RelayError::TransportAttached);
        }

        let publisher = Publisher::new(
            Arc::clone(&transport),
            Arc::clone(&self.serializer),
            self.source.as_ref(),
        );

        let mut sent_rx = publisher.subscribe_sent();
        let pump_diagnostics = Arc::clone(&self.diagnostics);
        let published_pump = tokio::spawn(async move {
            loop {
                match sent_rx.recv().await {
                    Ok(_) => {
                        pump_diagnostics
                            .published_message_count
                            .fetch_add(1, Ordering::Relaxed);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Skipped events were still real sends; keep the
                        // counter truthful.
                        pump_diagnostics
                            .published_message_count
                            .fetch_add(skipped, Ordering::Relaxed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        *self.diagnostics.transport.write() = Some(transport);
        *attachment = Attachment::Attached {
            publisher,
            published_pump,
        };
        Ok(())
    }

    /// Tear down the active publisher and release the transport.
    /// A no-op when nothing is attached.
    pub fn remove_transport(&self) {
        let mut attachment = self.attachment.lock();
        if let Attachment::Attached {
            publisher,
            published_pump,
        } = std::mem::replace(&mut *attachment, Attachment::Detached)
        {
            publisher.shutdown();
            published_pump.abort();
        }
        *self.diagnostics.transport.write() = None;
    }

    /// Start the local source, resetting the observed-message counter.
    pub async fn start_message_receiver(&self, port: u16) -> RelayResult<()> {
        self.diagnostics.message_count.store(0, Ordering::Relaxed);
        self.source.start(port).await
    }

    /// Stop the local source. Counters keep their values.
    pub async fn stop_message_receiver(&self) {
        self.source.stop().await;
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

    pub fn message_receiver_is_running(&self) -> bool {
        self.source.is_running()
    }

    pub fn source_port(&self) -> u16 {
        self.source.port()
    }

    /// Local messages observed while a connected transport was attached.
    pub fn message_count(&self) -> u64 {
        self.diagnostics.message_count.load(Ordering::Relaxed)
    }

    /// Frames actually handed to a transport.
    pub fn published_message_count(&self) -> u64 {
        self.diagnostics
            .published_message_count
            .load(Ordering::Relaxed)
    }

    pub fn message_logging_is_enabled(&self) -> bool {
        self.diagnostics.logging_enabled.load(Ordering::Relaxed)
    }

    /// Snapshot of the ring log in arrival order.
    pub fn message_logs(&self) -> Vec<MessageLog> {
        self.diagnostics.logs.lock().snapshot()
    }
}

impl Drop for PublisherContext {
    fn drop(&mut self) {
        self.remove_transport();
        if let Some(pump) = self.observe_pump.lock().take() {
            pump.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{wait_until, ChannelSource, LoopbackTransport};
    use codec::BincodeSerializer;
    use types::{BoneTransform, DeviceTransform, DeviceType, Time};

    fn context_fixture() -> (PublisherContext, Arc<ChannelSource>, Arc<LoopbackTransport>) {
        let source = Arc::new(ChannelSource::new());
        let context = PublisherContext::new(Arc::new(BincodeSerializer::new()), source.clone());
        let transport = Arc::new(LoopbackTransport::new(7));
        (context, source, transport)
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
    async fn second_add_transport_is_rejected() {
        let (context, _source, transport) = context_fixture();

        context.add_transport(transport.clone()).unwrap();
        let other = Arc::new(LoopbackTransport::new(8));
        let err = context.add_transport(other).unwrap_err();
        assert!(matches!(err, RelayError::TransportAttached));

        // The original attachment is still the active one.
        transport.connect().await.unwrap();
        assert!(context.transport_is_connected());
    }

    #[tokio::test]
    async fn remove_transport_without_attachment_is_a_noop() {
        let (context, _source, transport) = context_fixture();

        context.remove_transport();
        context.remove_transport();

        context.add_transport(transport).unwrap();
        context.remove_transport();
        context.remove_transport();
    }

    #[tokio::test]
    async fn start_message_receiver_resets_observed_counter() {
        let (context, source, transport) = context_fixture();
        transport.connect().await.unwrap();
        context.add_transport(transport).unwrap();

        context.start_message_receiver(39539).await.unwrap();
        source.emit(head_bone());
        wait_until(|| context.message_count() == 1).await;

        context.start_message_receiver(39539).await.unwrap();
        assert_eq!(context.message_count(), 0);
        assert_eq!(context.source_port(), 39539);
        assert!(context.message_receiver_is_running());
    }

    #[tokio::test]
    async fn stop_message_receiver_keeps_counters() {
        let (context, source, transport) = context_fixture();
        transport.connect().await.unwrap();
        context.add_transport(transport).unwrap();
        context.start_message_receiver(39539).await.unwrap();

        source.emit(head_bone());
        wait_until(|| context.message_count() == 1).await;

        context.stop_message_receiver().await;
        assert!(!context.message_receiver_is_running());
        assert_eq!(context.message_count(), 1);
    }

    #[tokio::test]
    async fn unconnected_local_traffic_is_not_counted() {
        let (context, source, transport) = context_fixture();
        context.add_transport(transport.clone()).unwrap();
        context.start_message_receiver(39539).await.unwrap();

        source.emit(head_bone());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(context.message_count(), 0);
        assert_eq!(context.published_message_count(), 0);

        transport.connect().await.unwrap();
        source.emit(head_bone());
        wait_until(|| context.message_count() == 1).await;
        wait_until(|| context.published_message_count() == 1).await;
    }

    #[tokio::test]
    async fn end_to_end_bone_transform_is_counted_and_logged() {
        let (context, source, transport) = context_fixture();
        transport.connect().await.unwrap();
        context.add_transport(transport.clone()).unwrap();
        context.enable_message_logging();
        context.start_message_receiver(39539).await.unwrap();

        source.emit(head_bone());

        wait_until(|| context.message_count() == 1).await;
        wait_until(|| !context.message_logs().is_empty()).await;

        let logs = context.message_logs();
        let newest = logs.last().unwrap();
        assert_eq!(newest.tag, "BoneTransform");
        assert_eq!(newest.detail.as_deref(), Some("Head, 0.1, 1.7, -0.2"));

        transport.wait_for_sent(1).await;
        wait_until(|| context.published_message_count() == 1).await;
    }

    #[tokio::test]
    async fn device_kinds_log_type_specific_tags() {
        let (context, source, transport) = context_fixture();
        transport.connect().await.unwrap();
        context.add_transport(transport).unwrap();
        context.enable_message_logging();
        context.start_message_receiver(39539).await.unwrap();

        for device_type in [
            DeviceType::HeadMountedDisplay,
            DeviceType::Controller,
            DeviceType::Tracker,
            DeviceType::Unknown,
        ] {
            source.emit(VmcMessage::DeviceTransform(DeviceTransform {
                device_type,
                serial: "S-1".to_string(),
                ..Default::default()
            }));
        }

        wait_until(|| context.message_logs().len() == 4).await;
        let tags: Vec<&str> = context.message_logs().iter().map(|l| l.tag).collect();
        assert_eq!(
            tags,
            vec![
                "HmdDeviceTransform",
                "ControllerDeviceTransform",
                "TrackerDeviceTransform",
                "UnknownDeviceTransform",
            ]
        );
    }

    #[tokio::test]
    async fn logging_toggle_clears_on_enable_and_freezes_on_disable() {
        let (context, source, transport) = context_fixture();
        transport.connect().await.unwrap();
        context.add_transport(transport).unwrap();
        context.start_message_receiver(39539).await.unwrap();
        context.enable_message_logging();

        source.emit(VmcMessage::Time(Time { time: 1.0 }));
        wait_until(|| context.message_logs().len() == 1).await;

        context.disable_message_logging();
        assert!(!context.message_logging_is_enabled());
        source.emit(VmcMessage::Time(Time { time: 2.0 }));
        wait_until(|| context.message_count() == 2).await;
        // Entry recorded before the toggle stays readable, growth stops.
        assert_eq!(context.message_logs().len(), 1);

        context.enable_message_logging();
        assert!(context.message_logs().is_empty());

        context.clear_message_logs();
        assert!(context.message_logs().is_empty());
    }

    #[tokio::test]
    async fn counters_and_logs_survive_transport_swap() {
        let (context, source, transport) = context_fixture();
        transport.connect().await.unwrap();
        context.add_transport(transport).unwrap();
        context.enable_message_logging();
        context.start_message_receiver(39539).await.unwrap();

        source.emit(head_bone());
        wait_until(|| context.message_count() == 1).await;

        context.remove_transport();
        assert_eq!(context.message_count(), 1);
        assert_eq!(context.message_logs().len(), 1);

        let replacement = Arc::new(LoopbackTransport::new(9));
        replacement.connect().await.unwrap();
        context.add_transport(replacement).unwrap();
        source.emit(head_bone());
        wait_until(|| context.message_count() == 2).await;
    }
}
