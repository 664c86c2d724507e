//! Loopback Bridge Demo
//!
//! Wires a publisher context and a subscriber context over an in-process
//! loopback transport pair and streams synthetic motion-capture telemetry
//! through the full relay pipeline:
//!
//! source → PublisherContext → transport A ⇄ transport B → SubscriberContext → sink
//!
//! Useful for exercising the pipeline and its diagnostics without a real
//! capture application or network transport attached.

use anyhow::{Context, Result};
use clap::Parser;
use codec::BincodeSerializer;
use relay_core::test_utils::{ChannelSource, CollectorSink, LoopbackTransport};
use relay_core::{BridgeConfig, PublisherContext, SubscriberContext, Transport};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::{BoneTransform, Time, VmcMessage};

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Loopback motion-capture bridge demo")]
struct Args {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_core=info,relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => BridgeConfig::default(),
    };

    info!(
        source_port = config.source.port,
        sink_port = config.sink.port,
        transport = %config.transport.kind,
        "Starting loopback bridge demo"
    );

    // Linked transport pair: frames published through A arrive at B.
    let transport_a = Arc::new(LoopbackTransport::new(1));
    let transport_b = Arc::new(LoopbackTransport::new(2));
    LoopbackTransport::link(&transport_a, &transport_b);
    transport_a.connect().await.context("transport A connect")?;
    transport_b.connect().await.context("transport B connect")?;

    let serializer = Arc::new(BincodeSerializer::new());
    let source = Arc::new(ChannelSource::new());
    let sink = Arc::new(CollectorSink::new());

    let publisher = PublisherContext::with_log_capacity(
        serializer.clone(),
        source.clone(),
        config.logging.capacity,
    );
    publisher
        .add_transport(transport_a.clone())
        .context("attach publisher transport")?;
    publisher
        .start_message_receiver(config.source.port)
        .await
        .context("start message receiver")?;

    let subscriber =
        SubscriberContext::with_log_capacity(serializer, sink.clone(), config.logging.capacity);
    subscriber
        .add_transport(transport_b.clone())
        .context("attach subscriber transport")?;
    subscriber
        .start_message_sender(&config.sink.address, config.sink.port)
        .await
        .context("start message sender")?;

    if config.logging.enabled {
        publisher.enable_message_logging();
        subscriber.enable_message_logging();
    }

    // Synthetic telemetry: one bone transform plus a time sync per tick.
    let feed = tokio::spawn({
        let source = source.clone();
        async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(33));
            let mut elapsed = 0.0f32;
            loop {
                ticker.tick().await;
                elapsed += 0.033;
                source.emit(VmcMessage::BoneTransform(BoneTransform {
                    name: "Head".to_string(),
                    position_y: 1.7,
                    rotation_w: 1.0,
                    ..Default::default()
                }));
                source.emit(VmcMessage::Time(Time { time: elapsed }));
            }
        }
    });

    info!("Bridge running. Press Ctrl+C to stop.");
    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    feed.abort();

    info!(
        published = publisher.published_message_count(),
        observed_local = publisher.message_count(),
        transported = subscriber.transported_message_count(),
        delivered = subscriber.message_count(),
        "Shutting down loopback bridge demo"
    );

    subscriber.remove_transport();
    publisher.remove_transport();
    transport_a.disconnect().await.ok();
    transport_b.disconnect().await.ok();

    Ok(())
}
