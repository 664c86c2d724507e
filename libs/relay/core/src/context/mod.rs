//! # Relay Session Contexts
//!
//! ## Purpose
//! Per-direction session managers. A context owns the full relay lifecycle
//! for one direction: the attachment state machine for the single active
//! transport, the observed/transported counters, the bounded diagnostic ring
//! log, and the wiring that turns catalog traffic into log entries.
//!
//! ## Shared Rules
//! - Attach is a guarded transition: attaching while attached is rejected,
//!   never silently replaced; detaching while detached is a no-op.
//! - Counters reset exactly when the local endpoint is (re)started.
//! - Enabling logging clears the ring log first; disabling only stops
//!   growth and keeps existing entries readable.
//! - Counters and logs are written by pump tasks and read by diagnostics
//!   consumers on any thread (atomics + a mutex-guarded ring).

mod publisher;
mod subscriber;

pub use publisher::PublisherContext;
pub use subscriber::SubscriberContext;
