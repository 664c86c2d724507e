//! Diagnostic log entry types for both relay directions.

use crate::transport::ClientId;
use std::time::SystemTime;

/// Default ring log capacity per context.
pub const DEFAULT_LOG_CAPACITY: usize = 4096;

/// One observed message on the publisher (local) path.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageLog {
    /// When the entry was recorded, not when the message was captured.
    pub timestamp: SystemTime,
    /// Kind-specific tag; device-bearing kinds resolve it from `DeviceType`.
    pub tag: &'static str,
    /// Human-readable field summary for bone and device poses.
    pub detail: Option<String>,
}

impl MessageLog {
    pub fn new(tag: &'static str, detail: Option<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            tag,
            detail,
        }
    }
}

/// One observed message on the subscriber path, stamped with the local
/// transport identity under which it was sent or observed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportedMessageLog {
    pub timestamp: SystemTime,
    pub tag: &'static str,
    pub detail: Option<String>,
    /// Local transport client identity at record time, -1 when detached.
    pub client_id: ClientId,
}

impl TransportedMessageLog {
    pub fn new(tag: &'static str, detail: Option<String>, client_id: ClientId) -> Self {
        Self {
            timestamp: SystemTime::now(),
            tag,
            detail,
            client_id,
        }
    }
}
