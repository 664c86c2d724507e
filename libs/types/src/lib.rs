//! # VMC Message Catalog
//!
//! ## Purpose
//! Unified type system for the VMC bridge: the closed set of motion-capture
//! message kinds exchanged between a local capture application and remote
//! bridge participants, plus the diagnostic tag/summary rules that every
//! relay direction shares.
//!
//! ## Integration Points
//! - **MessageKind**: stable per-kind wire identifier (travels next to the
//!   serialized payload, never inside it)
//! - **VmcMessage**: tagged union over all cataloged payloads; handlers
//!   switch on kind once instead of wiring one event per kind
//! - **tags**: log tag constants for the local and transported paths
//!
//! ## Architecture Role
//! ```text
//! Capture App → VmcMessage → Publisher → Transport → Subscriber → VmcMessage
//!                   ↓                                      ↓
//!               kind()/tag()                      transported_tag()
//! ```

pub mod messages;
pub mod tags;

pub use messages::{
    BlendShapeProxyApply, BlendShapeProxyValue, BoneTransform, Camera, ControllerInput,
    DeviceLocalTransform, DeviceTransform, DeviceType, KeyInput, Light, LocalVrm, MessageKind,
    PerformerAppStatus, RemoteVrm, RootTransform, Time, VmcMessage,
};
