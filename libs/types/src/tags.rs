//! Diagnostic log tags for every cataloged kind.
//!
//! Two tag families: the plain tags instrument the local path (a message
//! observed on its way out or delivered locally), the `Transported*` tags
//! instrument messages that crossed a transport. Device-bearing kinds do not
//! log a single tag; they resolve one of the device-specific tags from their
//! `DeviceType`, with an explicit unknown fallback.

pub const PERFORMER_APP_STATUS: &str = "PerformerAppStatus";
pub const LOCAL_VRM: &str = "LocalVrm";
pub const REMOTE_VRM: &str = "RemoteVrm";
pub const TIME: &str = "Time";
pub const ROOT_TRANSFORM: &str = "RootTransform";
pub const BONE_TRANSFORM: &str = "BoneTransform";
pub const BLEND_SHAPE_PROXY_VALUE: &str = "BlendShapeProxyValue";
pub const BLEND_SHAPE_PROXY_APPLY: &str = "BlendShapeProxyApply";
pub const CAMERA: &str = "Camera";
pub const LIGHT: &str = "Light";
pub const CONTROLLER_INPUT: &str = "ControllerInput";
pub const KEY_INPUT: &str = "KeyInput";

pub const HMD_DEVICE_TRANSFORM: &str = "HmdDeviceTransform";
pub const CONTROLLER_DEVICE_TRANSFORM: &str = "ControllerDeviceTransform";
pub const TRACKER_DEVICE_TRANSFORM: &str = "TrackerDeviceTransform";
pub const UNKNOWN_DEVICE_TRANSFORM: &str = "UnknownDeviceTransform";

pub const TRANSPORTED_PERFORMER_APP_STATUS: &str = "TransportedPerformerAppStatus";
pub const TRANSPORTED_LOCAL_VRM: &str = "TransportedLocalVrm";
pub const TRANSPORTED_REMOTE_VRM: &str = "TransportedRemoteVrm";
pub const TRANSPORTED_TIME: &str = "TransportedTime";
pub const TRANSPORTED_ROOT_TRANSFORM: &str = "TransportedRootTransform";
pub const TRANSPORTED_BONE_TRANSFORM: &str = "TransportedBoneTransform";
pub const TRANSPORTED_BLEND_SHAPE_PROXY_VALUE: &str = "TransportedBlendShapeProxyValue";
pub const TRANSPORTED_BLEND_SHAPE_PROXY_APPLY: &str = "TransportedBlendShapeProxyApply";
pub const TRANSPORTED_CAMERA: &str = "TransportedCamera";
pub const TRANSPORTED_LIGHT: &str = "TransportedLight";
pub const TRANSPORTED_CONTROLLER_INPUT: &str = "TransportedControllerInput";
pub const TRANSPORTED_KEY_INPUT: &str = "TransportedKeyInput";

pub const TRANSPORTED_HMD_DEVICE_TRANSFORM: &str = "TransportedHmdDeviceTransform";
pub const TRANSPORTED_CONTROLLER_DEVICE_TRANSFORM: &str = "TransportedControllerDeviceTransform";
pub const TRANSPORTED_TRACKER_DEVICE_TRANSFORM: &str = "TransportedTrackerDeviceTransform";
pub const TRANSPORTED_UNKNOWN_DEVICE_TRANSFORM: &str = "TransportedUnknownDeviceTransform";
