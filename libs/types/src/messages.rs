//! The cataloged VMC message kinds and their payloads.
//!
//! Every payload is an immutable value type: plain owned fields, `Clone`,
//! `PartialEq` and serde derives. The catalog is closed — the bridge routes
//! these fourteen kinds and nothing else.

use crate::tags;
use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable wire identifier for every cataloged kind.
///
/// The identifier travels next to the serialized payload on the transport;
/// it is never part of the payload encoding itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum MessageKind {
    PerformerAppStatus = 1,
    LocalVrm = 2,
    RemoteVrm = 3,
    Time = 4,
    RootTransform = 5,
    BoneTransform = 6,
    BlendShapeProxyValue = 7,
    BlendShapeProxyApply = 8,
    Camera = 9,
    Light = 10,
    ControllerInput = 11,
    KeyInput = 12,
    DeviceTransform = 13,
    DeviceLocalTransform = 14,
}

/// Tracked device category carried by the device-bearing kinds.
///
/// Values outside the known range resolve to `Unknown` instead of failing;
/// an unrecognized device is a diagnostic curiosity, never an error.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    FromPrimitive,
    Serialize,
    Deserialize,
    Default,
)]
#[repr(u8)]
pub enum DeviceType {
    HeadMountedDisplay = 0,
    Controller = 1,
    Tracker = 2,
    #[default]
    Unknown = 255,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::HeadMountedDisplay => "HeadMountedDisplay",
            DeviceType::Controller => "Controller",
            DeviceType::Tracker => "Tracker",
            DeviceType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Capture application status (loaded model, calibration, tracking).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformerAppStatus {
    pub loaded: bool,
    pub calibration_state: i32,
    pub calibration_mode: i32,
    pub tracking: bool,
}

/// Avatar rig descriptor for a model available on the local machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocalVrm {
    pub path: String,
    pub title: String,
    pub hash: String,
}

/// Avatar rig descriptor resolved through a remote avatar service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RemoteVrm {
    pub service_name: String,
    pub json: String,
}

/// Capture-side clock, relative seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Time {
    pub time: f32,
}

/// Avatar root pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RootTransform {
    pub name: String,
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub rotation_w: f32,
}

/// Single bone pose, emitted per bone at capture rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoneTransform {
    pub name: String,
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub rotation_w: f32,
}

/// Blendshape proxy weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BlendShapeProxyValue {
    pub name: String,
    pub value: f32,
}

/// Commits all blendshape values staged since the previous apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BlendShapeProxyApply {}

/// Scene camera pose and field of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Camera {
    pub name: String,
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub rotation_w: f32,
    pub fov: f32,
}

/// Scene light pose and color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Light {
    pub name: String,
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub rotation_w: f32,
    pub color_red: f32,
    pub color_green: f32,
    pub color_blue: f32,
    pub color_alpha: f32,
}

/// Controller button/axis event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ControllerInput {
    pub active: i32,
    pub name: String,
    pub is_left: bool,
    pub is_touch: bool,
    pub is_axis: bool,
    pub axis_x: f32,
    pub axis_y: f32,
    pub axis_z: f32,
}

/// Keyboard event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct KeyInput {
    pub active: bool,
    pub name: String,
    pub keycode: i32,
}

/// Tracked device pose in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeviceTransform {
    pub device_type: DeviceType,
    pub serial: String,
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub rotation_w: f32,
}

/// Tracked device pose in avatar-local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeviceLocalTransform {
    pub device_type: DeviceType,
    pub serial: String,
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub rotation_w: f32,
}

/// Tagged union over the whole catalog.
///
/// One typed channel of `VmcMessage` replaces a per-kind event pair at every
/// seam: sources emit it, publishers serialize it, subscribers reconstruct it
/// and sinks consume it. Handlers switch on the variant once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VmcMessage {
    PerformerAppStatus(PerformerAppStatus),
    LocalVrm(LocalVrm),
    RemoteVrm(RemoteVrm),
    Time(Time),
    RootTransform(RootTransform),
    BoneTransform(BoneTransform),
    BlendShapeProxyValue(BlendShapeProxyValue),
    BlendShapeProxyApply(BlendShapeProxyApply),
    Camera(Camera),
    Light(Light),
    ControllerInput(ControllerInput),
    KeyInput(KeyInput),
    DeviceTransform(DeviceTransform),
    DeviceLocalTransform(DeviceLocalTransform),
}

impl VmcMessage {
    /// Wire identifier of this message's kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            VmcMessage::PerformerAppStatus(_) => MessageKind::PerformerAppStatus,
            VmcMessage::LocalVrm(_) => MessageKind::LocalVrm,
            VmcMessage::RemoteVrm(_) => MessageKind::RemoteVrm,
            VmcMessage::Time(_) => MessageKind::Time,
            VmcMessage::RootTransform(_) => MessageKind::RootTransform,
            VmcMessage::BoneTransform(_) => MessageKind::BoneTransform,
            VmcMessage::BlendShapeProxyValue(_) => MessageKind::BlendShapeProxyValue,
            VmcMessage::BlendShapeProxyApply(_) => MessageKind::BlendShapeProxyApply,
            VmcMessage::Camera(_) => MessageKind::Camera,
            VmcMessage::Light(_) => MessageKind::Light,
            VmcMessage::ControllerInput(_) => MessageKind::ControllerInput,
            VmcMessage::KeyInput(_) => MessageKind::KeyInput,
            VmcMessage::DeviceTransform(_) => MessageKind::DeviceTransform,
            VmcMessage::DeviceLocalTransform(_) => MessageKind::DeviceLocalTransform,
        }
    }

    /// Local-path log tag. Device-bearing kinds resolve the tag from their
    /// `DeviceType`, falling back to the unknown-device tag.
    pub fn tag(&self) -> &'static str {
        match self {
            VmcMessage::PerformerAppStatus(_) => tags::PERFORMER_APP_STATUS,
            VmcMessage::LocalVrm(_) => tags::LOCAL_VRM,
            VmcMessage::RemoteVrm(_) => tags::REMOTE_VRM,
            VmcMessage::Time(_) => tags::TIME,
            VmcMessage::RootTransform(_) => tags::ROOT_TRANSFORM,
            VmcMessage::BoneTransform(_) => tags::BONE_TRANSFORM,
            VmcMessage::BlendShapeProxyValue(_) => tags::BLEND_SHAPE_PROXY_VALUE,
            VmcMessage::BlendShapeProxyApply(_) => tags::BLEND_SHAPE_PROXY_APPLY,
            VmcMessage::Camera(_) => tags::CAMERA,
            VmcMessage::Light(_) => tags::LIGHT,
            VmcMessage::ControllerInput(_) => tags::CONTROLLER_INPUT,
            VmcMessage::KeyInput(_) => tags::KEY_INPUT,
            VmcMessage::DeviceTransform(v) => device_tag(v.device_type),
            VmcMessage::DeviceLocalTransform(v) => device_tag(v.device_type),
        }
    }

    /// Transported-path log tag, same resolution rules as [`VmcMessage::tag`].
    pub fn transported_tag(&self) -> &'static str {
        match self {
            VmcMessage::PerformerAppStatus(_) => tags::TRANSPORTED_PERFORMER_APP_STATUS,
            VmcMessage::LocalVrm(_) => tags::TRANSPORTED_LOCAL_VRM,
            VmcMessage::RemoteVrm(_) => tags::TRANSPORTED_REMOTE_VRM,
            VmcMessage::Time(_) => tags::TRANSPORTED_TIME,
            VmcMessage::RootTransform(_) => tags::TRANSPORTED_ROOT_TRANSFORM,
            VmcMessage::BoneTransform(_) => tags::TRANSPORTED_BONE_TRANSFORM,
            VmcMessage::BlendShapeProxyValue(_) => tags::TRANSPORTED_BLEND_SHAPE_PROXY_VALUE,
            VmcMessage::BlendShapeProxyApply(_) => tags::TRANSPORTED_BLEND_SHAPE_PROXY_APPLY,
            VmcMessage::Camera(_) => tags::TRANSPORTED_CAMERA,
            VmcMessage::Light(_) => tags::TRANSPORTED_LIGHT,
            VmcMessage::ControllerInput(_) => tags::TRANSPORTED_CONTROLLER_INPUT,
            VmcMessage::KeyInput(_) => tags::TRANSPORTED_KEY_INPUT,
            VmcMessage::DeviceTransform(v) => transported_device_tag(v.device_type),
            VmcMessage::DeviceLocalTransform(v) => transported_device_tag(v.device_type),
        }
    }

    /// Human-readable detail line for the kinds worth inspecting at 60+ Hz:
    /// bone poses and world-space device poses. `None` for everything else.
    pub fn summary(&self) -> Option<String> {
        match self {
            VmcMessage::BoneTransform(v) => Some(format!(
                "{}, {}, {}, {}",
                v.name, v.position_x, v.position_y, v.position_z
            )),
            VmcMessage::DeviceTransform(v) => Some(format!(
                "{}, {}, {}, {}, {}",
                v.device_type, v.serial, v.position_x, v.position_y, v.position_z
            )),
            _ => None,
        }
    }
}

fn device_tag(device_type: DeviceType) -> &'static str {
    match device_type {
        DeviceType::HeadMountedDisplay => tags::HMD_DEVICE_TRANSFORM,
        DeviceType::Controller => tags::CONTROLLER_DEVICE_TRANSFORM,
        DeviceType::Tracker => tags::TRACKER_DEVICE_TRANSFORM,
        DeviceType::Unknown => tags::UNKNOWN_DEVICE_TRANSFORM,
    }
}

fn transported_device_tag(device_type: DeviceType) -> &'static str {
    match device_type {
        DeviceType::HeadMountedDisplay => tags::TRANSPORTED_HMD_DEVICE_TRANSFORM,
        DeviceType::Controller => tags::TRANSPORTED_CONTROLLER_DEVICE_TRANSFORM,
        DeviceType::Tracker => tags::TRANSPORTED_TRACKER_DEVICE_TRANSFORM,
        DeviceType::Unknown => tags::TRANSPORTED_UNKNOWN_DEVICE_TRANSFORM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_transform(device_type: DeviceType) -> VmcMessage {
        VmcMessage::DeviceTransform(DeviceTransform {
            device_type,
            serial: "LHR-0123".to_string(),
            position_x: 0.5,
            position_y: 1.0,
            position_z: -0.25,
            ..Default::default()
        })
    }

    #[test]
    fn kind_roundtrips_through_u8() {
        for id in 1u8..=14 {
            let kind = MessageKind::try_from(id).unwrap();
            assert_eq!(u8::from(kind), id);
        }
        assert!(MessageKind::try_from(0u8).is_err());
        assert!(MessageKind::try_from(15u8).is_err());
    }

    #[test]
    fn unrecognized_device_type_resolves_to_unknown() {
        assert_eq!(DeviceType::from(7u8), DeviceType::Unknown);
        assert_eq!(DeviceType::from(255u8), DeviceType::Unknown);
        assert_eq!(DeviceType::from(2u8), DeviceType::Tracker);
    }

    #[test]
    fn device_tags_are_distinct_per_known_type() {
        let hmd = device_transform(DeviceType::HeadMountedDisplay).tag();
        let controller = device_transform(DeviceType::Controller).tag();
        let tracker = device_transform(DeviceType::Tracker).tag();

        assert_eq!(hmd, tags::HMD_DEVICE_TRANSFORM);
        assert_ne!(hmd, controller);
        assert_ne!(hmd, tracker);
        assert_ne!(controller, tracker);

        assert_eq!(
            device_transform(DeviceType::Unknown).tag(),
            tags::UNKNOWN_DEVICE_TRANSFORM
        );
    }

    #[test]
    fn transported_tags_mirror_device_resolution() {
        assert_eq!(
            device_transform(DeviceType::HeadMountedDisplay).transported_tag(),
            tags::TRANSPORTED_HMD_DEVICE_TRANSFORM
        );
        assert_eq!(
            device_transform(DeviceType::Unknown).transported_tag(),
            tags::TRANSPORTED_UNKNOWN_DEVICE_TRANSFORM
        );
    }

    #[test]
    fn bone_summary_lists_name_and_position() {
        let message = VmcMessage::BoneTransform(BoneTransform {
            name: "Head".to_string(),
            position_x: 0.1,
            position_y: 1.7,
            position_z: -0.2,
            ..Default::default()
        });
        assert_eq!(message.summary().unwrap(), "Head, 0.1, 1.7, -0.2");
    }

    #[test]
    fn device_summary_includes_type_and_serial() {
        let summary = device_transform(DeviceType::Tracker).summary().unwrap();
        assert_eq!(summary, "Tracker, LHR-0123, 0.5, 1, -0.25");
    }

    #[test]
    fn non_pose_kinds_have_no_summary() {
        assert!(VmcMessage::Time(Time { time: 12.5 }).summary().is_none());
        assert!(
            VmcMessage::BlendShapeProxyApply(BlendShapeProxyApply {})
                .summary()
                .is_none()
        );
    }
}
