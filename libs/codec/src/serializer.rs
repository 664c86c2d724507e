//! Serializer seam between the relay core and the wire.

use crate::{CodecError, CodecResult};
use bytes::Bytes;
use types::{
    BlendShapeProxyApply, BlendShapeProxyValue, BoneTransform, Camera, ControllerInput,
    DeviceLocalTransform, DeviceTransform, KeyInput, Light, LocalVrm, MessageKind,
    PerformerAppStatus, RemoteVrm, RootTransform, Time, VmcMessage,
};

/// Lossless payload codec consumed by both relay directions.
///
/// Implementations must round-trip every cataloged kind: for all messages
/// `deserialize(m.kind(), &serialize(m)?)? == m`.
pub trait MessageSerializer: Send + Sync {
    /// Encode the payload of `message` (kind travels out of band).
    fn serialize(&self, message: &VmcMessage) -> CodecResult<Bytes>;

    /// Reconstruct a message of `kind` from its payload bytes.
    fn deserialize(&self, kind: MessageKind, payload: &[u8]) -> CodecResult<VmcMessage>;
}

/// Bincode-backed [`MessageSerializer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    pub fn new() -> Self {
        Self
    }
}

fn encode<T: serde::Serialize>(kind: MessageKind, payload: &T) -> CodecResult<Bytes> {
    bincode::serialize(payload)
        .map(Bytes::from)
        .map_err(|source| CodecError::Encode { kind, source })
}

fn decode<T: serde::de::DeserializeOwned>(kind: MessageKind, payload: &[u8]) -> CodecResult<T> {
    bincode::deserialize(payload).map_err(|source| CodecError::Decode { kind, source })
}

impl MessageSerializer for BincodeSerializer {
    fn serialize(&self, message: &VmcMessage) -> CodecResult<Bytes> {
        let kind = message.kind();
        match message {
            VmcMessage::PerformerAppStatus(v) => encode(kind, v),
            VmcMessage::LocalVrm(v) => encode(kind, v),
            VmcMessage::RemoteVrm(v) => encode(kind, v),
            VmcMessage::Time(v) => encode(kind, v),
            VmcMessage::RootTransform(v) => encode(kind, v),
            VmcMessage::BoneTransform(v) => encode(kind, v),
            VmcMessage::BlendShapeProxyValue(v) => encode(kind, v),
            VmcMessage::BlendShapeProxyApply(v) => encode(kind, v),
            VmcMessage::Camera(v) => encode(kind, v),
            VmcMessage::Light(v) => encode(kind, v),
            VmcMessage::ControllerInput(v) => encode(kind, v),
            VmcMessage::KeyInput(v) => encode(kind, v),
            VmcMessage::DeviceTransform(v) => encode(kind, v),
            VmcMessage::DeviceLocalTransform(v) => encode(kind, v),
        }
    }

    fn deserialize(&self, kind: MessageKind, payload: &[u8]) -> CodecResult<VmcMessage> {
        let message = match kind {
            MessageKind::PerformerAppStatus => {
                VmcMessage::PerformerAppStatus(decode::<PerformerAppStatus>(kind, payload)?)
            }
            MessageKind::LocalVrm => VmcMessage::LocalVrm(decode::<LocalVrm>(kind, payload)?),
            MessageKind::RemoteVrm => VmcMessage::RemoteVrm(decode::<RemoteVrm>(kind, payload)?),
            MessageKind::Time => VmcMessage::Time(decode::<Time>(kind, payload)?),
            MessageKind::RootTransform => {
                VmcMessage::RootTransform(decode::<RootTransform>(kind, payload)?)
            }
            MessageKind::BoneTransform => {
                VmcMessage::BoneTransform(decode::<BoneTransform>(kind, payload)?)
            }
            MessageKind::BlendShapeProxyValue => {
                VmcMessage::BlendShapeProxyValue(decode::<BlendShapeProxyValue>(kind, payload)?)
            }
            MessageKind::BlendShapeProxyApply => {
                VmcMessage::BlendShapeProxyApply(decode::<BlendShapeProxyApply>(kind, payload)?)
            }
            MessageKind::Camera => VmcMessage::Camera(decode::<Camera>(kind, payload)?),
            MessageKind::Light => VmcMessage::Light(decode::<Light>(kind, payload)?),
            MessageKind::ControllerInput => {
                VmcMessage::ControllerInput(decode::<ControllerInput>(kind, payload)?)
            }
            MessageKind::KeyInput => VmcMessage::KeyInput(decode::<KeyInput>(kind, payload)?),
            MessageKind::DeviceTransform => {
                VmcMessage::DeviceTransform(decode::<DeviceTransform>(kind, payload)?)
            }
            MessageKind::DeviceLocalTransform => {
                VmcMessage::DeviceLocalTransform(decode::<DeviceLocalTransform>(kind, payload)?)
            }
        };
        Ok(message)
    }
}
