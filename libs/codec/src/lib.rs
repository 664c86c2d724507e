//! # VMC Bridge Codec
//!
//! ## Purpose
//! Owns the byte representation of cataloged payloads crossing a transport.
//! The relay core never touches encoding rules directly; it talks to the
//! [`MessageSerializer`] seam and both directions of the bridge share one
//! implementation.
//!
//! ## Message Format
//! The kind identifier travels out of band (the transport frames it next to
//! the payload), so the codec encodes only the payload struct of the variant.
//! Bincode keeps the hot bone-pose path allocation-light and round-trips
//! every cataloged kind losslessly.

pub mod serializer;

pub use serializer::{BincodeSerializer, MessageSerializer};

use types::MessageKind;

/// Codec operation errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode {kind:?} payload: {source}")]
    Encode {
        kind: MessageKind,
        source: bincode::Error,
    },

    #[error("failed to decode {kind:?} payload: {source}")]
    Decode {
        kind: MessageKind,
        source: bincode::Error,
    },

    #[error("unknown message kind identifier: {0}")]
    UnknownKind(u8),
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Resolve a wire kind identifier to a cataloged [`MessageKind`].
///
/// Transports frame payloads with the raw u8; anything outside the catalog
/// is rejected before the payload is ever decoded.
pub fn kind_from_wire(id: u8) -> CodecResult<MessageKind> {
    MessageKind::try_from(id).map_err(|_| CodecError::UnknownKind(id))
}
