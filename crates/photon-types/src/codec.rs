//! CBOR codec boundary for the record types.
//!
//! Serialization is delegated wholesale to serde_cbor; nothing in
//! photon hand-rolls a wire format.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("cbor encode error:: {0}")]
    Encode(serde_cbor::Error),

    #[error("cbor decode error:: {0}")]
    Decode(serde_cbor::Error),
}

/// Encode a record to CBOR bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_cbor::to_vec(value).map_err(CodecError::Encode)
}

/// Decode a record from CBOR bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_cbor::from_slice(bytes).map_err(CodecError::Decode)
}
