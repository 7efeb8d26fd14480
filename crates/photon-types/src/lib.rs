//! Core types for the photon QR keyring.
//!
//! This crate defines the data model shared across photon crates:
//! synced key metadata, derivation paths, the wire records exchanged
//! with an air-gapped signing device, and the CBOR codec boundary.

pub mod codec;
pub mod key;
pub mod path;
pub mod registry;

pub use codec::CodecError;
pub use key::{HDKey, KeyringData};
pub use path::{KeyPath, PathComponent, PathError};
pub use registry::{
    AccountKey, MultiAccounts, SignRequest, SignType, SignatureRecord, UrKind, UrPayload,
};
