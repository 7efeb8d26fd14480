//! QR hardware wallet keyring
//!
//! This crate manages HD public-key metadata synced from an air-gapped
//! signing device and mediates signing requests over an out-of-band QR
//! display/scan channel. The core guarantee is request/response
//! correlation: every signature handed back to the caller is verified
//! against the id of the request it answers.
//!
//! Device I/O goes through the [`InteractionProvider`] capability,
//! injected at construction. [`QrInteractionProvider`] is the default
//! implementation over a [`QrLink`] transport; tests substitute
//! in-memory doubles.

use thiserror::Error;

pub mod interaction;
pub mod keyring;
pub mod provider;

pub use interaction::InteractionProvider;
pub use keyring::{QrKeyring, SignedPayload};
pub use provider::{
    PlayOptions, PlayStatus, QrInteractionProvider, QrLink, ReadOptions, ReadOutcome,
};

// Re-export the data model the keyring speaks.
pub use photon_types::{
    HDKey, KeyringData, MultiAccounts, SignRequest, SignType, SignatureRecord,
};

#[derive(Error, Debug)]
pub enum KeyringError {
    #[error("transport error:: {0}")]
    Transport(String),

    #[error("transport canceled:: {0}")]
    TransportCanceled(String),

    #[error("key not found:: {0}")]
    KeyNotFound(String),

    #[error("request id mismatch:: expected {expected}, device returned {returned}")]
    RequestIdMismatch { expected: String, returned: String },

    #[error("invalid hex:: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("codec error:: {0}")]
    Codec(#[from] photon_types::CodecError),

    #[error("unexpected payload:: expected {expected}, got {got}")]
    UnexpectedPayload { expected: String, got: String },
}
