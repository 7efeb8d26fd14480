//! Wire records exchanged with the signing device.
//!
//! These mirror the registry record shapes an air-gapped device carries
//! in QR payloads: the multi-account sync record and the signing
//! request/signature pair. How the records are rendered into QR frames
//! is the transport's business; photon only sees decoded records and
//! their CBOR bytes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::path::KeyPath;

/// Record kinds carried in QR payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UrKind {
    MultiAccounts,
    SignRequest,
    Signature,
}

impl UrKind {
    /// Stable registry tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            UrKind::MultiAccounts => "crypto-multi-accounts",
            UrKind::SignRequest => "sign-request",
            UrKind::Signature => "signature",
        }
    }
}

impl fmt::Display for UrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed payload as it crosses the QR transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrPayload {
    pub kind: UrKind,
    /// CBOR bytes of the record, produced and consumed by [`crate::codec`]
    pub cbor: Vec<u8>,
}

/// Whether a signing request covers a serialized transaction or a
/// free-form message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignType {
    Transaction,
    Message,
}

/// One account entry in a multi-account sync record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    /// Public key bytes
    pub key: Vec<u8>,
    /// Derivation path the device derived this key at
    pub origin: KeyPath,
    /// Device-reported label, if any
    pub name: Option<String>,
}

/// Account sync record produced by the device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiAccounts {
    /// Master fingerprint of the device's root key
    pub master_fingerprint: [u8; 4],
    pub keys: Vec<AccountKey>,
    /// Device model tag, absent on some firmware
    pub device: Option<String>,
}

/// A signing request bound to one key and one device.
///
/// Built fresh for every sign call; the id is never reused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub request_id: Uuid,
    /// Opaque payload to sign, pre-serialized by the caller
    pub sign_data: Vec<u8>,
    pub sign_type: SignType,
    /// Exactly one entry: the derivation path of the signing key
    pub derivation_paths: Vec<String>,
    /// Exactly one entry: the master fingerprint of the target device
    pub fingerprints: Vec<String>,
    /// Sender address bytes, empty when the caller supplied none
    pub accounts: Vec<Vec<u8>>,
    /// Calling application tag shown on the device
    pub origin: Option<String>,
}

/// The device's answer to a signing request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Raw echoed request id bytes; older firmware omits the echo
    pub request_id: Option<Vec<u8>>,
    pub signature: Vec<u8>,
    /// Public key the device signed with
    pub auth_pub_key: Vec<u8>,
}
