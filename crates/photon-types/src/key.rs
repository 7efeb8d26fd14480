//! Synced key metadata and the persisted keyring layout.
//!
//! The serialized field names are camelCase so the layout stays
//! interchangeable with state persisted by JavaScript wallet hosts.

use serde::{Deserialize, Serialize};

/// Metadata for one HD key reported by the device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HDKey {
    /// BIP32-style derivation path, e.g. "m/44'/637'/0'/0/0"
    pub hd_path: String,
    /// Public key as a hex string
    pub pub_key: String,
    /// Position in the device's reported account list
    pub index: u32,
}

/// Serialized keyring state, owned and persisted by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringData {
    /// Master fingerprint of the device's root key, hex encoded
    pub xfp: String,
    pub keys: Vec<HDKey>,
    /// Wallet name, absent when the device never reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Device model tag
    #[serde(default)]
    pub device: String,
}
