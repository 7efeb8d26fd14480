//! Keyring state and the signing request protocol.

use tracing::warn;
use uuid::Uuid;

use crate::{InteractionProvider, KeyringError};
use photon_types::{HDKey, KeyringData, MultiAccounts, SignRequest, SignType, SignatureRecord};

const REQUEST_TITLE: &str = "Scan with your device";
const REQUEST_DESCRIPTION: &str =
    "After the device has signed, scan the QR code it displays to collect the signature";

/// Result of a signing round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPayload {
    /// Signature bytes produced by the device
    pub signature: Vec<u8>,
    /// Public key the device signed with
    pub auth_pub_key: Vec<u8>,
}

/// Keyring for one QR-connected hardware wallet.
///
/// Holds the HD key metadata synced from the device and builds,
/// dispatches and verifies signing requests through the injected
/// provider. Sync operations take `&mut self` while signing takes
/// `&self`, so a resync can never swap the key list out from under an
/// in-flight signature.
pub struct QrKeyring<P> {
    provider: P,
    xfp: String,
    keys: Vec<HDKey>,
    name: String,
    device: String,
    initialized: bool,
}

impl<P> QrKeyring<P> {
    /// Keyring type tag, kept stable for persisted caller state.
    pub const TYPE: &'static str = "QR Hardware Wallet Device";

    /// Placeholder wallet name used until the device reports one.
    pub const DEFAULT_NAME: &'static str = "QR Hardware";

    /// Create an empty, un-synced keyring.
    pub fn new(provider: P) -> Self {
        QrKeyring {
            provider,
            xfp: String::new(),
            keys: Vec::new(),
            name: Self::DEFAULT_NAME.to_string(),
            device: String::new(),
            initialized: false,
        }
    }

    /// Restore a keyring from previously exported state.
    pub fn from_data(provider: P, data: KeyringData) -> Self {
        let mut keyring = Self::new(provider);
        keyring.sync_keyring_data(data);
        keyring
    }

    /// Replace the keyring state with a decoded device sync record.
    ///
    /// A resync replaces the whole key list; entries keep their
    /// position in the device's reported order. The wallet name comes
    /// from the first entry's label, falling back to the placeholder
    /// when the record carries no entries or no label.
    pub fn sync_keyring(&mut self, accounts: &MultiAccounts) {
        self.device = accounts.device.clone().unwrap_or_default();
        self.xfp = hex::encode(accounts.master_fingerprint);
        self.name = accounts
            .keys
            .first()
            .and_then(|entry| entry.name.clone())
            .unwrap_or_else(|| Self::DEFAULT_NAME.to_string());
        self.keys = accounts
            .keys
            .iter()
            .enumerate()
            .map(|(index, entry)| HDKey {
                hd_path: entry.origin.to_string(),
                pub_key: hex::encode(&entry.key),
                index: index as u32,
            })
            .collect();
        self.initialized = true;
    }

    /// Restore state previously exported by [`QrKeyring::to_data`].
    pub fn sync_keyring_data(&mut self, data: KeyringData) {
        self.xfp = data.xfp;
        self.keys = data.keys;
        self.name = data.name.unwrap_or_else(|| Self::DEFAULT_NAME.to_string());
        self.device = data.device;
        self.initialized = true;
    }

    /// Export the current state for caller-owned persistence.
    pub fn to_data(&self) -> KeyringData {
        KeyringData {
            xfp: self.xfp.clone(),
            keys: self.keys.clone(),
            name: Some(self.name.clone()),
            device: self.device.clone(),
        }
    }

    /// Wallet name reported by the device, or the generic placeholder.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Master fingerprint of the synced device, hex encoded.
    pub fn xfp(&self) -> &str {
        &self.xfp
    }

    /// Device model tag from the last sync.
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Synced keys in device order. Empty until a sync has completed.
    pub fn pub_keys(&self) -> &[HDKey] {
        if self.initialized {
            &self.keys
        } else {
            &[]
        }
    }
}

impl<P: InteractionProvider> QrKeyring<P> {
    /// Sync the key list live from the device.
    ///
    /// Transport cancellation or failure propagates unchanged; the
    /// previous state is kept untouched in that case.
    pub async fn read_keyring(&mut self) -> Result<(), KeyringError> {
        let accounts = self.provider.read_multi_accounts().await?;
        self.sync_keyring(&accounts);
        Ok(())
    }

    /// Request a signature over a free-form message payload.
    pub async fn sign_message(
        &self,
        auth_pub_key: &str,
        payload: &[u8],
        sender_address: Option<&str>,
        origin: Option<&str>,
    ) -> Result<SignedPayload, KeyringError> {
        self.get_signature(auth_pub_key, payload, SignType::Message, sender_address, origin)
            .await
    }

    /// Request a signature over a serialized transaction payload.
    pub async fn sign_transaction(
        &self,
        auth_pub_key: &str,
        payload: &[u8],
        sender_address: Option<&str>,
        origin: Option<&str>,
    ) -> Result<SignedPayload, KeyringError> {
        self.get_signature(auth_pub_key, payload, SignType::Transaction, sender_address, origin)
            .await
    }

    async fn get_signature(
        &self,
        auth_pub_key: &str,
        payload: &[u8],
        sign_type: SignType,
        sender_address: Option<&str>,
        origin: Option<&str>,
    ) -> Result<SignedPayload, KeyringError> {
        let request_id = Uuid::new_v4();

        // Hex forms differing only in 0x prefix or digit case refer to
        // the same key.
        let wanted = strip_hex_prefix(auth_pub_key);
        let key = self
            .keys
            .iter()
            .find(|key| strip_hex_prefix(&key.pub_key).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| KeyringError::KeyNotFound(auth_pub_key.to_string()))?;

        let accounts = match sender_address {
            Some(address) => vec![hex::decode(strip_hex_prefix(address))?],
            None => Vec::new(),
        };

        let request = SignRequest {
            request_id,
            sign_data: payload.to_vec(),
            sign_type,
            derivation_paths: vec![key.hd_path.clone()],
            fingerprints: vec![self.xfp.clone()],
            accounts,
            origin: origin.map(str::to_string),
        };

        let record = self
            .provider
            .request_signature(&request, REQUEST_TITLE, REQUEST_DESCRIPTION)
            .await?;

        verify_request_id(request_id, &record)?;

        Ok(SignedPayload {
            signature: record.signature,
            auth_pub_key: record.auth_pub_key,
        })
    }
}

/// Check that the answer echoes the id of the request that was sent.
///
/// Older firmware omits the echo; the record is then accepted as is,
/// with the skipped check logged.
fn verify_request_id(expected: Uuid, record: &SignatureRecord) -> Result<(), KeyringError> {
    let bytes = match &record.request_id {
        Some(bytes) => bytes,
        None => {
            warn!(request_id = %expected, "signature record omitted the request id echo, skipping verification");
            return Ok(());
        }
    };

    let returned = Uuid::from_slice(bytes).map_err(|_| KeyringError::RequestIdMismatch {
        expected: expected.to_string(),
        returned: hex::encode(bytes),
    })?;

    if returned != expected {
        return Err(KeyringError::RequestIdMismatch {
            expected: expected.to_string(),
            returned: returned.to_string(),
        });
    }

    Ok(())
}

fn strip_hex_prefix(hex_str: &str) -> &str {
    hex_str.strip_prefix("0x").unwrap_or(hex_str)
}
