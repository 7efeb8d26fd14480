//! Default interaction provider over a QR display/scan transport.
//!
//! The provider owns the record codec boundary: requests are encoded to
//! CBOR before display and answers decoded after scanning. The QR
//! rendering and camera plumbing live behind [`QrLink`].

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{InteractionProvider, KeyringError};
use photon_types::{codec, MultiAccounts, SignRequest, SignatureRecord, UrKind, UrPayload};

/// Ceiling on QR fragment size, matching device scanner limits.
pub const MAX_FRAGMENT_LENGTH: usize = 400;

const SYNC_TITLE: &str = "Sync device";
const SYNC_DESCRIPTION: &str = "Please scan the QR code displayed on your device";
const SCAN_SIGNATURE_TITLE: &str = "Scan device";
const SCAN_SIGNATURE_DESCRIPTION: &str = "Please scan the QR code displayed on your device";

/// Options for displaying an animated QR payload.
#[derive(Clone, Debug)]
pub struct PlayOptions {
    pub title: String,
    pub description: String,
    /// Whether a follow-up scan is expected after the display
    pub has_next: bool,
    pub max_fragment_length: usize,
}

/// Options for scanning a QR payload.
#[derive(Clone, Debug)]
pub struct ReadOptions {
    pub title: String,
    pub description: String,
}

/// Outcome of displaying a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayStatus {
    Completed,
    Canceled,
}

/// Outcome of scanning for a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Decoded(UrPayload),
    Canceled,
}

/// QR display/scan channel the provider drives.
///
/// Implementations own the actual rendering and camera handling, on
/// whatever UI stack the host application uses.
#[async_trait]
pub trait QrLink: Send + Sync {
    /// Display a payload until the user moves on or cancels.
    async fn play(
        &self,
        payload: &UrPayload,
        options: &PlayOptions,
    ) -> Result<PlayStatus, KeyringError>;

    /// Scan until a payload of one of the supported kinds is decoded or
    /// the user cancels.
    async fn read(
        &self,
        supported: &[UrKind],
        options: &ReadOptions,
    ) -> Result<ReadOutcome, KeyringError>;
}

/// Interaction provider speaking QR records over a [`QrLink`].
///
/// The internal lock stays held across each full display/scan round
/// trip, so clones of one shared provider never interleave traffic to
/// the single physical device.
pub struct QrInteractionProvider<L> {
    link: L,
    exchange: Mutex<()>,
}

impl<L> QrInteractionProvider<L> {
    pub fn new(link: L) -> Self {
        QrInteractionProvider {
            link,
            exchange: Mutex::new(()),
        }
    }
}

#[async_trait]
impl<L: QrLink> InteractionProvider for QrInteractionProvider<L> {
    async fn read_multi_accounts(&self) -> Result<MultiAccounts, KeyringError> {
        let _exchange = self.exchange.lock().await;

        let options = ReadOptions {
            title: SYNC_TITLE.to_string(),
            description: SYNC_DESCRIPTION.to_string(),
        };
        let payload = match self.link.read(&[UrKind::MultiAccounts], &options).await? {
            ReadOutcome::Decoded(payload) => payload,
            ReadOutcome::Canceled => {
                return Err(KeyringError::TransportCanceled(
                    "sync read canceled".to_string(),
                ))
            }
        };
        expect_kind(UrKind::MultiAccounts, &payload)?;

        Ok(codec::decode(&payload.cbor)?)
    }

    async fn request_signature(
        &self,
        request: &SignRequest,
        title: &str,
        description: &str,
    ) -> Result<SignatureRecord, KeyringError> {
        let _exchange = self.exchange.lock().await;

        debug!(request_id = %request.request_id, sign_type = ?request.sign_type, "displaying signing request");

        let payload = UrPayload {
            kind: UrKind::SignRequest,
            cbor: codec::encode(request)?,
        };
        let play_options = PlayOptions {
            title: title.to_string(),
            description: description.to_string(),
            has_next: true,
            max_fragment_length: MAX_FRAGMENT_LENGTH,
        };
        match self.link.play(&payload, &play_options).await? {
            PlayStatus::Completed => {}
            PlayStatus::Canceled => {
                return Err(KeyringError::TransportCanceled("play canceled".to_string()))
            }
        }

        let read_options = ReadOptions {
            title: SCAN_SIGNATURE_TITLE.to_string(),
            description: SCAN_SIGNATURE_DESCRIPTION.to_string(),
        };
        let answer = match self.link.read(&[UrKind::Signature], &read_options).await? {
            ReadOutcome::Decoded(payload) => payload,
            ReadOutcome::Canceled => {
                return Err(KeyringError::TransportCanceled(
                    "read signature canceled".to_string(),
                ))
            }
        };
        expect_kind(UrKind::Signature, &answer)?;

        Ok(codec::decode(&answer.cbor)?)
    }
}

fn expect_kind(expected: UrKind, payload: &UrPayload) -> Result<(), KeyringError> {
    if payload.kind != expected {
        return Err(KeyringError::UnexpectedPayload {
            expected: expected.as_str().to_string(),
            got: payload.kind.as_str().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photon_types::{AccountKey, KeyPath};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;
    use uuid::Uuid;

    /// Link double that answers reads from a script and records plays.
    struct MemoryLink {
        play_status: PlayStatus,
        played: StdMutex<Vec<(UrPayload, PlayOptions)>>,
        reads: StdMutex<VecDeque<ReadOutcome>>,
    }

    impl MemoryLink {
        fn new(play_status: PlayStatus, reads: Vec<ReadOutcome>) -> Self {
            MemoryLink {
                play_status,
                played: StdMutex::new(Vec::new()),
                reads: StdMutex::new(reads.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl QrLink for MemoryLink {
        async fn play(
            &self,
            payload: &UrPayload,
            options: &PlayOptions,
        ) -> Result<PlayStatus, KeyringError> {
            self.played
                .lock()
                .unwrap()
                .push((payload.clone(), options.clone()));
            Ok(self.play_status)
        }

        async fn read(
            &self,
            _supported: &[UrKind],
            _options: &ReadOptions,
        ) -> Result<ReadOutcome, KeyringError> {
            Ok(self
                .reads
                .lock()
                .unwrap()
                .pop_front()
                .expect("no read outcome scripted"))
        }
    }

    fn sync_record() -> MultiAccounts {
        MultiAccounts {
            master_fingerprint: [0x12, 0x34, 0xab, 0xcd],
            keys: vec![AccountKey {
                key: vec![0xaa, 0x11],
                origin: KeyPath::parse("m/44'/637'/0'/0/0").unwrap(),
                name: None,
            }],
            device: Some("keystone".to_string()),
        }
    }

    fn sign_request() -> SignRequest {
        SignRequest {
            request_id: Uuid::from_bytes([0x42; 16]),
            sign_data: b"payload".to_vec(),
            sign_type: photon_types::SignType::Transaction,
            derivation_paths: vec!["m/44'/637'/0'/0/0".to_string()],
            fingerprints: vec!["1234abcd".to_string()],
            accounts: vec![],
            origin: None,
        }
    }

    fn signature_payload(record: &SignatureRecord) -> UrPayload {
        UrPayload {
            kind: UrKind::Signature,
            cbor: codec::encode(record).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_read_multi_accounts_decodes_record() {
        let record = sync_record();
        let payload = UrPayload {
            kind: UrKind::MultiAccounts,
            cbor: codec::encode(&record).unwrap(),
        };
        let provider = QrInteractionProvider::new(MemoryLink::new(
            PlayStatus::Completed,
            vec![ReadOutcome::Decoded(payload)],
        ));

        let decoded = provider.read_multi_accounts().await.unwrap();
        assert_eq!(decoded, record);
    }

    #[tokio::test]
    async fn test_sync_read_cancel_surfaces_phase() {
        let provider = QrInteractionProvider::new(MemoryLink::new(
            PlayStatus::Completed,
            vec![ReadOutcome::Canceled],
        ));

        let result = provider.read_multi_accounts().await;
        match result {
            Err(KeyringError::TransportCanceled(phase)) => assert_eq!(phase, "sync read canceled"),
            other => panic!("expected cancel, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_signature_round_trip() {
        let record = SignatureRecord {
            request_id: Some(vec![0x42; 16]),
            signature: vec![0x51],
            auth_pub_key: vec![0xa1],
        };
        let link = MemoryLink::new(
            PlayStatus::Completed,
            vec![ReadOutcome::Decoded(signature_payload(&record))],
        );
        let provider = QrInteractionProvider::new(link);

        let request = sign_request();
        let answer = provider
            .request_signature(&request, "Scan with your device", "prompt")
            .await
            .unwrap();
        assert_eq!(answer, record);

        // The displayed payload carries the encoded request and the
        // display options
        let played = provider.link.played.lock().unwrap();
        let (payload, options) = &played[0];
        assert_eq!(payload.kind, UrKind::SignRequest);
        let displayed: SignRequest = codec::decode(&payload.cbor).unwrap();
        assert_eq!(displayed, request);
        assert_eq!(options.title, "Scan with your device");
        assert!(options.has_next);
        assert_eq!(options.max_fragment_length, MAX_FRAGMENT_LENGTH);
    }

    #[tokio::test]
    async fn test_play_cancel_surfaces_phase() {
        let provider =
            QrInteractionProvider::new(MemoryLink::new(PlayStatus::Canceled, vec![]));

        let result = provider
            .request_signature(&sign_request(), "title", "description")
            .await;
        match result {
            Err(KeyringError::TransportCanceled(phase)) => assert_eq!(phase, "play canceled"),
            other => panic!("expected cancel, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signature_read_cancel_surfaces_phase() {
        let provider = QrInteractionProvider::new(MemoryLink::new(
            PlayStatus::Completed,
            vec![ReadOutcome::Canceled],
        ));

        let result = provider
            .request_signature(&sign_request(), "title", "description")
            .await;
        match result {
            Err(KeyringError::TransportCanceled(phase)) => {
                assert_eq!(phase, "read signature canceled")
            }
            other => panic!("expected cancel, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_payload_kind_rejected() {
        // Link hands back a sign request where a signature was expected
        let stray = UrPayload {
            kind: UrKind::SignRequest,
            cbor: codec::encode(&sign_request()).unwrap(),
        };
        let provider = QrInteractionProvider::new(MemoryLink::new(
            PlayStatus::Completed,
            vec![ReadOutcome::Decoded(stray)],
        ));

        let result = provider
            .request_signature(&sign_request(), "title", "description")
            .await;
        assert!(matches!(
            result,
            Err(KeyringError::UnexpectedPayload { .. })
        ));
    }

    /// Link whose camera is unavailable.
    struct BrokenLink;

    #[async_trait]
    impl QrLink for BrokenLink {
        async fn play(
            &self,
            _payload: &UrPayload,
            _options: &PlayOptions,
        ) -> Result<PlayStatus, KeyringError> {
            Err(KeyringError::Transport("camera unavailable".to_string()))
        }

        async fn read(
            &self,
            _supported: &[UrKind],
            _options: &ReadOptions,
        ) -> Result<ReadOutcome, KeyringError> {
            Err(KeyringError::Transport("camera unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_link_failure_propagates_unchanged() {
        let provider = QrInteractionProvider::new(BrokenLink);

        let sync = provider.read_multi_accounts().await;
        assert!(matches!(sync, Err(KeyringError::Transport(_))));

        let sign = provider
            .request_signature(&sign_request(), "title", "description")
            .await;
        assert!(matches!(sign, Err(KeyringError::Transport(_))));
    }

    #[tokio::test]
    async fn test_undecodable_answer_is_codec_error() {
        let junk = UrPayload {
            kind: UrKind::Signature,
            cbor: vec![0xff, 0x00],
        };
        let provider = QrInteractionProvider::new(MemoryLink::new(
            PlayStatus::Completed,
            vec![ReadOutcome::Decoded(junk)],
        ));

        let result = provider
            .request_signature(&sign_request(), "title", "description")
            .await;
        assert!(matches!(result, Err(KeyringError::Codec(_))));
    }

    /// Link that tracks how many exchanges run at once.
    struct SlowLink {
        record: MultiAccounts,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl QrLink for SlowLink {
        async fn play(
            &self,
            _payload: &UrPayload,
            _options: &PlayOptions,
        ) -> Result<PlayStatus, KeyringError> {
            Ok(PlayStatus::Completed)
        }

        async fn read(
            &self,
            _supported: &[UrKind],
            _options: &ReadOptions,
        ) -> Result<ReadOutcome, KeyringError> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            Ok(ReadOutcome::Decoded(UrPayload {
                kind: UrKind::MultiAccounts,
                cbor: codec::encode(&self.record).unwrap(),
            }))
        }
    }

    #[tokio::test]
    async fn test_shared_provider_serializes_exchanges() {
        let provider = Arc::new(QrInteractionProvider::new(SlowLink {
            record: sync_record(),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }));

        let first = provider.read_multi_accounts();
        let second = provider.read_multi_accounts();
        let (a, b) = tokio::join!(first, second);
        a.unwrap();
        b.unwrap();

        assert_eq!(provider.link.max_active.load(Ordering::SeqCst), 1);
    }
}
