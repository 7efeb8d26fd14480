//! Device interaction capability.

use std::sync::Arc;

use async_trait::async_trait;

use crate::KeyringError;
use photon_types::{MultiAccounts, SignRequest, SignatureRecord};

/// Capability for exchanging records with the signing device.
///
/// [`crate::QrKeyring`] is generic over this trait. The production
/// implementation is [`crate::QrInteractionProvider`]; tests inject
/// in-memory doubles.
#[async_trait]
pub trait InteractionProvider: Send + Sync {
    /// Collect the device's account sync record.
    async fn read_multi_accounts(&self) -> Result<MultiAccounts, KeyringError>;

    /// Submit a signing request and collect the device's answer.
    ///
    /// Title and description are the prompts shown while the request is
    /// displayed.
    async fn request_signature(
        &self,
        request: &SignRequest,
        title: &str,
        description: &str,
    ) -> Result<SignatureRecord, KeyringError>;
}

// One physical device serves many keyrings; callers share a single
// provider by handing out Arc clones.
#[async_trait]
impl<P: InteractionProvider + ?Sized> InteractionProvider for Arc<P> {
    async fn read_multi_accounts(&self) -> Result<MultiAccounts, KeyringError> {
        (**self).read_multi_accounts().await
    }

    async fn request_signature(
        &self,
        request: &SignRequest,
        title: &str,
        description: &str,
    ) -> Result<SignatureRecord, KeyringError> {
        (**self).request_signature(request, title, description).await
    }
}
