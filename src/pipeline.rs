//! Put/Get Pipeline: orchestrates materials manager, content cipher and
//! metadata codec around an abstract `StorageClient`. Object storage
//! transport, credentials and retries are out of scope; `StorageClient` is
//! the seam a real SDK plugs into.

use crate::content::{gcm, legacy};
use crate::context::EncryptionContext;
use crate::error::EnvelopeError;
use crate::materials::MaterialsManager;
use crate::metadata;
use crate::rng::{OsSecureRandom, SecureRandom};
use crate::suite::AlgorithmSuite;
use std::collections::BTreeMap;

pub struct PutObjectRequest {
    pub key: String,
    pub metadata: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

pub struct PutObjectResponse {
    pub e_tag: Option<String>,
}

pub struct GetObjectRequest {
    pub key: String,
    /// Inclusive byte range, `[start, end)`. `None` fetches the full object.
    pub range: Option<(u64, u64)>,
}

pub struct GetObjectResponse {
    pub metadata: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// The out-of-scope transport collaborator. A real implementation wraps an
/// object-storage SDK client; this crate only needs put/get.
pub trait StorageClient: Send + Sync {
    fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectResponse, EnvelopeError>;
    fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectResponse, EnvelopeError>;
}

/// Orchestrates client-side envelope encryption around a `StorageClient`.
pub struct EncryptionClient<S> {
    storage: S,
    materials_manager: MaterialsManager,
    rng: Box<dyn SecureRandom>,
}

impl<S: StorageClient> EncryptionClient<S> {
    pub fn new(storage: S, materials_manager: MaterialsManager) -> Self {
        Self {
            storage,
            materials_manager,
            rng: Box::new(OsSecureRandom),
        }
    }

    pub fn with_rng(storage: S, materials_manager: MaterialsManager, rng: Box<dyn SecureRandom>) -> Self {
        Self {
            storage,
            materials_manager,
            rng,
        }
    }

    /// Encrypts `plaintext` with a freshly generated data key under the
    /// active suite and uploads it. The pipeline never calls `put_object`
    /// if materials generation or content encryption failed.
    pub fn put_object(
        &self,
        key: &str,
        plaintext: &[u8],
        context: EncryptionContext,
    ) -> Result<PutObjectResponse, EnvelopeError> {
        tracing::debug!(key, len = plaintext.len(), "put_object: building encryption materials");

        let materials = self
            .materials_manager
            .get_encryption_materials(context, self.rng.as_ref())?;
        let plaintext_dk = materials
            .plaintext_data_key
            .as_ref()
            .ok_or_else(|| EnvelopeError::wrap_failure("keyring produced no plaintext data key"))?;

        let content = gcm::encrypt(materials.suite, plaintext_dk, plaintext, self.rng.as_ref())?;
        let metadata = metadata::encode(&materials, &content)?;
        let ciphertext_len = content.ciphertext.len();

        let response = self.storage.put_object(PutObjectRequest {
            key: key.to_string(),
            metadata,
            body: content.ciphertext,
        })?;

        tracing::info!(key, ciphertext_len, "put_object: uploaded encrypted object");
        Ok(response)
    }

    /// Downloads and decrypts a full object.
    pub fn get_object(
        &self,
        key: &str,
        expected_context: Option<&EncryptionContext>,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let response = self.storage.get_object(GetObjectRequest {
            key: key.to_string(),
            range: None,
        })?;
        let envelope = metadata::decode(&response.metadata)?
            .ok_or_else(|| EnvelopeError::configuration("object carries no client-encryption metadata"))?;

        if envelope.suite.is_legacy() {
            tracing::warn!(key, suite = %envelope.suite, "get_object: decrypting legacy algorithm suite");
        }

        let materials = self
            .materials_manager
            .get_decryption_materials(&envelope, expected_context)?;
        let plaintext_dk = materials
            .plaintext_data_key
            .as_ref()
            .ok_or_else(|| EnvelopeError::wrap_failure("materials manager returned no plaintext data key"))?;

        let plaintext = match materials.suite {
            AlgorithmSuite::Aes256GcmNoKdf | AlgorithmSuite::Aes256GcmLegacyId => gcm::decrypt(
                materials.suite,
                plaintext_dk,
                &envelope.iv,
                envelope.tag_len_bits.unwrap_or(128) as usize / 8,
                &response.body,
            )?
            .to_vec(),
            AlgorithmSuite::AesCbcPkcs5Legacy => {
                legacy::decrypt_cbc_pkcs5(plaintext_dk, &envelope.iv, &response.body)?
            }
            AlgorithmSuite::AesCtrLegacy => legacy::decrypt_ctr(plaintext_dk, &envelope.iv, &response.body)?,
        };

        tracing::info!(key, plaintext_len = plaintext.len(), "get_object: decrypted object");
        Ok(plaintext)
    }

    /// Downloads and decrypts a byte range. GCM content (active or
    /// legacy-id) cannot be range-decrypted: a partial ciphertext has no
    /// verifiable tag, so the whole object must be fetched and authenticated
    /// at once. Only the unauthenticated legacy CTR suite supports this.
    pub fn get_object_range(
        &self,
        key: &str,
        range: (u64, u64),
        expected_context: Option<&EncryptionContext>,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let response = self.storage.get_object(GetObjectRequest {
            key: key.to_string(),
            range: Some(range),
        })?;
        let envelope = metadata::decode(&response.metadata)?
            .ok_or_else(|| EnvelopeError::configuration("object carries no client-encryption metadata"))?;

        if !envelope.suite.supports_range_get() {
            return Err(EnvelopeError::configuration(format!(
                "range GET is not supported for content suite {}",
                envelope.suite
            )));
        }

        let materials = self
            .materials_manager
            .get_decryption_materials(&envelope, expected_context)?;
        let plaintext_dk = materials
            .plaintext_data_key
            .as_ref()
            .ok_or_else(|| EnvelopeError::wrap_failure("materials manager returned no plaintext data key"))?;

        legacy::decrypt_ctr_range(plaintext_dk, &envelope.iv, &response.body, range.0)
    }
}
