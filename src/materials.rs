//! Data model for keyring operations: `EncryptedDataKey`, `EncryptionMaterials`,
//! `DecryptionMaterials`, and the `MaterialsManager` that sits between a
//! pipeline and a keyring.

use crate::context::EncryptionContext;
use crate::error::EnvelopeError;
use crate::keyring::Keyring;
use crate::metadata::ObjectEnvelope;
use crate::rng::SecureRandom;
use crate::suite::AlgorithmSuite;
use zeroize::Zeroizing;

/// An encrypted data key as it travels in the envelope: opaque ciphertext
/// plus enough provider bookkeeping for a keyring to find the strategy that
/// produced it.
#[derive(Clone, Debug)]
pub struct EncryptedDataKey {
    pub key_provider_id: String,
    pub key_provider_info: Option<String>,
    pub ciphertext: Vec<u8>,
}

/// State threaded through `Keyring::on_encrypt`.
pub struct EncryptionMaterials {
    pub suite: AlgorithmSuite,
    pub context: EncryptionContext,
    pub plaintext_data_key: Option<Zeroizing<Vec<u8>>>,
    pub encrypted_data_keys: Vec<EncryptedDataKey>,
}

/// State threaded through `Keyring::on_decrypt`.
pub struct DecryptionMaterials {
    pub suite: AlgorithmSuite,
    pub context: EncryptionContext,
    pub candidate_edks: Vec<EncryptedDataKey>,
    pub plaintext_data_key: Option<Zeroizing<Vec<u8>>>,
}

/// Thin policy layer over a keyring: fixes the active suite on encrypt,
/// reads the suite off the parsed envelope on decrypt, and can refuse to
/// decrypt legacy objects unless the caller explicitly opted in.
pub struct MaterialsManager {
    keyring: Keyring,
    allow_legacy: bool,
}

impl MaterialsManager {
    /// Refuses legacy algorithms on decrypt (`EnvelopeError::LegacyRefused`).
    pub fn new(keyring: Keyring) -> Self {
        Self {
            keyring,
            allow_legacy: false,
        }
    }

    /// Accepts legacy algorithms on decrypt.
    pub fn allowing_legacy(keyring: Keyring) -> Self {
        Self {
            keyring,
            allow_legacy: true,
        }
    }

    pub fn get_encryption_materials(
        &self,
        context: EncryptionContext,
        rng: &dyn SecureRandom,
    ) -> Result<EncryptionMaterials, EnvelopeError> {
        if context.contains_reserved_key() {
            return Err(EnvelopeError::configuration(
                "caller-supplied encryption context must not set the reserved suite-binding key",
            ));
        }
        let suite = AlgorithmSuite::Aes256GcmNoKdf;
        let materials = EncryptionMaterials {
            suite,
            context,
            plaintext_data_key: None,
            encrypted_data_keys: Vec::new(),
        };
        self.keyring.on_encrypt(materials, rng)
    }

    pub fn get_decryption_materials(
        &self,
        envelope: &ObjectEnvelope,
        expected_context: Option<&EncryptionContext>,
    ) -> Result<DecryptionMaterials, EnvelopeError> {
        if envelope.suite.is_legacy() && !self.allow_legacy {
            return Err(EnvelopeError::LegacyRefused {
                suite: envelope.suite.cipher_name().to_string(),
            });
        }
        if let Some(expected) = expected_context {
            if expected.to_canonical_json() != envelope.context.to_canonical_json() {
                return Err(EnvelopeError::configuration(
                    "encryption context does not match the stored envelope",
                ));
            }
        }
        let materials = DecryptionMaterials {
            suite: envelope.suite,
            context: envelope.context.clone(),
            candidate_edks: envelope.candidate_edks.clone(),
            plaintext_data_key: None,
        };
        self.keyring.on_decrypt(materials)
    }
}
