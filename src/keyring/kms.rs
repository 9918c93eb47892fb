//! KMS-style keyring: same `onEncrypt`/`onDecrypt` shape as the AES and RSA
//! keyrings, but wrap/unwrap of the data key is delegated to an
//! out-of-process service through the `KmsClient` trait. Transport,
//! credentials and retries are out of scope here; only the keyring contract
//! is implemented.

use super::{KeyUnwrapStrategy, KeyWrapStrategy, Keyring};
use crate::context::EncryptionContext;
use crate::error::{EnvelopeError, StrategyFailure};
use crate::materials::EncryptedDataKey;
use crate::rng::SecureRandom;
use crate::suite::AlgorithmSuite;
use std::sync::Arc;
use zeroize::Zeroizing;

const KMS_PROVIDER_ID: &str = "kms+context";

/// Out-of-process key management, abstracted. A real implementation calls
/// a KMS `Encrypt`/`Decrypt` API, passing the encryption context as the
/// grant condition.
pub trait KmsClient: Send + Sync {
    fn encrypt(
        &self,
        cmk_id: &str,
        plaintext_dk: &[u8],
        context: &EncryptionContext,
    ) -> Result<Vec<u8>, EnvelopeError>;

    fn decrypt(
        &self,
        cmk_id: &str,
        ciphertext: &[u8],
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError>;
}

impl Keyring {
    /// A KMS-style keyring bound to a single customer master key id.
    pub fn kms(client: Arc<dyn KmsClient>, cmk_id: impl Into<String>) -> Self {
        let cmk_id: String = cmk_id.into();
        let strategy = Box::new(KmsStrategy {
            client,
            cmk_id,
        });
        Keyring::from_parts(Some(strategy.clone_as_encrypt()), vec![strategy])
    }
}

struct KmsStrategy {
    client: Arc<dyn KmsClient>,
    cmk_id: String,
}

impl KmsStrategy {
    fn clone_as_encrypt(&self) -> Box<dyn KeyWrapStrategy> {
        Box::new(KmsStrategy {
            client: self.client.clone(),
            cmk_id: self.cmk_id.clone(),
        })
    }
}

impl KeyWrapStrategy for KmsStrategy {
    fn provider_id(&self) -> &'static str {
        KMS_PROVIDER_ID
    }

    fn wrap(
        &self,
        _suite: AlgorithmSuite,
        plaintext_dk: &[u8],
        context: &EncryptionContext,
        _rng: &dyn SecureRandom,
    ) -> Result<EncryptedDataKey, EnvelopeError> {
        let ciphertext = self.client.encrypt(&self.cmk_id, plaintext_dk, context)?;
        Ok(EncryptedDataKey {
            key_provider_id: KMS_PROVIDER_ID.to_string(),
            key_provider_info: Some(self.cmk_id.clone()),
            ciphertext,
        })
    }
}

impl KeyUnwrapStrategy for KmsStrategy {
    fn provider_id(&self) -> &'static str {
        KMS_PROVIDER_ID
    }

    fn unwrap(
        &self,
        _expected_suite: AlgorithmSuite,
        context: &EncryptionContext,
        edk: &EncryptedDataKey,
    ) -> Result<Zeroizing<Vec<u8>>, StrategyFailure> {
        let cmk_id = edk.key_provider_info.as_deref().unwrap_or(&self.cmk_id);
        self.client
            .decrypt(cmk_id, &edk.ciphertext, context)
            .map_err(|e| StrategyFailure::generic(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::OsSecureRandom;
    use std::sync::Mutex;

    /// A KMS stand-in that "wraps" a data key by XOR-ing it with a fixed
    /// per-cmk pad and records the context it was called with, so tests can
    /// assert the context threads through the keyring correctly.
    struct FakeKms {
        last_context_seen: Mutex<Option<EncryptionContext>>,
    }

    impl FakeKms {
        fn new() -> Self {
            Self {
                last_context_seen: Mutex::new(None),
            }
        }

        fn pad(cmk_id: &str) -> u8 {
            cmk_id.bytes().fold(0u8, |acc, b| acc ^ b)
        }
    }

    impl KmsClient for FakeKms {
        fn encrypt(
            &self,
            cmk_id: &str,
            plaintext_dk: &[u8],
            context: &EncryptionContext,
        ) -> Result<Vec<u8>, EnvelopeError> {
            *self.last_context_seen.lock().unwrap() = Some(context.clone());
            Ok(plaintext_dk.iter().map(|b| b ^ Self::pad(cmk_id)).collect())
        }

        fn decrypt(
            &self,
            cmk_id: &str,
            ciphertext: &[u8],
            context: &EncryptionContext,
        ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
            *self.last_context_seen.lock().unwrap() = Some(context.clone());
            Ok(Zeroizing::new(
                ciphertext.iter().map(|b| b ^ Self::pad(cmk_id)).collect(),
            ))
        }
    }

    #[test]
    fn kms_keyring_roundtrips_and_threads_context() {
        let client = Arc::new(FakeKms::new());
        let keyring = Keyring::kms(client.clone(), "alias/example");

        let mut ctx = EncryptionContext::new();
        ctx.insert("tenant", "acme");

        let materials = crate::materials::EncryptionMaterials {
            suite: AlgorithmSuite::Aes256GcmNoKdf,
            context: ctx.clone(),
            plaintext_data_key: None,
            encrypted_data_keys: Vec::new(),
        };
        let encrypted = keyring.on_encrypt(materials, &OsSecureRandom).unwrap();
        assert_eq!(
            client.last_context_seen.lock().unwrap().as_ref(),
            Some(&ctx)
        );

        let edk = encrypted.encrypted_data_keys[0].clone();
        assert_eq!(edk.key_provider_id, KMS_PROVIDER_ID);
        assert_eq!(edk.key_provider_info.as_deref(), Some("alias/example"));

        let decryption = crate::materials::DecryptionMaterials {
            suite: AlgorithmSuite::Aes256GcmNoKdf,
            context: ctx,
            candidate_edks: vec![edk],
            plaintext_data_key: None,
        };
        let decrypted = keyring.on_decrypt(decryption).unwrap();
        assert_eq!(
            decrypted.plaintext_data_key.unwrap().as_slice(),
            encrypted.plaintext_data_key.unwrap().as_slice()
        );
    }
}
