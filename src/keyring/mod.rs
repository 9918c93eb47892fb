//! Keyrings: the component that owns a wrapping key (or key pair) and knows
//! how to wrap a fresh data key on encrypt and how to unwrap one of several
//! candidate EDKs on decrypt.
//!
//! A `Keyring` is a single composed type built from three parts: an optional
//! encrypt strategy, a table of decrypt strategies keyed by provider id, and
//! (implicitly, inside each strategy) the wrapping key material itself. The
//! concrete constructors (`Keyring::aes`, `Keyring::rsa`, `Keyring::kms`) are
//! the public surface; `Keyring::from_parts` is the general composition
//! primitive they're built on.

pub mod aes;
pub mod kms;
pub mod rsa;

use crate::context::EncryptionContext;
use crate::error::{EnvelopeError, StrategyFailure, UnwrapAttempt, UnwrapFailure, UnwrapReasonClass};
use crate::materials::{DecryptionMaterials, EncryptedDataKey, EncryptionMaterials};
use crate::rng::SecureRandom;
use crate::suite::AlgorithmSuite;
use std::collections::BTreeMap;
use zeroize::Zeroizing;

/// Produces a fresh `EncryptedDataKey` for a plaintext data key. One keyring
/// has at most one encrypt strategy; a keyring built only for reading legacy
/// objects has none and `Keyring::on_encrypt` reports `ConfigurationError`.
pub trait KeyWrapStrategy: Send + Sync {
    fn provider_id(&self) -> &'static str;

    fn wrap(
        &self,
        suite: AlgorithmSuite,
        plaintext_dk: &[u8],
        context: &EncryptionContext,
        rng: &dyn SecureRandom,
    ) -> Result<EncryptedDataKey, EnvelopeError>;
}

/// Attempts to recover the plaintext data key from one candidate EDK whose
/// `key_provider_id` matches this strategy's.
pub trait KeyUnwrapStrategy: Send + Sync {
    fn provider_id(&self) -> &'static str;

    fn unwrap(
        &self,
        expected_suite: AlgorithmSuite,
        context: &EncryptionContext,
        edk: &EncryptedDataKey,
    ) -> Result<Zeroizing<Vec<u8>>, StrategyFailure>;
}

/// A composed keyring: an optional encrypt strategy plus a provider-id ->
/// decrypt-strategy table.
pub struct Keyring {
    encrypt_strategy: Option<Box<dyn KeyWrapStrategy>>,
    decrypt_strategies: BTreeMap<&'static str, Box<dyn KeyUnwrapStrategy>>,
}

impl Keyring {
    /// General composition primitive. Concrete constructors below call this;
    /// use it directly to build a keyring with a custom mix of strategies
    /// (e.g. a pure read-only migration keyring with no encrypt strategy).
    pub fn from_parts(
        encrypt_strategy: Option<Box<dyn KeyWrapStrategy>>,
        decrypt_strategies: Vec<Box<dyn KeyUnwrapStrategy>>,
    ) -> Self {
        let mut table = BTreeMap::new();
        for strategy in decrypt_strategies {
            table.insert(strategy.provider_id(), strategy);
        }
        Self {
            encrypt_strategy,
            decrypt_strategies: table,
        }
    }

    pub fn on_encrypt(
        &self,
        mut materials: EncryptionMaterials,
        rng: &dyn SecureRandom,
    ) -> Result<EncryptionMaterials, EnvelopeError> {
        let strategy = self.encrypt_strategy.as_ref().ok_or_else(|| {
            EnvelopeError::configuration("this keyring has no encrypt strategy (legacy-only)")
        })?;

        if materials.plaintext_data_key.is_none() {
            let len = materials.suite.fixed_data_key_len().unwrap_or(32);
            let mut dk = vec![0u8; len];
            rng.fill(&mut dk)?;
            materials.plaintext_data_key = Some(Zeroizing::new(dk));
        }

        let plaintext_dk = materials
            .plaintext_data_key
            .as_ref()
            .expect("just set above");
        let edk = strategy.wrap(materials.suite, plaintext_dk, &materials.context, rng)?;
        materials.encrypted_data_keys.push(edk);
        Ok(materials)
    }

    pub fn on_decrypt(
        &self,
        mut materials: DecryptionMaterials,
    ) -> Result<DecryptionMaterials, EnvelopeError> {
        let mut attempts = Vec::with_capacity(materials.candidate_edks.len());

        for edk in &materials.candidate_edks {
            let Some(strategy) = self.decrypt_strategies.get(edk.key_provider_id.as_str()) else {
                attempts.push(UnwrapAttempt {
                    provider_id: edk.key_provider_id.clone(),
                    reason: UnwrapReasonClass::UnknownProvider,
                });
                continue;
            };

            match strategy.unwrap(materials.suite, &materials.context, edk) {
                Ok(dk) => {
                    materials.plaintext_data_key = Some(dk);
                    return Ok(materials);
                }
                Err(StrategyFailure::Tampered(reason)) => {
                    return Err(EnvelopeError::tampered(reason));
                }
                Err(StrategyFailure::Generic(_)) => {
                    attempts.push(UnwrapAttempt {
                        provider_id: edk.key_provider_id.clone(),
                        reason: UnwrapReasonClass::CryptoFailure,
                    });
                }
            }
        }

        Err(EnvelopeError::UnwrapFailure(UnwrapFailure { attempts }))
    }
}
