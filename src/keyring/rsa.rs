//! RSA keyring: RSA-OAEP-SHA1 pseudo-data-key wrap (active, provider id
//! `RSA-OAEP-SHA1`) plus a read-only legacy RSA-ECB-OAEP-SHA256-MGF1 unwrap
//! strategy that recovers a bare (non-pseudo) data key.
//!
//! The pseudo-data-key layout is `[len: u8][data key bytes][cipher name
//! bytes]`; it binds the wrapped key to the content suite it was generated
//! for without needing the content AEAD itself to carry that binding as AAD.

use super::{KeyUnwrapStrategy, KeyWrapStrategy, Keyring};
use crate::context::EncryptionContext;
use crate::error::{EnvelopeError, StrategyFailure};
use crate::materials::EncryptedDataKey;
use crate::rng::SecureRandom;
use crate::suite::AlgorithmSuite;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

const RSA_OAEP_SHA1_PROVIDER_ID: &str = "RSA-OAEP-SHA1";
const RSA_LEGACY_PROVIDER_ID: &str = "RSA/ECB/OAEPWithSHA-256AndMGF1Padding";

/// Adapts the crate's `SecureRandom` seam to the `rand_core::RngCore` the
/// `rsa` crate's OAEP padding requires. `fill` is infallible by contract
/// for every caller-supplied `SecureRandom`; a failure here indicates the
/// OS RNG itself is broken, which `rand_core::OsRng` implementations treat
/// the same way (panic rather than propagate).
struct RngAdapter<'a>(&'a dyn SecureRandom);

impl rand_core::RngCore for RngAdapter<'_> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.0.fill(&mut buf).expect("secure random source failed");
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.0.fill(&mut buf).expect("secure random source failed");
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill(dest).expect("secure random source failed");
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.0
            .fill(dest)
            .map_err(|_| rand_core::Error::new("secure random source failed"))
    }
}

impl rand_core::CryptoRng for RngAdapter<'_> {}

/// An RSA wrapping key pair. A public-key-only keyring can encrypt but never
/// decrypt.
pub struct RsaWrappingKey {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl RsaWrappingKey {
    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = rsa::RsaPublicKey::from(&private);
        Self {
            public,
            private: Some(private),
        }
    }

    pub fn from_public_key(public: RsaPublicKey) -> Self {
        Self {
            public,
            private: None,
        }
    }
}

impl Keyring {
    /// An RSA keyring: encrypts with the active pseudo-data-key scheme,
    /// decrypts EDKs from either the active scheme or the legacy
    /// bare-key OAEP-SHA256 scheme. A public-key-only `RsaWrappingKey`
    /// registers no decrypt strategies.
    pub fn rsa(key: RsaWrappingKey) -> Self {
        let encrypt: Box<dyn KeyWrapStrategy> = Box::new(RsaOaepSha1 {
            public: key.public.clone(),
        });

        let mut decrypt_strategies: Vec<Box<dyn KeyUnwrapStrategy>> = Vec::new();
        if let Some(private) = key.private {
            decrypt_strategies.push(Box::new(RsaLegacyOaepSha256 {
                private: private.clone(),
            }));
            decrypt_strategies.push(Box::new(RsaOaepSha1Unwrap { private }));
        }
        Keyring::from_parts(Some(encrypt), decrypt_strategies)
    }
}

struct RsaOaepSha1 {
    public: RsaPublicKey,
}

impl KeyWrapStrategy for RsaOaepSha1 {
    fn provider_id(&self) -> &'static str {
        RSA_OAEP_SHA1_PROVIDER_ID
    }

    fn wrap(
        &self,
        suite: AlgorithmSuite,
        plaintext_dk: &[u8],
        _context: &EncryptionContext,
        rng: &dyn SecureRandom,
    ) -> Result<EncryptedDataKey, EnvelopeError> {
        if !matches!(plaintext_dk.len(), 16 | 24 | 32) {
            return Err(EnvelopeError::wrap_failure(
                "data key length must be 16, 24, or 32 bytes",
            ));
        }
        let cipher_name = suite.cipher_name().as_bytes();
        let mut pseudo = Vec::with_capacity(1 + plaintext_dk.len() + cipher_name.len());
        pseudo.push(plaintext_dk.len() as u8);
        pseudo.extend_from_slice(plaintext_dk);
        pseudo.extend_from_slice(cipher_name);

        let mut rng = RngAdapter(rng);
        let ciphertext = self
            .public
            .encrypt(&mut rng, Oaep::new::<Sha1>(), &pseudo)
            .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;

        Ok(EncryptedDataKey {
            key_provider_id: RSA_OAEP_SHA1_PROVIDER_ID.to_string(),
            key_provider_info: None,
            ciphertext,
        })
    }
}

// `KeyUnwrapStrategy` for `RsaOaepSha1` itself is unused directly: decrypt
// needs the private key, so the registered decrypt candidate is
// `RsaOaepSha1Unwrap` below. Kept as a separate type so the wrap strategy
// never carries private key material it doesn't need.
struct RsaOaepSha1Unwrap {
    private: RsaPrivateKey,
}

impl KeyUnwrapStrategy for RsaOaepSha1Unwrap {
    fn provider_id(&self) -> &'static str {
        RSA_OAEP_SHA1_PROVIDER_ID
    }

    fn unwrap(
        &self,
        expected_suite: AlgorithmSuite,
        _context: &EncryptionContext,
        edk: &EncryptedDataKey,
    ) -> Result<Zeroizing<Vec<u8>>, StrategyFailure> {
        let pseudo = self
            .private
            .decrypt(Oaep::new::<Sha1>(), &edk.ciphertext)
            .map_err(|_| StrategyFailure::generic("RSA-OAEP-SHA1 decrypt failed"))?;

        if pseudo.is_empty() {
            return Err(StrategyFailure::tampered("empty pseudo-data-key"));
        }
        let len = pseudo[0] as usize;
        if !matches!(len, 16 | 24 | 32) {
            return Err(StrategyFailure::tampered("invalid pseudo-data-key length byte"));
        }
        if pseudo.len() < 1 + len {
            return Err(StrategyFailure::tampered("truncated pseudo-data-key"));
        }

        let data_key = &pseudo[1..1 + len];
        let trailing = &pseudo[1 + len..];
        let expected_name = expected_suite.cipher_name().as_bytes();
        let bound = trailing.len() == expected_name.len()
            && bool::from(trailing.ct_eq(expected_name));
        if !bound {
            return Err(StrategyFailure::tampered(
                "pseudo-data-key cipher-name binding mismatch",
            ));
        }

        Ok(Zeroizing::new(data_key.to_vec()))
    }
}

/// Legacy RSA-ECB-OAEP-SHA256-MGF1 unwrap: a bare data key, no pseudo-key
/// wrapper, no cipher-name binding. Decrypt-only.
struct RsaLegacyOaepSha256 {
    private: RsaPrivateKey,
}

impl KeyUnwrapStrategy for RsaLegacyOaepSha256 {
    fn provider_id(&self) -> &'static str {
        RSA_LEGACY_PROVIDER_ID
    }

    fn unwrap(
        &self,
        _expected_suite: AlgorithmSuite,
        _context: &EncryptionContext,
        edk: &EncryptedDataKey,
    ) -> Result<Zeroizing<Vec<u8>>, StrategyFailure> {
        let data_key = self
            .private
            .decrypt(Oaep::new::<Sha256>(), &edk.ciphertext)
            .map_err(|_| StrategyFailure::generic("legacy RSA-OAEP-SHA256 decrypt failed"))?;

        if !matches!(data_key.len(), 16 | 24 | 32) {
            return Err(StrategyFailure::tampered(
                "legacy RSA-unwrapped data key has an invalid length",
            ));
        }
        Ok(Zeroizing::new(data_key))
    }
}
