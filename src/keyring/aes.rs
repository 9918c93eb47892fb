//! AES keyring: AES-GCM key wrap (active, provider id `AES/GCM`) plus two
//! read-only legacy unwrap strategies for objects written by older clients
//! (`AESWrap`, RFC 3394; raw `AES` ECB).

use super::{KeyUnwrapStrategy, KeyWrapStrategy, Keyring};
use crate::context::EncryptionContext;
use crate::error::{EnvelopeError, StrategyFailure};
use crate::materials::EncryptedDataKey;
use crate::rng::SecureRandom;
use crate::suite::AlgorithmSuite;
use aes::cipher::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use aes_kw::{KekAes128, KekAes192, KekAes256};
use ecb::cipher::{block_padding::NoPadding, BlockDecryptMut};
use zeroize::Zeroizing;

/// AES-192-GCM has no ready-made type alias in the `aes-gcm` crate; build it
/// the same way the crate builds its own `Aes128Gcm`/`Aes256Gcm` aliases.
type Aes192Gcm = AesGcm<aes::Aes192, aes_gcm::aead::consts::U12>;

const AES_GCM_PROVIDER_ID: &str = "AES/GCM";
const AES_WRAP_PROVIDER_ID: &str = "AESWrap";
const AES_ECB_PROVIDER_ID: &str = "AES";

/// A symmetric wrapping key for an AES keyring. Must be 16, 24, or 32 bytes.
pub struct AesWrappingKey {
    key: Zeroizing<Vec<u8>>,
}

impl AesWrappingKey {
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, EnvelopeError> {
        let key = key.into();
        match key.len() {
            16 | 24 | 32 => Ok(Self {
                key: Zeroizing::new(key),
            }),
            other => Err(EnvelopeError::configuration(format!(
                "AES wrapping key must be 16, 24, or 32 bytes, got {other}"
            ))),
        }
    }
}

impl Keyring {
    /// An AES keyring: encrypts with AES-GCM key wrap, decrypts EDKs wrapped
    /// with AES-GCM, legacy `AESWrap` (RFC 3394), or legacy raw AES ECB.
    pub fn aes(wrapping_key: AesWrappingKey) -> Self {
        let key = wrapping_key.key;
        let gcm = Box::new(AesGcmKeyWrap { key: key.clone() });
        let wrap_legacy = Box::new(AesWrapLegacy { key: key.clone() });
        let ecb_legacy = Box::new(AesEcbLegacy { key });
        Keyring::from_parts(Some(gcm.clone_as_encrypt()), vec![gcm, wrap_legacy, ecb_legacy])
    }
}

struct AesGcmKeyWrap {
    key: Zeroizing<Vec<u8>>,
}

impl AesGcmKeyWrap {
    /// `Keyring::aes` needs the same strategy registered both as the sole
    /// encrypt strategy and as a decrypt candidate; this avoids a spurious
    /// `Clone` bound on the trait objects themselves.
    fn clone_as_encrypt(&self) -> Box<dyn KeyWrapStrategy> {
        Box::new(AesGcmKeyWrap {
            key: self.key.clone(),
        })
    }
}

fn gcm_seal(key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, String> {
    let nonce = Nonce::from_slice(nonce);
    let payload = Payload { msg: plaintext, aad };
    match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .encrypt(nonce, payload)
            .map_err(|e| e.to_string()),
        24 => Aes192Gcm::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .encrypt(nonce, payload)
            .map_err(|e| e.to_string()),
        32 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .encrypt(nonce, payload)
            .map_err(|e| e.to_string()),
        other => Err(format!("unsupported AES key length: {other}")),
    }
}

fn gcm_open(key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, String> {
    let nonce = Nonce::from_slice(nonce);
    let payload = Payload {
        msg: ciphertext,
        aad,
    };
    match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .decrypt(nonce, payload)
            .map_err(|e| e.to_string()),
        24 => Aes192Gcm::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .decrypt(nonce, payload)
            .map_err(|e| e.to_string()),
        32 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| e.to_string())?
            .decrypt(nonce, payload)
            .map_err(|e| e.to_string()),
        other => Err(format!("unsupported AES key length: {other}")),
    }
}

impl KeyWrapStrategy for AesGcmKeyWrap {
    fn provider_id(&self) -> &'static str {
        AES_GCM_PROVIDER_ID
    }

    fn wrap(
        &self,
        suite: AlgorithmSuite,
        plaintext_dk: &[u8],
        _context: &EncryptionContext,
        rng: &dyn SecureRandom,
    ) -> Result<EncryptedDataKey, EnvelopeError> {
        let mut nonce = [0u8; 12];
        rng.fill(&mut nonce)?;
        let aad = suite.cipher_name().as_bytes();
        let ct = gcm_seal(&self.key, &nonce, aad, plaintext_dk)
            .map_err(EnvelopeError::wrap_failure)?;
        let mut ciphertext = Vec::with_capacity(12 + ct.len());
        ciphertext.extend_from_slice(&nonce);
        ciphertext.extend_from_slice(&ct);
        Ok(EncryptedDataKey {
            key_provider_id: AES_GCM_PROVIDER_ID.to_string(),
            key_provider_info: None,
            ciphertext,
        })
    }
}

impl KeyUnwrapStrategy for AesGcmKeyWrap {
    fn provider_id(&self) -> &'static str {
        AES_GCM_PROVIDER_ID
    }

    fn unwrap(
        &self,
        expected_suite: AlgorithmSuite,
        _context: &EncryptionContext,
        edk: &EncryptedDataKey,
    ) -> Result<Zeroizing<Vec<u8>>, StrategyFailure> {
        if edk.ciphertext.len() < 12 {
            return Err(StrategyFailure::tampered(
                "AES/GCM wrapped key shorter than its own nonce",
            ));
        }
        let (nonce, ct) = edk.ciphertext.split_at(12);
        let aad = expected_suite.cipher_name().as_bytes();
        gcm_open(&self.key, nonce, aad, ct)
            .map(Zeroizing::new)
            .map_err(|_| StrategyFailure::generic("AES/GCM key unwrap failed"))
    }
}

/// Legacy RFC 3394 key wrap. Decrypt-only: no client built on this crate
/// will ever emit it.
struct AesWrapLegacy {
    key: Zeroizing<Vec<u8>>,
}

impl KeyUnwrapStrategy for AesWrapLegacy {
    fn provider_id(&self) -> &'static str {
        AES_WRAP_PROVIDER_ID
    }

    fn unwrap(
        &self,
        _expected_suite: AlgorithmSuite,
        _context: &EncryptionContext,
        edk: &EncryptedDataKey,
    ) -> Result<Zeroizing<Vec<u8>>, StrategyFailure> {
        let unwrapped = match self.key.len() {
            16 => KekAes128::new(GenericArray::from_slice(&self.key)).unwrap_vec(&edk.ciphertext),
            24 => KekAes192::new(GenericArray::from_slice(&self.key)).unwrap_vec(&edk.ciphertext),
            32 => KekAes256::new(GenericArray::from_slice(&self.key)).unwrap_vec(&edk.ciphertext),
            _ => return Err(StrategyFailure::generic("unsupported AES key length for AESWrap")),
        };
        unwrapped
            .map(Zeroizing::new)
            .map_err(|_| StrategyFailure::generic("AESWrap key unwrap failed"))
    }
}

/// Legacy raw AES-ECB key unwrap. Decrypt-only, no padding: the wrapped
/// bytes are exactly the data key, block-aligned.
struct AesEcbLegacy {
    key: Zeroizing<Vec<u8>>,
}

type Aes128EcbDec = ecb::Decryptor<aes::Aes128>;
type Aes192EcbDec = ecb::Decryptor<aes::Aes192>;
type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;

impl KeyUnwrapStrategy for AesEcbLegacy {
    fn provider_id(&self) -> &'static str {
        AES_ECB_PROVIDER_ID
    }

    fn unwrap(
        &self,
        _expected_suite: AlgorithmSuite,
        _context: &EncryptionContext,
        edk: &EncryptedDataKey,
    ) -> Result<Zeroizing<Vec<u8>>, StrategyFailure> {
        if edk.ciphertext.is_empty() || edk.ciphertext.len() % 16 != 0 {
            return Err(StrategyFailure::tampered(
                "raw AES-ECB wrapped key is not block aligned",
            ));
        }
        let mut buf = edk.ciphertext.clone();
        let plaintext = match self.key.len() {
            16 => Aes128EcbDec::new_from_slice(&self.key)
                .map_err(|_| StrategyFailure::generic("bad AES-ECB key"))?
                .decrypt_padded_mut::<NoPadding>(&mut buf),
            24 => Aes192EcbDec::new_from_slice(&self.key)
                .map_err(|_| StrategyFailure::generic("bad AES-ECB key"))?
                .decrypt_padded_mut::<NoPadding>(&mut buf),
            32 => Aes256EcbDec::new_from_slice(&self.key)
                .map_err(|_| StrategyFailure::generic("bad AES-ECB key"))?
                .decrypt_padded_mut::<NoPadding>(&mut buf),
            _ => return Err(StrategyFailure::generic("unsupported AES key length for raw ECB")),
        }
        .map_err(|_| StrategyFailure::generic("raw AES-ECB key unwrap failed"))?;
        Ok(Zeroizing::new(plaintext.to_vec()))
    }
}
