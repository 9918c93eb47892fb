//! Active content cipher: AES-256-GCM. Encrypt refuses every suite but the
//! active one; decrypt refuses anything unauthenticated. The AEAD call
//! itself guarantees no plaintext byte is ever produced unless the tag
//! verifies — there is no partial-plaintext code path to accidentally take.

use super::EncryptedContent;
use crate::error::EnvelopeError;
use crate::rng::SecureRandom;
use crate::suite::AlgorithmSuite;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroizing;

pub fn encrypt(
    suite: AlgorithmSuite,
    data_key: &[u8],
    plaintext: &[u8],
    rng: &dyn SecureRandom,
) -> Result<EncryptedContent, EnvelopeError> {
    if !suite.is_active() {
        return Err(EnvelopeError::configuration(
            "content encryption refuses to emit anything but the active suite",
        ));
    }
    let mut iv = vec![0u8; suite.iv_len()];
    rng.fill(&mut iv)?;

    let cipher = Aes256Gcm::new_from_slice(data_key)
        .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
    let nonce = Nonce::from_slice(&iv);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;

    Ok(EncryptedContent {
        iv,
        ciphertext,
        tag_len: suite.tag_len(),
    })
}

pub fn decrypt(
    suite: AlgorithmSuite,
    data_key: &[u8],
    iv: &[u8],
    tag_len_bytes: usize,
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
    if !suite.is_authenticated() {
        return Err(EnvelopeError::configuration(
            "gcm content decrypt called with a non-authenticated suite",
        ));
    }
    if tag_len_bytes != 16 {
        return Err(EnvelopeError::tampered("GCM tag length out of the allowed set"));
    }
    if iv.len() != suite.iv_len() {
        return Err(EnvelopeError::tampered("IV length does not match the content suite"));
    }

    let cipher = Aes256Gcm::new_from_slice(data_key)
        .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
    let nonce = Nonce::from_slice(iv);
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| EnvelopeError::AuthenticationFailure)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::OsSecureRandom;

    #[test]
    fn roundtrips() {
        let key = [0x11u8; 32];
        let pt = b"hello envelope";
        let ct = encrypt(AlgorithmSuite::Aes256GcmNoKdf, &key, pt, &OsSecureRandom).unwrap();
        let out = decrypt(
            AlgorithmSuite::Aes256GcmNoKdf,
            &key,
            &ct.iv,
            ct.tag_len,
            &ct.ciphertext,
        )
        .unwrap();
        assert_eq!(&out[..], pt);
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let key = [0x22u8; 32];
        let pt = b"hello envelope";
        let mut ct = encrypt(AlgorithmSuite::Aes256GcmNoKdf, &key, pt, &OsSecureRandom).unwrap();
        let last = ct.ciphertext.len() - 1;
        ct.ciphertext[last] ^= 0x01;
        let err = decrypt(
            AlgorithmSuite::Aes256GcmNoKdf,
            &key,
            &ct.iv,
            ct.tag_len,
            &ct.ciphertext,
        )
        .unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure));
    }

    #[test]
    fn encrypt_refuses_legacy_suite() {
        let key = [0x33u8; 32];
        let err = encrypt(
            AlgorithmSuite::AesCbcPkcs5Legacy,
            &key,
            b"x",
            &OsSecureRandom,
        )
        .unwrap_err();
        assert!(matches!(err, EnvelopeError::Configuration(_)));
    }
}
