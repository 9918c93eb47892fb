//! Read-only legacy content ciphers: AES/CBC-PKCS5 and AES/CTR. Neither is
//! authenticated; both exist purely to decrypt objects written by older
//! clients. There is no encrypt path here by construction — this module
//! exposes only `decrypt_*` functions.

use crate::error::EnvelopeError;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use ctr::cipher::{StreamCipher, StreamCipherSeek};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type Aes192Ctr = ctr::Ctr128BE<aes::Aes192>;
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

pub fn decrypt_cbc_pkcs5(data_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    if iv.len() != 16 {
        return Err(EnvelopeError::tampered("CBC IV must be 16 bytes"));
    }
    let mut buf = ciphertext.to_vec();
    let plaintext = match data_key.len() {
        16 => Aes128CbcDec::new_from_slices(data_key, iv)
            .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?
            .decrypt_padded_mut::<Pkcs7>(&mut buf),
        24 => Aes192CbcDec::new_from_slices(data_key, iv)
            .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?
            .decrypt_padded_mut::<Pkcs7>(&mut buf),
        32 => Aes256CbcDec::new_from_slices(data_key, iv)
            .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?
            .decrypt_padded_mut::<Pkcs7>(&mut buf),
        other => {
            return Err(EnvelopeError::configuration(format!(
                "unsupported AES key length: {other}"
            )))
        }
    }
    .map_err(|_| EnvelopeError::tampered("CBC padding invalid"))?;
    Ok(plaintext.to_vec())
}

pub fn decrypt_ctr(data_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    decrypt_ctr_range(data_key, iv, ciphertext, 0)
}

/// Decrypts a byte range of a CTR-mode object by seeking the keystream to
/// `offset_bytes` before applying it. `ciphertext` must be exactly the bytes
/// at `[offset_bytes, offset_bytes + ciphertext.len())`.
pub fn decrypt_ctr_range(
    data_key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    offset_bytes: u64,
) -> Result<Vec<u8>, EnvelopeError> {
    if iv.len() != 16 {
        return Err(EnvelopeError::tampered("CTR IV must be 16 bytes"));
    }
    let mut buf = ciphertext.to_vec();
    match data_key.len() {
        16 => {
            let mut cipher = Aes128Ctr::new_from_slices(data_key, iv)
                .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
            cipher
                .try_seek(offset_bytes)
                .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
            cipher.apply_keystream(&mut buf);
        }
        24 => {
            let mut cipher = Aes192Ctr::new_from_slices(data_key, iv)
                .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
            cipher
                .try_seek(offset_bytes)
                .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
            cipher.apply_keystream(&mut buf);
        }
        32 => {
            let mut cipher = Aes256Ctr::new_from_slices(data_key, iv)
                .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
            cipher
                .try_seek(offset_bytes)
                .map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
            cipher.apply_keystream(&mut buf);
        }
        other => {
            return Err(EnvelopeError::configuration(format!(
                "unsupported AES key length: {other}"
            )))
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::KeyIvInit as EncKeyIvInit;
    use cbc::cipher::BlockEncryptMut;

    type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

    #[test]
    fn cbc_decrypts_what_was_encrypted() {
        let key = [0x44u8; 32];
        let iv = [0x01u8; 16];
        let pt = b"legacy cbc payload";
        let ct = Aes256CbcEnc::new_from_slices(&key, &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(pt);
        let out = decrypt_cbc_pkcs5(&key, &iv, &ct).unwrap();
        assert_eq!(out, pt);
    }

    #[test]
    fn ctr_range_matches_full_decrypt_slice() {
        let key = [0x55u8; 32];
        let iv = [0x02u8; 16];
        let pt = vec![0xABu8; 64];
        let mut cipher = Aes256Ctr::new_from_slices(&key, &iv).unwrap();
        let mut ct = pt.clone();
        cipher.apply_keystream(&mut ct);

        let full = decrypt_ctr(&key, &iv, &ct).unwrap();
        assert_eq!(full, pt);

        let ranged = decrypt_ctr_range(&key, &iv, &ct[32..48], 32).unwrap();
        assert_eq!(ranged, pt[32..48]);
    }
}
