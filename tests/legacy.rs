mod common;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use common::MemoryStorageClient;
use ecb::cipher::{block_padding::NoPadding, KeyInit};
use envelope_crypto_core::keyring::aes::AesWrappingKey;
use envelope_crypto_core::keyring::Keyring;
use envelope_crypto_core::materials::MaterialsManager;
use envelope_crypto_core::pipeline::EncryptionClient;
use envelope_crypto_core::EnvelopeError;
use std::collections::BTreeMap;
use std::sync::Arc;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256EcbEnc = ecb::Encryptor<aes::Aes256>;

/// Hand-builds a v1, CBC-PKCS5, AES-ECB-wrapped object the way an older
/// client would have written one: no `x-amz-cek-alg` at all.
fn put_legacy_cbc_object(storage: &MemoryStorageClient, wrapping_key: &[u8; 32], data_key: &[u8; 32], key: &str, plaintext: &[u8]) {
    let iv = [0x07u8; 16];
    let ciphertext = Aes256CbcEnc::new_from_slices(data_key, &iv)
        .unwrap()
        .encrypt_padded_vec_mut::<cbc::cipher::block_padding::Pkcs7>(plaintext);

    let wrapped_key = Aes256EcbEnc::new_from_slice(wrapping_key)
        .unwrap()
        .encrypt_padded_vec_mut::<NoPadding>(data_key);

    let mut metadata = BTreeMap::new();
    metadata.insert("x-amz-key".to_string(), BASE64.encode(wrapped_key));
    metadata.insert("x-amz-wrap-alg".to_string(), "AES".to_string());
    metadata.insert("x-amz-iv".to_string(), BASE64.encode(iv));

    storage.put_raw(key, metadata, ciphertext);
}

fn put_legacy_ctr_object(storage: &MemoryStorageClient, wrapping_key: &[u8; 32], data_key: &[u8; 32], key: &str, plaintext: &[u8]) {
    use ctr::cipher::StreamCipher;
    let iv = [0x08u8; 16];
    type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;
    let mut cipher = Aes256Ctr::new_from_slices(data_key, &iv).unwrap();
    let mut ciphertext = plaintext.to_vec();
    cipher.apply_keystream(&mut ciphertext);

    let wrapped_key = Aes256EcbEnc::new_from_slice(wrapping_key)
        .unwrap()
        .encrypt_padded_vec_mut::<NoPadding>(data_key);

    let mut metadata = BTreeMap::new();
    metadata.insert("x-amz-key-v2".to_string(), BASE64.encode(wrapped_key));
    metadata.insert("x-amz-wrap-alg".to_string(), "AES".to_string());
    metadata.insert("x-amz-iv".to_string(), BASE64.encode(iv));
    metadata.insert("x-amz-cek-alg".to_string(), "AES/CTR/NoPadding".to_string());

    storage.put_raw(key, metadata, ciphertext);
}

fn legacy_client(wrapping_key: [u8; 32], storage: Arc<MemoryStorageClient>) -> EncryptionClient<Arc<MemoryStorageClient>> {
    let manager = MaterialsManager::allowing_legacy(Keyring::aes(AesWrappingKey::new(wrapping_key.to_vec()).unwrap()));
    EncryptionClient::new(storage, manager)
}

#[test]
fn legacy_cbc_object_decrypts_when_legacy_is_allowed() {
    let wrapping_key = [0x30u8; 32];
    let data_key = [0x31u8; 32];
    let storage = Arc::new(MemoryStorageClient::new());
    put_legacy_cbc_object(&storage, &wrapping_key, &data_key, "k", b"a message from an older client");

    let client = legacy_client(wrapping_key, storage);
    let plaintext = client.get_object("k", None).unwrap();
    assert_eq!(plaintext, b"a message from an older client");
}

#[test]
fn legacy_object_is_refused_without_opt_in() {
    let wrapping_key = [0x32u8; 32];
    let data_key = [0x33u8; 32];
    let storage = Arc::new(MemoryStorageClient::new());
    put_legacy_cbc_object(&storage, &wrapping_key, &data_key, "k", b"payload");

    let manager = MaterialsManager::new(Keyring::aes(AesWrappingKey::new(wrapping_key.to_vec()).unwrap()));
    let client = EncryptionClient::new(storage, manager);
    let err = client.get_object("k", None).unwrap_err();
    assert!(matches!(err, EnvelopeError::LegacyRefused { .. }));
}

#[test]
fn legacy_ctr_object_supports_range_get() {
    let wrapping_key = [0x34u8; 32];
    let data_key = [0x35u8; 32];
    let storage = Arc::new(MemoryStorageClient::new());
    let plaintext = vec![0xCDu8; 64];
    put_legacy_ctr_object(&storage, &wrapping_key, &data_key, "k", &plaintext);

    let client = legacy_client(wrapping_key, storage);
    let range = client.get_object_range("k", (16, 32), None).unwrap();
    assert_eq!(range, plaintext[16..32]);
}

#[test]
fn gcm_content_does_not_support_range_get() {
    let storage = Arc::new(MemoryStorageClient::new());
    let manager = MaterialsManager::new(Keyring::aes(AesWrappingKey::new(vec![0x36u8; 32]).unwrap()));
    let client = EncryptionClient::new(storage, manager);
    client.put_object("k", b"payload", Default::default()).unwrap();

    let err = client.get_object_range("k", (0, 4), None).unwrap_err();
    assert!(matches!(err, EnvelopeError::Configuration(_)));
}
