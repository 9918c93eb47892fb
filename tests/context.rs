mod common;

use common::{aes_manager, sample_context, MemoryStorageClient};
use envelope_crypto_core::context::{EncryptionContext, RESERVED_SUITE_KEY};
use envelope_crypto_core::pipeline::EncryptionClient;
use envelope_crypto_core::rng::OsSecureRandom;
use envelope_crypto_core::EnvelopeError;
use std::sync::Arc;

#[test]
fn caller_supplied_reserved_key_is_rejected() {
    let manager = aes_manager(0x70);
    let mut ctx = EncryptionContext::new();
    ctx.insert(RESERVED_SUITE_KEY, "whatever");
    let err = manager.get_encryption_materials(ctx, &OsSecureRandom).unwrap_err();
    assert!(matches!(err, EnvelopeError::Configuration(_)));
}

#[test]
fn matching_context_decrypts_mismatched_context_does_not() {
    let storage = Arc::new(MemoryStorageClient::new());
    let client = EncryptionClient::new(storage, aes_manager(0x71));

    let mut ctx = EncryptionContext::new();
    ctx.insert("tenant", "north");
    client.put_object("k", b"payload", ctx.clone()).unwrap();

    assert_eq!(client.get_object("k", Some(&ctx)).unwrap(), b"payload");

    let mut other = EncryptionContext::new();
    other.insert("tenant", "south");
    let err = client.get_object("k", Some(&other)).unwrap_err();
    assert!(matches!(err, EnvelopeError::Configuration(_)));
}

#[test]
fn empty_context_is_the_default_and_matches_itself() {
    let storage = Arc::new(MemoryStorageClient::new());
    let client = EncryptionClient::new(storage, aes_manager(0x72));
    client.put_object("k", b"payload", EncryptionContext::new()).unwrap();
    let out = client.get_object("k", Some(&EncryptionContext::new())).unwrap();
    assert_eq!(out, b"payload");
}

#[test]
fn no_expected_context_skips_the_check_entirely() {
    let storage = Arc::new(MemoryStorageClient::new());
    let client = EncryptionClient::new(storage, aes_manager(0x73));
    client.put_object("k", b"payload", sample_context()).unwrap();
    assert_eq!(client.get_object("k", None).unwrap(), b"payload");
}
