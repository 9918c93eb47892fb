mod common;

use common::aes_manager;
use envelope_crypto_core::context::EncryptionContext;
use envelope_crypto_core::rng::OsSecureRandom;
use zeroize::Zeroize;

/// `MaterialsManager::get_encryption_materials` hands back the plaintext
/// data key wrapped in `Zeroizing<Vec<u8>>`. This exercises the same
/// `Zeroize` code path the wrapper runs on drop, without needing `unsafe`
/// to inspect freed memory.
#[test]
fn plaintext_data_key_zeroizes_in_place() {
    let manager = aes_manager(0x50);
    let mut materials = manager
        .get_encryption_materials(EncryptionContext::new(), &OsSecureRandom)
        .unwrap();

    let mut dk = materials
        .plaintext_data_key
        .take()
        .expect("keyring always generates a data key when encrypting");
    assert!(
        dk.iter().any(|&b| b != 0),
        "a freshly generated 32-byte key being all-zero is vanishingly unlikely"
    );

    dk.zeroize();
    assert!(dk.iter().all(|&b| b == 0));
}
