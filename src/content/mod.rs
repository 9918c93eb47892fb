//! Content Encryption Strategy: the active AES-GCM streaming cipher plus
//! read-only legacy CBC/CTR strategies for objects written by older
//! clients.

pub mod gcm;
pub mod legacy;

/// The ciphertext and framing parameters stored alongside an object.
pub struct EncryptedContent {
    pub iv: Vec<u8>,
    /// For authenticated suites this includes the trailing auth tag.
    pub ciphertext: Vec<u8>,
    /// Tag length in bytes; 0 for unauthenticated legacy suites.
    pub tag_len: usize,
}
