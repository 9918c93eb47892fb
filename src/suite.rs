//! Algorithm Suite Registry: the closed set of content ciphers this crate
//! understands. Exactly one suite is active (emitted by encrypt); the rest
//! are legacy, read-only on decrypt, and reachable only through a materials
//! manager that opted into legacy support.

use std::fmt;

/// A named content-encryption algorithm suite.
///
/// `AES_256_GCM_NO_KDF` is the only suite `MaterialsManager::get_encryption_materials`
/// will ever select. The others exist purely to decrypt objects written by
/// older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmSuite {
    /// Active suite: AES-256-GCM, 12-byte IV, 16-byte tag, no KDF.
    Aes256GcmNoKdf,
    /// Same cipher as the active suite but stored under the older
    /// `AES/GCM` cek-alg id instead of `AES/GCM/NoPadding`. Read-only.
    Aes256GcmLegacyId,
    /// Unauthenticated AES-CBC with PKCS5 padding. Read-only; this is also
    /// the implicit suite for v1 envelopes that carry no `x-amz-cek-alg`.
    AesCbcPkcs5Legacy,
    /// Unauthenticated AES-CTR. Read-only; supports range GET.
    AesCtrLegacy,
}

impl AlgorithmSuite {
    /// The `x-amz-cek-alg` wire value for this suite, where one exists.
    /// `AesCbcPkcs5Legacy` has no wire value of its own: it is signaled by
    /// the *absence* of `x-amz-cek-alg` in a v1 envelope.
    pub fn cipher_name(&self) -> &'static str {
        match self {
            Self::Aes256GcmNoKdf => "AES/GCM/NoPadding",
            Self::Aes256GcmLegacyId => "AES/GCM",
            Self::AesCbcPkcs5Legacy => "AES/CBC/PKCS5Padding",
            Self::AesCtrLegacy => "AES/CTR/NoPadding",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Aes256GcmNoKdf)
    }

    pub fn is_legacy(&self) -> bool {
        !self.is_active()
    }

    /// Whether the content stream for this suite carries an auth tag.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Aes256GcmNoKdf | Self::Aes256GcmLegacyId)
    }

    /// Whether this suite's content stream supports a range GET. Only the
    /// unauthenticated, seekable stream ciphers qualify; GCM objects must
    /// always be fetched and verified in full.
    pub fn supports_range_get(&self) -> bool {
        matches!(self, Self::AesCtrLegacy)
    }

    /// Data key length in bytes, where the suite mandates one. Legacy CBC
    /// and CTR accept whatever AES key size (16/24/32) the keyring unwrapped;
    /// the active suite always uses a 32-byte key.
    pub fn fixed_data_key_len(&self) -> Option<usize> {
        match self {
            Self::Aes256GcmNoKdf | Self::Aes256GcmLegacyId => Some(32),
            Self::AesCbcPkcs5Legacy | Self::AesCtrLegacy => None,
        }
    }

    pub fn iv_len(&self) -> usize {
        match self {
            Self::Aes256GcmNoKdf | Self::Aes256GcmLegacyId => 12,
            Self::AesCbcPkcs5Legacy | Self::AesCtrLegacy => 16,
        }
    }

    /// Tag length in bytes for authenticated suites.
    pub fn tag_len(&self) -> usize {
        if self.is_authenticated() {
            16
        } else {
            0
        }
    }

    /// Resolve a suite from a stored `x-amz-cek-alg` value.
    pub fn from_cek_alg(cek_alg: &str) -> Option<Self> {
        match cek_alg {
            "AES/GCM/NoPadding" => Some(Self::Aes256GcmNoKdf),
            "AES/GCM" => Some(Self::Aes256GcmLegacyId),
            "AES/CTR/NoPadding" => Some(Self::AesCtrLegacy),
            _ => None,
        }
    }
}

impl fmt::Display for AlgorithmSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cipher_name())
    }
}

/// Valid GCM tag lengths, in bits, per the allowed set a stored
/// `x-amz-tag-len` value is checked against.
pub const VALID_GCM_TAG_BITS: [u16; 5] = [96, 104, 112, 120, 128];
