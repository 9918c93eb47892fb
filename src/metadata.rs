//! Content Metadata Strategy: encodes/decodes the `x-amz-*` object metadata
//! keys that bind a wrapped data key, its IV, its algorithm parameters and
//! the encryption context to a stored object.

use crate::content::EncryptedContent;
use crate::context::EncryptionContext;
use crate::error::{EnvelopeError, UnwrapAttempt, UnwrapFailure, UnwrapReasonClass};
use crate::materials::{EncryptedDataKey, EncryptionMaterials};
use crate::suite::{AlgorithmSuite, VALID_GCM_TAG_BITS};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::BTreeMap;

const KEY_V2: &str = "x-amz-key-v2";
const KEY_V1: &str = "x-amz-key";
const KEY_IV: &str = "x-amz-iv";
const KEY_MATDESC: &str = "x-amz-matdesc";
const KEY_WRAP_ALG: &str = "x-amz-wrap-alg";
const KEY_CEK_ALG: &str = "x-amz-cek-alg";
const KEY_TAG_LEN: &str = "x-amz-tag-len";
const KEY_PROVIDER_INFO: &str = "x-amz-key-provider-info";
const KEY_UNENCRYPTED_CONTENT_LENGTH: &str = "x-amz-unencrypted-content-length";

/// A fully parsed view of an object's encryption metadata.
pub struct ObjectEnvelope {
    pub suite: AlgorithmSuite,
    pub context: EncryptionContext,
    pub candidate_edks: Vec<EncryptedDataKey>,
    pub iv: Vec<u8>,
    pub tag_len_bits: Option<u16>,
    pub is_v1: bool,
    pub unencrypted_content_length: Option<u64>,
}

/// Builds the `x-amz-*` metadata map for a freshly encrypted object. Always
/// a v2, active-suite envelope: encrypt never emits legacy metadata.
pub fn encode(materials: &EncryptionMaterials, content: &EncryptedContent) -> Result<BTreeMap<String, String>, EnvelopeError> {
    let edk = materials
        .encrypted_data_keys
        .last()
        .ok_or_else(|| EnvelopeError::wrap_failure("no encrypted data key to encode"))?;

    let mut out = BTreeMap::new();
    out.insert(KEY_V2.to_string(), BASE64.encode(&edk.ciphertext));
    out.insert(KEY_IV.to_string(), BASE64.encode(&content.iv));
    out.insert(KEY_MATDESC.to_string(), materials.context.to_canonical_json());
    out.insert(KEY_WRAP_ALG.to_string(), edk.key_provider_id.clone());
    out.insert(KEY_CEK_ALG.to_string(), materials.suite.cipher_name().to_string());
    out.insert(KEY_TAG_LEN.to_string(), (content.tag_len * 8).to_string());
    if let Some(info) = &edk.key_provider_info {
        out.insert(KEY_PROVIDER_INFO.to_string(), info.clone());
    }
    Ok(out)
}

/// Parses `metadata` into an `ObjectEnvelope`. Returns `Ok(None)` if the
/// object carries no client-side encryption metadata at all.
pub fn decode(metadata: &BTreeMap<String, String>) -> Result<Option<ObjectEnvelope>, EnvelopeError> {
    let (wrapped_key_b64, is_v1) = match metadata.get(KEY_V2) {
        Some(v) => (v, false),
        None => match metadata.get(KEY_V1) {
            Some(v) => (v, true),
            None => return Ok(None),
        },
    };

    let cek_alg = metadata.get(KEY_CEK_ALG);
    let (suite, tag_len_bits) = match cek_alg {
        Some(alg) => {
            let suite = AlgorithmSuite::from_cek_alg(alg).ok_or_else(|| {
                // An unrecognized cek-alg can't be distinguished from a bit-flipped
                // one, so it's treated the same as any other unwrap candidate that
                // doesn't match: aggregated rather than surfaced as a config error.
                EnvelopeError::UnwrapFailure(UnwrapFailure {
                    attempts: vec![UnwrapAttempt {
                        provider_id: alg.clone(),
                        reason: UnwrapReasonClass::UnknownProvider,
                    }],
                })
            })?;
            let tag_len_bits = if suite.is_authenticated() {
                let raw = metadata
                    .get(KEY_TAG_LEN)
                    .ok_or_else(|| EnvelopeError::configuration("missing x-amz-tag-len"))?;
                let bits: u16 = raw
                    .parse()
                    .map_err(|_| EnvelopeError::tampered("x-amz-tag-len is not a valid integer"))?;
                if !VALID_GCM_TAG_BITS.contains(&bits) {
                    return Err(EnvelopeError::tampered("GCM tag length out of the allowed set"));
                }
                Some(bits)
            } else {
                None
            };
            (suite, tag_len_bits)
        }
        None => (AlgorithmSuite::AesCbcPkcs5Legacy, None),
    };

    let wrap_alg = metadata
        .get(KEY_WRAP_ALG)
        .ok_or_else(|| EnvelopeError::configuration("missing x-amz-wrap-alg"))?
        .clone();
    let key_provider_info = metadata.get(KEY_PROVIDER_INFO).cloned();

    let iv_b64 = metadata
        .get(KEY_IV)
        .ok_or_else(|| EnvelopeError::configuration("missing x-amz-iv"))?;
    let iv = BASE64
        .decode(iv_b64)
        .map_err(|_| EnvelopeError::tampered("x-amz-iv is not valid base64"))?;

    let context = match metadata.get(KEY_MATDESC) {
        Some(raw) => EncryptionContext::from_canonical_json(raw)?,
        None => EncryptionContext::new(),
    };

    let ciphertext = BASE64
        .decode(wrapped_key_b64)
        .map_err(|_| EnvelopeError::tampered("wrapped key is not valid base64"))?;

    let unencrypted_content_length = metadata
        .get(KEY_UNENCRYPTED_CONTENT_LENGTH)
        .and_then(|v| v.parse().ok());

    Ok(Some(ObjectEnvelope {
        suite,
        context,
        candidate_edks: vec![EncryptedDataKey {
            key_provider_id: wrap_alg,
            key_provider_info,
            ciphertext,
        }],
        iv,
        tag_len_bits,
        is_v1,
        unencrypted_content_length,
    }))
}

/// A read-only summary of an object's envelope for audit tooling: enough to
/// tell what algorithm suite an object was written with and whether it's
/// legacy, without a wrapping key and without exposing the wrapped-key
/// ciphertext itself.
pub struct EnvelopeInspection {
    pub suite: AlgorithmSuite,
    pub wrap_algorithm: String,
    pub tag_len_bits: Option<u16>,
    pub is_legacy: bool,
    pub is_v1: bool,
}

/// Parses an object's metadata far enough to report its algorithm suite and
/// wrap algorithm, without ever touching a wrapping key. Never decrypts.
pub fn inspect_envelope(
    metadata: &BTreeMap<String, String>,
) -> Result<Option<EnvelopeInspection>, EnvelopeError> {
    let Some(envelope) = decode(metadata)? else {
        return Ok(None);
    };
    let wrap_algorithm = envelope
        .candidate_edks
        .first()
        .map(|edk| edk.key_provider_id.clone())
        .unwrap_or_default();
    Ok(Some(EnvelopeInspection {
        is_legacy: envelope.suite.is_legacy(),
        suite: envelope.suite,
        wrap_algorithm,
        tag_len_bits: envelope.tag_len_bits,
        is_v1: envelope.is_v1,
    }))
}
