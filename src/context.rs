//! Encryption context: caller-supplied key/value pairs bound into the
//! wrapped-key AAD and stored verbatim (as canonical JSON) in `x-amz-matdesc`.

use crate::error::EnvelopeError;
use std::collections::BTreeMap;

/// Reserved key name. Callers must not set it themselves: it is kept out of
/// the context namespace so a future schema revision can use it without
/// colliding with caller-supplied keys. The content suite is already bound
/// cryptographically (key-wrap AAD / pseudo-key cipher name) and is never
/// injected into the stored context or `x-amz-matdesc`.
pub const RESERVED_SUITE_KEY: &str = "aws:x-amz-cek-alg";

/// An encryption context: an ordered (by key) string-to-string map, canonical
/// JSON serialization is used both for the stored `x-amz-matdesc` and the
/// byte-wise equality check a decrypt request's context is held to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncryptionContext(BTreeMap<String, String>);

impl EncryptionContext {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains_reserved_key(&self) -> bool {
        self.0.contains_key(RESERVED_SUITE_KEY)
    }

    /// Compact JSON object with keys in sorted order (guaranteed by the
    /// underlying `BTreeMap`, preserved by `serde_json`'s map serialization).
    pub fn to_canonical_json(&self) -> String {
        serde_json::to_string(&self.0).expect("string-keyed map serialization cannot fail")
    }

    pub fn from_canonical_json(raw: &str) -> Result<Self, EnvelopeError> {
        if raw.is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_str(raw)
            .map(Self)
            .map_err(|e| EnvelopeError::tampered(format!("malformed matdesc JSON: {e}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for EncryptionContext {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_sorts_keys() {
        let mut ctx = EncryptionContext::new();
        ctx.insert("zebra", "1");
        ctx.insert("alpha", "2");
        assert_eq!(ctx.to_canonical_json(), r#"{"alpha":"2","zebra":"1"}"#);
    }

    #[test]
    fn reserved_key_is_detected_when_caller_supplied() {
        let mut ctx = EncryptionContext::new();
        assert!(!ctx.contains_reserved_key());
        ctx.insert(RESERVED_SUITE_KEY, "whatever");
        assert!(ctx.contains_reserved_key());
    }

    #[test]
    fn empty_context_serializes_to_empty_object() {
        let ctx = EncryptionContext::new();
        assert_eq!(ctx.to_canonical_json(), "{}");
    }

    #[test]
    fn roundtrips_through_canonical_json() {
        let mut ctx = EncryptionContext::new();
        ctx.insert("customer", "acme");
        ctx.insert("purpose", "billing");
        let json = ctx.to_canonical_json();
        let parsed = EncryptionContext::from_canonical_json(&json).unwrap();
        assert_eq!(ctx, parsed);
    }

    #[test]
    fn empty_canonical_json_roundtrips() {
        let parsed = EncryptionContext::from_canonical_json("").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn malformed_matdesc_is_tampered() {
        let err = EncryptionContext::from_canonical_json("{not json").unwrap_err();
        assert!(matches!(err, EnvelopeError::TamperedEnvelope(_)));
    }
}
