//! Unified error taxonomy for the envelope crypto core.
//!
//! One closed enum: crypto failures are never retried locally, I/O failures
//! are surfaced verbatim for the caller to retry. `UnwrapFailure` aggregates
//! per-candidate diagnostics without exposing which candidate (or why) came
//! closest to succeeding, so a caller cannot build an unwrap oracle out of
//! repeated failures.

use std::fmt;

/// Coarse classification of why a single keyring strategy failed to unwrap
/// an `EncryptedDataKey`. Never carries key material or the underlying
/// crypto library's error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwrapReasonClass {
    /// No registered decrypt strategy owns this provider id.
    UnknownProvider,
    /// A registered strategy tried and the underlying crypto operation
    /// failed (wrong key, AEAD tag mismatch, OAEP failure, ...).
    CryptoFailure,
}

/// One candidate EDK that a keyring tried (or skipped) during `on_decrypt`.
#[derive(Debug, Clone)]
pub struct UnwrapAttempt {
    pub provider_id: String,
    pub reason: UnwrapReasonClass,
}

/// Aggregate of every candidate tried by `Keyring::on_decrypt`. No EDK
/// resolved to a plaintext data key.
#[derive(Debug, Clone, Default)]
pub struct UnwrapFailure {
    pub attempts: Vec<UnwrapAttempt>,
}

impl fmt::Display for UnwrapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no registered keyring strategy could unwrap the data key ({} candidate(s) tried)",
            self.attempts.len()
        )
    }
}

/// Every failure mode the envelope crypto core can produce.
#[derive(Debug, Clone)]
pub enum EnvelopeError {
    /// Wrong wrapping-key algorithm, unknown suite id, attempt to encrypt
    /// with a legacy-only keyring, or a caller/stored encryption-context
    /// mismatch.
    Configuration(String),
    /// Underlying crypto primitive refused the operation (invalid key
    /// length, bad padding parameters).
    WrapFailure(String),
    /// No EDK was decryptable by any registered strategy.
    UnwrapFailure(UnwrapFailure),
    /// Structural checks on the envelope failed: bad pseudo-data-key length
    /// byte, cipher-name mismatch, tag length out of the allowed set.
    TamperedEnvelope(String),
    /// GCM tag verification failed on the content stream.
    AuthenticationFailure,
    /// Caller did not opt into legacy algorithms but the stored metadata
    /// names one.
    LegacyRefused { suite: String },
    /// The storage client reported a transport error.
    Io(String),
}

impl EnvelopeError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn wrap_failure(msg: impl Into<String>) -> Self {
        Self::WrapFailure(msg.into())
    }

    pub fn tampered(msg: impl Into<String>) -> Self {
        Self::TamperedEnvelope(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// CLI exit code, per the public interface's documented mapping.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::WrapFailure(_) => 3,
            Self::UnwrapFailure(_) => 3,
            Self::TamperedEnvelope(_) => 4,
            Self::AuthenticationFailure => 4,
            Self::LegacyRefused { .. } => 2,
            Self::Io(_) => 5,
        }
    }
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::WrapFailure(msg) => write!(f, "key wrap failed: {msg}"),
            Self::UnwrapFailure(inner) => write!(f, "{inner}"),
            Self::TamperedEnvelope(msg) => write!(f, "tampered envelope: {msg}"),
            Self::AuthenticationFailure => write!(f, "content authentication failed"),
            Self::LegacyRefused { suite } => {
                write!(f, "legacy algorithm '{suite}' refused without opt-in")
            }
            Self::Io(msg) => write!(f, "storage I/O error: {msg}"),
        }
    }
}

impl std::error::Error for EnvelopeError {}

/// Signal returned by a single keyring strategy attempt, from
/// `KeyUnwrapStrategy::unwrap`. Distinguishes a definitive structural tamper
/// (propagated immediately, never aggregated) from an ordinary "this
/// candidate wasn't for us" failure (aggregated into `UnwrapFailure`). Public
/// because `KeyUnwrapStrategy` is a trait third-party keyrings can implement.
#[derive(Debug, Clone)]
pub enum StrategyFailure {
    Generic(String),
    Tampered(String),
}

impl StrategyFailure {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    pub fn tampered(msg: impl Into<String>) -> Self {
        Self::Tampered(msg.into())
    }
}
