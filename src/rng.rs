//! The injectable RNG seam. Every nonce/IV and every freshly-generated data
//! key passes through a `&dyn SecureRandom`, never a direct call to a global
//! RNG, so tests can supply deterministic randomness and production callers
//! can swap in a hardware RNG without touching the crypto core.

use crate::error::EnvelopeError;

pub trait SecureRandom: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EnvelopeError>;
}

/// Default RNG, backed by the operating system's CSPRNG via `getrandom`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSecureRandom;

impl SecureRandom for OsSecureRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EnvelopeError> {
        getrandom::getrandom(buf).map_err(|e| EnvelopeError::wrap_failure(format!("rng failure: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_rng_fills_buffer() {
        let mut buf = [0u8; 32];
        OsSecureRandom.fill(&mut buf).unwrap();
        assert!(buf.iter().any(|&b| b != 0));
    }
}
