//! Injected randomness
//!
//! The RNG is the only non-deterministic input to DKES. Every operation that
//! needs randomness takes a `SecureRandom`; `OsRng` is the default.

use rand::{CryptoRng, RngCore};

use crate::error::{DkesError, DkesResult};
use crate::log_error;

/// A source of cryptographically secure random bytes
pub trait SecureRandom {
    fn fill(&mut self, out: &mut [u8]) -> DkesResult<()>;
}

impl<R: RngCore + CryptoRng> SecureRandom for R {
    fn fill(&mut self, out: &mut [u8]) -> DkesResult<()> {
        self.try_fill_bytes(out).map_err(|e| {
            log_error!("rng", "Random source failed", requested = out.len(), error = e);
            DkesError::rng_failure(format!("RNG failure: {}", e))
        })
    }
}

/// The operating system CSPRNG
pub fn os_rng() -> rand::rngs::OsRng {
    rand::rngs::OsRng
}
