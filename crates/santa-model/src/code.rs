//! Shareable codes for rooms and invitations.
//!
//! Codes are short, upper-case, and easy to type into a chat. They are not
//! secrets in the cryptographic sense: uniqueness is enforced by the store,
//! and a collision is simply retried by the caller.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Characters a code is drawn from: `A-Z` then `0-9`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces opaque human-shareable tokens.
///
/// `Send + Sync` because one generator is shared by every request the
/// service handles.
pub trait CodeGenerator: Send + Sync + 'static {
    /// Returns a fresh code of exactly `len` characters.
    fn generate(&self, len: usize) -> String;
}

/// A [`CodeGenerator`] that samples uniformly from [`CODE_ALPHABET`].
///
/// The RNG sits behind a `std::sync::Mutex`: it is only held for the few
/// nanoseconds it takes to sample, never across an `.await`.
pub struct RandomCodeGenerator {
    rng: Mutex<StdRng>,
}

impl RandomCodeGenerator {
    /// Seeds from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Seeds deterministically; two generators with the same seed produce
    /// the same sequence of codes.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, len: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (0..len)
            .map(|_| {
                let idx = rng.random_range(0..CODE_ALPHABET.len());
                char::from(CODE_ALPHABET[idx])
            })
            .collect()
    }
}
