//! Simulated environment: virtual wall clock and seeded RNG.
//!
//! Time only moves when a test advances it, and every random byte comes from
//! a ChaCha20 stream seeded by the test, so runs are reproducible.

#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use fanmail_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Starting wall-clock time (2023-11-14T22:13:20Z).
pub const DEFAULT_START_MS: u64 = 1_700_000_000_000;

/// Deterministic environment for tests.
///
/// Clones share both the clock and the RNG stream. [`SimEnv::fork`] shares
/// only the clock.
#[derive(Clone)]
pub struct SimEnv {
    clock_ms: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha20Rng>>,
    seed: u64,
}

impl SimEnv {
    /// Environment seeded with `seed`, clock at [`DEFAULT_START_MS`].
    pub fn with_seed(seed: u64) -> Self {
        Self {
            clock_ms: Arc::new(AtomicU64::new(DEFAULT_START_MS)),
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            seed,
        }
    }

    /// Environment on the same clock with an independent RNG stream.
    ///
    /// Different `stream` values never produce the same bytes.
    pub fn fork(&self, stream: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(self.seed);
        rng.set_stream(stream + 1);

        Self { clock_ms: Arc::clone(&self.clock_ms), rng: Arc::new(Mutex::new(rng)), seed: self.seed }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let by_ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.clock_ms.fetch_add(by_ms, Ordering::SeqCst);
    }

    /// Set the clock to an absolute time. May move it backwards.
    pub fn set_time_ms(&self, now_ms: u64) {
        self.clock_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    fn wall_clock_ms(&self) -> u64 {
        self.clock_ms.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().expect("SimEnv rng mutex poisoned").fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);
        assert_eq!(a.random_array::<32>(), b.random_array::<32>());
    }

    #[test]
    fn forks_share_clock_not_rng() {
        let env = SimEnv::with_seed(1);
        let left = env.fork(0);
        let right = env.fork(1);

        assert_ne!(left.random_array::<16>(), right.random_array::<16>());

        env.advance(Duration::from_secs(2));
        assert_eq!(left.wall_clock_ms(), DEFAULT_START_MS + 2_000);
        assert_eq!(right.wall_clock_ms(), DEFAULT_START_MS + 2_000);
    }

    #[test]
    fn clock_only_moves_when_told() {
        let env = SimEnv::with_seed(0);
        assert_eq!(env.wall_clock_ms(), DEFAULT_START_MS);
        assert_eq!(env.wall_clock_ms(), DEFAULT_START_MS);

        env.set_time_ms(5);
        assert_eq!(env.wall_clock_ms(), 5);
    }
}
