//! Environment abstraction for time and randomness.
//!
//! Decouples the coordinator from system resources so tests run with a
//! seeded RNG and a controlled clock. The production implementation lives in
//! `ridehail-server` (OS entropy, system wall clock).

use std::sync::{Arc, Mutex};

/// Source of wall-clock time and randomness.
///
/// # Invariants
///
/// - `wall_clock_secs()` never decreases within one execution context.
/// - `random_bytes()` uses cryptographically secure entropy in production;
///   deterministic implementations are for tests and simulation only.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current Unix time in seconds.
    fn wall_clock_secs(&self) -> u64;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// A random `u64`, for session ids.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// A random `u128`, for ride ids.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }
}

/// Deterministic environment for tests.
///
/// Randomness comes from a splitmix64 sequence over the seed, so id
/// generation is reproducible run to run. The clock starts at a fixed epoch
/// and only moves when a test calls [`SeededEnv::advance`].
#[derive(Clone)]
pub struct SeededEnv {
    inner: Arc<Mutex<SeededEnvInner>>,
}

struct SeededEnvInner {
    rng_state: u64,
    clock_secs: u64,
}

impl SeededEnv {
    /// Arbitrary but stable test epoch (2024-01-01T00:00:00Z).
    pub const EPOCH_SECS: u64 = 1_704_067_200;

    /// Create an environment seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SeededEnvInner {
                rng_state: seed,
                clock_secs: Self::EPOCH_SECS,
            })),
        }
    }

    /// Move the clock forward by `secs`.
    #[allow(clippy::expect_used)]
    pub fn advance(&self, secs: u64) {
        self.inner.lock().expect("SeededEnv mutex poisoned").clock_secs += secs;
    }
}

impl Default for SeededEnv {
    fn default() -> Self {
        Self::new(0x5eed_5eed_5eed_5eed)
    }
}

impl Environment for SeededEnv {
    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        self.inner.lock().expect("SeededEnv mutex poisoned").clock_secs
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut inner = self.inner.lock().expect("SeededEnv mutex poisoned");
        for chunk in buffer.chunks_mut(8) {
            // splitmix64 step
            inner.rng_state = inner.rng_state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = inner.rng_state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^= z >> 31;
            let bytes = z.to_be_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
