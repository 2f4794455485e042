//! Production environment: system wall clock and OS cryptographic RNG.

use ridehail_core::Environment;

/// Environment backed by the system clock and getrandom.
///
/// # Panics
///
/// Panics if the OS RNG fails. Intentional - a server that cannot generate
/// unpredictable session and ride ids cannot operate; RNG failure indicates
/// OS-level trouble.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_secs()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
