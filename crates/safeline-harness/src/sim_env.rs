//! Simulated environment: virtual clock and seeded RNG.
//!
//! Time only moves when the harness advances it, and every random byte comes
//! from a ChaCha stream seeded by the test. Two runs with the same seed and
//! script are identical.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use safeline_core::Environment;

/// Wall clock at simulation start: 2023-11-14T22:13:20Z.
pub const SIM_EPOCH_MS: u64 = 1_700_000_000_000;

/// Virtual monotonic instant, in milliseconds since simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(u64);

impl SimInstant {
    /// Milliseconds since simulation start.
    pub fn as_millis(self) -> u64 {
        self.0
    }
}

impl std::ops::Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

struct SimState {
    now_ms: u64,
    rng: ChaCha8Rng,
}

/// Deterministic environment. Clones share the same clock and RNG.
#[derive(Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

impl SimEnv {
    /// Environment with the given RNG seed, clock at zero.
    pub fn with_seed(seed: u64) -> Self {
        Self { state: Arc::new(Mutex::new(SimState { now_ms: 0, rng: ChaCha8Rng::seed_from_u64(seed) })) }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let mut state = self.lock();
        state.now_ms = state.now_ms.saturating_add(millis);
    }

    /// Move the clock to `instant`. Never moves backwards.
    pub fn advance_to(&self, instant: SimInstant) {
        let mut state = self.lock();
        state.now_ms = state.now_ms.max(instant.0);
    }

    /// Time elapsed since simulation start.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.lock().now_ms)
    }

    /// Instant `offset` after simulation start.
    pub fn instant_at(offset: Duration) -> SimInstant {
        SimInstant(u64::try_from(offset.as_millis()).unwrap_or(u64::MAX))
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().expect("SimEnv mutex poisoned")
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("now_ms", &self.lock().now_ms).finish_non_exhaustive()
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.lock().now_ms)
    }

    fn wall_clock_ms(&self) -> u64 {
        SIM_EPOCH_MS + self.lock().now_ms
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.lock().rng.fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);
        assert_eq!(a.random_u64(), b.random_u64());
        assert_ne!(SimEnv::with_seed(8).random_u64(), SimEnv::with_seed(7).random_u64());
    }

    #[test]
    fn clock_only_moves_forward() {
        let env = SimEnv::default();
        env.advance(Duration::from_secs(3));
        env.advance_to(SimEnv::instant_at(Duration::from_secs(1)));
        assert_eq!(env.elapsed(), Duration::from_secs(3));
        assert_eq!(env.wall_clock_ms(), SIM_EPOCH_MS + 3000);
    }
}
