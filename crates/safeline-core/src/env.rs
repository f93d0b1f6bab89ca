//! Environment abstraction for deterministic testing.
//!
//! Decouples safety logic from system resources (time, randomness). Enables
//! deterministic simulation (virtual clock, seeded RNG) and production use
//! with real system resources.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async primitives.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use a virtual instant.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - This method MUST return values that never decrease within a single
    ///   execution context.
    fn now(&self) -> Self::Instant;

    /// Wall-clock time as milliseconds since the Unix epoch.
    ///
    /// Used for user-facing timestamps such as the SOS activation time. Never
    /// used for ordering; use [`Environment::now`] for that.
    fn wall_clock_ms(&self) -> u64;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not controller logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Used for contact identifiers.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Deterministic environment for tests outside this crate.
pub mod test_utils {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use super::Environment;

    /// Environment with a manually advanced clock and counter-based bytes.
    ///
    /// Clones share the same clock.
    #[derive(Debug, Clone)]
    pub struct MockEnv {
        elapsed_ms: Arc<AtomicU64>,
        epoch_ms: u64,
        counter: Arc<AtomicU64>,
    }

    /// Monotonic instant of a [`MockEnv`], in milliseconds since creation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct MockInstant(u64);

    impl std::ops::Sub for MockInstant {
        type Output = Duration;

        fn sub(self, rhs: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(rhs.0))
        }
    }

    impl MockEnv {
        /// Wall clock starts at `epoch_ms`.
        pub fn new(epoch_ms: u64) -> Self {
            Self {
                elapsed_ms: Arc::new(AtomicU64::new(0)),
                epoch_ms,
                counter: Arc::new(AtomicU64::new(0)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, duration: Duration) {
            let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
            self.elapsed_ms.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new(1_700_000_000_000)
        }
    }

    impl Environment for MockEnv {
        type Instant = MockInstant;

        fn now(&self) -> MockInstant {
            MockInstant(self.elapsed_ms.load(Ordering::SeqCst))
        }

        fn wall_clock_ms(&self) -> u64 {
            self.epoch_ms + self.elapsed_ms.load(Ordering::SeqCst)
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            self.advance(duration);
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let seed = self.counter.fetch_add(1, Ordering::SeqCst);
            let mixed = seed.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15).to_be_bytes();
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = mixed[i % 8] ^ (i / 8) as u8;
            }
        }
    }
}
