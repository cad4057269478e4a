//! Injected wall-clock source, so bucket freshness is testable without sleeping.

use std::time::{SystemTime, UNIX_EPOCH};

/// Produces a nondecreasing count of seconds.
///
/// Used to timestamp bucket freshness (`KBucket::touch`) and to decide
/// staleness (`RoutingTable::get_refresh_list`). Injected rather than read
/// directly from `SystemTime` so tests can advance time deterministically.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

/// The default [`Clock`], backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is set before the Unix epoch")
            .as_secs()
    }
}

/// A clock a test can advance by hand, for deterministic staleness checks.
///
/// Gated behind the `test-util` feature rather than `#[cfg(test)]` so this
/// crate's own `tests/` integration suite, which links the library as an
/// ordinary dependency, can also construct one. Backed by an `AtomicU64`
/// rather than a `Cell` so it stays `Sync`, as `Clock`'s supertrait bound
/// requires.
#[cfg(feature = "test-util")]
#[derive(Debug, Default)]
pub struct FixedClock(std::sync::atomic::AtomicU64);

#[cfg(feature = "test-util")]
impl FixedClock {
    pub fn new(now: u64) -> Self {
        FixedClock(std::sync::atomic::AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(feature = "test-util")]
impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
