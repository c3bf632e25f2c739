//! Time management for the pipeline loops
//!
//! Every loop in buzzlink is "do something, then sleep". Routing both the
//! timestamp and the sleep through one [`Clock`] lets tests run the delivery
//! worker's cooldown schedule without waiting on a wall clock:
//! - [`SystemClock`]: monotonic time since construction, real sleeps
//! - [`MockClock`]: shared counter, `sleep` advances it instantly

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Timestamp in milliseconds since the clock's origin
pub type Timestamp = u64;

/// Source of time and sleep for the pipeline loops
///
/// `now()` must be monotonic: the cooldown floor is measured as the
/// difference between two attempt starts.
pub trait Clock: Send + Sync {
    /// Current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Suspend the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Monotonic wall clock backed by [`Instant`]
///
/// Starts at 0 on construction, always increases
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_millis() as Timestamp
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Controllable time for testing
///
/// Clones share the same counter, so a test can hand one clone to a worker
/// and read the schedule back from another. `sleep` returns immediately
/// after advancing the counter.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now_ms: Arc<AtomicU64>,
}

impl MockClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, timestamp: Timestamp) {
        self.now_ms.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration.as_millis() as u64);
    }
}
