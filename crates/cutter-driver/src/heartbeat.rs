//! Stall Monitor - detects a stalled execution context
//!
//! `synchronize()` blocks without a timeout, so a stalled stepper (e.g. a dead
//! timing source) would hang the command context forever. This monitor lets a
//! surrounding watchdog *report* that condition; nothing here recovers from it.
//!
//! **App Start Relative Time Pattern**:
//! - Uses monotonic time anchored to application start
//! - Safe to store in AtomicU64 for lock-free access

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global anchor point for monotonic time
static APP_START: OnceLock<Instant> = OnceLock::new();

/// Monotonic time as microseconds since app start
fn get_monotonic_micros() -> u64 {
    let start = APP_START.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// Execution progress monitor
///
/// The stepper arms a deadline when it starts a block (block duration + grace)
/// and again when it finishes one (grace only). The producer arms it when the
/// queue goes from empty to non-empty. Whether the execution context is
/// stalled is then "work is outstanding and the deadline has passed".
pub struct StallMonitor {
    deadline_us: AtomicU64,
    grace: Duration,
}

impl StallMonitor {
    /// Create a new stall monitor
    ///
    /// # Parameters
    /// - `grace`: slack allowed on top of the expected block duration
    ///
    /// # Example
    /// ```
    /// # use cutter_driver::StallMonitor;
    /// # use std::time::Duration;
    /// let monitor = StallMonitor::new(Duration::from_millis(500));
    /// assert!(!monitor.is_overdue());
    /// ```
    pub fn new(grace: Duration) -> Self {
        let now = get_monotonic_micros();
        Self {
            deadline_us: AtomicU64::new(now + grace.as_micros() as u64),
            grace,
        }
    }

    /// Expect the next progress report within `expected` (+ grace)
    pub fn expect_progress_within(&self, expected: Duration) {
        let deadline = get_monotonic_micros() + (expected + self.grace).as_micros() as u64;
        self.deadline_us.store(deadline, Ordering::Relaxed);
    }

    /// Whether the current deadline has passed
    pub fn is_overdue(&self) -> bool {
        get_monotonic_micros() > self.deadline_us.load(Ordering::Relaxed)
    }
}
