//! Single-flight guard.
//!
//! One optimistic operation per domain at a time. A second caller is turned
//! away instead of queued.

use std::sync::atomic::{AtomicBool, Ordering};

/// Per-domain single-flight token.
#[derive(Debug, Default)]
pub struct SingleFlightGuard {
    busy: AtomicBool,
}

impl SingleFlightGuard {
    /// Create an idle guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the token. `None` if another operation holds it.
    #[must_use]
    pub fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit { busy: &self.busy })
    }

    /// Whether an operation currently holds the token.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the token. Dropping it releases the guard, on every
/// exit path including unwinding.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the permit is dropped"]
pub struct FlightPermit<'a> {
    busy: &'a AtomicBool,
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
