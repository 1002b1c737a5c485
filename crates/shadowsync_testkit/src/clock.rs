//! Hand-advanced clock for deterministic timing tests.

use std::cell::Cell;
use std::rc::Rc;

use shadowsync_core::Clock;

/// A manual millisecond clock.
///
/// Clones share the same time source: hand one clone to
/// `DeviceShadow::builder().clock(..)` and keep another to advance
/// time from the test body.
///
/// ```
/// use shadowsync_core::DeviceShadow;
/// use shadowsync_testkit::ManualClock;
///
/// let clock = ManualClock::new();
/// let shadow = DeviceShadow::builder().clock(clock.clone()).build();
/// clock.advance(5_000);
/// # drop(shadow);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance time by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Jump to an absolute time.
    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
