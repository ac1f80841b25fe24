//! Clock port: wall-clock time for `Date` headers.

use fauxplug_domain::time::{self, Timestamp};

/// Source of the current wall-clock time.
///
/// `None` means the clock has not been synchronised yet; callers fall back
/// to a placeholder date instead of waiting.
pub trait Clock: Send + Sync {
    fn now(&self) -> Option<Timestamp>;
}

/// The host's UTC clock, distrusted until it reports a plausible year.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Option<Timestamp> {
        let now = time::now();
        time::is_plausible(now).then_some(now)
    }
}

/// A clock frozen at a given reading. Useful in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Option<Timestamp>);

impl Clock for FixedClock {
    fn now(&self) -> Option<Timestamp> {
        self.0
    }
}
