//! Time handle for deadline checks.
//!
//! The core never reads the system clock. The embedder advances a shared
//! [`Clock`] from its event loop and passes the same handle everywhere, so
//! tests can step time explicitly when exercising the resize-sync timeouts.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Shared monotonic time handle.
///
/// Cloned handles observe the same time.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    now: Rc<Cell<Duration>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current time.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Sets the current time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Advances the current time.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl PartialEq for Clock {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.now, &other.now)
    }
}

impl Eq for Clock {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = Clock::new();
        let handle = clock.clone();
        clock.advance(Duration::from_millis(16));
        assert_eq!(handle.now(), Duration::from_millis(16));
        assert_eq!(clock, handle);
    }
}
