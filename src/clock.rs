use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Milliseconds since the owning clock's origin
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn millis_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Time source for a typing session
pub trait Clock {
    /// Current time; never goes backwards.
    fn now(&self) -> Timestamp;

    fn elapsed_minutes(&self, start: Timestamp) -> f64 {
        self.now().millis_since(start) as f64 / MS_PER_MINUTE
    }
}

/// Monotonic wall clock anchored at construction
#[derive(Clone, Copy, Debug)]
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
        Timestamp(self.origin.elapsed().as_millis() as u64)
    }
}

/// Hand-driven clock for tests. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.millis.set(self.millis.get() + ms);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance_ms(1500);

        assert_eq!(clock.now(), Timestamp(1500));
    }

    #[test]
    fn elapsed_minutes_from_start() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance_secs(90);

        assert_eq!(clock.elapsed_minutes(start), 1.5);
    }

    #[test]
    fn elapsed_minutes_saturates_for_future_start() {
        let clock = ManualClock::new();

        assert_eq!(clock.elapsed_minutes(Timestamp(10_000)), 0.0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();

        assert!(second >= first);
    }
}
