use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::Clock;
use crate::runtime::SessionEvent;
use crate::session::TypingSession;

/// Reference refresh cadence for live metrics
pub const DEFAULT_TICK_MS: u64 = 200;

struct TickTask {
    generation: u64,
    // Dropping this disconnects the timer thread.
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

/// Periodically refreshes CPM and WPM so they keep moving while the user pauses.
///
/// Each `start` opens a new generation; ticks carry it, and `on_tick` ignores
/// any tick that does not belong to the live one.
pub struct SessionTicker {
    interval: Duration,
    generation: u64,
    task: Option<TickTask>,
}

impl SessionTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            task: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Start ticking into `sink`, stopping any previous timer first.
    pub fn start(&mut self, sink: Sender<SessionEvent>) -> u64 {
        self.stop();

        self.generation += 1;
        let generation = self.generation;
        let interval = self.interval;
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if sink.send(SessionEvent::Tick(generation)).is_err() {
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        debug!(generation, interval_ms = interval.as_millis() as u64, "ticker started");
        self.task = Some(TickTask {
            generation,
            stop_tx,
            thread,
        });
        generation
    }

    /// Cancel the timer. Returns false if none was running.
    pub fn stop(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };

        drop(task.stop_tx);
        let _ = task.thread.join();
        debug!(generation = task.generation, "ticker stopped");
        true
    }

    /// Whether a tick of `generation` should still be applied
    pub fn accepts(&self, generation: u64) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| task.generation == generation)
    }

    /// Apply a tick: refresh the session's time based metrics if the tick is current.
    pub fn on_tick<C: Clock>(&self, generation: u64, session: &mut TypingSession<C>) -> bool {
        if !self.accepts(generation) {
            trace!(generation, "stale tick dropped");
            return false;
        }
        session.update_cpm_and_wpm()
    }
}

impl Default for SessionTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TICK_MS))
    }
}

impl Drop for SessionTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::quote::Quote;
    use crate::session::Key;

    fn active_session(clock: &ManualClock) -> TypingSession<ManualClock> {
        let mut session = TypingSession::with_clock(clock.clone());
        session.load(Quote::new("ab cd").unwrap());
        for c in "ab ".chars() {
            session.handle_key(Key::Char(c));
        }
        session
    }

    #[test]
    fn test_ticks_arrive_with_generation() {
        let (tx, rx) = mpsc::channel();
        let mut ticker = SessionTicker::new(Duration::from_millis(5));

        let generation = ticker.start(tx);

        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(SessionEvent::Tick(g)) => assert_eq!(g, generation),
            other => panic!("expected a tick, got {other:?}"),
        }
        assert!(ticker.stop());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (tx, _rx) = mpsc::channel();
        let mut ticker = SessionTicker::new(Duration::from_millis(5));

        assert!(!ticker.stop());
        ticker.start(tx);
        assert!(ticker.is_running());
        assert!(ticker.stop());
        assert!(!ticker.stop());
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_no_ticks_after_stop() {
        let (tx, rx) = mpsc::channel();
        let mut ticker = SessionTicker::new(Duration::from_millis(1));
        ticker.start(tx);
        ticker.stop();

        // drain whatever was queued before the stop
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(20));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_restart_bumps_generation() {
        let (tx, _rx) = mpsc::channel();
        let mut ticker = SessionTicker::new(Duration::from_millis(50));

        let first = ticker.start(tx.clone());
        let second = ticker.start(tx);

        assert!(second > first);
        assert!(!ticker.accepts(first));
        assert!(ticker.accepts(second));
    }

    #[test]
    fn test_on_tick_updates_metrics() {
        let (tx, _rx) = mpsc::channel();
        let clock = ManualClock::new();
        let mut session = active_session(&clock);
        let mut ticker = SessionTicker::new(Duration::from_millis(50));
        let generation = ticker.start(tx);

        clock.advance_secs(60);

        assert!(ticker.on_tick(generation, &mut session));
        assert_eq!(session.cpm(), 3);
        assert_eq!(session.wpm(), 1);
    }

    #[test]
    fn test_stale_tick_is_dropped() {
        let (tx, _rx) = mpsc::channel();
        let clock = ManualClock::new();
        let mut session = active_session(&clock);
        let mut ticker = SessionTicker::new(Duration::from_millis(50));
        let stale = ticker.start(tx.clone());
        ticker.start(tx);

        clock.advance_secs(60);

        assert!(!ticker.on_tick(stale, &mut session));
        assert_eq!(session.cpm(), 0);
    }

    #[test]
    fn test_tick_after_stop_is_dropped() {
        let (tx, _rx) = mpsc::channel();
        let clock = ManualClock::new();
        let mut session = active_session(&clock);
        let mut ticker = SessionTicker::new(Duration::from_millis(50));
        let generation = ticker.start(tx);
        ticker.stop();

        clock.advance_secs(60);

        assert!(!ticker.on_tick(generation, &mut session));
    }
}
