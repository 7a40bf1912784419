use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::FetchError;
use crate::input::Action;
use crate::quote::Quote;
use crate::quote_source::{spawn_fetch, QuoteSource};
use crate::runtime::SessionEvent;
use crate::session::{Key, Keystroke, TypingSession};
use crate::ticker::SessionTicker;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    FetchFailed(String),
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the session and everything tied to its lifetime: the ticker and the
/// pending quote request.
pub struct App<C: Clock = SystemClock> {
    session: TypingSession<C>,
    ticker: SessionTicker,
    phase: Phase,
    source: Arc<dyn QuoteSource>,
    sink: Sender<SessionEvent>,
    fetch_request: u64,
}

impl App<SystemClock> {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        sink: Sender<SessionEvent>,
        tick_interval: Duration,
    ) -> Self {
        Self::with_session(
            TypingSession::new(),
            SessionTicker::new(tick_interval),
            source,
            sink,
        )
    }
}

impl<C: Clock> App<C> {
    pub fn with_session(
        session: TypingSession<C>,
        ticker: SessionTicker,
        source: Arc<dyn QuoteSource>,
        sink: Sender<SessionEvent>,
    ) -> Self {
        Self {
            session,
            ticker,
            phase: Phase::Loading,
            source,
            sink,
            fetch_request: 0,
        }
    }

    pub fn session(&self) -> &TypingSession<C> {
        &self.session
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Throw away the current session and ask the source for a new quote.
    pub fn request_quote(&mut self) {
        self.ticker.stop();
        self.session.reset();
        self.phase = Phase::Loading;
        self.fetch_request += 1;
        info!(request = self.fetch_request, "fetching quote");
        spawn_fetch(Arc::clone(&self.source), self.fetch_request, self.sink.clone());
    }

    /// Type the current quote again from the start.
    pub fn restart(&mut self) {
        if let Some(quote) = self.session.quote().cloned() {
            self.begin(quote);
        }
    }

    fn begin(&mut self, quote: Quote) {
        self.ticker.stop();
        self.session.reset();
        self.session.load(quote);
        self.ticker.start(self.sink.clone());
        self.phase = Phase::Typing;
    }

    fn finish(&mut self) {
        self.ticker.stop();
        self.phase = Phase::Results;
    }

    pub fn on_event(&mut self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Key(key) => match Action::from_key(key) {
                Some(action) => self.on_action(action),
                None => Flow::Continue,
            },
            SessionEvent::Tick(generation) => {
                self.ticker.on_tick(generation, &mut self.session);
                Flow::Continue
            }
            SessionEvent::Resize => Flow::Continue,
            SessionEvent::QuoteFetched { request, result } => {
                self.on_quote(request, result);
                Flow::Continue
            }
        }
    }

    fn on_quote(&mut self, request: u64, result: Result<String, FetchError>) {
        if request != self.fetch_request || self.phase != Phase::Loading {
            warn!(request, current = self.fetch_request, "dropping superseded quote");
            return;
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                self.phase = Phase::FetchFailed(format!("An error fetching quote. {err}"));
                return;
            }
        };

        match Quote::new(&raw) {
            Ok(quote) => self.begin(quote),
            Err(err) => {
                warn!(%err, "rejected fetched quote");
                self.phase = Phase::FetchFailed(format!("An error fetching quote. {err}"));
            }
        }
    }

    pub fn on_action(&mut self, action: Action) -> Flow {
        if action == Action::Quit {
            return Flow::Quit;
        }

        match self.phase {
            Phase::Loading => {}
            Phase::FetchFailed(_) => {
                if matches!(action, Action::NewQuote | Action::Type(Key::Char('n'))) {
                    self.request_quote();
                }
            }
            Phase::Typing => match action {
                Action::Type(key) => {
                    if self.session.handle_key(key) == Keystroke::Completed {
                        self.finish();
                    }
                }
                Action::Restart => self.restart(),
                Action::NewQuote => self.request_quote(),
                Action::Quit => {}
            },
            Phase::Results => match action {
                Action::Restart | Action::Type(Key::Char('r')) => self.restart(),
                Action::NewQuote | Action::Type(Key::Char('n')) => self.request_quote(),
                _ => {}
            },
        }

        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::quote_source::StaticQuote;
    use crate::session::SessionState;
    use std::sync::mpsc::{self, Receiver};

    struct Failing;

    impl QuoteSource for Failing {
        fn fetch(&self) -> Result<String, FetchError> {
            Err(FetchError::EmptyResponse)
        }
    }

    fn app_with(source: Arc<dyn QuoteSource>) -> (App<ManualClock>, Receiver<SessionEvent>, ManualClock) {
        let (tx, rx) = mpsc::channel();
        let clock = ManualClock::new();
        let app = App::with_session(
            TypingSession::with_clock(clock.clone()),
            SessionTicker::new(Duration::from_millis(50)),
            source,
            tx,
        );
        (app, rx, clock)
    }

    /// Request a quote and deliver the fetch result.
    fn load(app: &mut App<ManualClock>, rx: &Receiver<SessionEvent>) {
        app.request_quote();
        loop {
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(ev @ SessionEvent::QuoteFetched { .. }) => {
                    app.on_event(ev);
                    return;
                }
                Ok(_) => continue,
                Err(err) => panic!("no quote delivered: {err}"),
            }
        }
    }

    fn type_str(app: &mut App<ManualClock>, text: &str) {
        for c in text.chars() {
            app.on_action(Action::Type(Key::Char(c)));
        }
    }

    #[test]
    fn test_starts_loading() {
        let (app, _rx, _) = app_with(Arc::new(StaticQuote("ab".into())));

        assert_eq!(app.phase(), &Phase::Loading);
        assert_eq!(app.session().state(), SessionState::Unloaded);
        assert!(!app.is_ticking());
    }

    #[test]
    fn test_fetched_quote_is_normalized_and_loaded() {
        let (mut app, rx, _) = app_with(Arc::new(StaticQuote("ab.  cd".into())));
        load(&mut app, &rx);

        assert_eq!(app.phase(), &Phase::Typing);
        assert_eq!(app.session().quote().unwrap().as_str(), "ab. cd");
        assert!(app.is_ticking());
    }

    #[test]
    fn test_fetch_failure_never_creates_session() {
        let (mut app, rx, _) = app_with(Arc::new(Failing));
        load(&mut app, &rx);

        assert!(matches!(app.phase(), Phase::FetchFailed(msg) if msg.starts_with("An error fetching quote.")));
        assert_eq!(app.session().state(), SessionState::Unloaded);
        assert!(!app.is_ticking());

        type_str(&mut app, "ab");
        assert_eq!(app.session().start_time(), None);
    }

    #[test]
    fn test_superseded_fetch_is_dropped() {
        let (mut app, _rx, _) = app_with(Arc::new(StaticQuote("ab".into())));
        app.request_quote();
        app.request_quote();

        app.on_event(SessionEvent::QuoteFetched {
            request: 1,
            result: Ok("old quote".into()),
        });
        assert_eq!(app.phase(), &Phase::Loading);

        app.on_event(SessionEvent::QuoteFetched {
            request: 2,
            result: Ok("new quote".into()),
        });
        assert_eq!(app.session().quote().unwrap().as_str(), "new quote");
    }

    #[test]
    fn test_finishing_stops_ticker() {
        let (mut app, rx, _) = app_with(Arc::new(StaticQuote("ab".into())));
        load(&mut app, &rx);

        type_str(&mut app, "ab");

        assert_eq!(app.phase(), &Phase::Results);
        assert!(!app.is_ticking());
        assert!(app.session().is_finished());
    }

    #[test]
    fn test_ticks_refresh_metrics_while_paused() {
        let (mut app, rx, clock) = app_with(Arc::new(StaticQuote("ab cd".into())));
        load(&mut app, &rx);
        type_str(&mut app, "ab ");
        clock.advance_secs(60);

        let tick = loop {
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(SessionEvent::Tick(g)) => break g,
                Ok(_) => continue,
                Err(err) => panic!("no tick: {err}"),
            }
        };
        app.on_event(SessionEvent::Tick(tick));

        assert_eq!(app.session().cpm(), 3);
        assert_eq!(app.session().wpm(), 1);
    }

    #[test]
    fn test_tick_from_before_restart_is_ignored() {
        let (mut app, rx, clock) = app_with(Arc::new(StaticQuote("ab cd".into())));
        load(&mut app, &rx);
        // the first ticker generation belongs to the first load
        let stale = 1;
        app.restart();
        type_str(&mut app, "ab ");
        clock.advance_secs(60);

        app.on_event(SessionEvent::Tick(stale));

        assert_eq!(app.session().cpm(), 0);
    }

    #[test]
    fn test_restart_keeps_quote_and_clears_counters() {
        let (mut app, rx, _) = app_with(Arc::new(StaticQuote("ab cd".into())));
        load(&mut app, &rx);
        type_str(&mut app, "ab x");

        app.on_action(Action::Restart);

        assert_eq!(app.phase(), &Phase::Typing);
        assert_eq!(app.session().quote().unwrap().as_str(), "ab cd");
        assert_eq!(app.session().error_count(), 0);
        assert_eq!(app.session().word_count(), 0);
        assert_eq!(app.session().start_time(), None);
        assert_eq!(app.session().consumed_text(), "");
        assert!(app.is_ticking());
    }

    #[test]
    fn test_results_shortcuts() {
        let (mut app, rx, _) = app_with(Arc::new(StaticQuote("ok".into())));
        load(&mut app, &rx);
        type_str(&mut app, "ok");
        assert_eq!(app.phase(), &Phase::Results);

        app.on_action(Action::Type(Key::Char('r')));
        assert_eq!(app.phase(), &Phase::Typing);

        type_str(&mut app, "ok");
        app.on_action(Action::Type(Key::Char('n')));
        assert_eq!(app.phase(), &Phase::Loading);
        assert_eq!(app.session().state(), SessionState::Unloaded);
        assert!(!app.is_ticking());
    }

    #[test]
    fn test_new_quote_while_typing_resets() {
        let (mut app, rx, _) = app_with(Arc::new(StaticQuote("ab cd".into())));
        load(&mut app, &rx);
        type_str(&mut app, "a");

        app.on_action(Action::NewQuote);

        assert_eq!(app.phase(), &Phase::Loading);
        assert!(!app.is_ticking());
        assert_eq!(app.session().state(), SessionState::Unloaded);
    }

    #[test]
    fn test_quit_from_any_phase() {
        let (mut app, _rx, _) = app_with(Arc::new(StaticQuote("ab".into())));
        assert_eq!(app.on_action(Action::Quit), Flow::Quit);
    }
}
