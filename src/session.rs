use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::error::SessionError;
use crate::quote::Quote;
use crate::stats::{self, Metrics};

/// A single key press as seen by the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Modifiers, navigation, function keys and anything else that is not one visible character
    Other,
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        if c.is_control() {
            Key::Other
        } else {
            Key::Char(c)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Ready,
    Active,
    Finished,
}

/// What a key press did to the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keystroke {
    /// No state was touched
    Ignored,
    Correct,
    /// A space was consumed, ending a word
    WordCompleted,
    /// First miss of a run; counted as an error
    Missed,
    /// Miss following another miss; not counted
    RepeatedMiss,
    /// The last character of the quote was consumed
    Completed,
}

/// One attempt at typing a quote
#[derive(Debug)]
pub struct TypingSession<C: Clock = SystemClock> {
    clock: C,
    quote: Option<Quote>,
    chars: Vec<char>,
    cursor: usize,
    consumed: String,
    last_key_was_correct: bool,
    error_count: usize,
    word_count: usize,
    start_time: Option<Timestamp>,
    metrics: Metrics,
}

impl TypingSession<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for TypingSession<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TypingSession<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            quote: None,
            chars: Vec::new(),
            cursor: 0,
            consumed: String::new(),
            last_key_was_correct: true,
            error_count: 0,
            word_count: 0,
            start_time: None,
            metrics: Metrics::default(),
        }
    }

    /// Start over on `quote`. Every counter and the timer anchor are cleared.
    pub fn load(&mut self, quote: Quote) {
        self.clear();
        self.chars = quote.as_str().chars().collect();
        info!(chars = self.chars.len(), "quote loaded");
        self.quote = Some(quote);
    }

    /// Normalize and load unprocessed quote text. Empty text is rejected and
    /// leaves the session as it was.
    pub fn load_raw(&mut self, raw: &str) -> Result<(), SessionError> {
        let quote = Quote::new(raw).inspect_err(|err| warn!(%err, "quote rejected"))?;
        self.load(quote);
        Ok(())
    }

    /// Drop the quote and go back to `Unloaded`.
    pub fn reset(&mut self) {
        self.clear();
        debug!("session reset");
    }

    fn clear(&mut self) {
        self.quote = None;
        self.chars.clear();
        self.cursor = 0;
        self.consumed.clear();
        self.last_key_was_correct = true;
        self.error_count = 0;
        self.word_count = 0;
        self.start_time = None;
        self.metrics = Metrics::default();
    }

    pub fn handle_key(&mut self, key: Key) -> Keystroke {
        let Key::Char(c) = key else {
            return Keystroke::Ignored;
        };

        let Some(expected) = self.expected_char() else {
            // nothing loaded, or already finished
            return Keystroke::Ignored;
        };

        // The timer starts on the first press, right or wrong.
        let start = *self.start_time.get_or_insert_with(|| self.clock.now());

        if c == expected {
            self.consumed.push(expected);
            self.cursor += 1;
            self.last_key_was_correct = true;

            let elapsed = self.clock.elapsed_minutes(start);
            self.metrics.cpm = stats::cpm(self.cursor, elapsed);

            let ended_word = expected == ' ';
            if ended_word {
                self.word_count += 1;
                self.metrics.wpm = stats::wpm(self.word_count, elapsed);
            }

            if self.is_finished() {
                info!(
                    cpm = self.metrics.cpm,
                    wpm = self.metrics.wpm,
                    accuracy = self.metrics.accuracy,
                    errors = self.error_count,
                    "session finished"
                );
                Keystroke::Completed
            } else if ended_word {
                Keystroke::WordCompleted
            } else {
                Keystroke::Correct
            }
        } else if !self.last_key_was_correct {
            Keystroke::RepeatedMiss
        } else {
            self.error_count += 1;
            self.last_key_was_correct = false;
            self.metrics.accuracy = stats::accuracy(self.error_count, self.chars.len());
            Keystroke::Missed
        }
    }

    /// Refresh the time based metrics. Returns false when there is nothing to
    /// measure yet, or the session is over.
    pub fn update_cpm_and_wpm(&mut self) -> bool {
        let Some(start) = self.start_time else {
            return false;
        };
        if self.is_finished() {
            return false;
        }

        let elapsed = self.clock.elapsed_minutes(start);
        self.metrics.cpm = stats::cpm(self.cursor, elapsed);
        self.metrics.wpm = stats::wpm(self.word_count, elapsed);
        true
    }

    pub fn state(&self) -> SessionState {
        match (&self.quote, self.start_time) {
            (None, _) => SessionState::Unloaded,
            _ if self.is_finished() => SessionState::Finished,
            (Some(_), None) => SessionState::Ready,
            (Some(_), Some(_)) => SessionState::Active,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.quote.is_some() && self.cursor == self.chars.len()
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    /// The character the user has to type next; `None` before a quote is
    /// loaded and after the last one was typed.
    pub fn expected_char(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    /// Text after the expected character
    pub fn remaining_text(&self) -> String {
        self.chars.iter().skip(self.cursor + 1).collect()
    }

    pub fn consumed_text(&self) -> &str {
        &self.consumed
    }

    pub fn last_key_was_correct(&self) -> bool {
        self.last_key_was_correct
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn cpm(&self) -> u32 {
        self.metrics.cpm
    }

    pub fn wpm(&self) -> u32 {
        self.metrics.wpm
    }

    pub fn accuracy(&self) -> f64 {
        self.metrics.accuracy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
