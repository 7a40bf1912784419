use std::fmt;

/// Durations shorter than one millisecond yield no rate at all
const MIN_ELAPSED_MINUTES: f64 = 1.0 / 60_000.0;

/// Fastest recorded typing speed, in characters per minute
pub const WORLD_RECORD_CPM: u32 = 1080;

pub const DEFAULT_ACCURACY: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    pub cpm: u32,
    pub wpm: u32,
    pub accuracy: f64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            cpm: 0,
            wpm: 0,
            accuracy: DEFAULT_ACCURACY,
        }
    }
}

fn per_minute(count: usize, elapsed_minutes: f64) -> u32 {
    if !elapsed_minutes.is_finite() || elapsed_minutes < MIN_ELAPSED_MINUTES {
        return 0;
    }

    (count as f64 / elapsed_minutes).round() as u32
}

/// Completed words per minute
pub fn wpm(word_count: usize, elapsed_minutes: f64) -> u32 {
    per_minute(word_count, elapsed_minutes)
}

/// Correctly typed characters per minute
pub fn cpm(char_count: usize, elapsed_minutes: f64) -> u32 {
    per_minute(char_count, elapsed_minutes)
}

/// Accuracy in percent with one decimal, measured against the whole quote
/// rather than the characters typed so far. Never below 0.
pub fn accuracy(error_count: usize, quote_len: usize) -> f64 {
    if quote_len == 0 {
        return DEFAULT_ACCURACY;
    }

    let penalty = (1000.0 * error_count as f64 / quote_len as f64).round();

    ((1000.0 - penalty) / 10.0).max(0.0)
}

/// How a speed compares to the typing world record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldRecord {
    Slower { percent: u32 },
    Faster { percent: u32 },
}

impl WorldRecord {
    pub fn compare(cpm: u32) -> Self {
        let percent =
            (100.0 - (cpm as f64 / WORLD_RECORD_CPM as f64) * 100.0).round().abs() as u32;

        if cpm < WORLD_RECORD_CPM {
            WorldRecord::Slower { percent }
        } else {
            WorldRecord::Faster { percent }
        }
    }
}

impl fmt::Display for WorldRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (percent, direction) = match self {
            WorldRecord::Slower { percent } => (percent, "slower"),
            WorldRecord::Faster { percent } => (percent, "faster"),
        };

        write!(
            f,
            "Typing world record is {WORLD_RECORD_CPM} CPM. Your typing speed is {percent}% {direction} than this."
        )
    }
}
