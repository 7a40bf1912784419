use std::fmt;

use itertools::Itertools;

use crate::error::SessionError;

/// Collapse every run of two or more whitespace characters into one space.
///
/// The quote service puts two spaces after sentence-ending punctuation, which
/// would otherwise demand two space presses per word boundary. A lone tab or
/// newline also becomes a space, since neither can be typed as a character.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for (is_whitespace, run) in &raw.chars().chunk_by(|c| c.is_whitespace()) {
        if is_whitespace {
            out.push(' ');
        } else {
            out.extend(run);
        }
    }

    out
}

/// The normalized text a session is typed against. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote(String);

impl Quote {
    pub fn new(raw: &str) -> Result<Self, SessionError> {
        let text = normalize(raw);
        if text.trim().is_empty() {
            return Err(SessionError::InvalidLoad);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_collapses_whitespace_runs() {
        assert_eq!(normalize("a  b   c"), "a b c");
        assert_eq!(normalize("end.  Next"), "end. Next");
        assert_eq!(normalize("tab\t\tthen\n \nnewline"), "tab then newline");
    }

    #[test]
    fn test_single_whitespace_becomes_space() {
        assert_eq!(normalize("a b"), "a b");
        assert_eq!(normalize("a\tb"), "a b");
        assert_eq!(normalize("line\nbreak"), "line break");
        assert_eq!(normalize(" lead trail "), " lead trail ");
    }

    #[test]
    fn test_is_idempotent() {
        for raw in ["a  b   c", "  x\t\ty ", "plain", "", "   ", "a \n b"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn test_quote_new_normalizes() {
        let quote = Quote::new("Bacon  ipsum.  Dolor").unwrap();
        assert_eq!(quote.as_str(), "Bacon ipsum. Dolor");
        assert_eq!(quote.len(), 18);
    }

    #[test]
    fn test_quote_len_counts_chars() {
        let quote = Quote::new("jalapeño").unwrap();
        assert_eq!(quote.len(), 8);
    }

    #[test]
    fn test_quote_rejects_empty_text() {
        assert_matches!(Quote::new(""), Err(SessionError::InvalidLoad));
        assert_matches!(Quote::new("  \n\t "), Err(SessionError::InvalidLoad));
    }
}
