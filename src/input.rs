use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::Key;

/// What a terminal key press means to the app
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Type(Key),
    Restart,
    NewQuote,
    Quit,
}

impl Action {
    /// `None` for key releases, which some terminals report separately.
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        let action = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Esc => Action::Quit,
            KeyCode::Left => Action::Restart,
            KeyCode::Right => Action::NewQuote,
            KeyCode::Char(_) if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                Action::Type(Key::Other)
            }
            KeyCode::Char(c) => Action::Type(Key::from(c)),
            _ => Action::Type(Key::Other),
        };

        Some(action)
    }
}
