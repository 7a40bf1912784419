use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, Phase},
    clock::Clock,
    session::TypingSession,
    stats::WorldRecord,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

/// "Speed: 0 CPM 0 WPM    Accuracy: 100%"
fn info_header<C: Clock>(session: &TypingSession<C>) -> Line<'static> {
    let metrics = session.metrics();
    Line::from(vec![
        Span::styled("Speed: ", dim_bold()),
        Span::styled(format!("{} CPM ", metrics.cpm), bold()),
        Span::styled(format!("{} WPM", metrics.wpm), bold()),
        Span::raw("    "),
        Span::styled("Accuracy: ", dim_bold()),
        Span::styled(format!("{}%", metrics.accuracy), bold()),
    ])
}

fn legend(text: &'static str) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

fn centered_message(message: Line<'static>, hint: &'static str, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(message)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
    legend(hint).render(chunks[3], buf);
}

fn render_quote<C: Clock>(session: &TypingSession<C>, area: Rect, buf: &mut Buffer) {
    let green_bold = bold().fg(Color::Green);
    let red_bold = bold().fg(Color::Red);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let text_width = session.quote().map(|q| q.as_str().width()).unwrap_or(0);
    let prompt_lines = if text_width <= max_chars_per_line as usize {
        1
    } else {
        ((text_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(prompt_lines),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(info_header(session))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let mut spans = vec![Span::styled(session.consumed_text().to_owned(), green_bold)];
    if let Some(expected) = session.expected_char() {
        let style = if session.last_key_was_correct() {
            green_bold
        } else {
            red_bold
        };
        let shown = match expected {
            ' ' if !session.last_key_was_correct() => "·".to_owned(),
            c => c.to_string(),
        };
        spans.push(Span::styled(shown, style.add_modifier(Modifier::UNDERLINED)));
    }
    spans.push(Span::styled(session.remaining_text(), dim_bold()));

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    legend("(←) restart / (→) new quote / (esc) quit").render(chunks[4], buf);
}

fn render_results<C: Clock>(session: &TypingSession<C>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(info_header(session))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} errors over {} characters",
            session.error_count(),
            session.consumed_text().chars().count()
        ),
        dim_bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        WorldRecord::compare(session.cpm()).to_string(),
        Style::default().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[3], buf);

    legend("(r)estart / (n)ew quote / (esc) quit").render(chunks[5], buf);
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.phase() {
            Phase::Loading => centered_message(
                Line::from(Span::styled("Loading quote...", dim_bold())),
                "(esc) quit",
                area,
                buf,
            ),
            Phase::FetchFailed(message) => centered_message(
                Line::from(Span::styled(message.clone(), bold().fg(Color::Red))),
                "(n) try again / (esc) quit",
                area,
                buf,
            ),
            Phase::Typing => render_quote(self.session(), area, buf),
            Phase::Results => render_results(self.session(), area, buf),
        }
    }
}
