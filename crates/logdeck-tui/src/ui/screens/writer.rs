use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout as RatatuiLayout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListState, Paragraph, Wrap},
};

use logdeck_logs::{LogWriter, WRITER_SOURCE};
use logdeck_types::LogLevel;

use super::render_footer;
use crate::app::AppState;
use crate::ui::components::{ListSelector, ListSelectorExt};
use crate::ui::{Layout, Theme};

/// Compose and create a single log entry
pub struct WriterScreen;

impl WriterScreen {
    pub fn render(frame: &mut Frame, state: &AppState, writer: &LogWriter) {
        let (header_area, content_area, status_area) = Layout::main(frame.area());

        let header = Paragraph::new(Line::from(vec![
            Span::styled("logdeck", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("New log entry", Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(format!("source: {}", WRITER_SOURCE), Theme::text_dim()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, header_area);

        let chunks = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(22), Constraint::Min(20)])
            .split(content_area);

        let selector = ListSelector::new(" Level ").items(
            LogLevel::ALL
                .into_iter()
                .map(|level| (level.as_str(), Theme::level_text(level), level == writer.level())),
        );
        let mut list_state = ListState::default().with_selected(Some(writer.level().index()));
        frame.render_list_selector(chunks[0], selector, &mut list_state);

        let mut lines = vec![Line::from(vec![
            Span::styled(writer.message().to_string(), Theme::text()),
            Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ])];
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(Self::hint(writer), Theme::text_dim())));

        let input = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(" Message ", Theme::title())),
        );
        frame.render_widget(input, chunks[1]);

        let hints = vec![("Tab", "Level"), ("Enter", "Create"), ("Esc", "Back")];
        render_footer(frame, status_area, state, hints, String::new());
    }

    fn hint(writer: &LogWriter) -> &'static str {
        if writer.is_submitting() {
            "Creating…"
        } else if !writer.can_submit() {
            "Type a message to enable [Enter]"
        } else if writer.level() == LogLevel::Error {
            "[Enter] publishes the entry as a log event"
        } else {
            "[Enter] creates the entry"
        }
    }
}
