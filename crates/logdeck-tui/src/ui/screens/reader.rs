use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use logdeck_logs::{SearchFilter, TailButton, TailController};
use logdeck_types::{LogLevel, LogRecord, TailState};

use super::{local_time, render_footer};
use crate::app::{AppState, Navigate};
use crate::ui::{Layout, Theme, truncate_to_width};

/// Log reader: filters, tail toggle and the record list
pub struct ReaderScreen;

impl ReaderScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, tail: &TailController) {
        let (header_area, content_area, status_area) = Layout::main(frame.area());

        let show_search = state.ui_state.search_active
            || tail.search().is_some()
            || state.ui_state.search_error.is_some();
        let (search_area, list_area) = Layout::reader(content_area, show_search);

        Self::render_header(frame, header_area, tail);
        if let Some(area) = search_area {
            Self::render_search_bar(frame, area, state, tail);
        }
        Self::render_records(frame, list_area, state, tail);

        let hints = vec![
            ("t", tail.button().label),
            ("1-4", "Levels"),
            ("/", "Search"),
            ("Enter", "Open"),
            ("d", "Delete"),
            ("?", "Help"),
        ];
        render_footer(
            frame,
            status_area,
            state,
            hints,
            format!("{} per page", tail.page_size().value()),
        );
    }

    /// Open the selected visible record on the detail screen
    pub fn open_selected(
        nav: &mut impl Navigate,
        records: &[&LogRecord],
        selected: Option<usize>,
    ) -> bool {
        match selected.and_then(|i| records.get(i)) {
            Some(record) => {
                nav.open_record((*record).clone());
                true
            }
            None => false,
        }
    }

    /// Id of the selected visible record
    pub fn selected_id(state: &AppState, tail: &TailController) -> Option<String> {
        let visible = tail.visible_logs();
        state
            .selected_index()
            .and_then(|i| visible.get(i))
            .map(|r| r.id.clone())
    }

    fn render_header(frame: &mut Frame, area: Rect, tail: &TailController) {
        let mut spans = vec![
            Span::styled("logdeck", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
        ];

        spans.push(Self::tail_button(tail.button()));
        match (tail.state(), tail.tail_since()) {
            (TailState::Tailing, Some(since)) => spans.push(Span::styled(
                format!(" since {}", local_time(since)),
                Theme::text_dim(),
            )),
            (TailState::Subscribing | TailState::Unsubscribing, _) => spans.push(Span::styled(
                format!(" {}…", tail.state().label()),
                Theme::text_dim(),
            )),
            _ => {}
        }

        spans.push(Span::styled(" │ ", Theme::text_dim()));
        for (i, level) in LogLevel::ALL.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(
                format!(" {} {} ", i + 1, level),
                Theme::level_toggle(level, tail.levels().is_selected(level)),
            ));
        }

        if let Some(err) = tail.last_error() {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(format!("⚠ {}", err), Theme::error()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    /// The tail toggle, drawn filled while tailing and outlined when idle
    fn tail_button(button: TailButton) -> Span<'static> {
        let icon = if button == TailButton::STOP { "■" } else { "▶" };
        let style = if button.variant == TailButton::STOP.variant {
            Style::default()
                .fg(Color::Black)
                .bg(Theme::PRIMARY)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Theme::PRIMARY)
        };
        Span::styled(format!("[{} {}]", icon, button.label), style)
    }

    fn render_search_bar(frame: &mut Frame, area: Rect, state: &AppState, tail: &TailController) {
        let active = state.ui_state.search_active;
        let mut spans = vec![];

        if active {
            spans.push(Span::styled(" /", Theme::text_highlight()));
        } else {
            spans.push(Span::styled(" Search: ", Theme::text_dim()));
        }

        let pattern = if active {
            state.ui_state.search_input.as_str()
        } else {
            tail.search().map(|s| s.pattern()).unwrap_or_default()
        };
        spans.push(Span::styled(pattern.to_string(), Theme::text_highlight()));

        if active {
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        }

        if let Some(err) = &state.ui_state.search_error {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("⚠ {}", err), Style::default().fg(Color::Red)));
        }

        spans.push(Span::raw("  "));
        // Editing shows the pending mode, otherwise the applied filter's
        let case_insensitive = match tail.search() {
            Some(search) if !active => search.is_case_insensitive(),
            _ => state.ui_state.search_case_insensitive,
        };
        let case_text = if case_insensitive {
            "[i] case-insensitive"
        } else {
            "[I] case-sensitive"
        };
        spans.push(Span::styled(case_text, Theme::text_dim()));

        if active {
            spans.push(Span::styled("  [Enter] Apply  [Esc] Cancel", Theme::text_dim()));
        } else {
            spans.push(Span::styled("  [n] Clear  [/] Edit", Theme::text_dim()));
        }

        let border = if active {
            Style::default().fg(Color::Yellow)
        } else if state.ui_state.search_error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Theme::border()
        };

        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(" Search ", Theme::title())),
        );

        frame.render_widget(bar, area);
    }

    fn render_records(frame: &mut Frame, area: Rect, state: &mut AppState, tail: &TailController) {
        let visible = tail.visible_logs();
        state.clamp_selection(visible.len());

        let title = if tail.search().is_some() {
            format!(" Logs ({} of {} matching) ", visible.len(), tail.logs().len())
        } else {
            format!(" Logs ({}) ", visible.len())
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(title, Theme::title()));

        if visible.is_empty() {
            let message = if tail.has_logs() {
                "No log entries match the search"
            } else {
                "No log entries"
            };
            let empty = Paragraph::new(Line::from(Span::styled(message, Theme::text_dim())))
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        // Borders plus the highlight symbol
        let inner_width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = visible
            .iter()
            .map(|record| {
                let line = Self::format_record(record, inner_width, tail.search());
                if tail.is_new(&record.id) {
                    ListItem::new(line).style(Theme::fresh_record())
                } else {
                    ListItem::new(line)
                }
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut state.ui_state.list_state);
    }

    fn format_record(
        record: &LogRecord,
        width: usize,
        search: Option<&SearchFilter>,
    ) -> Line<'static> {
        let timestamp = local_time(record.created);
        let affected = record
            .affected_id
            .as_deref()
            .map(|id| format!("  → {}", id))
            .unwrap_or_default();

        // Badge, spaces and timestamp take a fixed width
        let fixed = 5 + 1 + timestamp.len() + 2;
        let location = format!("  {}", record.location);
        let message_width = width.saturating_sub(fixed + location.len() + affected.len());

        let message = truncate_to_width(&record.short_message, message_width.max(8));

        let mut spans = vec![
            Span::styled(format!(" {} ", record.level.short()), Theme::level_badge(record.level)),
            Span::raw(" "),
            Span::styled(timestamp, Theme::text_dim()),
            Span::raw("  "),
        ];
        spans.extend(Self::highlight_matches(message, search, Theme::text()));
        spans.push(Span::styled(location, Theme::text_dim()));
        spans.push(Span::styled(affected, Theme::level_text(record.level)));

        Line::from(spans)
    }

    /// Split `text` into spans with search matches highlighted
    fn highlight_matches(
        text: String,
        search: Option<&SearchFilter>,
        base: Style,
    ) -> Vec<Span<'static>> {
        let matches = search.map(|s| s.find_matches(&text)).unwrap_or_default();
        if matches.is_empty() {
            return vec![Span::styled(text, base)];
        }

        let mut spans = Vec::new();
        let mut last_end = 0;
        for (start, end) in matches {
            if start > last_end {
                spans.push(Span::styled(text[last_end..start].to_string(), base));
            }
            spans.push(Span::styled(text[start..end].to_string(), Theme::search_match()));
            last_end = end;
        }
        if last_end < text.len() {
            spans.push(Span::styled(text[last_end..].to_string(), base));
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Screen;
    use chrono::Utc;

    struct Recorder {
        opened: Vec<String>,
    }

    impl Navigate for Recorder {
        fn navigate_to(&mut self, _: Screen) {}

        fn go_back(&mut self) -> bool {
            false
        }

        fn open_record(&mut self, record: LogRecord) {
            self.opened.push(record.id);
        }
    }

    fn record(id: &str) -> LogRecord {
        LogRecord {
            id: id.into(),
            name: format!("LOG-{}", id),
            level: LogLevel::Info,
            created: Utc::now(),
            short_message: "a rather long message that will not fit".into(),
            location: "Job".into(),
            affected_id: Some("001x".into()),
        }
    }

    #[test]
    fn test_open_selected_uses_navigation() {
        let a = record("a");
        let b = record("b");
        let records = vec![&a, &b];
        let mut nav = Recorder { opened: Vec::new() };

        assert!(ReaderScreen::open_selected(&mut nav, &records, Some(1)));
        assert!(!ReaderScreen::open_selected(&mut nav, &records, Some(5)));
        assert!(!ReaderScreen::open_selected(&mut nav, &records, None));
        assert_eq!(nav.opened, vec!["b".to_string()]);
    }

    #[test]
    fn test_format_record_truncates_message() {
        let line = ReaderScreen::format_record(&record("a"), 50, None);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.starts_with(" INF "));
        assert!(text.contains('…'));
        assert!(text.ends_with("→ 001x"));
    }

    #[test]
    fn test_search_matches_are_highlighted() {
        let search = SearchFilter::new("LONG", true).unwrap();
        let line = ReaderScreen::format_record(&record("a"), 120, Some(&search));

        let highlighted: Vec<&str> = line
            .spans
            .iter()
            .filter(|s| s.style == Theme::search_match())
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(highlighted, vec!["long"]);

        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("a rather long message that will not fit"));
    }

    #[test]
    fn test_no_search_keeps_message_whole() {
        let spans = ReaderScreen::highlight_matches("plain".to_string(), None, Theme::text());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "plain");
    }
}
