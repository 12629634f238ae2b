use ratatui::{
    Frame,
    layout::Alignment,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use logdeck_types::LogRecord;

use super::{local_time, render_footer};
use crate::app::AppState;
use crate::ui::{Layout, Theme};

/// All fields of one record
pub struct RecordDetailScreen;

impl RecordDetailScreen {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let (header_area, content_area, status_area) = Layout::main(frame.area());

        let name = state
            .ui_state
            .detail
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or("?");
        let header = Paragraph::new(Line::from(vec![
            Span::styled("logdeck", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(name.to_string(), Theme::text_highlight()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, header_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(" Record ", Theme::title()));

        let body = match &state.ui_state.detail {
            Some(record) => Paragraph::new(Self::lines(record))
                .wrap(Wrap { trim: false })
                .block(block),
            None => Paragraph::new(Span::styled("No record selected", Theme::text_dim()))
                .alignment(Alignment::Center)
                .block(block),
        };
        frame.render_widget(body, content_area);

        render_footer(frame, status_area, state, vec![("Esc", "Back")], String::new());
    }

    fn lines(record: &LogRecord) -> Vec<Line<'static>> {
        vec![
            Self::field("Name", record.name.clone()),
            Self::field("Id", record.id.clone()),
            Line::from(vec![
                Span::styled(format!("{:>16}  ", "Level"), Theme::text_dim()),
                Span::styled(format!(" {} ", record.level), Theme::level_badge(record.level)),
            ]),
            Self::field("Created", local_time(record.created)),
            Self::field("Created (UTC)", record.created.to_rfc3339()),
            Self::field("Location", record.location.clone()),
            Self::field(
                "Affected record",
                record.affected_id.clone().unwrap_or_else(|| "-".to_string()),
            ),
            Self::field("Link", record.record_link()),
            Line::from(""),
            Line::from(Span::styled("Message", Theme::text_dim())),
            Line::from(Span::styled(record.short_message.clone(), Theme::text())),
        ]
    }

    fn field(label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:>16}  ", label), Theme::text_dim()),
            Span::styled(value, Theme::text()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use logdeck_types::LogLevel;

    #[test]
    fn test_lines_include_every_field() {
        let record = LogRecord {
            id: "a0L000000000042".into(),
            name: "LOG-000042".into(),
            level: LogLevel::Error,
            created: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            short_message: "Null reference".into(),
            location: "OpportunityTrigger".into(),
            affected_id: None,
        };
        let text: Vec<String> = RecordDetailScreen::lines(&record)
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();

        assert!(text.iter().any(|l| l.ends_with("LOG-000042")));
        assert!(text.iter().any(|l| l.ends_with("/a0L000000000042")));
        assert!(text.iter().any(|l| l.ends_with("2024-05-01T08:30:00+00:00")));
        assert!(text.iter().any(|l| l.trim_end().ends_with("ERROR")));
        assert_eq!(text.last().map(String::as_str), Some("Null reference"));
    }
}
