use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::Screen;
use crate::ui::Layout;

/// Help overlay showing the keybindings of the current screen
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame, screen: Screen) {
        let popup_area = Layout::centered(frame.area(), 52, 24);
        frame.render_widget(Clear, popup_area);

        let mut help_text = vec![
            Line::from(Span::styled(
                format!("Keybindings: {}", screen.title()),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        help_text.extend(Self::screen_lines(screen));
        help_text.extend([
            Line::from(""),
            Self::section("Global"),
            Self::key_line("F2/F3/F4", "Reader / Storage / Writer"),
            Self::key_line("x", "Dismiss notification"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("Esc", "Go back"),
            Self::key_line("q", "Quit"),
        ]);

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn screen_lines(screen: Screen) -> Vec<Line<'static>> {
        match screen {
            Screen::Reader => vec![
                Self::section("Records"),
                Self::key_line("j/↓ k/↑", "Move selection"),
                Self::key_line("Enter", "Open record"),
                Self::key_line("d", "Delete record"),
                Self::key_line("r", "Refresh"),
                Self::key_line("t", "Start/stop tailing"),
                Self::key_line("1-4", "Toggle INFO/DEBUG/WARN/ERROR"),
                Self::key_line("p", "Cycle page size"),
                Self::section("Search"),
                Self::key_line("/", "Search records"),
                Self::key_line("n", "Clear search"),
                Self::key_line("i", "Toggle case sensitivity"),
            ],
            Screen::Storage => vec![
                Self::section("Storage"),
                Self::key_line("j/↓ k/↑", "Select level"),
                Self::key_line("h/← l/→", "Previous/next date range"),
                Self::key_line("r", "Refresh"),
                Self::key_line("c", "Cycle chart type"),
                Self::key_line("d", "Delete level in range"),
            ],
            Screen::Writer => vec![
                Self::section("Writer"),
                Self::key_line("Tab", "Cycle level"),
                Self::key_line("Enter", "Create entry"),
                Self::key_line("Ctrl+u", "Clear message"),
            ],
            Screen::RecordDetail => vec![
                Self::section("Record"),
                Self::key_line("Enter", "Back to list"),
            ],
        }
    }

    fn section(title: &'static str) -> Line<'static> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {:>9}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
