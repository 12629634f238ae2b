use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::app::Toast;
use crate::ui::{Theme, truncate_to_width};

/// One-line notification drawn in place of the status bar
pub struct ToastLine<'a> {
    toast: &'a Toast,
}

impl<'a> ToastLine<'a> {
    pub fn new(toast: &'a Toast) -> Self {
        Self { toast }
    }
}

impl Widget for ToastLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let n = &self.toast.notification;
        let style = Theme::toast(n.severity);
        buf.set_style(area, style);

        let text = format!(" {}: {}", n.title, n.message);
        let text = truncate_to_width(&text, area.width.saturating_sub(6) as usize);
        let line = Line::from(vec![
            Span::styled(text, style),
            Span::styled("  [x]", style),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
