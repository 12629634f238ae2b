use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Create the main layout with header, content, and status bar
    pub fn main(area: Rect) -> (Rect, Rect, Rect) {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        (chunks[0], chunks[1], chunks[2])
    }

    /// Popup of the given size centered in `area`, clipped to fit
    pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }

    /// Storage screen: summary table above the chart. The chart is dropped
    /// when hidden.
    pub fn storage(area: Rect, show_chart: bool) -> (Rect, Option<Rect>) {
        if show_chart {
            let chunks = RatatuiLayout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(7), // Summary table: 4 rows + header + borders
                    Constraint::Min(5),    // Chart
                ])
                .split(area);
            (chunks[0], Some(chunks[1]))
        } else {
            (area, None)
        }
    }

    /// Reader content with an optional search bar on top
    pub fn reader(area: Rect, show_search: bool) -> (Option<Rect>, Rect) {
        if show_search {
            let chunks = RatatuiLayout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1)])
                .split(area);
            (Some(chunks[0]), chunks[1])
        } else {
            (None, area)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 40, 10);
        let popup = Layout::centered(area, 60, 8);
        assert_eq!(popup.width, 36);
        assert_eq!(popup.height, 6);
        assert_eq!(popup.x, 2);
        assert_eq!(popup.y, 2);
    }

    #[test]
    fn test_storage_without_chart_uses_full_area() {
        let area = Rect::new(0, 0, 80, 30);
        assert_eq!(Layout::storage(area, false), (area, None));
        let (table, chart) = Layout::storage(area, true);
        assert_eq!(table.height, 7);
        assert_eq!(chart.map(|c| c.height), Some(23));
    }
}
