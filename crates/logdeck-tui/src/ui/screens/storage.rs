use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType,
        Paragraph, Row, Table,
    },
};

use logdeck_logs::{ChartMatrix, StorageSummary};
use logdeck_types::{ChartType, LogLevel};

use super::{local_time, render_footer};
use crate::app::AppState;
use crate::ui::{Layout, Theme};

/// Storage summary: counts per level for a date range, with a per-day chart
pub struct StorageScreen;

impl StorageScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, storage: &StorageSummary) {
        let (header_area, content_area, status_area) = Layout::main(frame.area());
        let (table_area, chart_area) =
            Layout::storage(content_area, storage.chart_type().is_visible());

        Self::render_header(frame, header_area, storage);
        Self::render_table(frame, table_area, state, storage);
        if let Some(area) = chart_area {
            Self::render_chart(frame, area, storage);
        }

        let hints = vec![
            ("←/→", "Range"),
            ("r", "Refresh"),
            ("c", "Chart"),
            ("d", "Delete"),
            ("?", "Help"),
        ];
        let right = if storage.is_auto_refreshing() {
            "auto-refresh on".to_string()
        } else {
            String::new()
        };
        render_footer(frame, status_area, state, hints, right);
    }

    /// Level of the selected summary row
    pub fn selected_level(state: &AppState) -> LogLevel {
        let i = state.ui_state.summary_state.selected().unwrap_or(0);
        LogLevel::ALL[i.min(LogLevel::ALL.len() - 1)]
    }

    fn render_header(frame: &mut Frame, area: Rect, storage: &StorageSummary) {
        let mut spans = vec![
            Span::styled("logdeck", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(storage.title().to_string(), Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(format!("chart: {}", storage.chart_type().as_str()), Theme::text()),
        ];

        if storage.is_loading() {
            spans.push(Span::styled(" │ loading…", Theme::text_dim()));
        }
        if let Some(err) = storage.last_error() {
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

    fn render_table(frame: &mut Frame, area: Rect, state: &mut AppState, storage: &StorageSummary) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(format!(" {} ", storage.title()), Theme::title()));

        if storage.no_data() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No logs in this period",
                Theme::text_dim(),
            )))
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let rows = storage.summaries().iter().map(|summary| {
            let first = summary
                .first_created
                .map(local_time)
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(Span::styled(
                    format!(" {} ", summary.level),
                    Theme::level_badge(summary.level),
                )),
                Cell::from(summary.count.to_string()),
                Cell::from(first),
                Cell::from(Span::styled(summary.delete_title(), Theme::text_dim())),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(9),
                Constraint::Length(10),
                Constraint::Length(21),
                Constraint::Min(10),
            ],
        )
        .header(Row::new(vec!["Level", "Count", "First", ""]).style(Theme::text_dim()))
        .row_highlight_style(Theme::list_item_selected())
        .highlight_symbol("▶ ")
        .block(block);

        frame.render_stateful_widget(table, area, &mut state.ui_state.summary_state);
    }

    fn render_chart(frame: &mut Frame, area: Rect, storage: &StorageSummary) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .title(Span::styled(" Logs per day ", Theme::title()));

        let Some(matrix) = storage.chart().filter(|m| !m.is_empty() && !storage.no_data()) else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let inner_width = area.width.saturating_sub(2) as usize;
        match storage.chart_type() {
            ChartType::Bar => Self::render_grouped_bars(frame, area, block, matrix, inner_width),
            ChartType::Line => Self::render_lines(frame, area, block, matrix),
            ChartType::Off => {}
            stacked if stacked.is_stacked() => {
                let shape = if stacked == ChartType::Area {
                    StackShape::Area
                } else {
                    StackShape::Bars
                };
                Self::render_stacked(frame, area, block, matrix, shape)
            }
            _ => {}
        }
    }

    /// One group per day, one bar per level
    fn render_grouped_bars(
        frame: &mut Frame,
        area: Rect,
        block: Block,
        matrix: &ChartMatrix,
        width: usize,
    ) {
        // Four one-column bars plus a gap per day
        let fit = (width / 5).max(1);
        let skip = matrix.len().saturating_sub(fit);

        let mut chart = BarChart::default()
            .block(block)
            .bar_width(1)
            .bar_gap(0)
            .group_gap(1);

        for (date, counts) in matrix.iter().skip(skip) {
            let bars: Vec<Bar> = counts
                .iter()
                .map(|(level, count)| {
                    Bar::default()
                        .value(count)
                        .style(Style::default().fg(level.color()))
                        .text_value(String::new())
                })
                .collect();
            chart = chart.data(
                BarGroup::default()
                    .label(Line::from(date.format("%d").to_string()))
                    .bars(&bars),
            );
        }

        frame.render_widget(chart, area);
    }

    /// Levels stacked per day, each band in its level color
    ///
    /// Bands are drawn as filled datasets from the running total down, so
    /// each later dataset covers the lower part of the one before it.
    fn render_stacked(
        frame: &mut Frame,
        area: Rect,
        block: Block,
        matrix: &ChartMatrix,
        shape: StackShape,
    ) {
        let bands: Vec<(LogLevel, Vec<(f64, f64)>)> = matrix
            .stacked_series()
            .into_iter()
            .rev()
            .map(|(level, running)| (level, stacked_points(&running, shape)))
            .collect();

        let datasets: Vec<Dataset> = bands
            .iter()
            .map(|(level, data)| {
                Dataset::default()
                    .name(level.as_str())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Bar)
                    .style(Style::default().fg(level.color()))
                    .data(data)
            })
            .collect();

        let days = matrix.len();
        let (x_min, x_max) = match shape {
            StackShape::Bars => (-0.5, days as f64 - 0.5),
            StackShape::Area => (0.0, days.saturating_sub(1).max(1) as f64),
        };
        let max = matrix.max_total().max(1) as f64;

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .style(Theme::text_dim())
                    .bounds([x_min, x_max])
                    .labels(date_labels(matrix)),
            )
            .y_axis(
                Axis::default()
                    .style(Theme::text_dim())
                    .bounds([0.0, max])
                    .labels(vec![Span::raw("0"), Span::raw(format!("{}", max as u64))]),
            );

        frame.render_widget(chart, area);
    }

    /// One line per level across the days
    fn render_lines(frame: &mut Frame, area: Rect, block: Block, matrix: &ChartMatrix) {
        let points: Vec<(LogLevel, Vec<(f64, f64)>)> = LogLevel::ALL
            .into_iter()
            .map(|level| {
                let series = matrix
                    .series(level)
                    .into_iter()
                    .enumerate()
                    .map(|(i, n)| (i as f64, n as f64))
                    .collect();
                (level, series)
            })
            .collect();

        let datasets: Vec<Dataset> = points
            .iter()
            .map(|(level, data)| {
                Dataset::default()
                    .name(level.as_str())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(level.color()))
                    .data(data)
            })
            .collect();

        let days = matrix.len();
        let max = matrix.max_count().max(1) as f64;

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .style(Theme::text_dim())
                    .bounds([0.0, days.saturating_sub(1).max(1) as f64])
                    .labels(date_labels(matrix)),
            )
            .y_axis(
                Axis::default()
                    .style(Theme::text_dim())
                    .bounds([0.0, max])
                    .labels(vec![Span::raw("0"), Span::raw(format!("{}", max as u64))]),
            );

        frame.render_widget(chart, area);
    }
}

/// How a stacked band is filled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StackShape {
    /// A separate column per day
    Bars,
    /// Interpolated between days
    Area,
}

/// Half the width of a stacked column, in days
const BAR_HALF_WIDTH: f64 = 0.3;
/// Samples per day; each sample is drawn as a vertical stroke
const SAMPLES_PER_DAY: usize = 12;

/// Sample points for one filled band of a stacked chart
fn stacked_points(running: &[u64], shape: StackShape) -> Vec<(f64, f64)> {
    let step = 1.0 / SAMPLES_PER_DAY as f64;
    match shape {
        StackShape::Bars => running
            .iter()
            .enumerate()
            .flat_map(|(day, total)| {
                let center = day as f64;
                let samples = (2.0 * BAR_HALF_WIDTH / step).round() as usize;
                (0..=samples)
                    .map(move |i| (center - BAR_HALF_WIDTH + i as f64 * step, *total as f64))
            })
            .collect(),
        StackShape::Area => match running {
            [] => Vec::new(),
            [only] => vec![(0.0, *only as f64)],
            _ => {
                let mut points: Vec<(f64, f64)> = running
                    .windows(2)
                    .enumerate()
                    .flat_map(|(day, pair)| {
                        let (from, to) = (pair[0] as f64, pair[1] as f64);
                        (0..SAMPLES_PER_DAY).map(move |i| {
                            let t = i as f64 * step;
                            (day as f64 + t, from + (to - from) * t)
                        })
                    })
                    .collect();
                if let Some(last) = running.last() {
                    points.push(((running.len() - 1) as f64, *last as f64));
                }
                points
            }
        },
    }
}

/// First and last date of the matrix as axis labels
fn date_labels(matrix: &ChartMatrix) -> Vec<Span<'static>> {
    match (matrix.dates().next(), matrix.dates().last()) {
        (Some(first), Some(last)) => vec![
            Span::raw(first.format("%m-%d").to_string()),
            Span::raw(last.format("%m-%d").to_string()),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Screen;

    #[test]
    fn test_selected_level_follows_table_row() {
        let mut state = AppState::new(Screen::Storage);
        assert_eq!(StorageScreen::selected_level(&state), LogLevel::Info);

        state.summary_down(4);
        state.summary_down(4);
        assert_eq!(StorageScreen::selected_level(&state), LogLevel::Warn);

        state.summary_down(4);
        state.summary_down(4);
        assert_eq!(StorageScreen::selected_level(&state), LogLevel::Error);

        state.summary_up();
        assert_eq!(StorageScreen::selected_level(&state), LogLevel::Warn);
    }

    #[test]
    fn test_stacked_bars_are_flat_columns_per_day() {
        let points = stacked_points(&[4, 7], StackShape::Bars);

        let first: Vec<_> = points.iter().filter(|(x, _)| *x < 0.5).collect();
        let second: Vec<_> = points.iter().filter(|(x, _)| *x > 0.5).collect();
        assert!(!first.is_empty() && !second.is_empty());
        assert!(first.iter().all(|(x, y)| *y == 4.0 && x.abs() <= BAR_HALF_WIDTH + 1e-9));
        assert!(second.iter().all(|(x, y)| *y == 7.0 && (x - 1.0).abs() <= BAR_HALF_WIDTH + 1e-9));
    }

    #[test]
    fn test_stacked_area_interpolates_between_days() {
        let points = stacked_points(&[0, 12, 6], StackShape::Area);

        assert_eq!(points.first(), Some(&(0.0, 0.0)));
        assert_eq!(points.last(), Some(&(2.0, 6.0)));
        let (_, mid) = points
            .iter()
            .find(|(x, _)| (x - 0.5).abs() < 1e-9)
            .unwrap();
        assert!((mid - 6.0).abs() < 1e-9);
        assert!(points.windows(2).all(|w| w[0].0 < w[1].0));

        assert!(stacked_points(&[], StackShape::Area).is_empty());
        assert_eq!(stacked_points(&[3], StackShape::Area), vec![(0.0, 3.0)]);
    }

    #[test]
    fn test_stacked_chart_renders_level_colors() {
        use chrono::NaiveDate;
        use logdeck_types::DateLevelCount;
        use ratatui::{Terminal, backend::TestBackend};

        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let matrix = logdeck_logs::build_date_level_matrix(&[
            DateLevelCount::new(day(11), LogLevel::Info, 10),
            DateLevelCount::new(day(11), LogLevel::Error, 10),
            DateLevelCount::new(day(12), LogLevel::Info, 5),
        ]);

        let mut terminal = Terminal::new(TestBackend::new(40, 16)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                let block = Block::default().borders(Borders::ALL);
                StorageScreen::render_stacked(frame, area, block, &matrix, StackShape::Bars)
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let colors: Vec<_> = buffer.content().iter().map(|cell| cell.fg).collect();
        assert!(colors.contains(&LogLevel::Info.color()));
        assert!(colors.contains(&LogLevel::Error.color()));
    }
}
