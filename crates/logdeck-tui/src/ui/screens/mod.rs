mod reader;
mod record_detail;
mod storage;
mod writer;

pub use reader::ReaderScreen;
pub use record_detail::RecordDetailScreen;
pub use storage::StorageScreen;
pub use writer::WriterScreen;

use chrono::{DateTime, Local, Utc};
use ratatui::{Frame, layout::Rect};

use crate::app::AppState;
use crate::ui::components::{StatusBar, ToastLine};

/// Status bar, or the active notification in its place
fn render_footer(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    hints: Vec<(&str, &str)>,
    right: String,
) {
    match &state.ui_state.toast {
        Some(toast) => frame.render_widget(ToastLine::new(toast), area),
        None => frame.render_widget(StatusBar::new().hints(hints).right(right), area),
    }
}

/// Timestamp in the local zone, as shown in lists
fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}
