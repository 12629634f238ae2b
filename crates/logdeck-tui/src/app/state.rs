use std::time::{Duration, Instant};

use ratatui::widgets::{ListState, TableState};

use logdeck_types::{LogRecord, Notification};

/// Screen enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Reader,
    Storage,
    Writer,
    RecordDetail,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Reader => "Reader",
            Self::Storage => "Storage",
            Self::Writer => "Writer",
            Self::RecordDetail => "Record",
        }
    }
}

/// Navigation capability handed to views
///
/// Views ask to move between screens through this trait instead of
/// reaching into the application state.
pub trait Navigate {
    fn navigate_to(&mut self, screen: Screen);

    /// Returns false when there is nothing to go back to
    fn go_back(&mut self) -> bool;

    /// Show one record on the detail screen
    fn open_record(&mut self, record: LogRecord);
}

/// A notification shown until it expires
#[derive(Clone, Debug)]
pub struct Toast {
    pub notification: Notification,
    expires_at: Instant,
}

impl Toast {
    pub fn new(notification: Notification, ttl: Duration) -> Self {
        Self {
            notification,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// UI-specific transient state
pub struct UiState {
    /// Is help overlay visible?
    pub help_visible: bool,

    /// Selection in the reader's record list
    pub list_state: ListState,

    /// Selection in the storage summary table
    pub summary_state: TableState,

    /// Is the search bar taking input?
    pub search_active: bool,

    pub search_input: String,

    /// Rejected pattern message (e.g., invalid regex)
    pub search_error: Option<String>,

    pub search_case_insensitive: bool,

    /// Currently displayed notification
    pub toast: Option<Toast>,

    /// Bulk delete prompt awaiting an answer
    pub confirm_prompt: Option<String>,

    /// Record shown on the detail screen
    pub detail: Option<LogRecord>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            help_visible: false,
            list_state: ListState::default().with_selected(Some(0)),
            summary_state: TableState::default().with_selected(Some(0)),
            search_active: false,
            search_input: String::new(),
            search_error: None,
            search_case_insensitive: true,
            toast: None,
            confirm_prompt: None,
            detail: None,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Current screen being displayed
    pub current_screen: Screen,

    /// Navigation stack for back navigation
    pub screen_stack: Vec<Screen>,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,

    /// How long notifications stay on screen
    pub toast_ttl: Duration,
}

impl AppState {
    pub fn new(screen: Screen) -> Self {
        Self {
            current_screen: screen,
            screen_stack: Vec::new(),
            ui_state: UiState::default(),
            should_quit: false,
            toast_ttl: Duration::from_secs(4),
        }
    }

    /// Move selection up, wrapping around
    pub fn list_up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.ui_state.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => (i - 1).min(len - 1),
        };
        self.ui_state.list_state.select(Some(i));
    }

    /// Move selection down, wrapping around
    pub fn list_down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.ui_state.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.ui_state.list_state.select(Some(i));
    }

    /// Keep the selection inside a list that may have shrunk
    pub fn clamp_selection(&mut self, len: usize) {
        match self.ui_state.list_state.selected() {
            _ if len == 0 => self.ui_state.list_state.select(Some(0)),
            Some(i) if i >= len => self.ui_state.list_state.select(Some(len - 1)),
            None => self.ui_state.list_state.select(Some(0)),
            _ => {}
        }
    }

    /// Get currently selected index
    pub fn selected_index(&self) -> Option<usize> {
        self.ui_state.list_state.selected()
    }

    pub fn summary_up(&mut self) {
        let i = self.ui_state.summary_state.selected().unwrap_or(0);
        self.ui_state.summary_state.select(Some(i.saturating_sub(1)));
    }

    pub fn summary_down(&mut self, len: usize) {
        let i = self.ui_state.summary_state.selected().unwrap_or(0);
        self.ui_state
            .summary_state
            .select(Some((i + 1).min(len.saturating_sub(1))));
    }

    pub fn show_toast(&mut self, notification: Notification) {
        self.ui_state.toast = Some(Toast::new(notification, self.toast_ttl));
    }

    /// Drop the toast once expired; returns true when something changed
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        if self.ui_state.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.ui_state.toast = None;
            return true;
        }
        false
    }

    pub fn dismiss_toast(&mut self) {
        self.ui_state.toast = None;
    }

    /// Start search input mode, editing the current pattern
    pub fn start_search(&mut self, current: Option<&str>) {
        self.ui_state.search_active = true;
        self.ui_state.search_input = current.unwrap_or_default().to_string();
        self.ui_state.search_error = None;
    }

    /// Leave search input mode without applying
    pub fn cancel_search(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.search_input.clear();
        self.ui_state.search_error = None;
    }

    /// Add a character to search input
    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
    }

    /// Remove last character from search input
    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
    }
}

impl Navigate for AppState {
    fn navigate_to(&mut self, screen: Screen) {
        if screen == self.current_screen {
            return;
        }
        self.screen_stack.push(self.current_screen);
        self.current_screen = screen;
        self.ui_state.help_visible = false;
    }

    fn go_back(&mut self) -> bool {
        if let Some(prev_screen) = self.screen_stack.pop() {
            self.current_screen = prev_screen;
            true
        } else {
            false
        }
    }

    fn open_record(&mut self, record: LogRecord) {
        self.ui_state.detail = Some(record);
        self.navigate_to(Screen::RecordDetail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use logdeck_types::LogLevel;

    fn record() -> LogRecord {
        LogRecord {
            id: "a0L1".into(),
            name: "LOG-1".into(),
            level: LogLevel::Warn,
            created: Utc::now(),
            short_message: "slow".into(),
            location: "Job".into(),
            affected_id: None,
        }
    }

    #[test]
    fn test_navigation_stack() {
        let mut state = AppState::new(Screen::Reader);
        state.navigate_to(Screen::Storage);
        state.navigate_to(Screen::Storage);
        assert_eq!(state.screen_stack, vec![Screen::Reader]);

        state.open_record(record());
        assert_eq!(state.current_screen, Screen::RecordDetail);
        assert_eq!(state.ui_state.detail.as_ref().map(|r| r.id.as_str()), Some("a0L1"));

        assert!(state.go_back());
        assert!(state.go_back());
        assert_eq!(state.current_screen, Screen::Reader);
        assert!(!state.go_back());
    }

    #[test]
    fn test_list_wraps() {
        let mut state = AppState::new(Screen::Reader);
        state.list_up(3);
        assert_eq!(state.selected_index(), Some(2));
        state.list_down(3);
        assert_eq!(state.selected_index(), Some(0));

        state.ui_state.list_state.select(Some(7));
        state.clamp_selection(3);
        assert_eq!(state.selected_index(), Some(2));
    }

    #[test]
    fn test_toast_expiry() {
        let mut state = AppState::new(Screen::Reader);
        state.toast_ttl = Duration::from_secs(2);
        state.show_toast(Notification::success("saved"));

        assert!(!state.expire_toast(Instant::now()));
        assert!(state.expire_toast(Instant::now() + Duration::from_secs(3)));
        assert!(state.ui_state.toast.is_none());
    }

    #[test]
    fn test_search_edit_starts_from_current_pattern() {
        let mut state = AppState::new(Screen::Reader);
        state.start_search(Some("time"));
        state.search_input_char('o');
        state.search_input_backspace();
        state.search_input_char('s');
        assert_eq!(state.ui_state.search_input, "times");

        state.cancel_search();
        assert!(!state.ui_state.search_active);
        assert!(state.ui_state.search_input.is_empty());
    }
}
