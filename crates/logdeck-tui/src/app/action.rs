use logdeck_types::LogLevel;

use crate::app::Screen;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Navigate(Screen),
    GoBack,
    Quit,

    // UI toggles
    ToggleHelp,
    DismissToast,

    // List navigation
    ListUp,
    ListDown,
    ListSelect,

    // Reader
    Refresh,
    ToggleTail,
    ToggleLevel(LogLevel),
    CyclePageSize,
    DeleteSelected,

    // Search in the reader
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    ApplySearch,
    ClearSearch,
    ToggleCaseSensitive,

    // Storage
    NextDateRange,
    PrevDateRange,
    CycleChartType,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,

    // Writer
    WriterInput(char),
    WriterBackspace,
    WriterClear,
    WriterCycleLevel,
    WriterSubmit,

    // Tick (for periodic updates)
    Tick,

    // Render request
    Render,
}
