//! TUI components for logdeck
//!
//! This crate provides the terminal user interface for logdeck,
//! including state management, keybindings, event handling, and the
//! reader, storage, writer and record detail screens.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, Navigate, Screen, Toast, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{
    ConfirmDialog, HelpOverlay, ListSelector, ListSelectorExt, StatusBar, ToastLine,
};
pub use ui::screens::{ReaderScreen, RecordDetailScreen, StorageScreen, WriterScreen};
pub use ui::{Layout, Theme, truncate_to_width};
