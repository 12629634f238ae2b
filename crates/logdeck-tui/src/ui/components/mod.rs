mod confirm_dialog;
mod help_overlay;
mod list_selector;
mod status_bar;
mod toast;

pub use confirm_dialog::ConfirmDialog;
pub use help_overlay::HelpOverlay;
pub use list_selector::{ListSelector, ListSelectorExt};
pub use status_bar::StatusBar;
pub use toast::ToastLine;
