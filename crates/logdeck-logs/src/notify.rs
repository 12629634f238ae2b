use tokio::sync::mpsc;
use tracing::{error, info, warn};

use logdeck_types::{Notification, Severity};

/// Sends user-facing notifications to whoever renders them
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => error!(title = %notification.title, "{}", notification.message),
            Severity::Warning => warn!(title = %notification.title, "{}", notification.message),
            Severity::Success | Severity::Info => {
                info!(title = %notification.title, "{}", notification.message)
            }
        }
        // Receiver gone means the UI is shutting down
        let _ = self.tx.send(notification);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Notification::success(message));
    }

    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) {
        self.notify(Notification::warning(title, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Notification::error(message));
    }
}
