use std::sync::Arc;

use tracing::{debug, error};

use logdeck_service::LogQueryClient;
use logdeck_types::LogLevel;

use crate::Notifier;

/// Source recorded on entries created from the writer
pub const WRITER_SOURCE: &str = "logdeck.writer";

/// Composes and submits a single log entry
pub struct LogWriter {
    client: Arc<dyn LogQueryClient>,
    notifier: Notifier,
    level: LogLevel,
    message: String,
    submitting: bool,
}

impl LogWriter {
    pub fn new(client: Arc<dyn LogQueryClient>, notifier: Notifier) -> Self {
        Self {
            client,
            notifier,
            level: LogLevel::Info,
            message: String::new(),
            submitting: false,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub fn cycle_level(&mut self) {
        self.level = LogLevel::ALL[(self.level.index() + 1) % LogLevel::ALL.len()];
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.message.push(c);
    }

    pub fn pop_char(&mut self) {
        self.message.pop();
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.message.trim().is_empty()
    }

    /// Write the entry. ERROR goes through the event path, other levels
    /// through the regular logging path.
    pub async fn submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        self.submitting = true;
        debug!(level = %self.level, "writing log entry");

        let result = match self.level {
            LogLevel::Error => {
                self.client
                    .publish_error_event(self.level, &self.message, WRITER_SOURCE)
                    .await
            }
            LogLevel::Info | LogLevel::Debug | LogLevel::Warn => {
                self.client
                    .write_log(self.level, &self.message, WRITER_SOURCE)
                    .await
            }
        };
        self.submitting = false;

        match result {
            Ok(()) => {
                self.notifier.success("Log entry created successfully");
                self.message.clear();
                true
            }
            Err(e) => {
                error!(level = %self.level, error = %e, "write failed");
                self.notifier
                    .error(format!("Error creating log entry: {}", e.user_message("unknown error")));
                false
            }
        }
    }
}
