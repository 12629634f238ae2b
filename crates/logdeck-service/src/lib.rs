//! Log service boundary for logdeck
//!
//! This crate defines the remote calls logdeck depends on: the log query
//! service and the push-notification channel, plus an in-process
//! implementation of both.

mod client;
mod error;
mod memory;
mod push;

pub use client::LogQueryClient;
pub use error::{ServiceError, ServiceResult};
pub use memory::{MemoryLogService, demo_records};
pub use push::{LOG_EVENT_TOPIC, PushChannel, Subscription, SubscriptionHandle};

// Re-export types that are used in our public API
pub use logdeck_types::{
    DateLevelCount, DateRange, LevelCountRow, LogLevel, LogRecord, PushMessage, QueryParams,
    ReplayFrom,
};
