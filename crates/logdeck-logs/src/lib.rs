//! Log processing for logdeck
//!
//! This crate provides aggregation of log rows into summaries and chart
//! matrices, the tail controller for push-driven refreshes, and the storage
//! summary and writer controllers.

mod aggregate;
mod config;
mod filter;
mod notify;
mod retry;
mod storage;
mod tail;
mod task;
mod writer;

pub use aggregate::{
    ChartCache, ChartMatrix, LevelCounts, build_date_level_matrix, has_data, summarize_by_level,
};
pub use config::{LogdeckConfig, ReaderConfig, StorageConfig, TailConfig};
pub use filter::{FilterError, LevelFilter, SearchFilter};
pub use notify::Notifier;
pub use retry::RetryPolicy;
pub use storage::{StorageEvent, StorageSummary};
pub use tail::{CacheBuster, TailButton, TailController, TailEvent};
pub use task::OwnedTask;
pub use writer::{LogWriter, WRITER_SOURCE};

// Re-export types used in our public API
pub use logdeck_types::{
    ChartType, DateLevelCount, DateRange, LevelCountRow, LevelSummary, LogLevel, LogRecord,
    Notification, PageSize, QueryParams, Severity, TailState,
};
