use async_trait::async_trait;

use logdeck_types::{DateLevelCount, DateRange, LevelCountRow, LogLevel, LogRecord, QueryParams};

use crate::ServiceResult;

/// Remote log storage and query service
#[async_trait]
pub trait LogQueryClient: Send + Sync {
    /// One row per level present in the range, with count and earliest timestamp
    async fn count_logs_by_level(&self, range: DateRange) -> ServiceResult<Vec<LevelCountRow>>;

    /// Per-date, per-level counts for charting
    async fn fetch_logs_by_date_level(&self, range: DateRange)
    -> ServiceResult<Vec<DateLevelCount>>;

    /// Newest records matching the query, at most `params.page_size` of them
    async fn fetch_logs(&self, params: &QueryParams) -> ServiceResult<Vec<LogRecord>>;

    /// Bulk delete of one level within a range
    async fn delete_logs_by_level(&self, level: LogLevel, range: DateRange) -> ServiceResult<()>;

    async fn delete_log(&self, id: &str) -> ServiceResult<()>;

    /// Write a log entry through the regular logging path (INFO, DEBUG, WARN)
    async fn write_log(&self, level: LogLevel, message: &str, source: &str) -> ServiceResult<()>;

    /// Write a log entry through the privileged event path (required for ERROR)
    async fn publish_error_event(
        &self,
        level: LogLevel,
        message: &str,
        source: &str,
    ) -> ServiceResult<()>;
}
