use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use logdeck_service::LogQueryClient;
use logdeck_types::{ChartType, DateRange, LevelSummary, LogLevel};

use crate::{
    ChartCache, ChartMatrix, Notifier, OwnedTask, StorageConfig, build_date_level_matrix,
    has_data, summarize_by_level,
};

/// Sent by the auto-refresh timer; the owner answers with [`StorageSummary::load`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageEvent {
    Tick,
}

/// Per-level storage usage over a date range, with the per-day chart matrix
/// and bulk delete of one level
pub struct StorageSummary {
    client: Arc<dyn LogQueryClient>,
    notifier: Notifier,

    date_range: DateRange,
    chart_type: ChartType,
    summaries: [LevelSummary; 4],
    chart: ChartCache,
    /// Set when the chart matrix changed and the chart should be redrawn
    chart_dirty: bool,
    no_data: bool,
    loading: bool,
    last_error: Option<String>,
    title: String,

    /// Level awaiting delete confirmation
    pending_delete: Option<LogLevel>,

    refresh_interval: Option<Duration>,
    timer: Option<OwnedTask>,
    ticks_tx: mpsc::UnboundedSender<StorageEvent>,
}

impl StorageSummary {
    pub fn new(
        client: Arc<dyn LogQueryClient>,
        notifier: Notifier,
        config: &StorageConfig,
    ) -> (Self, mpsc::UnboundedReceiver<StorageEvent>) {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();

        let date_range = DateRange::parse(&config.default_date_filter).unwrap_or_else(|| {
            warn!(token = %config.default_date_filter, "unknown date filter, using this week");
            DateRange::ThisWeek
        });
        let chart_type = ChartType::parse(&config.chart_type).unwrap_or_else(|| {
            warn!(token = %config.chart_type, "unsupported chart type, chart disabled");
            ChartType::Off
        });

        let summary = Self {
            client,
            notifier,
            date_range,
            chart_type,
            summaries: LogLevel::ALL.map(LevelSummary::empty),
            chart: ChartCache::default(),
            chart_dirty: false,
            no_data: false,
            loading: false,
            last_error: None,
            title: title_for(date_range),
            pending_delete: None,
            refresh_interval: config.refresh_interval(),
            timer: None,
            ticks_tx,
        };

        (summary, ticks_rx)
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn summaries(&self) -> &[LevelSummary; 4] {
        &self.summaries
    }

    pub fn chart(&self) -> Option<&ChartMatrix> {
        self.chart.matrix()
    }

    pub fn no_data(&self) -> bool {
        self.no_data
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pending_delete(&self) -> Option<LogLevel> {
        self.pending_delete
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Returns true once after each chart change
    pub fn take_chart_redraw(&mut self) -> bool {
        std::mem::take(&mut self.chart_dirty)
    }

    /// Enter the loading state ahead of a remote call, so it can be drawn
    /// before the call is awaited
    pub fn begin_loading(&mut self) {
        self.stop_timer();
        self.loading = true;
        self.last_error = None;
    }

    /// Reload counts and the chart for the selected range
    pub async fn load(&mut self) {
        self.begin_loading();
        debug!(range = ?self.date_range, "loading storage summary");

        if let Err(message) = self.fetch().await {
            self.last_error = Some(message.clone());
            self.notifier.error(message);
        }

        self.title = title_for(self.date_range);
        self.start_timer();
        self.loading = false;
    }

    pub async fn set_date_range(&mut self, range: DateRange) {
        self.date_range = range;
        self.load().await;
    }

    pub async fn next_date_range(&mut self) {
        self.set_date_range(self.date_range.next()).await;
    }

    pub async fn prev_date_range(&mut self) {
        self.set_date_range(self.date_range.prev()).await;
    }

    /// Switch the chart presentation; unsupported tokens disable the chart
    pub fn set_chart_type(&mut self, token: &str) -> bool {
        match ChartType::parse(token) {
            Some(chart_type) => {
                self.chart_type = chart_type;
                self.chart_dirty = true;
                true
            }
            None => {
                warn!(token, "unsupported chart type, chart disabled");
                self.notifier
                    .warning("Chart", format!("Unsupported chart type: {}", token));
                self.chart_type = ChartType::Off;
                false
            }
        }
    }

    /// Ask for confirmation before deleting every record of `level` in the
    /// selected range; returns the prompt to show
    pub fn request_delete(&mut self, level: LogLevel) -> String {
        self.pending_delete = Some(level);
        format!(
            "Are you sure you want to delete all {} logs for the selected time period?",
            level
        )
    }

    pub fn cancel_delete(&mut self) {
        if let Some(level) = self.pending_delete.take() {
            debug!(%level, "bulk delete cancelled");
        }
    }

    /// Enter the loading state for a confirmed bulk delete; false when
    /// nothing is pending
    pub fn begin_delete(&mut self) -> bool {
        if self.pending_delete.is_none() {
            return false;
        }
        self.begin_loading();
        true
    }

    /// Run the pending bulk delete, if any
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(level) = self.pending_delete.take() else {
            return false;
        };

        self.begin_loading();
        info!(%level, range = ?self.date_range, "bulk delete");
        let result = self
            .client
            .delete_logs_by_level(level, self.date_range)
            .await;

        match result {
            Ok(()) => {
                self.notifier
                    .success(format!("Successfully deleted {} logs", level));
                self.load().await;
                true
            }
            Err(e) => {
                error!(%level, error = %e, "bulk delete failed");
                self.notifier.error(format!("Error deleting {} logs", level));
                self.start_timer();
                self.loading = false;
                false
            }
        }
    }

    /// Stop auto-refresh; used on teardown
    pub fn shutdown(&mut self) {
        self.stop_timer();
    }

    async fn fetch(&mut self) -> Result<(), String> {
        let fallback = "Error loading log data";

        let rows = self
            .client
            .count_logs_by_level(self.date_range)
            .await
            .map_err(|e| {
                error!(error = %e, "count by level failed");
                e.user_message(fallback)
            })?;

        if rows.is_empty() {
            self.no_data = true;
            self.summaries = LogLevel::ALL.map(LevelSummary::empty);
            if self.chart.clear() {
                self.chart_dirty = true;
            }
            return Ok(());
        }

        let by_date = self
            .client
            .fetch_logs_by_date_level(self.date_range)
            .await
            .map_err(|e| {
                error!(error = %e, "count by date failed");
                e.user_message(fallback)
            })?;

        self.summaries = summarize_by_level(&rows);
        self.no_data = !has_data(&self.summaries);
        if self.chart.replace(build_date_level_matrix(&by_date)) {
            self.chart_dirty = true;
        }
        Ok(())
    }

    fn start_timer(&mut self) {
        let Some(period) = self.refresh_interval else {
            return;
        };
        let ticks = self.ticks_tx.clone();
        self.timer = Some(OwnedTask::interval(period, move || {
            ticks.send(StorageEvent::Tick).is_ok()
        }));
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl Drop for StorageSummary {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

fn title_for(range: DateRange) -> String {
    format!("Logs {}", range.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use logdeck_service::{MemoryLogService, ServiceError, ServiceResult};
    use std::sync::atomic::{AtomicBool, Ordering};
    use logdeck_types::{DateLevelCount, LevelCountRow, LogRecord, Notification, QueryParams, Severity};

    /// Fails every call
    struct Unreachable;

    #[async_trait]
    impl LogQueryClient for Unreachable {
        async fn count_logs_by_level(&self, _: DateRange) -> ServiceResult<Vec<LevelCountRow>> {
            Err(ServiceError::Rejected { message: None })
        }

        async fn fetch_logs_by_date_level(&self, _: DateRange) -> ServiceResult<Vec<DateLevelCount>> {
            Err(ServiceError::Rejected { message: None })
        }

        async fn fetch_logs(&self, _: &QueryParams) -> ServiceResult<Vec<LogRecord>> {
            Err(ServiceError::Rejected { message: None })
        }

        async fn delete_logs_by_level(&self, _: LogLevel, _: DateRange) -> ServiceResult<()> {
            Err(ServiceError::rejected("insufficient access"))
        }

        async fn delete_log(&self, id: &str) -> ServiceResult<()> {
            Err(ServiceError::NotFound(id.to_string()))
        }

        async fn write_log(&self, _: LogLevel, _: &str, _: &str) -> ServiceResult<()> {
            Err(ServiceError::Rejected { message: None })
        }

        async fn publish_error_event(&self, _: LogLevel, _: &str, _: &str) -> ServiceResult<()> {
            Err(ServiceError::Rejected { message: None })
        }
    }

    /// Delegates to the memory service; chart queries and bulk deletes can
    /// be made to fail
    struct Faulty {
        inner: MemoryLogService,
        fail_chart: AtomicBool,
        fail_deletes: AtomicBool,
    }

    impl Faulty {
        fn new(inner: MemoryLogService) -> Self {
            Self {
                inner,
                fail_chart: AtomicBool::new(false),
                fail_deletes: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl LogQueryClient for Faulty {
        async fn count_logs_by_level(&self, range: DateRange) -> ServiceResult<Vec<LevelCountRow>> {
            self.inner.count_logs_by_level(range).await
        }

        async fn fetch_logs_by_date_level(&self, range: DateRange) -> ServiceResult<Vec<DateLevelCount>> {
            if self.fail_chart.load(Ordering::SeqCst) {
                return Err(ServiceError::Transient("timeout".into()));
            }
            self.inner.fetch_logs_by_date_level(range).await
        }

        async fn fetch_logs(&self, params: &QueryParams) -> ServiceResult<Vec<LogRecord>> {
            self.inner.fetch_logs(params).await
        }

        async fn delete_logs_by_level(&self, level: LogLevel, range: DateRange) -> ServiceResult<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(ServiceError::rejected("insufficient access"));
            }
            self.inner.delete_logs_by_level(level, range).await
        }

        async fn delete_log(&self, id: &str) -> ServiceResult<()> {
            self.inner.delete_log(id).await
        }

        async fn write_log(&self, level: LogLevel, message: &str, source: &str) -> ServiceResult<()> {
            self.inner.write_log(level, message, source).await
        }

        async fn publish_error_event(&self, level: LogLevel, message: &str, source: &str) -> ServiceResult<()> {
            self.inner.publish_error_event(level, message, source).await
        }
    }

    fn record(n: u32, level: LogLevel, day: u32) -> LogRecord {
        LogRecord {
            id: format!("rec-{}", n),
            name: format!("LOG-{}", n),
            level,
            created: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            short_message: "message".into(),
            location: "Test".into(),
            affected_id: None,
        }
    }

    fn seeded_service() -> MemoryLogService {
        let service = MemoryLogService::with_records(vec![
            record(1, LogLevel::Info, 11),
            record(2, LogLevel::Info, 11),
            record(3, LogLevel::Error, 13),
            record(4, LogLevel::Warn, 13),
        ]);
        // Wednesday; this week is Sun 10th to Sat 16th
        service.set_today(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
        service
    }

    fn storage(
        client: Arc<dyn LogQueryClient>,
        config: StorageConfig,
    ) -> (
        StorageSummary,
        mpsc::UnboundedReceiver<StorageEvent>,
        mpsc::UnboundedReceiver<Notification>,
    ) {
        let (notifier, notifications) = Notifier::channel();
        let (summary, ticks) = StorageSummary::new(client, notifier, &config);
        (summary, ticks, notifications)
    }

    #[tokio::test]
    async fn test_load_this_week() {
        let (mut s, _ticks, _notes) = storage(Arc::new(seeded_service()), StorageConfig::default());
        assert_eq!(s.title(), "Logs This Week");

        s.load().await;

        let counts: Vec<u64> = s.summaries().iter().map(|sum| sum.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 1]);
        assert!(s.summaries()[1].first_created.is_none());
        assert!(!s.no_data());
        assert!(!s.is_loading());

        let matrix = s.chart().unwrap();
        // 11th to 13th inclusive, 12th filled with zeros
        assert_eq!(matrix.len(), 3);
        let gap = matrix.get(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()).unwrap();
        assert_eq!(gap.total(), 0);
        assert!(s.take_chart_redraw());
        assert!(!s.take_chart_redraw());
    }

    #[tokio::test]
    async fn test_unchanged_matrix_skips_redraw() {
        let (mut s, _ticks, _notes) = storage(Arc::new(seeded_service()), StorageConfig::default());
        s.load().await;
        assert!(s.take_chart_redraw());

        s.load().await;
        assert!(!s.take_chart_redraw());
        assert_eq!(s.chart().map(ChartMatrix::len), Some(3));
    }

    #[tokio::test]
    async fn test_empty_range_sets_no_data() {
        let (mut s, _ticks, _notes) = storage(Arc::new(seeded_service()), StorageConfig::default());
        s.set_date_range(DateRange::LastYear).await;

        assert!(s.no_data());
        assert_eq!(s.title(), "Logs Last Year");
        assert!(s.summaries().iter().all(|sum| sum.count == 0));
        assert!(s.chart().is_none());
    }

    #[tokio::test]
    async fn test_empty_range_clears_previous_chart() {
        let (mut s, _ticks, _notes) = storage(Arc::new(seeded_service()), StorageConfig::default());
        s.load().await;
        assert!(s.chart().is_some());
        assert!(s.take_chart_redraw());

        s.set_date_range(DateRange::LastYear).await;
        assert!(s.no_data());
        assert!(s.chart().is_none());
        assert!(s.take_chart_redraw());
    }

    #[tokio::test]
    async fn test_load_error_notifies_with_fallback() {
        let (mut s, _ticks, mut notes) = storage(Arc::new(Unreachable), StorageConfig::default());
        s.load().await;

        assert_eq!(s.last_error(), Some("Error loading log data"));
        assert!(!s.is_loading());
        let note = notes.try_recv().unwrap();
        assert_eq!(note.severity, Severity::Error);
        assert_eq!(note.message, "Error loading log data");
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_confirmation() {
        let service = seeded_service();
        let (mut s, _ticks, mut notes) = storage(Arc::new(service.clone()), StorageConfig::default());
        s.load().await;

        let prompt = s.request_delete(LogLevel::Info);
        assert_eq!(
            prompt,
            "Are you sure you want to delete all INFO logs for the selected time period?"
        );
        assert_eq!(service.len(), 4);

        s.cancel_delete();
        assert!(!s.confirm_delete().await);
        assert_eq!(service.len(), 4);

        s.request_delete(LogLevel::Info);
        assert!(s.confirm_delete().await);
        assert_eq!(service.len(), 2);
        assert_eq!(s.summaries()[0].count, 0);
        assert_eq!(s.pending_delete(), None);

        let note = notes.try_recv().unwrap();
        assert_eq!(note.message, "Successfully deleted INFO logs");
    }

    #[tokio::test]
    async fn test_bulk_delete_failure_keeps_data() {
        let service = seeded_service();
        let client = Arc::new(Faulty::new(service.clone()));
        client.fail_deletes.store(true, Ordering::SeqCst);
        let (mut s, _ticks, mut notes) = storage(client, StorageConfig::default());
        s.load().await;
        s.take_chart_redraw();
        let summaries = s.summaries().clone();
        let chart = s.chart().cloned();

        s.request_delete(LogLevel::Warn);
        assert!(s.begin_delete());
        assert!(s.is_loading());
        assert!(!s.confirm_delete().await);

        assert!(!s.is_loading());
        assert!(!s.no_data());
        assert_eq!(s.summaries(), &summaries);
        assert_eq!(s.chart().cloned(), chart);
        assert!(!s.take_chart_redraw());
        assert_eq!(service.len(), 4);

        let note = notes.try_recv().unwrap();
        assert_eq!(note.severity, Severity::Error);
        assert_eq!(note.message, "Error deleting WARN logs");
    }

    #[tokio::test]
    async fn test_begin_delete_needs_pending_level() {
        let (mut s, _ticks, _notes) = storage(Arc::new(seeded_service()), StorageConfig::default());
        assert!(!s.begin_delete());
        assert!(!s.is_loading());

        s.request_delete(LogLevel::Info);
        assert!(s.begin_delete());
        assert!(s.is_loading());
        assert!(s.confirm_delete().await);
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_begin_loading_is_visible_until_load_finishes() {
        let (mut s, _ticks, _notes) = storage(Arc::new(Unreachable), StorageConfig::default());
        s.load().await;
        assert!(s.last_error().is_some());

        s.begin_loading();
        assert!(s.is_loading());
        assert_eq!(s.last_error(), None);

        s.load().await;
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_chart_fetch_failure_keeps_summaries() {
        let service = seeded_service();
        let client = Arc::new(Faulty::new(service.clone()));
        let (mut s, _ticks, mut notes) = storage(client.clone(), StorageConfig::default());
        s.load().await;
        s.take_chart_redraw();
        let summaries = s.summaries().clone();
        let chart = s.chart().cloned();

        // Counts change remotely but the per-day query fails
        service.seed(vec![record(9, LogLevel::Debug, 12)]);
        client.fail_chart.store(true, Ordering::SeqCst);
        s.load().await;

        assert_eq!(s.summaries(), &summaries);
        assert_eq!(s.chart().cloned(), chart);
        assert!(!s.no_data());
        assert!(!s.take_chart_redraw());
        assert_eq!(s.last_error(), Some("timeout"));
        assert_eq!(notes.try_recv().unwrap().severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_chart_type_validation() {
        let config = StorageConfig {
            chart_type: "pie".into(),
            ..StorageConfig::default()
        };
        let (mut s, _ticks, mut notes) = storage(Arc::new(seeded_service()), config);
        assert_eq!(s.chart_type(), ChartType::Off);

        assert!(s.set_chart_type("stackedBar"));
        assert_eq!(s.chart_type(), ChartType::StackedBar);

        assert!(!s.set_chart_type("donut"));
        assert_eq!(s.chart_type(), ChartType::Off);
        assert_eq!(notes.try_recv().unwrap().severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_default_date_filter_from_config() {
        let config = StorageConfig {
            default_date_filter: "null".into(),
            ..StorageConfig::default()
        };
        let (s, _ticks, _notes) = storage(Arc::new(seeded_service()), config);
        assert_eq!(s.date_range(), DateRange::AllTime);
        assert_eq!(s.title(), "Logs All Time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_ticks_and_restarts() {
        let config = StorageConfig {
            refresh_interval_secs: Some(30),
            ..StorageConfig::default()
        };
        let (mut s, mut ticks, _notes) = storage(Arc::new(seeded_service()), config);
        assert!(!s.is_auto_refreshing());

        s.load().await;
        assert!(s.is_auto_refreshing());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(ticks.try_recv(), Ok(StorageEvent::Tick));

        s.shutdown();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(ticks.try_recv().is_err());
        assert!(!s.is_auto_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timer_without_interval() {
        let (mut s, mut ticks, _notes) = storage(Arc::new(seeded_service()), StorageConfig::default());
        s.load().await;
        assert!(!s.is_auto_refreshing());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(ticks.try_recv().is_err());
    }
}
