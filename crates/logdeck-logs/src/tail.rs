use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use logdeck_service::{
    LOG_EVENT_TOPIC, LogQueryClient, PushChannel, SubscriptionHandle,
};
use logdeck_types::{
    LogLevel, LogRecord, PageSize, PushMessage, QueryParams, ReplayFrom, TailState,
};

use crate::{FilterError, LevelFilter, Notifier, OwnedTask, ReaderConfig, SearchFilter, TailConfig};

/// Result of a push-driven refresh, delivered to the controller's owner
#[derive(Clone, Debug, PartialEq)]
pub enum TailEvent {
    Refreshed(Vec<LogRecord>),
    /// Retries exhausted; carries the user-facing message
    RefreshFailed(String),
}

/// Presentation of the tail toggle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TailButton {
    pub variant: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
}

impl TailButton {
    pub const START: Self = Self {
        variant: "brand-outline",
        label: "Tail",
        icon: "utility:play",
        title: "Tail the logs",
    };

    pub const STOP: Self = Self {
        variant: "brand",
        label: "Stop",
        icon: "utility:stop",
        title: "Stop tailing the logs",
    };
}

/// Cache-buster source: current epoch millis, strictly increasing
#[derive(Clone, Debug, Default)]
pub struct CacheBuster {
    last: Arc<AtomicI64>,
}

impl CacheBuster {
    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }
}

/// Owns the log listing of the reader: filter state, the fetched records and
/// the push subscription used for tailing
///
/// Push-driven refreshes run on a background task and come back through the
/// [`TailEvent`] channel returned by [`TailController::new`]; the owner feeds
/// them to [`TailController::apply`].
pub struct TailController {
    client: Arc<dyn LogQueryClient>,
    push: Arc<dyn PushChannel>,
    notifier: Notifier,
    config: TailConfig,

    state: TailState,
    button: TailButton,
    levels: LevelFilter,
    page_size: PageSize,
    tail_since: Option<DateTime<Utc>>,
    cache_buster: CacheBuster,

    /// Last parameters sent (or about to be sent) to the service
    params: QueryParams,
    /// Shared with the listener so tail refreshes use current filters
    params_tx: watch::Sender<QueryParams>,

    logs: Vec<LogRecord>,
    last_error: Option<String>,
    search: Option<SearchFilter>,

    /// Ids that appeared in the latest tail refresh
    fresh_ids: HashSet<String>,
    fresh_until: Option<Instant>,

    subscription: Option<SubscriptionHandle>,
    listener: Option<OwnedTask>,
    events_tx: mpsc::UnboundedSender<TailEvent>,
}

impl TailController {
    pub fn new(
        client: Arc<dyn LogQueryClient>,
        push: Arc<dyn PushChannel>,
        notifier: Notifier,
        reader: &ReaderConfig,
        config: TailConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TailEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let levels = LevelFilter::from_config(reader.default_log_levels.as_deref());
        let page_size = PageSize::from_configured(reader.default_logs_per_page);
        let params = QueryParams {
            levels: levels.selected(),
            page_size,
            cache_buster: 0,
            since: None,
        };
        let (params_tx, _) = watch::channel(params.clone());

        let controller = Self {
            client,
            push,
            notifier,
            config,
            state: TailState::Idle,
            button: TailButton::START,
            levels,
            page_size,
            tail_since: None,
            cache_buster: CacheBuster::default(),
            params,
            params_tx,
            logs: Vec::new(),
            last_error: None,
            search: None,
            fresh_ids: HashSet::new(),
            fresh_until: None,
            subscription: None,
            listener: None,
            events_tx,
        };

        (controller, events_rx)
    }

    pub fn state(&self) -> TailState {
        self.state
    }

    pub fn is_tailing(&self) -> bool {
        self.state == TailState::Tailing
    }

    pub fn button(&self) -> TailButton {
        self.button
    }

    pub fn levels(&self) -> &LevelFilter {
        &self.levels
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn tail_since(&self) -> Option<DateTime<Utc>> {
        self.tail_since
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.params
    }

    /// All records of the last applied fetch
    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    pub fn has_logs(&self) -> bool {
        !self.logs.is_empty()
    }

    /// Records passing the client-side search
    pub fn visible_logs(&self) -> Vec<&LogRecord> {
        self.logs
            .iter()
            .filter(|r| self.search.as_ref().is_none_or(|s| s.matches(r)))
            .collect()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn search(&self) -> Option<&SearchFilter> {
        self.search.as_ref()
    }

    /// Whether the record arrived with the latest tail refresh and is still
    /// within its highlight window
    pub fn is_new(&self, id: &str) -> bool {
        self.fresh_until.is_some_and(|until| Instant::now() < until) && self.fresh_ids.contains(id)
    }

    /// Drop the highlight once its window has passed; true when it was dropped
    pub fn expire_highlight(&mut self) -> bool {
        match self.fresh_until {
            Some(until) if Instant::now() >= until => {
                self.fresh_until = None;
                self.fresh_ids.clear();
                true
            }
            _ => false,
        }
    }

    /// One-shot fetch with the current filters; no retry
    pub async fn refresh(&mut self) -> bool {
        let params = self.next_params();
        debug!(?params, "loading logs");

        match self.client.fetch_logs(&params).await {
            Ok(records) => {
                self.replace_logs(records, false);
                true
            }
            Err(e) => {
                let message = e.user_message("Error loading logs");
                error!(error = %e, "failed to load logs");
                self.last_error = Some(message.clone());
                self.notifier.error(message);
                false
            }
        }
    }

    /// Flip a level in the filter and refetch. Deselecting the last level is
    /// rejected with a warning.
    pub async fn toggle_level(&mut self, level: LogLevel) -> bool {
        match self.levels.toggle(level) {
            Ok(selected) => {
                debug!(%level, selected, "level toggled");
                self.sync_params();
                self.refresh().await;
                true
            }
            Err(e @ FilterError::LastLevel(_)) => {
                warn!(%level, "refusing to deselect the last level");
                self.notifier.warning("Log levels", e.to_string());
                false
            }
            Err(e) => {
                self.notifier.warning("Log levels", e.to_string());
                false
            }
        }
    }

    pub async fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.sync_params();
        self.refresh().await;
    }

    pub async fn cycle_page_size(&mut self) {
        self.set_page_size(self.page_size.next()).await;
    }

    /// Start tailing when idle, stop when tailing; ignored mid-transition
    pub async fn toggle_tail(&mut self) {
        if self.begin_toggle() {
            self.finish_toggle().await;
        }
    }

    /// Enter the transitional state of a toggle without any remote call, so
    /// it can be drawn first. Returns false mid-transition.
    pub fn begin_toggle(&mut self) -> bool {
        match self.state {
            TailState::Idle => {
                self.state = TailState::Subscribing;
                info!(topic = LOG_EVENT_TOPIC, "subscribing");
                true
            }
            TailState::Tailing => {
                self.state = TailState::Unsubscribing;
                self.stop_listener();
                self.tail_since = None;
                self.button = TailButton::START;
                self.sync_params();
                true
            }
            TailState::Subscribing | TailState::Unsubscribing => {
                debug!(state = self.state.label(), "tail toggle ignored");
                false
            }
        }
    }

    /// Complete a transition started by [`TailController::begin_toggle`]
    pub async fn finish_toggle(&mut self) {
        match self.state {
            TailState::Subscribing => self.subscribe().await,
            TailState::Unsubscribing => {
                self.release_subscription().await;
                self.state = TailState::Idle;
            }
            TailState::Idle | TailState::Tailing => {}
        }
    }

    /// Subscribe to new-record notifications, starting from now
    pub async fn start_tail(&mut self) {
        if self.state == TailState::Idle {
            self.toggle_tail().await;
        }
    }

    /// Release the subscription; always ends Idle
    pub async fn stop_tail(&mut self) {
        if self.state == TailState::Tailing {
            self.toggle_tail().await;
        }
    }

    async fn subscribe(&mut self) {
        match self.push.subscribe(LOG_EVENT_TOPIC, ReplayFrom::Latest).await {
            Ok(subscription) => {
                info!(id = subscription.handle.id, "subscribed");
                self.state = TailState::Tailing;
                self.tail_since = Some(Utc::now());
                self.button = TailButton::STOP;
                self.sync_params();
                self.listener = Some(self.spawn_listener(subscription.messages));
                self.subscription = Some(subscription.handle);
                self.notifier.success("New log entries are now being tailed.");
            }
            Err(e) => {
                self.state = TailState::Idle;
                error!(error = %e, "subscribe failed");
                self.notifier.error(e.user_message("Unable to tail the logs"));
            }
        }
    }

    /// Apply the outcome of a tail refresh. Last applied result wins.
    pub fn apply(&mut self, event: TailEvent) {
        match event {
            TailEvent::Refreshed(records) => self.replace_logs(records, true),
            TailEvent::RefreshFailed(message) => {
                self.last_error = Some(message.clone());
                self.notifier.error(message);
            }
        }
    }

    /// Remove a record locally, then delete it remotely. The local removal is
    /// kept even when the remote call fails.
    pub async fn delete_log(&mut self, id: &str) -> bool {
        self.logs.retain(|r| r.id != id);

        match self.client.delete_log(id).await {
            Ok(()) => {
                self.notifier.success(format!("Log {} deleted", id));
                true
            }
            Err(e) => {
                error!(id, error = %e, "delete failed");
                self.notifier.error(e.user_message("Error deleting log"));
                false
            }
        }
    }

    pub fn set_search(&mut self, pattern: &str, case_insensitive: bool) -> Result<(), FilterError> {
        if pattern.is_empty() {
            self.search = None;
            return Ok(());
        }
        self.search = Some(SearchFilter::new(pattern, case_insensitive)?);
        Ok(())
    }

    pub fn clear_search(&mut self) {
        self.search = None;
    }

    /// Teardown: cancel pending refreshes and release the subscription
    pub async fn shutdown(&mut self) {
        self.stop_listener();
        self.release_subscription().await;
        self.tail_since = None;
        self.button = TailButton::START;
        self.state = TailState::Idle;
    }

    fn next_params(&mut self) -> QueryParams {
        self.params.cache_buster = self.cache_buster.next();
        self.params.clone()
    }

    fn sync_params(&mut self) {
        self.params.levels = self.levels.selected();
        self.params.page_size = self.page_size;
        self.params.since = self.tail_since;
        self.params_tx.send_replace(self.params.clone());
    }

    fn replace_logs(&mut self, records: Vec<LogRecord>, from_tail: bool) {
        if from_tail {
            let previous: HashSet<&str> = self.logs.iter().map(|r| r.id.as_str()).collect();
            self.fresh_ids = records
                .iter()
                .filter(|r| !previous.contains(r.id.as_str()))
                .map(|r| r.id.clone())
                .collect();
            self.fresh_until = Some(Instant::now() + self.config.highlight());
        }
        self.logs = records;
        self.last_error = None;
    }

    fn stop_listener(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.cancel();
        }
    }

    async fn release_subscription(&mut self) {
        let Some(handle) = self.subscription.take() else {
            return;
        };
        match self.push.unsubscribe(&handle).await {
            Ok(()) => info!(id = handle.id, "unsubscribed"),
            Err(e) => warn!(id = handle.id, error = %e, "unsubscribe failed"),
        }
    }

    fn spawn_listener(&self, messages: mpsc::UnboundedReceiver<PushMessage>) -> OwnedTask {
        let client = Arc::clone(&self.client);
        let params = self.params_tx.subscribe();
        let buster = self.cache_buster.clone();
        let events = self.events_tx.clone();
        let delay = self.config.refresh_delay();
        let policy = self.config.retry_policy();

        OwnedTask::spawn(move |cancel| async move {
            let mut messages = messages;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,

                    message = messages.recv() => {
                        let Some(message) = message else {
                            // Channel closed by the service
                            break;
                        };
                        debug!(replay_id = message.replay_id, "log event received");

                        let refresh = async {
                            // Give the store time to make the new record queryable
                            tokio::time::sleep(delay).await;
                            // Coalesce notifications that arrived during the delay
                            while messages.try_recv().is_ok() {}

                            policy
                                .run(|attempt| {
                                    let params = QueryParams {
                                        cache_buster: buster.next(),
                                        ..params.borrow().clone()
                                    };
                                    let client = Arc::clone(&client);
                                    async move {
                                        debug!(attempt, ?params, "tail refresh");
                                        client.fetch_logs(&params).await
                                    }
                                })
                                .await
                        };

                        let result = tokio::select! {
                            _ = cancel.cancelled() => break,
                            result = refresh => result,
                        };

                        let event = match result {
                            Ok(records) => TailEvent::Refreshed(records),
                            Err(e) => {
                                error!(error = %e, "tail refresh failed after retries");
                                TailEvent::RefreshFailed(
                                    e.user_message("Error refreshing tailed logs"),
                                )
                            }
                        };

                        if events.send(event).is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }
}

impl Drop for TailController {
    fn drop(&mut self) {
        self.stop_listener();

        // Skipped `shutdown`: release the subscription on the runtime
        let Some(handle) = self.subscription.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let push = Arc::clone(&self.push);
                runtime.spawn(async move {
                    if let Err(e) = push.unsubscribe(&handle).await {
                        warn!(id = handle.id, error = %e, "unsubscribe on drop failed");
                    }
                });
            }
            Err(_) => warn!(id = handle.id, "subscription dropped outside a runtime"),
        }
    }
}
