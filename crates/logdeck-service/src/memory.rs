use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use logdeck_types::{
    DateLevelCount, DateRange, LevelCountRow, LogLevel, LogRecord, PushMessage, QueryParams,
    ReplayFrom,
};

use crate::{
    LOG_EVENT_TOPIC, LogQueryClient, PushChannel, ServiceError, ServiceResult, Subscription,
    SubscriptionHandle,
};

/// Push messages kept for replay
const REPLAY_CAPACITY: usize = 256;

struct Subscriber {
    topic: String,
    tx: mpsc::UnboundedSender<PushMessage>,
}

struct Inner {
    records: RwLock<Vec<LogRecord>>,
    subscribers: RwLock<HashMap<u64, Subscriber>>,
    retained: RwLock<VecDeque<PushMessage>>,
    next_record: AtomicU64,
    next_handle: AtomicU64,
    next_replay: AtomicI64,
    /// Simulates an unreachable push channel
    offline: AtomicBool,
    /// Fixed reference date for relative ranges (None = today, UTC)
    today: RwLock<Option<NaiveDate>>,
}

/// In-process log service implementing both the query boundary and the push channel
///
/// Every write through [`MemoryLogService::insert`] (or the writer calls of
/// [`LogQueryClient`]) publishes a message on [`LOG_EVENT_TOPIC`].
#[derive(Clone)]
pub struct MemoryLogService {
    inner: Arc<Inner>,
}

impl MemoryLogService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                records: RwLock::new(Vec::new()),
                subscribers: RwLock::new(HashMap::new()),
                retained: RwLock::new(VecDeque::with_capacity(REPLAY_CAPACITY)),
                next_record: AtomicU64::new(1),
                next_handle: AtomicU64::new(1),
                next_replay: AtomicI64::new(1),
                offline: AtomicBool::new(false),
                today: RwLock::new(None),
            }),
        }
    }

    /// Create a service pre-populated with records (no push messages are sent)
    pub fn with_records(records: Vec<LogRecord>) -> Self {
        let service = Self::new();
        service.seed(records);
        service
    }

    /// Store records without announcing them
    pub fn seed(&self, records: Vec<LogRecord>) {
        self.inner.records.write().extend(records);
    }

    /// Create and store a record timestamped now, then announce it
    pub fn insert(
        &self,
        level: LogLevel,
        message: &str,
        location: &str,
        affected_id: Option<String>,
    ) -> LogRecord {
        let record = self.new_record(level, message, location, affected_id, Utc::now());
        self.inner.records.write().push(record.clone());
        self.publish(serde_json::json!({
            "id": record.id,
            "level": record.level,
            "message": record.short_message,
        }));
        record
    }

    /// Announce a message to every subscriber of the log event topic
    pub fn publish(&self, payload: serde_json::Value) {
        let message = PushMessage {
            topic: LOG_EVENT_TOPIC.to_string(),
            replay_id: self.inner.next_replay.fetch_add(1, Ordering::SeqCst),
            payload,
        };

        {
            let mut retained = self.inner.retained.write();
            if retained.len() >= REPLAY_CAPACITY {
                retained.pop_front();
            }
            retained.push_back(message.clone());
        }

        // Drop subscribers whose receiver is gone
        self.inner
            .subscribers
            .write()
            .retain(|_, sub| sub.topic != message.topic || sub.tx.send(message.clone()).is_ok());
    }

    /// Make subscribe/unsubscribe fail with a connection error
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Pin the reference date used for relative date ranges
    pub fn set_today(&self, today: NaiveDate) {
        *self.inner.today.write() = Some(today);
    }

    /// Snapshot of every stored record
    pub fn records(&self) -> Vec<LogRecord> {
        self.inner.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.records.read().is_empty()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    fn today(&self) -> NaiveDate {
        self.inner
            .today
            .read()
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    fn new_record(
        &self,
        level: LogLevel,
        message: &str,
        location: &str,
        affected_id: Option<String>,
        created: DateTime<Utc>,
    ) -> LogRecord {
        let n = self.inner.next_record.fetch_add(1, Ordering::SeqCst);
        LogRecord {
            id: format!("a0L{:012}", n),
            name: format!("LOG-{:06}", n),
            level,
            created,
            short_message: message.to_string(),
            location: location.to_string(),
            affected_id,
        }
    }

    fn in_range(&self, record: &LogRecord, range: DateRange, today: NaiveDate) -> bool {
        range.contains(record.created.date_naive(), today)
    }
}

impl Default for MemoryLogService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogQueryClient for MemoryLogService {
    async fn count_logs_by_level(&self, range: DateRange) -> ServiceResult<Vec<LevelCountRow>> {
        let today = self.today();
        let records = self.inner.records.read();

        let rows = LogLevel::ALL
            .into_iter()
            .filter_map(|level| {
                let matching = records
                    .iter()
                    .filter(|r| r.level == level && self.in_range(r, range, today));
                let (count, first_created) =
                    matching.fold((0u64, None::<DateTime<Utc>>), |(count, first), r| {
                        let first = Some(first.map_or(r.created, |f| f.min(r.created)));
                        (count + 1, first)
                    });
                (count > 0).then_some(LevelCountRow {
                    level,
                    count,
                    first_created,
                })
            })
            .collect();

        Ok(rows)
    }

    async fn fetch_logs_by_date_level(
        &self,
        range: DateRange,
    ) -> ServiceResult<Vec<DateLevelCount>> {
        let today = self.today();
        let records = self.inner.records.read();

        let mut counts: BTreeMap<(NaiveDate, LogLevel), u64> = BTreeMap::new();
        for record in records.iter().filter(|r| self.in_range(r, range, today)) {
            *counts
                .entry((record.created.date_naive(), record.level))
                .or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|((date, level), count)| DateLevelCount::new(date, level, count))
            .collect())
    }

    async fn fetch_logs(&self, params: &QueryParams) -> ServiceResult<Vec<LogRecord>> {
        debug!(?params, "fetching logs");
        let records = self.inner.records.read();

        let mut matching: Vec<LogRecord> = records
            .iter()
            .filter(|r| params.levels.contains(&r.level))
            .filter(|r| params.since.is_none_or(|since| r.created >= since))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created.cmp(&a.created));
        matching.truncate(params.page_size.value() as usize);
        Ok(matching)
    }

    async fn delete_logs_by_level(&self, level: LogLevel, range: DateRange) -> ServiceResult<()> {
        let today = self.today();
        let mut records = self.inner.records.write();
        let before = records.len();
        records.retain(|r| !(r.level == level && self.in_range(r, range, today)));
        debug!(%level, removed = before - records.len(), "bulk delete");
        Ok(())
    }

    async fn delete_log(&self, id: &str) -> ServiceResult<()> {
        let mut records = self.inner.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn write_log(&self, level: LogLevel, message: &str, source: &str) -> ServiceResult<()> {
        if level == LogLevel::Error {
            return Err(ServiceError::rejected(
                "ERROR entries must be written through the log event path",
            ));
        }
        self.insert(level, message, source, None);
        Ok(())
    }

    async fn publish_error_event(
        &self,
        level: LogLevel,
        message: &str,
        source: &str,
    ) -> ServiceResult<()> {
        self.insert(level, message, source, None);
        Ok(())
    }
}

#[async_trait]
impl PushChannel for MemoryLogService {
    async fn subscribe(&self, topic: &str, replay: ReplayFrom) -> ServiceResult<Subscription> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(ServiceError::Connection("push channel unreachable".to_string()));
        }

        let (tx, messages) = mpsc::unbounded_channel();

        let replayed: Vec<PushMessage> = match replay {
            ReplayFrom::Latest => Vec::new(),
            ReplayFrom::Earliest => self.inner.retained.read().iter().cloned().collect(),
            ReplayFrom::After(id) => self
                .inner
                .retained
                .read()
                .iter()
                .filter(|m| m.replay_id > id)
                .cloned()
                .collect(),
        };
        for message in replayed.into_iter().filter(|m| m.topic == topic) {
            let _ = tx.send(message);
        }

        let id = self.inner.next_handle.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers.write().insert(
            id,
            Subscriber {
                topic: topic.to_string(),
                tx,
            },
        );

        Ok(Subscription {
            handle: SubscriptionHandle {
                id,
                topic: topic.to_string(),
            },
            messages,
        })
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> ServiceResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(ServiceError::Connection("push channel unreachable".to_string()));
        }

        match self.inner.subscribers.write().remove(&handle.id) {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(format!("subscription {}", handle.id))),
        }
    }
}

/// Deterministic demo data spread over the last two weeks before `now`
pub fn demo_records(count: usize, now: DateTime<Utc>) -> Vec<LogRecord> {
    const MESSAGES: [(&str, &str); 6] = [
        ("Account sync finished", "AccountSyncJob"),
        ("Cache miss for pricing rules", "PricingService"),
        ("Retrying callout to billing", "BillingCallout"),
        ("Null reference in trigger handler", "OpportunityTrigger"),
        ("Batch chunk processed", "LeadScoringBatch"),
        ("Slow query detected", "ReportController"),
    ];
    // Weighted towards INFO/DEBUG like real traffic
    const LEVELS: [LogLevel; 8] = [
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Error,
        LogLevel::Info,
    ];

    (0..count)
        .map(|i| {
            let n = i + 1;
            let (message, location) = MESSAGES[i % MESSAGES.len()];
            // 97 minutes apart wraps over roughly two weeks for a few hundred records
            let offset = Duration::minutes((i as i64 * 97) % (14 * 24 * 60));
            LogRecord {
                id: format!("a0D{:012}", n),
                name: format!("DEMO-{:06}", n),
                level: LEVELS[i % LEVELS.len()],
                created: now - offset,
                short_message: message.to_string(),
                location: location.to_string(),
                affected_id: (i % 3 == 0).then(|| format!("001{:012}", n)),
            }
        })
        .collect()
}
