use async_trait::async_trait;
use tokio::sync::mpsc;

use logdeck_types::{PushMessage, ReplayFrom};

use crate::ServiceResult;

/// Topic on which the log service announces new records
pub const LOG_EVENT_TOPIC: &str = "/event/AppLogEvent__e";

/// Identifies a live subscription so it can be released
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub id: u64,
    pub topic: String,
}

/// A live subscription: its handle plus the stream of messages
#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub messages: mpsc::UnboundedReceiver<PushMessage>,
}

/// Push-notification channel
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn subscribe(&self, topic: &str, replay: ReplayFrom) -> ServiceResult<Subscription>;

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> ServiceResult<()>;
}
