use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use paydesk_schema::BusMessage;
use tokio::sync::{mpsc, RwLock};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    NotificationPublished,
    AccountUpdated,
    AccountSelected,
    CallAnswered,
    CallClosed,
    TranscriptRevealed,
    RescheduleApplied,
    ImpactToggled,
    DurationTick,
}

impl Topic {
    pub fn from_message(msg: &BusMessage) -> Self {
        match msg {
            BusMessage::NotificationPublished { .. } => Topic::NotificationPublished,
            BusMessage::AccountUpdated { .. } => Topic::AccountUpdated,
            BusMessage::AccountSelected { .. } => Topic::AccountSelected,
            BusMessage::CallAnswered { .. } => Topic::CallAnswered,
            BusMessage::CallClosed { .. } => Topic::CallClosed,
            BusMessage::TranscriptRevealed { .. } => Topic::TranscriptRevealed,
            BusMessage::RescheduleApplied { .. } => Topic::RescheduleApplied,
            BusMessage::ImpactToggled { .. } => Topic::ImpactToggled,
            BusMessage::DurationTick { .. } => Topic::DurationTick,
        }
    }
}

type Subscriber = mpsc::Sender<BusMessage>;
type SubscriberMap = Arc<RwLock<HashMap<Topic, Vec<Subscriber>>>>;

/// Topic-routed, fire-and-forget event bus.
///
/// Delivery is best effort: a subscriber whose channel is full or closed
/// simply misses the message.
pub struct EventBus {
    subscribers: SubscriberMap,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe(&self, topic: Topic) -> mpsc::Receiver<BusMessage> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subs = self.subscribers.write().await;
        subs.entry(topic).or_default().push(tx);
        rx
    }

    pub async fn publish(&self, msg: BusMessage) -> Result<()> {
        deliver(&self.subscribers, msg).await
    }

    pub fn publisher(&self) -> BusPublisher {
        BusPublisher {
            subscribers: self.subscribers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BusPublisher {
    subscribers: SubscriberMap,
}

impl BusPublisher {
    pub async fn publish(&self, msg: BusMessage) -> Result<()> {
        deliver(&self.subscribers, msg).await
    }
}

async fn deliver(subscribers: &SubscriberMap, msg: BusMessage) -> Result<()> {
    let topic = Topic::from_message(&msg);
    let subs = subscribers.read().await;
    if let Some(subscribers) = subs.get(&topic) {
        for tx in subscribers {
            if tx.try_send(msg.clone()).is_err() {
                tracing::debug!(?topic, "bus subscriber full or closed, message dropped");
            }
        }
    }
    Ok(())
}
