//! Toast-style notifications.
//!
//! Publishers push `{kind, message}` onto the bus; a single display slot shows
//! the latest one and hides it after a fixed window. There is no queue: a new
//! notification replaces the one on screen.

use std::sync::Arc;

use chrono::Utc;
use paydesk_bus::{BusPublisher, EventBus, Topic};
use paydesk_schema::{BusMessage, Notification, NotificationKind};
use tokio::sync::{mpsc, RwLock};
use tokio::time::Duration;

#[derive(Clone)]
pub struct Notifier {
    publisher: BusPublisher,
}

impl Notifier {
    pub fn new(bus: &EventBus) -> Self {
        Self {
            publisher: bus.publisher(),
        }
    }

    pub async fn publish(&self, notification: Notification) {
        tracing::debug!(kind = ?notification.kind, message = %notification.message, "notification published");
        let _ = self
            .publisher
            .publish(BusMessage::NotificationPublished {
                notification,
                at: Utc::now(),
            })
            .await;
    }

    pub async fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        self.publish(Notification::new(kind, message)).await;
    }
}

#[derive(Debug, Default)]
struct Displayed {
    generation: u64,
    current: Option<Notification>,
}

/// The one place a notification is visible. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct NotificationSlot {
    inner: Arc<RwLock<Displayed>>,
}

impl NotificationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Notification> {
        self.inner.read().await.current.clone()
    }

    /// Show `notification`, replacing whatever is showing. Returns the
    /// generation the matching dismissal must present.
    pub async fn show(&self, notification: Notification) -> u64 {
        let mut displayed = self.inner.write().await;
        displayed.generation += 1;
        displayed.current = Some(notification);
        displayed.generation
    }

    /// Hide the notification shown under `generation`. A newer notification
    /// stays visible.
    pub async fn dismiss(&self, generation: u64) -> bool {
        let mut displayed = self.inner.write().await;
        if displayed.generation != generation || displayed.current.is_none() {
            return false;
        }
        displayed.current = None;
        true
    }
}

/// Subscriber that feeds bus notifications into a [`NotificationSlot`].
pub struct NotificationCenter {
    slot: NotificationSlot,
    display_for: Duration,
    rx: mpsc::Receiver<BusMessage>,
}

impl NotificationCenter {
    pub async fn subscribe(bus: &EventBus, display_ms: u64) -> Self {
        Self {
            slot: NotificationSlot::new(),
            display_for: Duration::from_millis(display_ms),
            rx: bus.subscribe(Topic::NotificationPublished).await,
        }
    }

    pub fn slot(&self) -> NotificationSlot {
        self.slot.clone()
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            let BusMessage::NotificationPublished { notification, .. } = msg else {
                continue;
            };
            let message = notification.message.clone();
            let generation = self.slot.show(notification).await;
            tracing::info!(generation, %message, "notification shown");

            let slot = self.slot.clone();
            let display_for = self.display_for;
            tokio::spawn(async move {
                tokio::time::sleep(display_for).await;
                if slot.dismiss(generation).await {
                    tracing::debug!(generation, "notification dismissed");
                }
            });
        }
    }
}
