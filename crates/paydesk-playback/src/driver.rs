use std::sync::Arc;

use paydesk_bus::{BusPublisher, EventBus};
use paydesk_schema::{BusMessage, TranscriptMessage};
use tokio::sync::Mutex;
use tokio::time::{interval_at, sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{CallSession, PlaybackConfig, RevealStep, ScriptLayout, SessionSnapshot};

/// Drives a [`CallSession`] in real time: one timer task per answered call
/// reveals the transcript and ticks the duration counter.
pub struct PlaybackDriver {
    session: Arc<Mutex<CallSession>>,
    messages: Arc<Vec<TranscriptMessage>>,
    config: PlaybackConfig,
    publisher: BusPublisher,
    timers: Mutex<Option<CancellationToken>>,
}

impl PlaybackDriver {
    pub fn new(messages: Vec<TranscriptMessage>, config: PlaybackConfig, bus: &EventBus) -> Self {
        let layout = ScriptLayout::from_messages(&messages);
        Self {
            session: Arc::new(Mutex::new(CallSession::new(layout))),
            messages: Arc::new(messages),
            config,
            publisher: bus.publisher(),
            timers: Mutex::new(None),
        }
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Messages currently on screen, oldest first.
    pub async fn visible_messages(&self) -> Vec<TranscriptMessage> {
        let visible = self.session.lock().await.visible();
        self.messages[..visible.min(self.messages.len())].to_vec()
    }

    pub async fn open(&self) -> bool {
        self.session.lock().await.open()
    }

    pub async fn answer(&self) -> Option<u64> {
        let (generation, messages, plan) = {
            let mut session = self.session.lock().await;
            let generation = session.answer()?;
            let layout = session.layout();
            if layout.is_empty() {
                tracing::warn!(generation, "call answered with an empty transcript");
            }
            let plan = layout.reveal_plan(self.config.reveal_step_ms, self.config.reveal_jitter_ms);
            (generation, layout.len(), plan)
        };

        let token = CancellationToken::new();
        if let Some(previous) = self.timers.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        tracing::info!(generation, messages, reveals = plan.len(), "call answered");
        let _ = self
            .publisher
            .publish(BusMessage::CallAnswered { generation })
            .await;

        tokio::spawn(run_timers(
            Arc::clone(&self.session),
            self.publisher.clone(),
            generation,
            plan,
            Duration::from_millis(self.config.tick_ms),
            token,
        ));
        Some(generation)
    }

    pub async fn close(&self) {
        if let Some(token) = self.timers.lock().await.take() {
            token.cancel();
        }
        let generation = self.session.lock().await.close();
        tracing::info!(generation, "call panel closed");
        let _ = self
            .publisher
            .publish(BusMessage::CallClosed { generation })
            .await;
    }

    /// Returns true when the success message was revealed by this call.
    pub async fn apply_reschedule(&self) -> bool {
        let (applied, snapshot) = {
            let mut session = self.session.lock().await;
            (session.apply_reschedule(), session.snapshot())
        };
        if applied {
            tracing::info!(generation = snapshot.generation, visible = snapshot.visible, "reschedule applied");
            let _ = self
                .publisher
                .publish(BusMessage::RescheduleApplied {
                    generation: snapshot.generation,
                    visible: snapshot.visible,
                })
                .await;
        } else {
            tracing::debug!(visible = snapshot.visible, "apply reschedule ignored");
        }
        applied
    }

    pub async fn view_impact(&self) {
        self.set_impact(true).await;
    }

    pub async fn dismiss_impact(&self) {
        self.set_impact(false).await;
    }

    async fn set_impact(&self, shown: bool) {
        let generation = {
            let mut session = self.session.lock().await;
            if shown {
                session.show_impact();
            } else {
                session.dismiss_impact();
            }
            session.generation()
        };
        let _ = self
            .publisher
            .publish(BusMessage::ImpactToggled { generation, shown })
            .await;
    }
}

async fn run_timers(
    session: Arc<Mutex<CallSession>>,
    publisher: BusPublisher,
    generation: u64,
    plan: Vec<RevealStep>,
    tick: Duration,
    token: CancellationToken,
) {
    let start = Instant::now();
    let mut ticker = interval_at(start + tick, tick);
    let mut pending = plan.into_iter().peekable();

    loop {
        let next_reveal = pending
            .peek()
            .map(|step| start + Duration::from_millis(step.delay_ms));

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = sleep_until(next_reveal.unwrap_or(start)), if next_reveal.is_some() => {
                let Some(step) = pending.next() else { continue };
                let (revealed, live) = {
                    let mut session = session.lock().await;
                    (session.reveal(generation, step.index), session.generation() == generation)
                };
                if !live {
                    break;
                }
                if let Some(visible) = revealed {
                    tracing::debug!(generation, visible, "transcript message revealed");
                    let _ = publisher
                        .publish(BusMessage::TranscriptRevealed { generation, visible })
                        .await;
                }
            }
            _ = ticker.tick() => {
                let Some(seconds) = session.lock().await.tick(generation) else {
                    break;
                };
                let _ = publisher
                    .publish(BusMessage::DurationTick { generation, seconds })
                    .await;
            }
        }
    }

    tracing::debug!(generation, "call timers stopped");
}
