use paydesk_bus::{EventBus, Topic};
use paydesk_playback::{CallPhase, PlaybackConfig, PlaybackDriver};
use paydesk_schema::{
    ActionKind, ActionVariant, BusMessage, Speaker, TranscriptAction, TranscriptMessage,
};
use tokio::time::{sleep, Duration};

const ACTION_INDEX: usize = 7;

fn call_script() -> Vec<TranscriptMessage> {
    (0..9)
        .map(|i| TranscriptMessage {
            id: (i + 1).to_string(),
            speaker: if i % 2 == 0 {
                Speaker::Customer
            } else {
                Speaker::Agent
            },
            text: format!("line {}", i + 1),
            timestamp: format!("14:{}", 18 + i),
            metadata: None,
            actions: if i == ACTION_INDEX {
                vec![
                    TranscriptAction {
                        id: "apply-reschedule".into(),
                        label: "Apply reschedule".into(),
                        variant: ActionVariant::Primary,
                        kind: ActionKind::ApplyReschedule,
                    },
                    TranscriptAction {
                        id: "view-impact".into(),
                        label: "View impact".into(),
                        variant: ActionVariant::Secondary,
                        kind: ActionKind::ViewImpact,
                    },
                ]
            } else {
                vec![]
            },
            reveals_after: (i == ACTION_INDEX + 1).then(|| "apply-reschedule".to_string()),
        })
        .collect()
}

fn config() -> PlaybackConfig {
    PlaybackConfig {
        reveal_step_ms: 4_000,
        reveal_jitter_ms: 1_000,
        tick_ms: 1_000,
    }
}

#[tokio::test(start_paused = true)]
async fn transcript_reveals_in_order_and_stops_at_action() {
    let bus = EventBus::new(64);
    let mut revealed_rx = bus.subscribe(Topic::TranscriptRevealed).await;
    let driver = PlaybackDriver::new(call_script(), config(), &bus);

    assert!(driver.open().await);
    assert_eq!(driver.snapshot().await.phase, CallPhase::Waiting);
    driver.answer().await.unwrap();

    sleep(Duration::from_millis(2_000)).await;
    assert_eq!(driver.snapshot().await.visible, 0);

    sleep(Duration::from_millis(4_000)).await;
    assert_eq!(driver.snapshot().await.visible, 1);

    sleep(Duration::from_millis(34_500)).await;
    let snapshot = driver.snapshot().await;
    assert_eq!(snapshot.visible, ACTION_INDEX + 1);
    assert_eq!(snapshot.duration_seconds, 40);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(driver.snapshot().await.visible, ACTION_INDEX + 1);
    assert_eq!(driver.visible_messages().await.len(), ACTION_INDEX + 1);

    let mut seen = Vec::new();
    while let Ok(msg) = revealed_rx.try_recv() {
        if let BusMessage::TranscriptRevealed { visible, .. } = msg {
            seen.push(visible);
        }
    }
    assert_eq!(seen, (1..=ACTION_INDEX + 1).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn apply_reschedule_reveals_success_once() {
    let bus = EventBus::new(64);
    let driver = PlaybackDriver::new(call_script(), config(), &bus);
    driver.open().await;
    driver.answer().await.unwrap();

    sleep(Duration::from_millis(10_500)).await;
    assert!(!driver.apply_reschedule().await);
    assert_eq!(driver.snapshot().await.visible, 2);

    sleep(Duration::from_secs(40)).await;
    assert!(driver.apply_reschedule().await);
    assert_eq!(driver.snapshot().await.visible, ACTION_INDEX + 2);
    assert!(!driver.apply_reschedule().await);
    assert_eq!(driver.snapshot().await.visible, ACTION_INDEX + 2);

    let shown = driver.visible_messages().await;
    assert_eq!(
        shown.last().and_then(|m| m.reveals_after.as_deref()),
        Some("apply-reschedule")
    );
}

#[tokio::test(start_paused = true)]
async fn view_impact_can_toggle_anytime() {
    let bus = EventBus::new(64);
    let driver = PlaybackDriver::new(call_script(), config(), &bus);
    driver.open().await;

    driver.view_impact().await;
    assert!(driver.snapshot().await.impact_shown);
    driver.dismiss_impact().await;

    driver.answer().await.unwrap();
    sleep(Duration::from_secs(45)).await;
    driver.view_impact().await;
    assert!(driver.apply_reschedule().await);
    let snapshot = driver.snapshot().await;
    assert!(snapshot.impact_shown);
    assert_eq!(snapshot.visible, ACTION_INDEX + 2);
}

#[tokio::test(start_paused = true)]
async fn close_resets_and_cancels_timers() {
    let bus = EventBus::new(64);
    let driver = PlaybackDriver::new(call_script(), config(), &bus);
    driver.open().await;
    driver.answer().await.unwrap();
    sleep(Duration::from_millis(6_500)).await;
    driver.view_impact().await;

    driver.close().await;
    sleep(Duration::from_secs(60)).await;

    let snapshot = driver.snapshot().await;
    assert_eq!(snapshot.phase, CallPhase::Idle);
    assert_eq!(snapshot.visible, 0);
    assert_eq!(snapshot.duration_seconds, 0);
    assert!(!snapshot.impact_shown);
}

#[tokio::test(start_paused = true)]
async fn timers_from_previous_session_have_no_effect() {
    let bus = EventBus::new(64);
    let driver = PlaybackDriver::new(call_script(), config(), &bus);
    driver.open().await;
    let first = driver.answer().await.unwrap();
    sleep(Duration::from_millis(6_500)).await;
    assert_eq!(driver.snapshot().await.visible, 1);

    driver.close().await;
    driver.open().await;
    let second = driver.answer().await.unwrap();
    assert!(second > first);

    sleep(Duration::from_millis(2_500)).await;
    let snapshot = driver.snapshot().await;
    assert_eq!(snapshot.visible, 0);
    assert_eq!(snapshot.duration_seconds, 2);

    sleep(Duration::from_millis(3_000)).await;
    assert_eq!(driver.snapshot().await.visible, 1);
}

#[tokio::test(start_paused = true)]
async fn script_without_action_plays_in_full() {
    let mut script = call_script();
    for message in &mut script {
        message.actions.clear();
        message.reveals_after = None;
    }
    let bus = EventBus::new(64);
    let driver = PlaybackDriver::new(script, config(), &bus);
    driver.open().await;
    driver.answer().await.unwrap();

    sleep(Duration::from_secs(60)).await;
    assert_eq!(driver.snapshot().await.visible, 9);
    assert!(!driver.apply_reschedule().await);
}

#[tokio::test(start_paused = true)]
async fn script_missing_action_reveals_gated_message_too() {
    let mut script = call_script();
    for action in &mut script[ACTION_INDEX].actions {
        action.kind = ActionKind::Other;
    }
    assert!(script[ACTION_INDEX + 1].reveals_after.is_some());

    let bus = EventBus::new(64);
    let driver = PlaybackDriver::new(script, config(), &bus);
    driver.open().await;
    driver.answer().await.unwrap();

    sleep(Duration::from_secs(60)).await;
    assert_eq!(driver.snapshot().await.visible, 9);
    assert!(!driver.apply_reschedule().await);
}

#[tokio::test(start_paused = true)]
async fn empty_transcript_still_counts_duration() {
    let bus = EventBus::new(64);
    let driver = PlaybackDriver::new(Vec::new(), config(), &bus);
    driver.open().await;
    driver.answer().await.unwrap();

    sleep(Duration::from_millis(3_500)).await;
    let snapshot = driver.snapshot().await;
    assert_eq!(snapshot.phase, CallPhase::Answered);
    assert_eq!(snapshot.visible, 0);
    assert_eq!(snapshot.duration_seconds, 3);
    assert!(driver.visible_messages().await.is_empty());
}
