use paydesk_schema::{ActionKind, TranscriptMessage};
use rand::Rng;

/// Where the gate sits in a script.
///
/// A script normally contains one message offering "apply reschedule"; the
/// message right after it is the success message and only the agent can
/// reveal it. A script without such a message is played out in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLayout {
    len: usize,
    action_index: Option<usize>,
    first_declared_gate: Option<usize>,
}

impl ScriptLayout {
    pub fn from_messages(messages: &[TranscriptMessage]) -> Self {
        let action_index = messages.iter().position(|message| {
            message
                .actions
                .iter()
                .any(|action| action.kind == ActionKind::ApplyReschedule)
        });
        if action_index.is_none() {
            tracing::warn!(
                messages = messages.len(),
                "transcript has no apply-reschedule action, playing it ungated"
            );
        }
        let first_declared_gate = messages
            .iter()
            .position(|message| message.reveals_after.is_some());
        Self {
            len: messages.len(),
            action_index,
            first_declared_gate,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn action_index(&self) -> Option<usize> {
        self.action_index
    }

    /// Index of the message withheld until the action is taken.
    pub fn gated_index(&self) -> Option<usize> {
        self.action_index
            .map(|idx| idx + 1)
            .filter(|idx| *idx < self.len)
    }

    /// Highest visible count the timer alone may reach. In a gated script the
    /// timer also stops short of any message declaring `reveals_after`; a
    /// script without an action plays out in full regardless.
    pub fn auto_reveal_limit(&self) -> usize {
        match (self.action_index, self.first_declared_gate) {
            (Some(idx), Some(gate)) => (idx + 1).min(gate),
            (Some(idx), None) => idx + 1,
            (None, _) => self.len,
        }
    }

    /// Timer offsets for every auto-revealed message, strictly increasing in
    /// index as long as `jitter_ms < step_ms`.
    pub fn reveal_plan(&self, step_ms: u64, jitter_ms: u64) -> Vec<RevealStep> {
        let mut rng = rand::thread_rng();
        (0..self.auto_reveal_limit())
            .map(|index| {
                let jitter = if jitter_ms > 0 {
                    rng.gen_range(0..jitter_ms)
                } else {
                    0
                };
                RevealStep {
                    index,
                    delay_ms: (index as u64 + 1) * step_ms + jitter,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealStep {
    pub index: usize,
    pub delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use paydesk_schema::{ActionVariant, Speaker, TranscriptAction};

    fn message(id: &str, actions: Vec<TranscriptAction>) -> TranscriptMessage {
        TranscriptMessage {
            id: id.into(),
            speaker: Speaker::Agent,
            text: format!("message {id}"),
            timestamp: "14:20".into(),
            metadata: None,
            actions,
            reveals_after: None,
        }
    }

    fn apply_action() -> TranscriptAction {
        TranscriptAction {
            id: "apply".into(),
            label: "Apply reschedule".into(),
            variant: ActionVariant::Primary,
            kind: ActionKind::ApplyReschedule,
        }
    }

    #[test]
    fn finds_action_and_gate() {
        let messages = vec![
            message("1", vec![]),
            message("2", vec![]),
            message("3", vec![apply_action()]),
            message("4", vec![]),
            message("5", vec![]),
        ];
        let layout = ScriptLayout::from_messages(&messages);
        assert_eq!(layout.action_index(), Some(2));
        assert_eq!(layout.gated_index(), Some(3));
        assert_eq!(layout.auto_reveal_limit(), 3);
    }

    #[test]
    fn ungated_script_reveals_everything() {
        let messages = vec![message("1", vec![]), message("2", vec![])];
        let layout = ScriptLayout::from_messages(&messages);
        assert_eq!(layout.action_index(), None);
        assert_eq!(layout.gated_index(), None);
        assert_eq!(layout.auto_reveal_limit(), 2);
        assert_eq!(layout.reveal_plan(10, 0).len(), 2);
    }

    #[test]
    fn action_as_last_message_has_no_gate() {
        let messages = vec![message("1", vec![]), message("2", vec![apply_action()])];
        let layout = ScriptLayout::from_messages(&messages);
        assert_eq!(layout.gated_index(), None);
        assert_eq!(layout.auto_reveal_limit(), 2);
    }

    #[test]
    fn declared_gate_stops_the_timer_early() {
        let mut gated = message("2", vec![]);
        gated.reveals_after = Some("apply".into());
        let messages = vec![
            message("1", vec![]),
            gated,
            message("3", vec![apply_action()]),
            message("4", vec![]),
        ];
        let layout = ScriptLayout::from_messages(&messages);
        assert_eq!(layout.auto_reveal_limit(), 1);
    }

    #[test]
    fn script_missing_its_action_still_plays_gated_message() {
        let mut demoted = apply_action();
        demoted.kind = ActionKind::Other;
        let mut messages: Vec<_> = (0..9).map(|i| message(&i.to_string(), vec![])).collect();
        messages[7].actions.push(demoted);
        messages[8].reveals_after = Some("apply".into());

        let layout = ScriptLayout::from_messages(&messages);
        assert_eq!(layout.action_index(), None);
        assert_eq!(layout.auto_reveal_limit(), 9);
        assert_eq!(layout.reveal_plan(4_000, 0).len(), 9);
    }

    #[test]
    fn plan_delays_strictly_increase_with_jitter() {
        let messages: Vec<_> = (0..8)
            .map(|i| {
                let actions = if i == 7 { vec![apply_action()] } else { vec![] };
                message(&i.to_string(), actions)
            })
            .collect();
        let layout = ScriptLayout::from_messages(&messages);

        for _ in 0..50 {
            let plan = layout.reveal_plan(4_000, 3_999);
            assert_eq!(plan.len(), 8);
            for pair in plan.windows(2) {
                assert!(pair[0].delay_ms < pair[1].delay_ms);
                assert_eq!(pair[0].index + 1, pair[1].index);
            }
        }
    }
}
