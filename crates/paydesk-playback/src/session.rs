use serde::Serialize;

use crate::layout::ScriptLayout;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    Idle,
    Waiting,
    Answered,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: CallPhase,
    pub generation: u64,
    pub duration_seconds: u64,
    pub visible: usize,
    pub impact_shown: bool,
}

/// State of one call panel.
///
/// Every answer and every close starts a new generation. Timer callbacks
/// carry the generation they were scheduled under and are ignored once it is
/// stale, so a late reveal or tick from an old session never shows up.
#[derive(Debug, Clone)]
pub struct CallSession {
    layout: ScriptLayout,
    phase: CallPhase,
    generation: u64,
    duration_seconds: u64,
    visible: usize,
    impact_shown: bool,
}

impl CallSession {
    pub fn new(layout: ScriptLayout) -> Self {
        Self {
            layout,
            phase: CallPhase::Idle,
            generation: 0,
            duration_seconds: 0,
            visible: 0,
            impact_shown: false,
        }
    }

    pub fn layout(&self) -> &ScriptLayout {
        &self.layout
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            generation: self.generation,
            duration_seconds: self.duration_seconds,
            visible: self.visible,
            impact_shown: self.impact_shown,
        }
    }

    /// Panel opened. Returns false if it was already open.
    pub fn open(&mut self) -> bool {
        if self.phase != CallPhase::Idle {
            return false;
        }
        self.phase = CallPhase::Waiting;
        true
    }

    /// Answer the waiting call. Returns the generation the new timers belong to.
    pub fn answer(&mut self) -> Option<u64> {
        if self.phase != CallPhase::Waiting {
            return None;
        }
        self.generation += 1;
        self.phase = CallPhase::Answered;
        self.duration_seconds = 0;
        self.visible = 0;
        self.impact_shown = false;
        Some(self.generation)
    }

    /// Close the panel from any phase and discard the session.
    pub fn close(&mut self) -> u64 {
        let closed = self.generation;
        self.generation += 1;
        self.phase = CallPhase::Idle;
        self.duration_seconds = 0;
        self.visible = 0;
        self.impact_shown = false;
        closed
    }

    fn is_live(&self, generation: u64) -> bool {
        self.phase == CallPhase::Answered && self.generation == generation
    }

    /// Timer reveal of message `index`. Returns the new visible count when it changed.
    pub fn reveal(&mut self, generation: u64, index: usize) -> Option<usize> {
        if !self.is_live(generation) || index >= self.layout.auto_reveal_limit() {
            return None;
        }
        let next = self.visible.max(index + 1);
        if next == self.visible {
            return None;
        }
        self.visible = next;
        Some(next)
    }

    pub fn tick(&mut self, generation: u64) -> Option<u64> {
        if !self.is_live(generation) {
            return None;
        }
        self.duration_seconds += 1;
        Some(self.duration_seconds)
    }

    /// Reveal the success message. Only valid while the action message is the
    /// last one showing; anything else, including a second apply, is a no-op.
    pub fn apply_reschedule(&mut self) -> bool {
        let (Some(action), Some(gated)) = (self.layout.action_index(), self.layout.gated_index())
        else {
            return false;
        };
        if self.phase != CallPhase::Answered || self.visible != action + 1 {
            return false;
        }
        self.visible = gated + 1;
        true
    }

    pub fn show_impact(&mut self) {
        self.impact_shown = true;
    }

    pub fn dismiss_impact(&mut self) {
        self.impact_shown = false;
    }

    pub fn impact_shown(&self) -> bool {
        self.impact_shown
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }
}

/// `MM:SS`; minutes keep counting past 59.
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
