use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Spacing between consecutive transcript reveals.
    #[serde(default = "default_reveal_step_ms")]
    pub reveal_step_ms: u64,
    /// Random extra delay per reveal, `[0, reveal_jitter_ms)`.
    #[serde(default = "default_reveal_jitter_ms")]
    pub reveal_jitter_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            reveal_step_ms: default_reveal_step_ms(),
            reveal_jitter_ms: default_reveal_jitter_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if self.reveal_step_ms == 0 {
            return Err(anyhow!("playback.reveal_step_ms must be greater than 0"));
        }
        // jitter at or above the step could let message i+1 overtake message i
        if self.reveal_jitter_ms >= self.reveal_step_ms {
            return Err(anyhow!(
                "playback.reveal_jitter_ms ({}) must be less than reveal_step_ms ({})",
                self.reveal_jitter_ms,
                self.reveal_step_ms
            ));
        }
        if self.tick_ms == 0 {
            return Err(anyhow!("playback.tick_ms must be greater than 0"));
        }
        Ok(())
    }

    /// Same schedule played `factor` times faster.
    pub fn accelerated(&self, factor: u64) -> Self {
        let factor = factor.max(1);
        let reveal_step_ms = (self.reveal_step_ms / factor).max(1);
        Self {
            reveal_step_ms,
            reveal_jitter_ms: (self.reveal_jitter_ms / factor).min(reveal_step_ms - 1),
            tick_ms: (self.tick_ms / factor).max(1),
        }
    }
}

fn default_reveal_step_ms() -> u64 {
    4_000
}

fn default_reveal_jitter_ms() -> u64 {
    1_000
}

fn default_tick_ms() -> u64 {
    1_000
}
