use std::{collections::HashSet, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use paydesk_playback::PlaybackConfig;
use paydesk_schema::{ActionKind, Customer, Money, TranscriptScript};
use serde::{Deserialize, Serialize};

use crate::fixtures::{seed_customer, seed_script};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub env: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_display_ms")]
    pub display_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            display_ms: default_display_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BusConfig {
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    pub app: AppConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub bus: BusConfig,
}

#[derive(Debug, Clone)]
pub struct PaydeskConfig {
    pub main: MainConfig,
    pub customer: Customer,
    pub script: TranscriptScript,
}

impl PaydeskConfig {
    /// Built-in configuration with the seed customer and call script.
    pub fn builtin() -> Self {
        Self {
            main: MainConfig {
                app: AppConfig {
                    name: "paydesk".to_string(),
                    env: "dev".to_string(),
                },
                playback: PlaybackConfig::default(),
                notifications: NotificationConfig::default(),
                bus: BusConfig::default(),
            },
            customer: seed_customer(),
            script: seed_script(),
        }
    }
}

fn default_display_ms() -> u64 {
    3_000
}

fn default_bus_capacity() -> usize {
    64
}

/// Load `main.yaml` plus the optional `customer.yaml` and `transcript.yaml`
/// from `root`. Missing optional files fall back to the built-in seed.
pub fn load_config(root: &Path) -> Result<PaydeskConfig> {
    let main: MainConfig = read_yaml_file(&root.join("main.yaml"))?;
    let customer = read_optional_yaml_file(&root.join("customer.yaml"))?
        .unwrap_or_else(seed_customer);
    let script = read_optional_yaml_file(&root.join("transcript.yaml"))?
        .unwrap_or_else(seed_script);

    let config = PaydeskConfig {
        main,
        customer,
        script,
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &PaydeskConfig) -> Result<()> {
    config.main.playback.validate()?;

    if config.main.notifications.display_ms == 0 {
        return Err(anyhow!("notifications.display_ms must be greater than 0"));
    }
    if config.main.bus.capacity == 0 {
        return Err(anyhow!("bus.capacity must be greater than 0"));
    }

    let customer = &config.customer;
    for (field, amount) in [
        ("utility_total_balance", customer.utility_total_balance),
        ("payment_plan_balance", customer.payment_plan_balance),
        ("next_payment", customer.next_payment),
    ] {
        if amount < Money::ZERO {
            return Err(anyhow!(
                "customer {}: {field} must not be negative, got {amount}",
                customer.id
            ));
        }
    }
    if customer.plan_length == 0 {
        return Err(anyhow!("customer {}: plan_length must be greater than 0", customer.id));
    }
    if customer.months_remaining > customer.plan_length {
        return Err(anyhow!(
            "customer {}: months_remaining ({}) exceeds plan_length ({})",
            customer.id,
            customer.months_remaining,
            customer.plan_length
        ));
    }

    let mut message_ids = HashSet::new();
    let mut action_ids = HashSet::new();
    for message in &config.script.messages {
        if !message_ids.insert(message.id.as_str()) {
            return Err(anyhow!("duplicate transcript message id: {}", message.id));
        }
        for action in &message.actions {
            action_ids.insert(action.id.as_str());
        }
    }

    for message in &config.script.messages {
        if let Some(gate) = &message.reveals_after {
            if !action_ids.contains(gate.as_str()) {
                return Err(anyhow!(
                    "transcript message {} reveals after unknown action: {}",
                    message.id,
                    gate
                ));
            }
        }
    }

    let action_index = config.script.messages.iter().position(|message| {
        message
            .actions
            .iter()
            .any(|action| action.kind == ActionKind::ApplyReschedule)
    });
    for (index, message) in config.script.messages.iter().enumerate() {
        if message.reveals_after.is_none() {
            continue;
        }
        match action_index {
            Some(action) if index != action + 1 => {
                return Err(anyhow!(
                    "transcript message {} is gated but does not follow the apply-reschedule message",
                    message.id
                ));
            }
            Some(_) => {}
            None => tracing::warn!(
                message_id = %message.id,
                "transcript has no apply-reschedule action, gated message will play ungated"
            ),
        }
    }

    let apply_actions = config
        .script
        .messages
        .iter()
        .flat_map(|message| &message.actions)
        .filter(|action| action.kind == ActionKind::ApplyReschedule)
        .count();
    if apply_actions > 1 {
        tracing::warn!(
            apply_actions,
            "transcript has several apply-reschedule actions, only the first gates playback"
        );
    }

    Ok(())
}

fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}

fn read_optional_yaml_file<T>(path: &Path) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.exists() {
        return Ok(None);
    }
    read_yaml_file(path).map(Some)
}
