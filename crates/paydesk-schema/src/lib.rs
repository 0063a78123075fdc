mod money;

pub use money::{Money, ParseMoneyError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub account_number: String,
    pub utility_total_balance: Money,
    pub payment_plan_balance: Money,
    pub next_payment: Money,
    pub next_payment_date: String,
    pub plan_length: u32,
    pub months_remaining: u32,
    #[serde(default = "default_true")]
    pub active_plan: bool,
    #[serde(default)]
    pub auto_pay: bool,
    #[serde(default)]
    pub eligible_for_extension: bool,
    #[serde(default)]
    pub eligible_for_roll_in: bool,
    /// Newest first.
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Customer {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Months of the plan already elapsed.
    pub fn months_elapsed(&self) -> u32 {
        self.plan_length.saturating_sub(self.months_remaining)
    }

    /// Receipt of the most recent payment, used to describe the current default method.
    pub fn latest_receipt(&self) -> Option<&Receipt> {
        self.payments.first().and_then(|payment| payment.receipt.as_ref())
    }
}

/// Another account held by the same person, offered in the account switcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub account_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentlyViewed {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub date: String,
    pub amount: Money,
    pub status: PaymentStatus,
    #[serde(default)]
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Upcoming,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub reference_id: String,
    pub payment_method: String,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub bank_account_last4: Option<String>,
    #[serde(default)]
    pub card_brand: Option<String>,
    #[serde(default)]
    pub card_last4: Option<String>,
    pub transaction_date: String,
    pub transaction_time: String,
    #[serde(default)]
    pub billing_address: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Customer,
    System,
    Agent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionVariant {
    Primary,
    #[default]
    Secondary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ApplyReschedule,
    ViewImpact,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptAction {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub variant: ActionVariant,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptMessage {
    pub id: String,
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: String,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub actions: Vec<TranscriptAction>,
    /// Id of the action that must be taken before this message can appear.
    #[serde(default)]
    pub reveals_after: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptScript {
    pub messages: Vec<TranscriptMessage>,
    /// Date the scripted reschedule moves the next payment to.
    #[serde(default)]
    pub reschedule_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Copy,
    Sent,
    Email,
    Sms,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
        }
    }

    pub fn sent(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Sent, message)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOperation {
    ApplyPayment,
    UpdateMethod,
    Reschedule,
    RollIn,
    UpdateProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BusMessage {
    NotificationPublished {
        notification: Notification,
        at: DateTime<Utc>,
    },
    AccountUpdated {
        account_id: String,
        operation: LedgerOperation,
        at: DateTime<Utc>,
    },
    AccountSelected {
        account_id: String,
        previous_id: String,
        at: DateTime<Utc>,
    },
    CallAnswered {
        generation: u64,
    },
    CallClosed {
        generation: u64,
    },
    TranscriptRevealed {
        generation: u64,
        visible: usize,
    },
    RescheduleApplied {
        generation: u64,
        visible: usize,
    },
    ImpactToggled {
        generation: u64,
        shown: bool,
    },
    DurationTick {
        generation: u64,
        seconds: u64,
    },
}

fn default_true() -> bool {
    true
}
