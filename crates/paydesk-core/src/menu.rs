use paydesk_schema::{Customer, Notification, NotificationKind};
use serde::{Deserialize, Serialize};

/// Entries of the "Manage plan" menu on the account card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagePlanAction {
    MakePayment,
    UpdatePaymentMethod,
    Reschedule,
    RollInBalance,
    OneTimeExtension,
    NotEligibleForExtension,
}

impl ManagePlanAction {
    pub fn label(self) -> &'static str {
        match self {
            ManagePlanAction::MakePayment => "Make payment",
            ManagePlanAction::UpdatePaymentMethod => "Update payment method",
            ManagePlanAction::Reschedule => "Reschedule",
            ManagePlanAction::RollInBalance => "Roll-in balance",
            ManagePlanAction::OneTimeExtension => "One time extension",
            ManagePlanAction::NotEligibleForExtension => "Not eligible for extension",
        }
    }

    /// The ineligible entry is shown greyed out.
    pub fn is_enabled(self) -> bool {
        self != ManagePlanAction::NotEligibleForExtension
    }
}

pub fn manage_plan_actions(account: &Customer) -> Vec<ManagePlanAction> {
    vec![
        ManagePlanAction::MakePayment,
        ManagePlanAction::UpdatePaymentMethod,
        ManagePlanAction::Reschedule,
        ManagePlanAction::RollInBalance,
        if account.eligible_for_extension {
            ManagePlanAction::OneTimeExtension
        } else {
            ManagePlanAction::NotEligibleForExtension
        },
    ]
}

/// "Send to customer" shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendAction {
    CopyPaymentLink,
    AccountPage,
    Faq,
    Application,
    Email,
    Sms,
}

impl SendAction {
    pub const ALL: [SendAction; 6] = [
        SendAction::CopyPaymentLink,
        SendAction::AccountPage,
        SendAction::Faq,
        SendAction::Application,
        SendAction::Email,
        SendAction::Sms,
    ];

    pub fn notification(self) -> Notification {
        match self {
            SendAction::CopyPaymentLink => {
                Notification::new(NotificationKind::Copy, "Payment link copied to clipboard")
            }
            SendAction::AccountPage => Notification::sent("Account page sent to user"),
            SendAction::Faq => Notification::sent("FAQ sent to user"),
            SendAction::Application => Notification::sent("Application sent to user"),
            SendAction::Email => Notification::new(NotificationKind::Email, "Email sent"),
            SendAction::Sms => Notification::new(NotificationKind::Sms, "SMS sent"),
        }
    }
}
