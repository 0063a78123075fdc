//! Ledger operations over a customer record.
//!
//! Every operation is a pure function of the current record: it returns a
//! whole new record plus the notification to show the agent. Balances are
//! floored at zero instead of failing.

use chrono::NaiveDate;
use paydesk_schema::{Customer, LedgerOperation, Money, Notification};
use serde::{Deserialize, Serialize};

use crate::calendar::format_display_date;
use crate::method::MethodUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTarget {
    Plan,
    Utility,
    Both,
}

impl PaymentTarget {
    pub fn describe(self) -> &'static str {
        match self {
            PaymentTarget::Plan => "payment plan",
            PaymentTarget::Utility => "utility bill",
            PaymentTarget::Both => "payment plan and utility bill",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerOutcome {
    pub operation: LedgerOperation,
    pub account: Customer,
    pub notification: Notification,
}

pub fn apply_payment(
    account: &Customer,
    amount: Money,
    target: PaymentTarget,
    method: &str,
) -> LedgerOutcome {
    let (plan_portion, utility_portion) = match target {
        PaymentTarget::Plan => (amount, Money::ZERO),
        PaymentTarget::Utility => (Money::ZERO, amount),
        PaymentTarget::Both => {
            let plan = amount.min(account.next_payment);
            (plan, amount - plan)
        }
    };

    let mut next = account.clone();
    next.payment_plan_balance = next.payment_plan_balance.floored_sub(plan_portion);
    next.next_payment = next.next_payment.floored_sub(plan_portion);
    next.utility_total_balance = next.utility_total_balance.floored_sub(utility_portion);

    tracing::info!(
        account_id = %account.id,
        %amount,
        ?target,
        method,
        plan_portion = %plan_portion,
        utility_portion = %utility_portion,
        "payment applied"
    );

    LedgerOutcome {
        operation: LedgerOperation::ApplyPayment,
        account: next,
        notification: Notification::sent(format!(
            "Payment of {amount} to {} processed successfully",
            target.describe()
        )),
    }
}

/// Replace the method on the most recent receipt. Older receipts are history
/// and stay untouched; without a receipt there is nothing to update.
pub fn update_method(account: &Customer, update: &MethodUpdate) -> LedgerOutcome {
    let mut next = account.clone();
    match next.payments.first_mut().and_then(|p| p.receipt.as_mut()) {
        Some(receipt) => {
            update.apply_to(receipt);
            tracing::info!(account_id = %account.id, method = %update.description, "payment method updated");
        }
        None => {
            tracing::debug!(account_id = %account.id, "no receipt to update, method change skipped");
        }
    }

    LedgerOutcome {
        operation: LedgerOperation::UpdateMethod,
        account: next,
        notification: Notification::sent("Payment method updated successfully"),
    }
}

pub fn reschedule(account: &Customer, new_date: NaiveDate) -> LedgerOutcome {
    let formatted = format_display_date(new_date);
    let mut next = account.clone();
    next.next_payment_date = formatted.clone();

    tracing::info!(account_id = %account.id, date = %formatted, "payment plan rescheduled");

    LedgerOutcome {
        operation: LedgerOperation::Reschedule,
        account: next,
        notification: Notification::sent(format!("Payment plan rescheduled to {formatted}")),
    }
}

/// Move `amount` of utility balance into the plan.
///
/// The installment is recomputed over the months already elapsed
/// (`plan_length - months_remaining`); when none have elapsed it is left as is.
pub fn roll_in(account: &Customer, amount: Money) -> LedgerOutcome {
    let mut next = account.clone();
    next.payment_plan_balance = next.payment_plan_balance + amount;
    next.utility_total_balance = next.utility_total_balance.floored_sub(amount);

    let months = next.months_elapsed();
    if months > 0 {
        next.next_payment = next.payment_plan_balance.split(months);
    }

    tracing::info!(
        account_id = %account.id,
        %amount,
        months,
        next_payment = %next.next_payment,
        "balance rolled into plan"
    );

    LedgerOutcome {
        operation: LedgerOperation::RollIn,
        account: next,
        notification: Notification::sent(format!("{amount} rolled into payment plan")),
    }
}

/// Edited contact details. Fields left `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.address.is_none()
    }
}

/// Merge edited contact details into the record. Balances, plan and history
/// are untouched.
pub fn update_profile(account: &Customer, update: &ProfileUpdate) -> LedgerOutcome {
    let mut next = account.clone();
    let fields = [
        (&mut next.name, &update.name),
        (&mut next.email, &update.email),
        (&mut next.phone, &update.phone),
        (&mut next.address, &update.address),
    ];
    let mut changed = 0;
    for (field, value) in fields {
        if let Some(value) = value {
            let value = value.trim();
            if !value.is_empty() && field.as_str() != value {
                *field = value.to_string();
                changed += 1;
            }
        }
    }

    tracing::info!(account_id = %account.id, changed, "customer profile updated");

    LedgerOutcome {
        operation: LedgerOperation::UpdateProfile,
        account: next,
        notification: Notification::sent("Customer details updated"),
    }
}

/// Largest amount the payment form accepts for `target`.
pub fn max_payment(account: &Customer, target: PaymentTarget) -> Money {
    match target {
        PaymentTarget::Plan => account.next_payment,
        PaymentTarget::Utility => account.utility_total_balance,
        PaymentTarget::Both => account.next_payment + account.utility_total_balance,
    }
}

pub fn roll_in_ceiling(account: &Customer) -> Money {
    account.utility_total_balance
}
