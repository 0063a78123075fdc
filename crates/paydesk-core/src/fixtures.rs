//! Built-in seed used when the config directory does not provide its own
//! `customer.yaml` or `transcript.yaml`.

use chrono::NaiveDate;
use paydesk_schema::{
    ActionKind, ActionVariant, Customer, LinkedAccount, Money, Payment, PaymentStatus, Receipt,
    RecentlyViewed, Speaker, TranscriptAction, TranscriptMessage, TranscriptScript,
};

pub const APPLY_RESCHEDULE_ACTION: &str = "apply-reschedule";
pub const VIEW_IMPACT_ACTION: &str = "view-impact";

pub fn seed_customer() -> Customer {
    let history = [
        ("March 27th, 2026", "TXN-2026-03-27-003456", "Chase Bank", "7892"),
        ("February 27th, 2026", "TXN-2026-02-27-009012", "Wells Fargo", "2341"),
        ("January 27th, 2026", "TXN-2026-01-27-005678", "Bank of America", "4563"),
        ("December 27th, 2025", "TXN-2025-12-27-001234", "Chase Bank", "7892"),
    ];

    Customer {
        id: "142612-0005065".to_string(),
        name: "Sarah Johnson".to_string(),
        email: "s.johnson@aol.com".to_string(),
        phone: "(555) 123-4567".to_string(),
        address: "2847 Sunset Blvd, Los Angeles, CA 90026".to_string(),
        account_number: "#142612-0005065".to_string(),
        utility_total_balance: Money::from_cents(72_415),
        payment_plan_balance: Money::from_cents(48_276),
        next_payment: Money::from_cents(12_069),
        next_payment_date: "December 27th, 2025".to_string(),
        plan_length: 6,
        months_remaining: 4,
        active_plan: true,
        auto_pay: true,
        eligible_for_extension: false,
        eligible_for_roll_in: false,
        payments: history
            .iter()
            .map(|(date, reference, bank, last4)| Payment {
                date: date.to_string(),
                amount: Money::from_cents(12_069),
                status: PaymentStatus::Paid,
                receipt: Some(Receipt {
                    reference_id: reference.to_string(),
                    payment_method: "Bank Account".to_string(),
                    bank_name: Some(bank.to_string()),
                    bank_account_last4: Some(last4.to_string()),
                    card_brand: Some("Visa".to_string()),
                    card_last4: Some("4242".to_string()),
                    transaction_date: date.to_string(),
                    transaction_time: "10:34 AM".to_string(),
                    billing_address: None,
                }),
            })
            .collect(),
    }
}

/// Accounts sharing the seed customer's identity, offered by the account
/// switcher.
pub fn linked_accounts() -> Vec<LinkedAccount> {
    let sunset = "2847 Sunset Blvd, Los Angeles, CA 90026";
    [
        ("142612-0005065", "Sarah Johnson", Some(sunset)),
        ("142612-0005123", "Sarah J. Johnson", Some(sunset)),
        ("142612-0005234", "S. Johnson", None),
        ("142612-0005345", "Sarah Johnson", Some("4521 Hollywood Blvd, Los Angeles, CA 90027")),
    ]
    .into_iter()
    .map(|(id, name, address)| LinkedAccount {
        id: id.to_string(),
        name: name.to_string(),
        address: address.map(str::to_string),
        account_number: format!("#{id}"),
    })
    .collect()
}

pub fn seed_recently_viewed() -> Vec<RecentlyViewed> {
    [("1", "Michael Chen"), ("2", "Emily Rodriguez"), ("3", "David Thompson")]
        .into_iter()
        .map(|(id, name)| RecentlyViewed {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Customer record shown after switching to `linked`. Balances and history
/// come from `template`; identity fields come from the linked entry.
pub fn customer_for_linked(template: &Customer, linked: &LinkedAccount) -> Customer {
    let mut customer = template.clone();
    customer.id = linked.id.clone();
    customer.name = linked.name.clone();
    customer.account_number = linked.account_number.clone();
    if let Some(address) = &linked.address {
        customer.address = address.clone();
    }
    customer
}

pub fn seed_script() -> TranscriptScript {
    let line = |id: &str, speaker: Speaker, text: &str, timestamp: &str| TranscriptMessage {
        id: id.to_string(),
        speaker,
        text: text.to_string(),
        timestamp: timestamp.to_string(),
        metadata: None,
        actions: Vec::new(),
        reveals_after: None,
    };

    let mut predictive = line(
        "3",
        Speaker::Agent,
        "Caller may want the answers to these questions next: Next payment due date: 12/27/2025 Next payment amount: $120.69",
        "14:19",
    );
    predictive.metadata = Some("Predictive".to_string());

    let mut history = line(
        "7",
        Speaker::Agent,
        "Sarah has successfully completed 2 previous payments on time. Good payment history — consider offering flexibility",
        "14:22",
    );
    history.metadata = Some("Payment History".to_string());

    let mut eligibility = line(
        "8",
        Speaker::Agent,
        "Sarah is eligible for a one-time reschedule. Moving payment to January 7th will shift all remaining payments by 11 days. No fees apply.",
        "14:23",
    );
    eligibility.metadata = Some("Eligibility Check".to_string());
    eligibility.actions = vec![
        TranscriptAction {
            id: APPLY_RESCHEDULE_ACTION.to_string(),
            label: "Apply reschedule".to_string(),
            variant: ActionVariant::Primary,
            kind: ActionKind::ApplyReschedule,
        },
        TranscriptAction {
            id: VIEW_IMPACT_ACTION.to_string(),
            label: "View impact".to_string(),
            variant: ActionVariant::Secondary,
            kind: ActionKind::ViewImpact,
        },
    ];

    let mut applied = line(
        "9",
        Speaker::Agent,
        "Reschedule Applied Successfully\n\nPayment dates have been updated:\nDec 27 → Jan 7, 2026 ($120.69)\nJan 27 → Feb 7, 2026 ($120.69)\nFeb 27 → Mar 7, 2026 ($120.69)\nMar 27 → Apr 7, 2026 ($120.69)\n\n→ Sarah has been notified via Email & SMS",
        "14:24",
    );
    applied.metadata = Some("Action Completed".to_string());
    applied.reveals_after = Some(APPLY_RESCHEDULE_ACTION.to_string());

    TranscriptScript {
        messages: vec![
            line(
                "1",
                Speaker::Customer,
                "Hello, I was calling to see what my current balance is?",
                "14:18",
            ),
            line("2", Speaker::System, "Your current balance is $482.76", "14:19"),
            predictive,
            line(
                "4",
                Speaker::Customer,
                "I think my next payment is coming up and I'm wondering if I can change the date?",
                "14:20",
            ),
            line(
                "5",
                Speaker::System,
                "Of course, I can help you with that. I see you have a payment of $120.69 due on December 27th. What date would work better for you?",
                "14:21",
            ),
            line(
                "6",
                Speaker::Customer,
                "Could we move it to the 7th of January? That's when I get paid.",
                "14:22",
            ),
            history,
            eligibility,
            applied,
        ],
        reschedule_to: NaiveDate::from_ymd_opt(2026, 1, 7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_script_gates_the_success_message() {
        let script = seed_script();
        assert_eq!(script.messages.len(), 9);
        let action_index = script
            .messages
            .iter()
            .position(|m| m.actions.iter().any(|a| a.kind == ActionKind::ApplyReschedule))
            .unwrap();
        assert_eq!(action_index, 7);
        assert_eq!(
            script.messages[action_index + 1].reveals_after.as_deref(),
            Some(APPLY_RESCHEDULE_ACTION)
        );
    }

    #[test]
    fn seed_history_is_newest_first() {
        let customer = seed_customer();
        assert_eq!(customer.payments[0].date, "March 27th, 2026");
        assert_eq!(
            customer.latest_receipt().and_then(|r| r.bank_name.as_deref()),
            Some("Chase Bank")
        );
    }

    #[test]
    fn linked_account_keeps_template_balances() {
        let seed = seed_customer();
        let linked = &linked_accounts()[2];
        let customer = customer_for_linked(&seed, linked);
        assert_eq!(customer.id, "142612-0005234");
        assert_eq!(customer.account_number, "#142612-0005234");
        assert_eq!(customer.address, seed.address);
        assert_eq!(customer.payment_plan_balance, seed.payment_plan_balance);
    }
}
