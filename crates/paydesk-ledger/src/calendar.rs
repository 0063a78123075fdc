use chrono::{Datelike, Days, Months, NaiveDate};
use paydesk_schema::Customer;
use serde::Serialize;

/// `Jan 7, 2026`
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Parse the long form used in payment history (`December 27th, 2025`),
/// as well as the short form produced by [`format_display_date`].
pub fn parse_display_date(text: &str) -> Option<NaiveDate> {
    let cleaned: Vec<String> = text
        .split_whitespace()
        .map(|token| {
            let trimmed = token.trim_end_matches(',');
            let stripped = ["st", "nd", "rd", "th"]
                .iter()
                .find_map(|suffix| {
                    trimmed
                        .strip_suffix(suffix)
                        .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
                })
                .unwrap_or(trimmed);
            stripped.to_string()
        })
        .collect();
    let normalized = cleaned.join(" ");

    ["%B %d %Y", "%b %d %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RescheduleOption {
    pub label: &'static str,
    pub date: NaiveDate,
}

impl RescheduleOption {
    pub fn value(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Quick picks offered next to the calendar: one and two weeks out, one and
/// two months out.
pub fn reschedule_options(today: NaiveDate) -> Vec<RescheduleOption> {
    let mut options = Vec::with_capacity(4);
    for (label, days) in [("1 week from now", 7), ("2 weeks from now", 14)] {
        if let Some(date) = today.checked_add_days(Days::new(days)) {
            options.push(RescheduleOption { label, date });
        }
    }
    for (label, months) in [("1 month from now", 1), ("2 months from now", 2)] {
        if let Some(date) = today.checked_add_months(Months::new(months)) {
            options.push(RescheduleOption { label, date });
        }
    }
    options
}

/// Preview of what a reschedule to `new_date` does to the payment history:
/// the earliest payment moves to `new_date` and each later one lands on the
/// same day of the following months.
pub fn impact_preview(account: &Customer, new_date: NaiveDate) -> String {
    let mut dated: Vec<_> = account
        .payments
        .iter()
        .filter_map(|payment| parse_display_date(&payment.date).map(|date| (date, payment.amount)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let mut lines = Vec::with_capacity(dated.len());
    for (offset, (date, amount)) in dated.iter().enumerate() {
        let Some(moved) = new_date.checked_add_months(Months::new(offset as u32)) else {
            continue;
        };
        lines.push(format!(
            "{} {} → {} ({amount})",
            date.format("%b"),
            date.day(),
            format_display_date(moved)
        ));
    }

    let mut preview = String::from("If you apply this reschedule, the following will happen:\n\n");
    if lines.is_empty() {
        preview.push_str(&format!(
            "Next payment will move to {}\n",
            format_display_date(new_date)
        ));
    } else {
        preview.push_str("Payment dates will change:\n");
        preview.push_str(&lines.join("\n"));
        preview.push('\n');
    }
    preview.push_str(&format!(
        "\n{} will be notified via Email & SMS",
        account.first_name()
    ));
    preview
}
