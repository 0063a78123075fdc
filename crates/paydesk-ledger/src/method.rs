use paydesk_schema::{Customer, Receipt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MASK: &str = "••••";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MethodError {
    #[error("Bank name is required to continue.")]
    MissingBankName,
    #[error("Please enter the last 4 digits of the account.")]
    InvalidAccountLast4,
    #[error("Please enter the last 4 digits of the card.")]
    InvalidCardLast4,
    #[error("Please enter a valid card number.")]
    InvalidCardNumber,
    #[error("Venmo handle is required.")]
    MissingVenmoHandle,
    #[error("PayPal email is required.")]
    MissingPaypalEmail,
    #[error("Zelle email or phone is required.")]
    MissingZelleContact,
}

/// A payment method as entered by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Whatever the most recent receipt was paid with.
    Default,
    Bank { bank_name: String, last4: String },
    /// Only the trailing digits are kept once validated.
    Card { number: String },
    Venmo { handle: String },
    Paypal { email: String },
    Zelle { contact: String },
}

impl PaymentMethod {
    pub fn validate(&self) -> Result<(), MethodError> {
        match self {
            PaymentMethod::Default => Ok(()),
            PaymentMethod::Bank { bank_name, last4 } => {
                if bank_name.trim().is_empty() {
                    return Err(MethodError::MissingBankName);
                }
                if !is_last4(last4) {
                    return Err(MethodError::InvalidAccountLast4);
                }
                Ok(())
            }
            PaymentMethod::Card { number } => {
                let digits = digits_only(number);
                if digits.len() == 4 || digits.len() >= 13 {
                    Ok(())
                } else if digits.len() < 4 {
                    Err(MethodError::InvalidCardLast4)
                } else {
                    Err(MethodError::InvalidCardNumber)
                }
            }
            PaymentMethod::Venmo { handle } => required(handle, MethodError::MissingVenmoHandle),
            PaymentMethod::Paypal { email } => required(email, MethodError::MissingPaypalEmail),
            PaymentMethod::Zelle { contact } => {
                required(contact, MethodError::MissingZelleContact)
            }
        }
    }

    /// Trailing four characters identifying the method.
    pub fn last4(&self) -> String {
        match self {
            PaymentMethod::Default => String::new(),
            PaymentMethod::Bank { last4, .. } => last4.clone(),
            PaymentMethod::Card { number } => tail(&digits_only(number), 4),
            PaymentMethod::Venmo { handle } => tail(handle.trim(), 4),
            PaymentMethod::Paypal { email } => tail(email.trim(), 4),
            PaymentMethod::Zelle { contact } => tail(contact.trim(), 4),
        }
    }

    /// Human-readable descriptor. `Default` resolves against the account.
    pub fn describe(&self, account: &Customer) -> String {
        match self {
            PaymentMethod::Default => current_method_description(account),
            PaymentMethod::Bank { bank_name, last4 } => {
                format!("{} {MASK}{last4}", bank_name.trim())
            }
            PaymentMethod::Card { .. } => format!("Card {MASK}{}", self.last4()),
            PaymentMethod::Venmo { handle } => {
                format!("Venmo @{}", handle.trim().trim_start_matches('@'))
            }
            PaymentMethod::Paypal { email } => format!("PayPal {}", email.trim()),
            PaymentMethod::Zelle { contact } => format!("Zelle {}", contact.trim()),
        }
    }

    /// Validate and turn into the descriptor stored on the latest receipt.
    /// Venmo never carries a billing address.
    pub fn into_update(
        self,
        account: &Customer,
        billing_address: Option<String>,
    ) -> Result<MethodUpdate, MethodError> {
        self.validate()?;
        let billing_address = match self {
            PaymentMethod::Venmo { .. } => None,
            _ => billing_address.filter(|addr| !addr.trim().is_empty()),
        };
        Ok(MethodUpdate {
            description: self.describe(account),
            last4: self.last4(),
            bank_name: match &self {
                PaymentMethod::Bank { bank_name, .. } => Some(bank_name.trim().to_string()),
                _ => None,
            },
            is_card: matches!(self, PaymentMethod::Card { .. }),
            billing_address,
        })
    }
}

/// Validated method change, ready to be written onto a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodUpdate {
    pub description: String,
    pub last4: String,
    pub bank_name: Option<String>,
    pub is_card: bool,
    pub billing_address: Option<String>,
}

impl MethodUpdate {
    pub(crate) fn apply_to(&self, receipt: &mut Receipt) {
        receipt.payment_method = self.description.clone();
        receipt.billing_address = self.billing_address.clone();
        if self.is_card {
            receipt.card_last4 = Some(self.last4.clone());
            receipt.card_brand = None;
            receipt.bank_name = None;
            receipt.bank_account_last4 = None;
        } else if self.bank_name.is_some() {
            receipt.bank_name = self.bank_name.clone();
            receipt.bank_account_last4 = Some(self.last4.clone());
        } else {
            receipt.bank_name = None;
            receipt.bank_account_last4 = None;
        }
    }
}

/// Describe the method on the most recent receipt, the way the payment form
/// labels its "use default method" option.
pub fn current_method_description(account: &Customer) -> String {
    let Some(receipt) = account.latest_receipt() else {
        return "Default payment method".to_string();
    };
    match (&receipt.bank_name, &receipt.bank_account_last4) {
        (Some(bank), Some(last4)) => format!("{bank} {MASK}{last4}"),
        _ => match (&receipt.card_brand, &receipt.card_last4) {
            (Some(brand), Some(last4)) => format!("{brand} {MASK}{last4}"),
            (None, Some(last4)) => format!("Card {MASK}{last4}"),
            _ => receipt.payment_method.clone(),
        },
    }
}

fn required(value: &str, err: MethodError) -> Result<(), MethodError> {
    if value.trim().is_empty() {
        Err(err)
    } else {
        Ok(())
    }
}

fn is_last4(value: &str) -> bool {
    value.len() == 4 && value.chars().all(|c| c.is_ascii_digit())
}

fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn tail(value: &str, n: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    chars[chars.len().saturating_sub(n)..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use paydesk_schema::{Money, Payment, PaymentStatus};

    fn account_with_receipt() -> Customer {
        Customer {
            id: "1".into(),
            name: "Sarah Johnson".into(),
            email: String::new(),
            phone: String::new(),
            address: "2847 Sunset Blvd".into(),
            account_number: String::new(),
            utility_total_balance: Money::ZERO,
            payment_plan_balance: Money::ZERO,
            next_payment: Money::ZERO,
            next_payment_date: String::new(),
            plan_length: 6,
            months_remaining: 4,
            active_plan: true,
            auto_pay: true,
            eligible_for_extension: false,
            eligible_for_roll_in: false,
            payments: vec![Payment {
                date: "March 27th, 2026".into(),
                amount: Money::from_cents(12_069),
                status: PaymentStatus::Paid,
                receipt: Some(Receipt {
                    reference_id: "TXN-1".into(),
                    payment_method: "Bank Account".into(),
                    bank_name: Some("Chase Bank".into()),
                    bank_account_last4: Some("7892".into()),
                    card_brand: Some("Visa".into()),
                    card_last4: Some("4242".into()),
                    transaction_date: "March 27th, 2026".into(),
                    transaction_time: "10:34 AM".into(),
                    billing_address: None,
                }),
            }],
        }
    }

    #[test]
    fn bank_requires_name_and_four_digits() {
        let missing = PaymentMethod::Bank {
            bank_name: "  ".into(),
            last4: "1234".into(),
        };
        assert_eq!(missing.validate(), Err(MethodError::MissingBankName));

        let short = PaymentMethod::Bank {
            bank_name: "Chase".into(),
            last4: "12a".into(),
        };
        assert_eq!(short.validate(), Err(MethodError::InvalidAccountLast4));
        assert_eq!(
            MethodError::InvalidAccountLast4.to_string(),
            "Please enter the last 4 digits of the account."
        );
    }

    #[test]
    fn card_accepts_full_number_or_last4() {
        let full = PaymentMethod::Card {
            number: "4242 4242 4242 4242".into(),
        };
        assert!(full.validate().is_ok());
        assert_eq!(full.describe(&account_with_receipt()), "Card ••••4242");

        let short = PaymentMethod::Card {
            number: "4242 42".into(),
        };
        assert_eq!(short.validate(), Err(MethodError::InvalidCardNumber));

        let tiny = PaymentMethod::Card { number: "42".into() };
        assert_eq!(tiny.validate(), Err(MethodError::InvalidCardLast4));
    }

    #[test]
    fn wallet_descriptors() {
        let account = account_with_receipt();
        let venmo = PaymentMethod::Venmo {
            handle: "@sarahj".into(),
        };
        assert_eq!(venmo.describe(&account), "Venmo @sarahj");
        assert_eq!(venmo.last4(), "rahj");

        let zelle = PaymentMethod::Zelle {
            contact: String::new(),
        };
        assert_eq!(zelle.validate(), Err(MethodError::MissingZelleContact));
    }

    #[test]
    fn default_method_reads_latest_receipt() {
        let account = account_with_receipt();
        assert_eq!(current_method_description(&account), "Chase Bank ••••7892");

        let mut no_history = account.clone();
        no_history.payments.clear();
        assert_eq!(
            current_method_description(&no_history),
            "Default payment method"
        );
    }

    #[test]
    fn update_rewrites_only_latest_receipt() {
        let account = account_with_receipt();
        let update = PaymentMethod::Bank {
            bank_name: "Wells Fargo".into(),
            last4: "2341".into(),
        }
        .into_update(&account, Some("1 Main St".into()))
        .unwrap();

        let mut receipt = account.payments[0].receipt.clone().unwrap();
        update.apply_to(&mut receipt);
        assert_eq!(receipt.payment_method, "Wells Fargo ••••2341");
        assert_eq!(receipt.bank_name.as_deref(), Some("Wells Fargo"));
        assert_eq!(receipt.bank_account_last4.as_deref(), Some("2341"));
        assert_eq!(receipt.billing_address.as_deref(), Some("1 Main St"));
        assert_eq!(receipt.reference_id, "TXN-1");
    }

    #[test]
    fn venmo_drops_billing_address() {
        let account = account_with_receipt();
        let update = PaymentMethod::Venmo {
            handle: "sarahj".into(),
        }
        .into_update(&account, Some("1 Main St".into()))
        .unwrap();
        assert!(update.billing_address.is_none());
        assert!(update.bank_name.is_none());
    }
}
