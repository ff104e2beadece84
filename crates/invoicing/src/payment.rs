use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use invoiceme_core::{AggregateId, DomainError, DomainResult, Entity, Money};

use crate::invoice::{Invoice, InvoiceId, InvoiceStatus};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub AggregateId);

impl PaymentId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// How the money was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Check,
    BankTransfer,
    Card,
    CreditCard,
    DebitCard,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 7] = [
        PaymentMethod::Cash,
        PaymentMethod::Check,
        PaymentMethod::BankTransfer,
        PaymentMethod::Card,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Card => "CARD",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation(format!("invalid payment method: {s}")))
    }
}

/// Money received against an invoice. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    id: PaymentId,
    invoice_id: InvoiceId,
    amount: Money,
    payment_date: NaiveDate,
    method: PaymentMethod,
    reference_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl Payment {
    /// Validate a payment against the invoice's current state.
    ///
    /// Checks run in order: positive amount, invoice not a draft, amount not
    /// above the outstanding balance. The invoice is not mutated; the caller
    /// persists the payment and then applies the new payment total.
    pub fn create(
        id: PaymentId,
        invoice: &Invoice,
        amount: Money,
        payment_date: NaiveDate,
        method: PaymentMethod,
        reference_number: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation("payment amount must be greater than zero"));
        }
        if invoice.status() == InvoiceStatus::Draft {
            return Err(DomainError::invalid_state(
                "cannot record payment for draft invoice",
            ));
        }
        if amount > invoice.balance() {
            return Err(DomainError::validation(format!(
                "payment amount {amount} exceeds invoice balance {}",
                invoice.balance()
            )));
        }

        let reference_number = reference_number
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        Ok(Self {
            id,
            invoice_id: invoice.id_typed(),
            amount,
            payment_date,
            method,
            reference_number,
            created_at: now,
        })
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn invoice_id(&self) -> InvoiceId {
        self.invoice_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn payment_date(&self) -> NaiveDate {
        self.payment_date
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn reference_number(&self) -> Option<&str> {
        self.reference_number.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
