//! Inputs to the ledger operations.
//!
//! Commands carry the caller's clock (`occurred_at`) so every operation stamps
//! timestamps deterministically.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use invoiceme_core::Money;
use invoiceme_invoicing::InvoiceId;
use invoiceme_parties::{CustomerDetails, CustomerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCompany {
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub details: CustomerDetails,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub customer_id: CustomerId,
    pub details: CustomerDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Requested line item. Quantity and unit price are optional on the wire;
/// a missing one is rejected as a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub description: String,
    pub quantity: Option<i32>,
    pub unit_price: Option<Money>,
}

impl LineItemInput {
    pub fn new(description: impl Into<String>, quantity: i32, unit_price: Money) -> Self {
        Self {
            description: description.into(),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub customer_id: CustomerId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub line_items: Vec<LineItemInput>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInvoice {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    /// `None` keeps the current line items; `Some` replaces all of them.
    pub line_items: Option<Vec<LineItemInput>>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInvoiceAsSent {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    /// Parsed case-insensitively into a `PaymentMethod`.
    pub payment_method: String,
    pub reference_number: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Invoice listing filter. Both criteria are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    pub customer_id: Option<CustomerId>,
    /// Status name, matched case-insensitively.
    pub status: Option<String>,
}

impl InvoiceFilter {
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
