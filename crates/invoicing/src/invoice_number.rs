use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_INVOICE_NUMBER_PREFIX: &str = "INV";

/// Source of candidate invoice numbers.
///
/// Candidates are not guaranteed unique; the ledger checks each one against
/// the store and retries.
pub trait InvoiceNumberGenerator: Send + Sync {
    fn generate(&self, at: DateTime<Utc>) -> String;
}

impl<F> InvoiceNumberGenerator for F
where
    F: Fn(DateTime<Utc>) -> String + Send + Sync,
{
    fn generate(&self, at: DateTime<Utc>) -> String {
        self(at)
    }
}

/// `{prefix}-{last 8 digits of epoch millis}-{8 random uppercase hex}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedInvoiceNumbers {
    prefix: String,
}

impl TimestampedInvoiceNumbers {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for TimestampedInvoiceNumbers {
    fn default() -> Self {
        Self::new(DEFAULT_INVOICE_NUMBER_PREFIX)
    }
}

impl InvoiceNumberGenerator for TimestampedInvoiceNumbers {
    fn generate(&self, at: DateTime<Utc>) -> String {
        let millis = at.timestamp_millis().rem_euclid(100_000_000);
        let random = Uuid::new_v4().simple().to_string();
        format!("{}-{millis:08}-{}", self.prefix, random[..8].to_ascii_uppercase())
    }
}
