//! Customer balance summaries.
//!
//! Derived on read from every invoice the customer has, drafts included;
//! nothing here is stored.

use chrono::NaiveDate;
use serde::Serialize;

use invoiceme_core::{DomainResult, Money};
use invoiceme_invoicing::{Invoice, InvoiceStatus};
use invoiceme_parties::CustomerId;

/// Read model: what a customer owes as of a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerBalanceSummary {
    pub customer_id: CustomerId,
    pub as_of: NaiveDate,
    /// Sum of totals over all of the customer's invoices.
    pub total_invoiced: Money,
    /// Sum of balances still owed.
    pub outstanding_balance: Money,
    pub unpaid_count: u32,
    /// Unpaid invoices whose due date is before `as_of`.
    pub overdue_count: u32,
    pub has_outstanding_balance: bool,
}

impl CustomerBalanceSummary {
    /// Fold `invoices` into a summary. Invoices for other customers are
    /// skipped.
    pub fn from_invoices<'a>(
        customer_id: CustomerId,
        invoices: impl IntoIterator<Item = &'a Invoice>,
        as_of: NaiveDate,
    ) -> DomainResult<Self> {
        let mut summary = Self {
            customer_id,
            as_of,
            total_invoiced: Money::zero(),
            outstanding_balance: Money::zero(),
            unpaid_count: 0,
            overdue_count: 0,
            has_outstanding_balance: false,
        };

        let own = invoices.into_iter().filter(|i| i.customer_id() == customer_id);

        for invoice in own {
            summary.total_invoiced = summary.total_invoiced.checked_add(invoice.total_amount())?;
            summary.outstanding_balance =
                summary.outstanding_balance.checked_add(invoice.balance())?;

            if invoice.status() != InvoiceStatus::Paid && invoice.balance().is_positive() {
                summary.unpaid_count += 1;
                if invoice.is_overdue(as_of) {
                    summary.overdue_count += 1;
                }
            }
        }

        summary.has_outstanding_balance = summary.outstanding_balance.is_positive();
        Ok(summary)
    }
}
