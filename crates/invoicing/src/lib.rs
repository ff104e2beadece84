//! Invoicing domain module.
//!
//! This crate contains the invoice lifecycle and balance-accounting rules:
//! line items and their amounts, invoice totals and status transitions, and
//! payment validation. Pure, deterministic domain logic (no IO, no storage);
//! callers pass in timestamps and identifiers.

pub mod invoice;
pub mod invoice_number;
pub mod line_item;
pub mod payment;

pub use invoice::{Invoice, InvoiceId, InvoiceStatus};
pub use invoice_number::{InvoiceNumberGenerator, TimestampedInvoiceNumbers};
pub use line_item::{LineItem, LineItemId};
pub use payment::{Payment, PaymentId, PaymentMethod};
