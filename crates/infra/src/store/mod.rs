//! Persistence boundary for the ledger.
//!
//! Repositories are tenant-scoped: every lookup takes the caller's `TenantId`
//! and never sees rows owned by another tenant. A `LedgerStore` runs a closure
//! against a unit of work; the work commits only when the closure returns `Ok`.

mod in_memory;

pub use in_memory::{InMemoryLedgerStore, InMemoryTables};

use std::sync::Arc;

use thiserror::Error;

use invoiceme_core::{ExpectedVersion, TenantId};
use invoiceme_invoicing::{Invoice, InvoiceId, Payment, PaymentId};
use invoiceme_parties::{Company, Customer, CustomerId};

/// Failures raised by the storage layer itself (not domain rules).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A natural key (invoice number, customer email) is already taken.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The stored version no longer matches the caller's expectation.
    #[error("optimistic concurrency conflict: {0}")]
    Concurrency(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait CompanyRepository {
    fn company(&self, tenant_id: TenantId) -> Option<Company>;
    fn save_company(&mut self, company: Company) -> Result<(), StoreError>;
}

pub trait CustomerRepository {
    fn customer(&self, tenant_id: TenantId, id: CustomerId) -> Option<Customer>;
    fn customers(&self, tenant_id: TenantId) -> Vec<Customer>;
    /// Case-insensitive; `excluding` skips the customer being edited.
    fn customer_email_exists(
        &self,
        tenant_id: TenantId,
        email: &str,
        excluding: Option<CustomerId>,
    ) -> bool;
    /// Insert or replace. Rejects an email already used by another customer
    /// of the same tenant.
    fn save_customer(&mut self, customer: Customer) -> Result<(), StoreError>;
    fn delete_customer(&mut self, tenant_id: TenantId, id: CustomerId) -> bool;
}

pub trait InvoiceRepository {
    fn invoice(&self, tenant_id: TenantId, id: InvoiceId) -> Option<Invoice>;
    fn invoices(&self, tenant_id: TenantId) -> Vec<Invoice>;
    /// Invoice numbers are unique across all tenants.
    fn invoice_number_exists(&self, invoice_number: &str) -> bool;
    /// Persist the invoice (line items included) if the stored version matches
    /// `expected`. Returns the saved invoice with its version bumped.
    fn save_invoice(
        &mut self,
        invoice: Invoice,
        expected: ExpectedVersion,
    ) -> Result<Invoice, StoreError>;
    /// Removes the invoice and every line item it owns.
    fn delete_invoice(&mut self, tenant_id: TenantId, id: InvoiceId) -> bool;
}

pub trait PaymentRepository {
    fn payment(&self, tenant_id: TenantId, id: PaymentId) -> Option<Payment>;
    fn payments_for_invoice(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> Vec<Payment>;
    /// Payments are insert-only.
    fn save_payment(&mut self, tenant_id: TenantId, payment: Payment) -> Result<(), StoreError>;
}

/// Everything a ledger operation may touch inside one transaction.
pub trait UnitOfWork:
    CompanyRepository + CustomerRepository + InvoiceRepository + PaymentRepository
{
}

impl<T> UnitOfWork for T where
    T: CompanyRepository + CustomerRepository + InvoiceRepository + PaymentRepository
{
}

/// Transaction boundary.
///
/// `transaction` runs `work` in isolation from concurrent callers and commits
/// its writes only if it returns `Ok`. On `Err` nothing is persisted.
pub trait LedgerStore: Send + Sync {
    type Tx: UnitOfWork;

    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E>,
        E: From<StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore,
{
    type Tx = S::Tx;

    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E>,
        E: From<StoreError>,
    {
        (**self).transaction(work)
    }
}
