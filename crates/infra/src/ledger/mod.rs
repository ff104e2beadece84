//! Ledger operations: the application-level workflows over the invoicing
//! domain.
//!
//! Each mutation runs as one unit of work against a [`LedgerStore`]:
//!
//! ```text
//! Command
//!   ↓
//! 1. Tenant-scoped lookups (missing or foreign rows are NotFound)
//!   ↓
//! 2. Domain decision (pure; validation and state rules live in the aggregates)
//!   ↓
//! 3. Persist with optimistic version check
//! ```
//!
//! Any failure aborts the whole unit of work, so a failed operation leaves
//! nothing committed. Reads use the same transaction boundary to get a
//! consistent snapshot.

mod commands;
mod error;

pub use commands::{
    CreateCustomer, CreateInvoice, InvoiceFilter, LineItemInput, MarkInvoiceAsSent,
    RecordPayment, RegisterCompany, UpdateCustomer, UpdateInvoice,
};
pub use error::{LedgerError, LedgerResult};

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use invoiceme_core::{AggregateId, AggregateRoot, ExpectedVersion, Money, TenantId};
use invoiceme_invoicing::{
    Invoice, InvoiceId, InvoiceNumberGenerator, InvoiceStatus, LineItem, LineItemId, Payment,
    PaymentId, PaymentMethod, TimestampedInvoiceNumbers,
};
use invoiceme_parties::{Company, Customer, CustomerId};

use crate::balances::CustomerBalanceSummary;
use crate::config::LedgerConfig;
use crate::store::{
    CompanyRepository, CustomerRepository, InvoiceRepository, LedgerStore, PaymentRepository,
    UnitOfWork,
};

/// Invoice lifecycle and balance engine over a tenant-isolated store.
///
/// The ledger performs no locking itself; atomicity and the serialization of
/// concurrent payments come from the store's transaction boundary.
pub struct Ledger<S> {
    store: S,
    invoice_numbers: Box<dyn InvoiceNumberGenerator>,
    invoice_number_attempts: u32,
}

impl<S> core::fmt::Debug for Ledger<S>
where
    S: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ledger")
            .field("store", &self.store)
            .field("invoice_number_attempts", &self.invoice_number_attempts)
            .finish_non_exhaustive()
    }
}

impl<S> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &LedgerConfig::default())
    }

    pub fn with_config(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            invoice_numbers: Box::new(TimestampedInvoiceNumbers::new(
                config.invoice_number_prefix.clone(),
            )),
            invoice_number_attempts: config.invoice_number_attempts.max(1),
        }
    }

    /// Swap the invoice number source (tests use fixed sequences).
    pub fn with_invoice_numbers(mut self, generator: impl InvoiceNumberGenerator + 'static) -> Self {
        self.invoice_numbers = Box::new(generator);
        self
    }
}

impl<S> Ledger<S>
where
    S: LedgerStore,
{
    // ---------------------------------------------------------------------
    // Companies and customers
    // ---------------------------------------------------------------------

    /// Create or rename the company that owns `tenant_id`.
    #[instrument(skip(self, cmd), fields(tenant_id = %tenant_id), err)]
    pub fn register_company(
        &self,
        tenant_id: TenantId,
        cmd: RegisterCompany,
    ) -> LedgerResult<Company> {
        self.store.transaction(|tx| {
            let company = match tx.company(tenant_id) {
                Some(mut existing) => {
                    existing.rename(cmd.name, cmd.occurred_at)?;
                    existing
                }
                None => Company::create(tenant_id, cmd.name, cmd.occurred_at)?,
            };
            tx.save_company(company.clone())?;
            info!(company = %company.name(), "company registered");
            Ok(company)
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    pub fn get_company(&self, tenant_id: TenantId) -> LedgerResult<Company> {
        self.store.transaction(|tx| {
            tx.company(tenant_id)
                .ok_or_else(|| LedgerError::not_found(format!("company {tenant_id}")))
        })
    }

    #[instrument(skip(self, cmd), fields(tenant_id = %tenant_id), err)]
    pub fn create_customer(
        &self,
        tenant_id: TenantId,
        cmd: CreateCustomer,
    ) -> LedgerResult<Customer> {
        self.store.transaction(|tx| {
            if tx.company(tenant_id).is_none() {
                return Err(LedgerError::not_found(format!("company {tenant_id}")));
            }

            let id = CustomerId::new(AggregateId::new());
            let customer = Customer::create(id, tenant_id, cmd.details, cmd.occurred_at)?;
            if tx.customer_email_exists(tenant_id, customer.email(), None) {
                return Err(LedgerError::conflict(format!(
                    "customer with email {} already exists",
                    customer.email()
                )));
            }

            tx.save_customer(customer.clone())?;
            info!(customer_id = %id, "customer created");
            Ok(customer)
        })
    }

    #[instrument(skip(self, cmd), fields(tenant_id = %tenant_id, customer_id = %cmd.customer_id), err)]
    pub fn update_customer(
        &self,
        tenant_id: TenantId,
        cmd: UpdateCustomer,
    ) -> LedgerResult<Customer> {
        self.store.transaction(|tx| {
            let mut customer = load_customer(tx, tenant_id, cmd.customer_id)?;
            customer.update(cmd.details, cmd.occurred_at)?;

            if tx.customer_email_exists(tenant_id, customer.email(), Some(cmd.customer_id)) {
                return Err(LedgerError::conflict(format!(
                    "customer with email {} already exists",
                    customer.email()
                )));
            }

            tx.save_customer(customer.clone())?;
            Ok(customer)
        })
    }

    /// Customers with invoices cannot be deleted.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, customer_id = %customer_id), err)]
    pub fn delete_customer(&self, tenant_id: TenantId, customer_id: CustomerId) -> LedgerResult<()> {
        self.store.transaction(|tx| {
            load_customer(tx, tenant_id, customer_id)?;

            let invoice_count = tx
                .invoices(tenant_id)
                .iter()
                .filter(|i| i.customer_id() == customer_id)
                .count();
            if invoice_count > 0 {
                return Err(LedgerError::conflict(format!(
                    "customer {customer_id} has {invoice_count} invoice(s) and cannot be deleted"
                )));
            }

            tx.delete_customer(tenant_id, customer_id);
            info!("customer deleted");
            Ok(())
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, customer_id = %customer_id), err)]
    pub fn get_customer(&self, tenant_id: TenantId, customer_id: CustomerId) -> LedgerResult<Customer> {
        self.store
            .transaction(|tx| load_customer(tx, tenant_id, customer_id))
    }

    /// All customers of the tenant, sorted by name.
    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    pub fn list_customers(&self, tenant_id: TenantId) -> LedgerResult<Vec<Customer>> {
        self.store.transaction(|tx| {
            let mut customers = tx.customers(tenant_id);
            customers.sort_by(|a, b| {
                a.name()
                    .cmp(b.name())
                    .then_with(|| a.id_typed().cmp(&b.id_typed()))
            });
            Ok(customers)
        })
    }

    // ---------------------------------------------------------------------
    // Invoices
    // ---------------------------------------------------------------------

    #[instrument(skip(self, cmd), fields(tenant_id = %tenant_id, customer_id = %cmd.customer_id), err)]
    pub fn create_invoice(&self, tenant_id: TenantId, cmd: CreateInvoice) -> LedgerResult<Invoice> {
        self.store.transaction(|tx| {
            load_customer(tx, tenant_id, cmd.customer_id)?;

            let invoice_number = self.next_invoice_number(tx, cmd.occurred_at)?;
            let mut invoice = Invoice::create(
                InvoiceId::new(AggregateId::new()),
                tenant_id,
                cmd.customer_id,
                invoice_number,
                cmd.issue_date,
                cmd.due_date,
                cmd.occurred_at,
            )?;
            for item in build_line_items(cmd.line_items)? {
                invoice.add_line_item(item, cmd.occurred_at)?;
            }

            let saved = persist_invoice(tx, invoice, ExpectedVersion::New)?;
            info!(
                invoice_id = %saved.id_typed(),
                invoice_number = %saved.invoice_number(),
                total = %saved.total_amount(),
                "invoice created"
            );
            Ok(saved)
        })
    }

    #[instrument(skip(self, cmd), fields(tenant_id = %tenant_id, invoice_id = %cmd.invoice_id), err)]
    pub fn update_invoice(&self, tenant_id: TenantId, cmd: UpdateInvoice) -> LedgerResult<Invoice> {
        self.store.transaction(|tx| {
            let mut invoice = load_invoice(tx, tenant_id, cmd.invoice_id)?;
            load_customer(tx, tenant_id, cmd.customer_id)?;
            let expected = ExpectedVersion::Exact(invoice.version());

            invoice.update(cmd.customer_id, cmd.issue_date, cmd.due_date, cmd.occurred_at)?;
            if let Some(items) = cmd.line_items {
                invoice.replace_line_items(build_line_items(items)?, cmd.occurred_at)?;
            }

            let saved = persist_invoice(tx, invoice, expected)?;
            debug!(total = %saved.total_amount(), "invoice updated");
            Ok(saved)
        })
    }

    #[instrument(skip(self, cmd), fields(tenant_id = %tenant_id, invoice_id = %cmd.invoice_id), err)]
    pub fn mark_invoice_as_sent(
        &self,
        tenant_id: TenantId,
        cmd: MarkInvoiceAsSent,
    ) -> LedgerResult<Invoice> {
        self.store.transaction(|tx| {
            let mut invoice = load_invoice(tx, tenant_id, cmd.invoice_id)?;
            let expected = ExpectedVersion::Exact(invoice.version());

            invoice.mark_as_sent(cmd.occurred_at)?;

            let saved = persist_invoice(tx, invoice, expected)?;
            info!(invoice_number = %saved.invoice_number(), "invoice sent");
            Ok(saved)
        })
    }

    /// Drafts only; the invoice's line items go with it.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, invoice_id = %invoice_id), err)]
    pub fn delete_invoice(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> LedgerResult<()> {
        self.store.transaction(|tx| {
            let invoice = load_invoice(tx, tenant_id, invoice_id)?;
            if invoice.status() != InvoiceStatus::Draft {
                return Err(LedgerError::InvalidState(format!(
                    "only draft invoices can be deleted (status: {})",
                    invoice.status()
                )));
            }

            tx.delete_invoice(tenant_id, invoice_id);
            info!(invoice_number = %invoice.invoice_number(), "invoice deleted");
            Ok(())
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, invoice_id = %invoice_id), err)]
    pub fn get_invoice(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> LedgerResult<Invoice> {
        self.store
            .transaction(|tx| load_invoice(tx, tenant_id, invoice_id))
    }

    /// Newest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    pub fn list_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
    ) -> LedgerResult<Vec<Invoice>> {
        let status = filter
            .status
            .as_deref()
            .map(str::parse::<InvoiceStatus>)
            .transpose()?;

        self.store.transaction(|tx| {
            let mut invoices: Vec<Invoice> = tx
                .invoices(tenant_id)
                .into_iter()
                .filter(|i| filter.customer_id.is_none_or(|c| i.customer_id() == c))
                .filter(|i| status.is_none_or(|s| i.status() == s))
                .collect();
            invoices.sort_by_key(|i| Reverse((i.created_at(), i.id_typed())));
            Ok(invoices)
        })
    }

    // ---------------------------------------------------------------------
    // Payments
    // ---------------------------------------------------------------------

    /// Record a payment and re-derive the invoice balance from all payments.
    #[instrument(skip(self, cmd), fields(tenant_id = %tenant_id, invoice_id = %cmd.invoice_id, amount = %cmd.amount), err)]
    pub fn record_payment(&self, tenant_id: TenantId, cmd: RecordPayment) -> LedgerResult<Payment> {
        self.store.transaction(|tx| {
            let mut invoice = load_invoice(tx, tenant_id, cmd.invoice_id)?;
            let expected = ExpectedVersion::Exact(invoice.version());
            let method: PaymentMethod = cmd.payment_method.parse()?;

            let payment = Payment::create(
                PaymentId::new(AggregateId::new()),
                &invoice,
                cmd.amount,
                cmd.payment_date,
                method,
                cmd.reference_number,
                cmd.occurred_at,
            )?;
            tx.save_payment(tenant_id, payment.clone())?;

            let total_paid = Money::checked_sum(
                tx.payments_for_invoice(tenant_id, invoice.id_typed())
                    .iter()
                    .map(Payment::amount),
            )?;
            invoice.apply_payment_total(total_paid, cmd.occurred_at)?;

            let saved = persist_invoice(tx, invoice, expected)?;
            info!(
                payment_id = %payment.id_typed(),
                balance = %saved.balance(),
                status = %saved.status(),
                "payment recorded"
            );
            Ok(payment)
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, payment_id = %payment_id), err)]
    pub fn get_payment(&self, tenant_id: TenantId, payment_id: PaymentId) -> LedgerResult<Payment> {
        self.store.transaction(|tx| {
            tx.payment(tenant_id, payment_id)
                .ok_or_else(|| LedgerError::not_found(format!("payment {payment_id}")))
        })
    }

    /// Latest payment date first; same-day payments newest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, invoice_id = %invoice_id), err)]
    pub fn list_payments_for_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> LedgerResult<Vec<Payment>> {
        self.store.transaction(|tx| {
            load_invoice(tx, tenant_id, invoice_id)?;
            let mut payments = tx.payments_for_invoice(tenant_id, invoice_id);
            payments.sort_by_key(|p| Reverse((p.payment_date(), p.created_at(), p.id_typed())));
            Ok(payments)
        })
    }

    // ---------------------------------------------------------------------
    // Balances
    // ---------------------------------------------------------------------

    #[instrument(skip(self), fields(tenant_id = %tenant_id, customer_id = %customer_id), err)]
    pub fn customer_balance_summary(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        as_of: NaiveDate,
    ) -> LedgerResult<CustomerBalanceSummary> {
        self.store.transaction(|tx| {
            load_customer(tx, tenant_id, customer_id)?;
            let invoices = tx.invoices(tenant_id);
            Ok(CustomerBalanceSummary::from_invoices(customer_id, &invoices, as_of)?)
        })
    }

    fn next_invoice_number(&self, tx: &S::Tx, at: DateTime<Utc>) -> LedgerResult<String> {
        for attempt in 1..=self.invoice_number_attempts {
            let candidate = self.invoice_numbers.generate(at);
            if !tx.invoice_number_exists(&candidate) {
                return Ok(candidate);
            }
            warn!(attempt, candidate = %candidate, "invoice number collision");
        }
        Err(LedgerError::conflict(format!(
            "could not generate a unique invoice number after {} attempts",
            self.invoice_number_attempts
        )))
    }
}

fn load_customer<U: UnitOfWork>(
    tx: &U,
    tenant_id: TenantId,
    customer_id: CustomerId,
) -> LedgerResult<Customer> {
    tx.customer(tenant_id, customer_id)
        .ok_or_else(|| LedgerError::not_found(format!("customer {customer_id}")))
}

fn load_invoice<U: UnitOfWork>(
    tx: &U,
    tenant_id: TenantId,
    invoice_id: InvoiceId,
) -> LedgerResult<Invoice> {
    tx.invoice(tenant_id, invoice_id)
        .ok_or_else(|| LedgerError::not_found(format!("invoice {invoice_id}")))
}

/// Every invoice write goes through here so header invariants are rechecked
/// before the store sees the row.
fn persist_invoice<U: UnitOfWork>(
    tx: &mut U,
    invoice: Invoice,
    expected: ExpectedVersion,
) -> LedgerResult<Invoice> {
    invoice.validate()?;
    Ok(tx.save_invoice(invoice, expected)?)
}

fn build_line_items(inputs: Vec<LineItemInput>) -> LedgerResult<Vec<LineItem>> {
    inputs
        .into_iter()
        .map(|input| {
            LineItem::create(
                LineItemId::new(AggregateId::new()),
                input.description,
                input.quantity,
                input.unit_price,
            )
            .map_err(LedgerError::from)
        })
        .collect()
}
