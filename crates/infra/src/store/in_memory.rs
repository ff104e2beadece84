use std::collections::HashMap;
use std::sync::Mutex;

use invoiceme_core::{AggregateRoot, ExpectedVersion, TenantId};
use invoiceme_invoicing::{Invoice, InvoiceId, Payment, PaymentId};
use invoiceme_parties::{Company, Customer, CustomerId};

use super::{
    CompanyRepository, CustomerRepository, InvoiceRepository, LedgerStore, PaymentRepository,
    StoreError,
};

/// Table contents of the in-memory store; also serves as its transaction.
///
/// Rows are keyed by `(tenant, id)` so tenant isolation is structural.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTables {
    companies: HashMap<TenantId, Company>,
    customers: HashMap<(TenantId, CustomerId), Customer>,
    invoices: HashMap<(TenantId, InvoiceId), Invoice>,
    payments: HashMap<(TenantId, PaymentId), Payment>,
}

/// In-memory ledger store.
///
/// Intended for tests/dev. Not optimized for performance: every transaction
/// works on a private copy of all tables and swaps it in on success. The
/// mutex serializes transactions, so concurrent payments against the same
/// invoice apply one after the other.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: Mutex<InMemoryTables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    type Tx = InMemoryTables;

    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let mut staged = tables.clone();
        let out = work(&mut staged)?;
        *tables = staged;
        Ok(out)
    }
}

impl CompanyRepository for InMemoryTables {
    fn company(&self, tenant_id: TenantId) -> Option<Company> {
        self.companies.get(&tenant_id).cloned()
    }

    fn save_company(&mut self, company: Company) -> Result<(), StoreError> {
        self.companies.insert(company.tenant_id(), company);
        Ok(())
    }
}

impl CustomerRepository for InMemoryTables {
    fn customer(&self, tenant_id: TenantId, id: CustomerId) -> Option<Customer> {
        self.customers.get(&(tenant_id, id)).cloned()
    }

    fn customers(&self, tenant_id: TenantId) -> Vec<Customer> {
        self.customers
            .iter()
            .filter_map(|((t, _id), c)| if *t == tenant_id { Some(c.clone()) } else { None })
            .collect()
    }

    fn customer_email_exists(
        &self,
        tenant_id: TenantId,
        email: &str,
        excluding: Option<CustomerId>,
    ) -> bool {
        self.customers.iter().any(|((t, id), c)| {
            *t == tenant_id && Some(*id) != excluding && c.has_email(email)
        })
    }

    fn save_customer(&mut self, customer: Customer) -> Result<(), StoreError> {
        let tenant_id = customer.tenant_id();
        let id = customer.id_typed();
        if self.customer_email_exists(tenant_id, customer.email(), Some(id)) {
            return Err(StoreError::UniqueViolation(format!(
                "customer email '{}' already exists for tenant {tenant_id}",
                customer.email()
            )));
        }
        self.customers.insert((tenant_id, id), customer);
        Ok(())
    }

    fn delete_customer(&mut self, tenant_id: TenantId, id: CustomerId) -> bool {
        self.customers.remove(&(tenant_id, id)).is_some()
    }
}

impl InvoiceRepository for InMemoryTables {
    fn invoice(&self, tenant_id: TenantId, id: InvoiceId) -> Option<Invoice> {
        self.invoices.get(&(tenant_id, id)).cloned()
    }

    fn invoices(&self, tenant_id: TenantId) -> Vec<Invoice> {
        self.invoices
            .iter()
            .filter_map(|((t, _id), i)| if *t == tenant_id { Some(i.clone()) } else { None })
            .collect()
    }

    fn invoice_number_exists(&self, invoice_number: &str) -> bool {
        self.invoices
            .values()
            .any(|i| i.invoice_number() == invoice_number)
    }

    fn save_invoice(
        &mut self,
        mut invoice: Invoice,
        expected: ExpectedVersion,
    ) -> Result<Invoice, StoreError> {
        let key = (invoice.tenant_id(), invoice.id_typed());
        let current = self.invoices.get(&key).map(|stored| stored.version());

        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "invoice {}: expected {expected:?}, found {current:?}",
                invoice.id_typed()
            )));
        }

        let number_taken = self.invoices.iter().any(|((_t, id), other)| {
            *id != invoice.id_typed() && other.invoice_number() == invoice.invoice_number()
        });
        if number_taken {
            return Err(StoreError::UniqueViolation(format!(
                "invoice number '{}' already exists",
                invoice.invoice_number()
            )));
        }

        invoice.increment_version();
        self.invoices.insert(key, invoice.clone());
        Ok(invoice)
    }

    fn delete_invoice(&mut self, tenant_id: TenantId, id: InvoiceId) -> bool {
        self.invoices.remove(&(tenant_id, id)).is_some()
    }
}

impl PaymentRepository for InMemoryTables {
    fn payment(&self, tenant_id: TenantId, id: PaymentId) -> Option<Payment> {
        self.payments.get(&(tenant_id, id)).cloned()
    }

    fn payments_for_invoice(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> Vec<Payment> {
        self.payments
            .iter()
            .filter_map(|((t, _id), p)| {
                if *t == tenant_id && p.invoice_id() == invoice_id {
                    Some(p.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn save_payment(&mut self, tenant_id: TenantId, payment: Payment) -> Result<(), StoreError> {
        let key = (tenant_id, payment.id_typed());
        if self.payments.contains_key(&key) {
            return Err(StoreError::UniqueViolation(format!(
                "payment {} already exists",
                payment.id_typed()
            )));
        }
        self.payments.insert(key, payment);
        Ok(())
    }
}
