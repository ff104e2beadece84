use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use invoiceme_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Money, TenantId};
use invoiceme_parties::CustomerId;

use crate::line_item::{LineItem, LineItemId};

/// Invoice identifier (tenant-scoped via `tenant_id`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Invoice status lifecycle: `Draft -> Sent -> Paid`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [InvoiceStatus::Draft, InvoiceStatus::Sent, InvoiceStatus::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation(format!("invalid invoice status: {s}")))
    }
}

/// Aggregate root: Invoice.
///
/// Owns its line items by value. Totals are derived from the items while the
/// invoice is a draft; once payments exist the balance only moves through
/// [`Invoice::apply_payment_total`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    id: InvoiceId,
    tenant_id: TenantId,
    customer_id: CustomerId,
    invoice_number: String,
    status: InvoiceStatus,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    total_amount: Money,
    balance: Money,
    amount_paid: Money,
    line_items: Vec<LineItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: u64,
}

impl Invoice {
    /// Start a new draft invoice with zero totals and no line items.
    pub fn create(
        id: InvoiceId,
        tenant_id: TenantId,
        customer_id: CustomerId,
        invoice_number: impl Into<String>,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let invoice = Self {
            id,
            tenant_id,
            customer_id,
            invoice_number: invoice_number.into().trim().to_string(),
            status: InvoiceStatus::Draft,
            issue_date,
            due_date,
            total_amount: Money::zero(),
            balance: Money::zero(),
            amount_paid: Money::zero(),
            line_items: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        };
        invoice.validate()?;
        Ok(invoice)
    }

    /// Header invariants; checked on creation and on every header change.
    /// The ledger rechecks them before each invoice write.
    pub fn validate(&self) -> DomainResult<()> {
        if self.invoice_number.trim().is_empty() {
            return Err(DomainError::validation("invoice number cannot be empty"));
        }
        ensure_due_not_before_issue(self.issue_date, self.due_date)
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Sum of all payments last applied through `apply_payment_total`.
    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn line_item(&self, id: LineItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.id_typed() == id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn has_payments(&self) -> bool {
        !self.amount_paid.is_zero()
    }

    /// Unpaid and past due as of `as_of`.
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.status != InvoiceStatus::Paid && self.balance.is_positive() && self.due_date < as_of
    }

    /// Change customer and dates. Header fields are frozen once sent.
    pub fn update(
        &mut self,
        customer_id: CustomerId,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_draft("update")?;
        ensure_due_not_before_issue(issue_date, due_date)?;

        self.customer_id = customer_id;
        self.issue_date = issue_date;
        self.due_date = due_date;
        self.updated_at = now;
        Ok(())
    }

    pub fn add_line_item(&mut self, item: LineItem, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_draft("add line items to")?;
        if self.line_item(item.id_typed()).is_some() {
            return Err(DomainError::conflict(format!(
                "line item {} is already on the invoice",
                item.id_typed()
            )));
        }

        let mut items = self.line_items.clone();
        items.push(item);
        self.set_line_items(items, now)
    }

    /// Detach a line item; the removed item is returned and no longer owned.
    pub fn remove_line_item(&mut self, id: LineItemId, now: DateTime<Utc>) -> DomainResult<LineItem> {
        self.ensure_draft("remove line items from")?;
        let position = self
            .line_items
            .iter()
            .position(|item| item.id_typed() == id)
            .ok_or_else(|| DomainError::not_found(format!("line item {id}")))?;

        let mut items = self.line_items.clone();
        let removed = items.remove(position);
        self.set_line_items(items, now)?;
        Ok(removed)
    }

    /// Replace the whole collection (the previous items are dropped).
    pub fn replace_line_items(&mut self, items: Vec<LineItem>, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_draft("update line items for")?;
        for (idx, item) in items.iter().enumerate() {
            if items[..idx].iter().any(|other| other.id_typed() == item.id_typed()) {
                return Err(DomainError::conflict(format!(
                    "line item {} appears more than once",
                    item.id_typed()
                )));
            }
        }
        self.set_line_items(items, now)
    }

    /// Edit one line item in place and recompute totals.
    pub fn update_line_item(
        &mut self,
        id: LineItemId,
        description: impl Into<String>,
        quantity: Option<i32>,
        unit_price: Option<Money>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_draft("update line items for")?;
        let mut items = self.line_items.clone();
        let item = items
            .iter_mut()
            .find(|item| item.id_typed() == id)
            .ok_or_else(|| DomainError::not_found(format!("line item {id}")))?;
        item.update(description, quantity, unit_price)?;
        self.set_line_items(items, now)
    }

    /// DRAFT -> SENT. Requires at least one line item.
    pub fn mark_as_sent(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(DomainError::invalid_state(format!(
                "only draft invoices can be marked as sent (status: {})",
                self.status
            )));
        }
        if self.line_items.is_empty() {
            return Err(DomainError::invalid_state(
                "cannot send invoice without line items",
            ));
        }
        self.status = InvoiceStatus::Sent;
        self.updated_at = now;
        Ok(())
    }

    /// Set the balance from the total of every payment recorded so far.
    ///
    /// When the balance reaches zero it is clamped there and a sent invoice
    /// becomes paid. This is the only path that changes the balance once a
    /// payment exists, and it must not be followed by a totals recompute.
    pub fn apply_payment_total(&mut self, total_payments: Money, now: DateTime<Utc>) -> DomainResult<()> {
        if total_payments.is_negative() {
            return Err(DomainError::validation("payment total cannot be negative"));
        }

        let mut balance = self.total_amount.checked_sub(total_payments)?;
        let settled = !balance.is_positive();
        if settled {
            balance = Money::zero();
        }

        self.amount_paid = total_payments;
        self.balance = balance;
        if settled && self.status == InvoiceStatus::Sent {
            self.status = InvoiceStatus::Paid;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Bump the persisted version. Stores call this on every successful save.
    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    fn ensure_draft(&self, action: &str) -> DomainResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(DomainError::invalid_state(format!(
                "cannot {action} invoice with status: {}",
                self.status
            )));
        }
        Ok(())
    }

    /// Re-derive total and balance from the current line items.
    ///
    /// Refused once any payment has been applied.
    pub fn recompute_totals(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        let items = self.line_items.clone();
        self.set_line_items(items, now)
    }

    /// Install `items` and recompute totals; nothing changes on error.
    fn set_line_items(&mut self, items: Vec<LineItem>, now: DateTime<Utc>) -> DomainResult<()> {
        // Resetting the balance would erase recorded payments.
        if self.has_payments() {
            return Err(DomainError::invalid_state(
                "cannot recompute totals after payments have been recorded",
            ));
        }
        let total = Money::checked_sum(items.iter().map(LineItem::amount))?;

        self.line_items = items;
        self.total_amount = total;
        self.balance = total;
        self.updated_at = now;
        Ok(())
    }
}

fn ensure_due_not_before_issue(issue_date: NaiveDate, due_date: NaiveDate) -> DomainResult<()> {
    if due_date < issue_date {
        return Err(DomainError::validation(format!(
            "due date {due_date} cannot be before issue date {issue_date}"
        )));
    }
    Ok(())
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_invoice_id() -> InvoiceId {
        InvoiceId::new(AggregateId::new())
    }

    fn test_customer_id() -> CustomerId {
        CustomerId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(description: &str, quantity: i32, cents: i64) -> LineItem {
        LineItem::create(
            LineItemId::new(AggregateId::new()),
            description,
            Some(quantity),
            Some(Money::from_cents(cents)),
        )
        .unwrap()
    }

    fn draft() -> Invoice {
        Invoice::create(
            test_invoice_id(),
            TenantId::new(),
            test_customer_id(),
            "INV-00000001-ABCDEF12",
            date(2025, 1, 1),
            date(2025, 1, 31),
            test_time(),
        )
        .unwrap()
    }

    fn sent_invoice_totalling_1750() -> Invoice {
        let mut invoice = draft();
        invoice.add_line_item(item("Consulting", 10, 10000), test_time()).unwrap();
        invoice.add_line_item(item("Support", 5, 15000), test_time()).unwrap();
        invoice.mark_as_sent(test_time()).unwrap();
        invoice
    }

    #[test]
    fn create_starts_as_empty_draft() {
        let invoice = draft();
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
        assert_eq!(invoice.total_amount(), Money::zero());
        assert_eq!(invoice.balance(), Money::zero());
        assert!(invoice.line_items().is_empty());
        assert_eq!(invoice.version(), 0);
    }

    #[test]
    fn create_rejects_due_date_before_issue_date() {
        let err = Invoice::create(
            test_invoice_id(),
            TenantId::new(),
            test_customer_id(),
            "INV-1",
            date(2025, 2, 1),
            date(2025, 1, 31),
            test_time(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("due date") => {}
            other => panic!("expected due date validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_rejects_blank_invoice_number() {
        let err = Invoice::create(
            test_invoice_id(),
            TenantId::new(),
            test_customer_id(),
            "   ",
            date(2025, 1, 1),
            date(2025, 1, 1),
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn adding_line_items_recomputes_total_and_balance() {
        let mut invoice = draft();
        invoice.add_line_item(item("Consulting", 10, 10000), test_time()).unwrap();
        invoice.add_line_item(item("Support", 5, 15000), test_time()).unwrap();

        assert_eq!(invoice.total_amount(), Money::from_cents(175000));
        assert_eq!(invoice.balance(), Money::from_cents(175000));
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
    }

    #[test]
    fn removing_and_replacing_line_items_recomputes_totals() {
        let mut invoice = draft();
        let consulting = item("Consulting", 10, 10000);
        let consulting_id = consulting.id_typed();
        invoice.add_line_item(consulting, test_time()).unwrap();
        invoice.add_line_item(item("Support", 5, 15000), test_time()).unwrap();

        let removed = invoice.remove_line_item(consulting_id, test_time()).unwrap();
        assert_eq!(removed.id_typed(), consulting_id);
        assert_eq!(invoice.total_amount(), Money::from_cents(75000));

        invoice
            .replace_line_items(vec![item("Hosting", 3, 999)], test_time())
            .unwrap();
        assert_eq!(invoice.line_items().len(), 1);
        assert_eq!(invoice.total_amount(), Money::from_cents(2997));
        assert_eq!(invoice.balance(), Money::from_cents(2997));

        invoice.replace_line_items(Vec::new(), test_time()).unwrap();
        assert_eq!(invoice.total_amount(), Money::zero());
        assert_eq!(invoice.balance(), Money::zero());
    }

    #[test]
    fn removing_unknown_line_item_is_not_found() {
        let mut invoice = draft();
        let err = invoice
            .remove_line_item(LineItemId::new(AggregateId::new()), test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn duplicate_line_item_ids_are_rejected() {
        let mut invoice = draft();
        let widget = item("Widget", 1, 100);
        invoice.add_line_item(widget.clone(), test_time()).unwrap();
        let err = invoice.add_line_item(widget.clone(), test_time()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let err = invoice
            .replace_line_items(vec![widget.clone(), widget], test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(invoice.line_items().len(), 1);
    }

    #[test]
    fn update_line_item_recomputes_totals() {
        let mut invoice = draft();
        let widget = item("Widget", 1, 100);
        let widget_id = widget.id_typed();
        invoice.add_line_item(widget, test_time()).unwrap();

        invoice
            .update_line_item(widget_id, "Widget", Some(7), Some(Money::from_cents(100)), test_time())
            .unwrap();
        assert_eq!(invoice.total_amount(), Money::from_cents(700));
        assert_eq!(invoice.line_item(widget_id).unwrap().quantity(), 7);
    }

    #[test]
    fn mark_as_sent_requires_line_items() {
        let mut invoice = draft();
        let err = invoice.mark_as_sent(test_time()).unwrap_err();
        match err {
            DomainError::InvalidState(msg) if msg.contains("without line items") => {}
            other => panic!("expected InvalidState, got {other:?}"),
        }
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
    }

    #[test]
    fn sent_invoice_rejects_line_item_and_header_changes() {
        let mut invoice = sent_invoice_totalling_1750();
        assert_eq!(invoice.status(), InvoiceStatus::Sent);
        let before = invoice.clone();

        let add = invoice.add_line_item(item("Extra", 1, 100), test_time());
        assert!(matches!(add, Err(DomainError::InvalidState(_))));

        let first_id = invoice.line_items()[0].id_typed();
        let remove = invoice.remove_line_item(first_id, test_time());
        assert!(matches!(remove, Err(DomainError::InvalidState(_))));

        let replace = invoice.replace_line_items(Vec::new(), test_time());
        assert!(matches!(replace, Err(DomainError::InvalidState(_))));

        let edit = invoice.update_line_item(first_id, "x", Some(1), Some(Money::zero()), test_time());
        assert!(matches!(edit, Err(DomainError::InvalidState(_))));

        let header = invoice.update(test_customer_id(), date(2025, 1, 1), date(2025, 3, 1), test_time());
        assert!(matches!(header, Err(DomainError::InvalidState(_))));

        assert_eq!(invoice, before);
    }

    #[test]
    fn status_never_moves_backwards() {
        let mut invoice = sent_invoice_totalling_1750();
        let err = invoice.mark_as_sent(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        invoice
            .apply_payment_total(Money::from_cents(175000), test_time())
            .unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);

        let err = invoice.mark_as_sent(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn partial_then_full_payment_settles_invoice() {
        let mut invoice = sent_invoice_totalling_1750();

        invoice
            .apply_payment_total(Money::from_cents(50000), test_time())
            .unwrap();
        assert_eq!(invoice.balance(), Money::from_cents(125000));
        assert_eq!(invoice.status(), InvoiceStatus::Sent);

        invoice
            .apply_payment_total(Money::from_cents(175000), test_time())
            .unwrap();
        assert_eq!(invoice.balance(), Money::zero());
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.total_amount(), Money::from_cents(175000));
    }

    #[test]
    fn overpayment_total_clamps_balance_to_zero() {
        let mut invoice = sent_invoice_totalling_1750();
        invoice
            .apply_payment_total(Money::from_cents(200000), test_time())
            .unwrap();
        assert_eq!(invoice.balance(), Money::zero());
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn payment_total_on_draft_does_not_change_status() {
        let mut invoice = draft();
        invoice.add_line_item(item("Widget", 1, 100), test_time()).unwrap();
        invoice.apply_payment_total(Money::from_cents(100), test_time()).unwrap();
        assert_eq!(invoice.balance(), Money::zero());
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
    }

    #[test]
    fn recompute_is_refused_once_payments_are_applied() {
        let mut invoice = draft();
        invoice.add_line_item(item("Widget", 10, 100), test_time()).unwrap();
        invoice.apply_payment_total(Money::from_cents(400), test_time()).unwrap();

        let err = invoice
            .add_line_item(item("Gadget", 1, 100), test_time())
            .unwrap_err();
        match err {
            DomainError::InvalidState(msg) if msg.contains("payments") => {}
            other => panic!("expected recompute guard, got {other:?}"),
        }
        assert_eq!(invoice.balance(), Money::from_cents(600));
        assert_eq!(invoice.line_items().len(), 1);
    }

    #[test]
    fn recompute_totals_refreshes_draft_and_refuses_after_payment() {
        let mut invoice = draft();
        invoice.add_line_item(item("Widget", 2, 250), test_time()).unwrap();
        invoice.recompute_totals(test_time()).unwrap();
        assert_eq!(invoice.total_amount(), Money::from_cents(500));

        invoice.apply_payment_total(Money::from_cents(100), test_time()).unwrap();
        let err = invoice.recompute_totals(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(invoice.balance(), Money::from_cents(400));
    }

    #[test]
    fn negative_payment_total_is_rejected() {
        let mut invoice = sent_invoice_totalling_1750();
        let err = invoice
            .apply_payment_total(Money::from_cents(-1), test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_changes_header_while_draft() {
        let mut invoice = draft();
        let new_customer = test_customer_id();
        invoice
            .update(new_customer, date(2025, 2, 1), date(2025, 2, 1), test_time())
            .unwrap();
        assert_eq!(invoice.customer_id(), new_customer);
        assert_eq!(invoice.issue_date(), date(2025, 2, 1));

        let err = invoice
            .update(new_customer, date(2025, 2, 2), date(2025, 2, 1), test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(invoice.issue_date(), date(2025, 2, 1));
    }

    #[test]
    fn overdue_requires_unpaid_balance_past_due_date() {
        let mut invoice = sent_invoice_totalling_1750();
        assert!(!invoice.is_overdue(date(2025, 1, 31)));
        assert!(invoice.is_overdue(date(2025, 2, 1)));

        invoice
            .apply_payment_total(Money::from_cents(175000), test_time())
            .unwrap();
        assert!(!invoice.is_overdue(date(2025, 2, 1)));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("draft".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Draft);
        assert_eq!(" Sent ".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Sent);
        assert_eq!("PAID".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        let err = "void".parse::<InvoiceStatus>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn serializes_persisted_shape() {
        let invoice = sent_invoice_totalling_1750();
        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["status"], "SENT");
        assert_eq!(json["total_amount"], "1750.00");
        assert_eq!(json["balance"], "1750.00");
        assert_eq!(json["line_items"].as_array().unwrap().len(), 2);
        assert!(json.get("version").is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: for a draft, total == sum(item amounts) == balance after
        /// every add and remove.
        #[test]
        fn draft_total_matches_line_items(
            lines in prop::collection::vec((1i32..100, 0i64..1_000_000), 1..12),
            removals in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let mut invoice = draft();
            for (qty, cents) in &lines {
                invoice.add_line_item(item("Line", *qty, *cents), test_time()).unwrap();
                let expected = Money::checked_sum(invoice.line_items().iter().map(LineItem::amount)).unwrap();
                prop_assert_eq!(invoice.total_amount(), expected);
                prop_assert_eq!(invoice.balance(), expected);
            }

            for idx in removals {
                if invoice.line_items().is_empty() {
                    break;
                }
                let id = invoice.line_items()[idx.index(invoice.line_items().len())].id_typed();
                invoice.remove_line_item(id, test_time()).unwrap();
                let expected = Money::checked_sum(invoice.line_items().iter().map(LineItem::amount)).unwrap();
                prop_assert_eq!(invoice.total_amount(), expected);
                prop_assert_eq!(invoice.balance(), expected);
            }
        }

        /// Property: payments that sum exactly to the total leave balance 0 and
        /// the invoice PAID; the status stays SENT before that.
        #[test]
        fn balance_converges_to_zero(
            cents in prop::collection::vec(1i64..100_000, 1..8),
        ) {
            let total: i64 = cents.iter().sum();
            let mut invoice = draft();
            invoice.add_line_item(item("Bulk", 1, total), test_time()).unwrap();
            invoice.mark_as_sent(test_time()).unwrap();

            let mut paid = 0i64;
            for c in &cents {
                prop_assert_eq!(invoice.status(), InvoiceStatus::Sent);
                paid += c;
                invoice.apply_payment_total(Money::from_cents(paid), test_time()).unwrap();
                prop_assert_eq!(invoice.balance(), Money::from_cents(total - paid));
            }

            prop_assert_eq!(invoice.balance(), Money::zero());
            prop_assert_eq!(invoice.status(), InvoiceStatus::Paid);
        }
    }
}
