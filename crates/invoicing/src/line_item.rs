use serde::{Deserialize, Serialize};

use invoiceme_core::{AggregateId, DomainError, DomainResult, Entity, Money};

/// Line item identifier (unique within the owning invoice).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub AggregateId);

impl LineItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One priced entry on an invoice.
///
/// `amount` is derived: it is recomputed from `unit_price * quantity` every
/// time either input changes and is never set on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    id: LineItemId,
    description: String,
    quantity: i32,
    unit_price: Money,
    amount: Money,
}

impl LineItem {
    /// Build a line item.
    ///
    /// Quantity and unit price arrive optional because they come straight from
    /// request payloads; a missing one is a validation failure. Quantity sign
    /// is not checked.
    pub fn create(
        id: LineItemId,
        description: impl Into<String>,
        quantity: Option<i32>,
        unit_price: Option<Money>,
    ) -> DomainResult<Self> {
        let (description, quantity, unit_price, amount) =
            Self::validated(description.into(), quantity, unit_price)?;
        Ok(Self {
            id,
            description,
            quantity,
            unit_price,
            amount,
        })
    }

    /// Replace description, quantity and unit price, recomputing the amount.
    ///
    /// The owning invoice's totals are not touched; callers must go through
    /// `Invoice::update_line_item` (or recompute themselves).
    pub fn update(
        &mut self,
        description: impl Into<String>,
        quantity: Option<i32>,
        unit_price: Option<Money>,
    ) -> DomainResult<()> {
        let (description, quantity, unit_price, amount) =
            Self::validated(description.into(), quantity, unit_price)?;
        self.description = description;
        self.quantity = quantity;
        self.unit_price = unit_price;
        self.amount = amount;
        Ok(())
    }

    fn validated(
        description: String,
        quantity: Option<i32>,
        unit_price: Option<Money>,
    ) -> DomainResult<(String, i32, Money, Money)> {
        if description.trim().is_empty() {
            return Err(DomainError::validation("line item description cannot be empty"));
        }
        let quantity =
            quantity.ok_or_else(|| DomainError::validation("line item quantity is required"))?;
        let unit_price = unit_price
            .ok_or_else(|| DomainError::validation("line item unit price is required"))?;
        let amount = unit_price.checked_mul_quantity(quantity)?;
        Ok((description, quantity, unit_price, amount))
    }

    pub fn id_typed(&self) -> LineItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn amount(&self) -> Money {
        self.amount
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
