use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use invoiceme_core::{AggregateId, DomainError, DomainResult, Entity, TenantId};

/// Customer identifier (tenant-scoped via `tenant_id`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub AggregateId);

impl CustomerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Editable customer attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl CustomerDetails {
    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("customer email cannot be empty"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(DomainError::validation(format!(
                "invalid email format: {}",
                self.email
            )));
        }
        Ok(())
    }

    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            address: non_blank(self.address),
            phone: non_blank(self.phone),
        }
    }
}

/// Local part of `[A-Za-z0-9+_.-]+`, then `@`, then anything non-empty.
static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@(.+)$").ok());

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A customer billed by a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    tenant_id: TenantId,
    name: String,
    email: String,
    address: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn create(
        id: CustomerId,
        tenant_id: TenantId,
        details: CustomerDetails,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        details.validate()?;
        let details = details.normalized();
        Ok(Self {
            id,
            tenant_id,
            name: details.name,
            email: details.email,
            address: details.address,
            phone: details.phone,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace all editable attributes (validated as on creation).
    pub fn update(&mut self, details: CustomerDetails, now: DateTime<Utc>) -> DomainResult<()> {
        details.validate()?;
        let details = details.normalized();
        self.name = details.name;
        self.email = details.email;
        self.address = details.address;
        self.phone = details.phone;
        self.updated_at = now;
        Ok(())
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `email` names the same mailbox as this customer's (ASCII case-insensitive).
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_customer_id() -> CustomerId {
        CustomerId::new(AggregateId::new())
    }

    fn details(name: &str, email: &str) -> CustomerDetails {
        CustomerDetails {
            name: name.to_string(),
            email: email.to_string(),
            address: Some("123 Main St".to_string()),
            phone: Some("  ".to_string()),
        }
    }

    #[test]
    fn create_customer_normalizes_details() {
        let tenant_id = TenantId::new();
        let now = Utc::now();
        let customer = Customer::create(
            test_customer_id(),
            tenant_id,
            details("  Jane Doe ", " jane@example.com "),
            now,
        )
        .unwrap();

        assert_eq!(customer.tenant_id(), tenant_id);
        assert_eq!(customer.name(), "Jane Doe");
        assert_eq!(customer.email(), "jane@example.com");
        assert_eq!(customer.address(), Some("123 Main St"));
        assert_eq!(customer.phone(), None);
        assert_eq!(customer.created_at(), now);
        assert_eq!(customer.updated_at(), now);
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Customer::create(
            test_customer_id(),
            TenantId::new(),
            details(" ", "jane@example.com"),
            Utc::now(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("name") => {}
            other => panic!("expected name validation error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["", "jane", "@example.com", "jane@", "ja ne@example.com", "jäne@example.com"] {
            let result = Customer::create(
                test_customer_id(),
                TenantId::new(),
                details("Jane", email),
                Utc::now(),
            );
            assert!(
                matches!(result, Err(DomainError::Validation(_))),
                "expected {email:?} to be rejected"
            );
        }
    }

    #[test]
    fn permissive_email_shapes_are_accepted() {
        for email in [
            "jane+billing@example.com",
            "j.doe-1_x@sub.example",
            "a@b",
            "a@b@c",
            "jane@exa mple.com",
        ] {
            assert!(is_valid_email(email), "expected {email:?} to be accepted");
        }
    }

    #[test]
    fn domain_may_contain_another_at_sign() {
        let customer = Customer::create(
            test_customer_id(),
            TenantId::new(),
            details("Jane", "a@b@c"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(customer.email(), "a@b@c");
    }

    #[test]
    fn update_replaces_details_and_stamps_time() {
        let created = Utc::now();
        let mut customer = Customer::create(
            test_customer_id(),
            TenantId::new(),
            details("Jane", "jane@example.com"),
            created,
        )
        .unwrap();

        let later = created + chrono::Duration::minutes(1);
        customer
            .update(
                CustomerDetails {
                    name: "Jane Smith".to_string(),
                    email: "jane.smith@example.com".to_string(),
                    address: None,
                    phone: Some("+123456789".to_string()),
                },
                later,
            )
            .unwrap();

        assert_eq!(customer.name(), "Jane Smith");
        assert!(customer.has_email("JANE.SMITH@example.com"));
        assert_eq!(customer.address(), None);
        assert_eq!(customer.phone(), Some("+123456789"));
        assert_eq!(customer.created_at(), created);
        assert_eq!(customer.updated_at(), later);
    }

    #[test]
    fn failed_update_leaves_customer_untouched() {
        let mut customer = Customer::create(
            test_customer_id(),
            TenantId::new(),
            details("Jane", "jane@example.com"),
            Utc::now(),
        )
        .unwrap();
        let before = customer.clone();

        let err = customer
            .update(details("Jane", "not-an-email"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(customer, before);
    }
}
