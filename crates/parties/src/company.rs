use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoiceme_core::{DomainError, DomainResult, Entity, TenantId};

/// A company is the tenant: every customer, invoice and payment belongs to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    id: TenantId,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Company {
    pub fn create(id: TenantId, name: impl Into<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("company name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn rename(&mut self, name: impl Into<String>, now: DateTime<Utc>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("company name cannot be empty"));
        }
        self.name = name;
        self.updated_at = now;
        Ok(())
    }

    pub fn tenant_id(&self) -> TenantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Company {
    type Id = TenantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let err = Company::create(TenantId::new(), "   ", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rename_stamps_updated_at() {
        let created = Utc::now();
        let mut company = Company::create(TenantId::new(), "Acme", created).unwrap();
        let later = created + chrono::Duration::seconds(5);
        company.rename("Acme Ltd", later).unwrap();
        assert_eq!(company.name(), "Acme Ltd");
        assert_eq!(company.created_at(), created);
        assert_eq!(company.updated_at(), later);
    }
}
