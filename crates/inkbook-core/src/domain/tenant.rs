//! Tattoo studio tenant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NewTenant {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    #[validate(length(min = 3, max = 40))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

impl Tenant {
    pub fn from_new(input: NewTenant, owner_id: Uuid, now: DateTime<Utc>) -> Result<Self, validator::ValidationErrors> {
        input.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            address: input.address,
            phone: input.phone,
            email: input.email.map(|e| e.trim().to_lowercase()),
            owner_id,
            created_at: now,
        })
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Tenant plus the owner's mail address, used for request broadcasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantContact {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub owner_email: String,
    pub owner_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> NewTenant {
        NewTenant {
            name: name.to_string(),
            description: None,
            address: Some("Calle Mayor 1".to_string()),
            phone: None,
            email: Some("Hello@Studio.ink".to_string()),
        }
    }

    #[test]
    fn test_from_new_sets_owner() {
        let owner = Uuid::new_v4();
        let tenant = Tenant::from_new(input(" Black Anchor "), owner, Utc::now()).unwrap();
        assert_eq!(tenant.name, "Black Anchor");
        assert_eq!(tenant.email.as_deref(), Some("hello@studio.ink"));
        assert!(tenant.is_owned_by(owner));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(Tenant::from_new(input(""), Uuid::new_v4(), Utc::now()).is_err());
    }
}
