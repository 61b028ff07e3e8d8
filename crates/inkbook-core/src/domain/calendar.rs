//! Calendar entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NewCalendar {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Display colour such as `#1f2937`
    #[validate(length(min = 1, max = 16))]
    pub color: Option<String>,
}

impl Calendar {
    pub fn from_new(input: NewCalendar, tenant_id: Uuid, now: DateTime<Utc>) -> Result<Self, validator::ValidationErrors> {
        input.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: input.name.trim().to_string(),
            description: input.description,
            color: input.color,
            created_at: now,
        })
    }

    pub fn belongs_to(&self, tenant_id: Uuid) -> bool {
        self.tenant_id == tenant_id
    }
}
