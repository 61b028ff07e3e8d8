//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    #[default]
    Client,
    Artist,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Client => "CLIENT",
            UserType::Artist => "ARTIST",
            UserType::Admin => "ADMIN",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CLIENT" => Some(UserType::Client),
            "ARTIST" => Some(UserType::Artist),
            "ADMIN" => Some(UserType::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Uuid,

    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub user_type: UserType,

    #[serde(skip_serializing, default)]
    pub password_hash: String,

    #[serde(default)]
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: String,
        name: String,
        user_type: UserType,
        password_hash: String,
    ) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let user = Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            name,
            phone: None,
            avatar: None,
            user_type,
            password_hash,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn is_client(&self) -> bool {
        self.user_type == UserType::Client
    }

    /// ARTIST and ADMIN users may own or staff a studio.
    pub fn is_staff(&self) -> bool {
        !self.is_client()
    }

    pub fn apply_profile(&mut self, changes: ProfileChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(phone) = changes.phone {
            self.phone = Some(phone);
        }
        if let Some(avatar) = changes.avatar {
            self.avatar = Some(avatar);
        }
        self.updated_at = now;
    }

    /// The audited part of a profile
    pub fn profile_snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "phone": self.phone,
            "avatar": self.avatar,
        })
    }

    /// Returns false when the address was already verified.
    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) -> bool {
        if self.email_verified_at.is_some() {
            return false;
        }
        self.email_verified_at = Some(now);
        self.updated_at = now;
        true
    }
}

/// Listing filter: `search` matches name or email, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFilter {
    pub search: Option<String>,
    pub user_type: Option<UserType>,
}

impl UserFilter {
    pub fn of_type(user_type: UserType) -> Self {
        Self {
            search: None,
            user_type: Some(user_type),
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        let type_ok = self.user_type.is_none_or(|t| t == user.user_type);
        let search_ok = self.search.as_deref().is_none_or(|term| {
            let term = term.to_lowercase();
            user.name.to_lowercase().contains(&term) || user.email.contains(&term)
        });
        type_ok && search_ok
    }
}

/// Self-service profile edit; absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProfileChanges {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 40))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub avatar: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.avatar.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserTypeCounts {
    pub artists: u64,
    pub clients: u64,
    pub admins: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserTypePercentages {
    pub artists: f64,
    pub clients: f64,
    pub admins: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub total: u64,
    pub by_type: UserTypeCounts,
    pub percentages: UserTypePercentages,
}

impl UserStatistics {
    pub fn from_counts(total: u64, by_type: UserTypeCounts) -> Self {
        let share = |n: u64| if total == 0 { 0.0 } else { n as f64 * 100.0 / total as f64 };
        Self {
            total,
            by_type,
            percentages: UserTypePercentages {
                artists: share(by_type.artists),
                clients: share(by_type.clients),
                admins: share(by_type.admins),
            },
        }
    }
}
