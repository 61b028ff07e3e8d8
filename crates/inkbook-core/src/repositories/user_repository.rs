//! User repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use inkbook_shared::Pagination;

use crate::domain::{User, UserFilter};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn create(&self, user: &User) -> Result<User, DomainError>;
    /// Newest first.
    async fn find_all(&self, filter: &UserFilter, pagination: Pagination) -> Result<Vec<User>, DomainError>;
    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError>;
    /// Writes profile, password and verification fields.
    async fn update(&self, user: &User) -> Result<User, DomainError>;
    /// Fails with `UserInUse` while the user still owns a studio or bookings.
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}
