//! Tenant repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use inkbook_shared::Pagination;

use crate::domain::{Tenant, TenantContact};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, DomainError>;
    /// Oldest first.
    async fn find_all(&self, pagination: Pagination) -> Result<Vec<Tenant>, DomainError>;
    async fn count(&self) -> Result<u64, DomainError>;
    /// Every tenant with its owner's mail address.
    async fn find_all_contacts(&self) -> Result<Vec<TenantContact>, DomainError>;
    /// Owner or member of the tenant.
    async fn is_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, DomainError>;
    /// Idempotent.
    async fn add_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), DomainError>;
}
