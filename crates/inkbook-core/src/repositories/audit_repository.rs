//! Audit repository trait (port). Append and read only.

use async_trait::async_trait;
use uuid::Uuid;

use inkbook_shared::Paginated;

use crate::domain::{AuditEntry, AuditQuery};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditEntry, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditEntry>, DomainError>;
    /// Oldest first.
    async fn find_by_resource(
        &self,
        resource_type: &str,
        resource_id: Uuid,
    ) -> Result<Vec<AuditEntry>, DomainError>;
    /// Newest first.
    async fn find_by_actor(&self, actor_id: Uuid, limit: u32) -> Result<Vec<AuditEntry>, DomainError>;
    /// Newest first.
    async fn find_by_tenant(&self, tenant_id: Uuid, limit: u32) -> Result<Vec<AuditEntry>, DomainError>;
    async fn query(&self, query: &AuditQuery) -> Result<Paginated<AuditEntry>, DomainError>;
    /// ERROR/CRITICAL entries and SECURITY_* actions, newest first.
    async fn find_security_events(&self, limit: u32) -> Result<Vec<AuditEntry>, DomainError>;
}
