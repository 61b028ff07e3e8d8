// ============================================================================
// InkBook Core - Audit Recorder
// File: crates/inkbook-core/src/services/audit_service.rs
// ============================================================================
//! Append-only audit log.
//!
//! `log` never fails into the caller: persistence errors are logged and
//! reported as `None` so a broken audit store cannot block a booking.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use inkbook_shared::Paginated;

use crate::domain::{AuditEntry, AuditQuery, NewAuditEntry};
use crate::error::DomainError;
use crate::repositories::AuditRepository;

pub struct AuditRecorder {
    repo: Arc<dyn AuditRepository>,
}

impl AuditRecorder {
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    pub async fn log(&self, entry: NewAuditEntry) -> Option<AuditEntry> {
        let action = entry.action;
        let record = AuditEntry::from_new(entry, Utc::now());

        match self.repo.append(&record).await {
            Ok(saved) => {
                debug!(action = %action, id = %saved.id, "Audit entry recorded");
                Some(saved)
            }
            Err(e) => {
                error!(action = %action, error = %e, "Failed to record audit entry");
                None
            }
        }
    }

    /// Always fails: records are immutable.
    pub async fn update(&self, id: Uuid) -> Result<AuditEntry, DomainError> {
        error!(id = %id, "Rejected attempt to update an audit entry");
        Err(DomainError::AuditLogImmutable("update"))
    }

    /// Always fails: records are immutable.
    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        error!(id = %id, "Rejected attempt to delete an audit entry");
        Err(DomainError::AuditLogImmutable("delete"))
    }

    // ------------------------------------------------------------------
    // Consultation
    // ------------------------------------------------------------------

    pub async fn find_one(&self, id: Uuid) -> Result<AuditEntry, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::AuditEntryNotFound(id))
    }

    pub async fn find_by_resource(
        &self,
        resource_type: &str,
        resource_id: Uuid,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        self.repo.find_by_resource(resource_type, resource_id).await
    }

    pub async fn find_by_actor(&self, actor_id: Uuid, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        self.repo.find_by_actor(actor_id, limit).await
    }

    pub async fn find_by_tenant(&self, tenant_id: Uuid, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        self.repo.find_by_tenant(tenant_id, limit).await
    }

    pub async fn query(&self, query: &AuditQuery) -> Result<Paginated<AuditEntry>, DomainError> {
        self.repo.query(query).await
    }

    pub async fn find_security_events(&self, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        self.repo.find_security_events(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditAction;
    use crate::repositories::MockAuditRepository;

    #[tokio::test]
    async fn test_log_returns_saved_entry() {
        let mut repo = MockAuditRepository::new();
        repo.expect_append().times(1).returning(|e| Ok(e.clone()));

        let recorder = AuditRecorder::new(Arc::new(repo));
        let saved = recorder
            .log(NewAuditEntry::new(AuditAction::AppointmentCreated, "created"))
            .await
            .unwrap();
        assert_eq!(saved.action, AuditAction::AppointmentCreated);
        assert!(saved.success);
    }

    #[tokio::test]
    async fn test_log_swallows_persistence_errors() {
        let mut repo = MockAuditRepository::new();
        repo.expect_append()
            .returning(|_| Err(DomainError::DatabaseError("connection reset".into())));

        let recorder = AuditRecorder::new(Arc::new(repo));
        let saved = recorder
            .log(NewAuditEntry::new(AuditAction::AppointmentDeleted, "deleted"))
            .await;
        assert!(saved.is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_fail_loudly() {
        let recorder = AuditRecorder::new(Arc::new(MockAuditRepository::new()));
        assert!(matches!(
            recorder.update(Uuid::new_v4()).await,
            Err(DomainError::AuditLogImmutable("update"))
        ));
        assert!(matches!(
            recorder.delete(Uuid::new_v4()).await,
            Err(DomainError::AuditLogImmutable("delete"))
        ));
    }

    #[tokio::test]
    async fn test_find_one_not_found() {
        let mut repo = MockAuditRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let recorder = AuditRecorder::new(Arc::new(repo));
        let id = Uuid::new_v4();
        assert!(matches!(recorder.find_one(id).await, Err(DomainError::AuditEntryNotFound(x)) if x == id));
    }
}
