// ============================================================================
// InkBook Core - User Service
// File: crates/inkbook-core/src/services/user_service.rs
// ============================================================================
//! Account management: listing, profile edits, password changes,
//! email verification, removal and role statistics. Every write is audited.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use inkbook_security::PasswordService;
use inkbook_shared::{Paginated, Pagination};

use crate::domain::{
    ActorContext, AuditAction, AuditSeverity, NewAuditEntry, ProfileChanges, User, UserFilter, UserStatistics,
    UserType, UserTypeCounts,
};
use crate::error::DomainError;
use crate::repositories::UserRepository;
use crate::services::AuditRecorder;

const RESOURCE_USER: &str = "USER";

pub struct UserService {
    users: Arc<dyn UserRepository>,
    audit: Arc<AuditRecorder>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, audit: Arc<AuditRecorder>) -> Self {
        Self { users, audit }
    }

    pub async fn find_all(&self, filter: &UserFilter, pagination: Pagination) -> Result<Paginated<User>, DomainError> {
        let data = self.users.find_all(filter, pagination).await?;
        let total = self.users.count(filter).await?;
        Ok(Paginated::new(data, total, pagination))
    }

    pub async fn find_one(&self, id: Uuid) -> Result<User, DomainError> {
        self.users.find_by_id(id).await?.ok_or(DomainError::UserNotFound)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
        actor: &ActorContext,
    ) -> Result<User, DomainError> {
        changes.validate()?;
        let mut user = self.find_one(id).await?;
        if changes.is_empty() {
            return Ok(user);
        }

        let before = user.profile_snapshot();
        user.apply_profile(changes, Utc::now());
        let user = self.users.update(&user).await?;

        let entry = NewAuditEntry::new(AuditAction::UserUpdated, format!("User profile updated: {}", user.name))
            .actor(actor)
            .resource(RESOURCE_USER, user.id, Some(user.name.clone()))
            .values(Some(before), Some(user.profile_snapshot()));
        self.audit.log(entry).await;

        info!(user_id = %id, "User profile updated");
        Ok(user)
    }

    /// Verifies the current password before storing the new hash.
    pub async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
        actor: &ActorContext,
    ) -> Result<(), DomainError> {
        let mut user = self.find_one(id).await?;

        let valid = PasswordService::verify(current_password, &user.password_hash).unwrap_or(false);
        if !valid {
            warn!(user_id = %id, "Password change rejected: wrong current password");
            let entry = NewAuditEntry::new(AuditAction::UserPasswordChanged, "Password change failed")
                .severity(AuditSeverity::Warning)
                .actor(actor)
                .resource(RESOURCE_USER, id, Some(user.name.clone()))
                .metadata(serde_json::json!({ "reason": "invalid_current_password" }))
                .failed("INVALID_CURRENT_PASSWORD", "Current password is incorrect");
            self.audit.log(entry).await;
            return Err(DomainError::InvalidCurrentPassword);
        }

        PasswordService::check_length(new_password).map_err(|e| DomainError::ValidationError(e.to_string()))?;
        user.password_hash =
            PasswordService::hash(new_password).map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
        user.updated_at = Utc::now();
        self.users.update(&user).await?;

        let entry = NewAuditEntry::new(AuditAction::UserPasswordChanged, "Password changed")
            .actor(actor)
            .resource(RESOURCE_USER, id, Some(user.name.clone()));
        self.audit.log(entry).await;

        info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Marks the address verified; a repeat call is a no-op.
    pub async fn verify_email(&self, id: Uuid, actor: &ActorContext) -> Result<User, DomainError> {
        let mut user = self.find_one(id).await?;
        if !user.mark_email_verified(Utc::now()) {
            return Ok(user);
        }
        let user = self.users.update(&user).await?;

        let entry = NewAuditEntry::new(AuditAction::UserEmailVerified, format!("Email verified: {}", user.email))
            .actor(actor)
            .resource(RESOURCE_USER, user.id, Some(user.name.clone()));
        self.audit.log(entry).await;

        info!(user_id = %id, "Email verified");
        Ok(user)
    }

    pub async fn remove(&self, id: Uuid, actor: &ActorContext) -> Result<(), DomainError> {
        let user = self.find_one(id).await?;
        self.users.delete(id).await?;

        let entry = NewAuditEntry::new(AuditAction::UserDeleted, format!("User deleted: {}", user.name))
            .severity(AuditSeverity::Warning)
            .actor(actor)
            .resource(RESOURCE_USER, user.id, Some(user.name.clone()))
            .values(
                Some(serde_json::json!({
                    "email": user.email,
                    "user_type": user.user_type.as_str(),
                })),
                None,
            );
        self.audit.log(entry).await;

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    pub async fn statistics(&self) -> Result<UserStatistics, DomainError> {
        let total = self.users.count(&UserFilter::default()).await?;
        let by_type = UserTypeCounts {
            artists: self.users.count(&UserFilter::of_type(UserType::Artist)).await?,
            clients: self.users.count(&UserFilter::of_type(UserType::Client)).await?,
            admins: self.users.count(&UserFilter::of_type(UserType::Admin)).await?,
        };
        Ok(UserStatistics::from_counts(total, by_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockAuditRepository, MockUserRepository};

    fn service(users: MockUserRepository, audit: MockAuditRepository) -> UserService {
        UserService::new(Arc::new(users), Arc::new(AuditRecorder::new(Arc::new(audit))))
    }

    fn stored_user(password: &str) -> User {
        let hash = PasswordService::hash(password).unwrap();
        User::new("ana@ink.test".into(), "Ana".into(), UserType::Client, hash).unwrap()
    }

    #[tokio::test]
    async fn test_change_password_rehashes() {
        let user = stored_user("old-password-1");
        let id = user.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        users
            .expect_update()
            .withf(|u| PasswordService::verify("new-password-2", &u.password_hash).unwrap_or(false))
            .times(1)
            .returning(|u| Ok(u.clone()));
        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(|e| e.action == AuditAction::UserPasswordChanged && e.success)
            .times(1)
            .returning(|e| Ok(e.clone()));

        let svc = service(users, audit);
        svc.change_password(id, "old-password-1", "new-password-2", &ActorContext::user(id))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_change_password_wrong_current_is_audited() {
        let user = stored_user("old-password-1");
        let id = user.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        users.expect_update().never();
        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(|e| e.action == AuditAction::UserPasswordChanged && !e.success && e.severity == AuditSeverity::Warning)
            .times(1)
            .returning(|e| Ok(e.clone()));

        let svc = service(users, audit);
        let result = svc
            .change_password(id, "guess", "new-password-2", &ActorContext::user(id))
            .await;
        assert!(matches!(result, Err(DomainError::InvalidCurrentPassword)));
    }

    #[tokio::test]
    async fn test_change_password_short_new_password() {
        let user = stored_user("old-password-1");
        let id = user.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        users.expect_update().never();

        let svc = service(users, MockAuditRepository::new());
        let result = svc.change_password(id, "old-password-1", "short", &ActorContext::user(id)).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_profile_records_old_and_new_values() {
        let user = stored_user("pw-123456");
        let id = user.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        users.expect_update().times(1).returning(|u| Ok(u.clone()));
        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(|e| {
                e.action == AuditAction::UserUpdated
                    && e.old_values.as_ref().is_some_and(|v| v["name"] == "Ana")
                    && e.new_values.as_ref().is_some_and(|v| v["name"] == "Ana Sol")
            })
            .times(1)
            .returning(|e| Ok(e.clone()));

        let svc = service(users, audit);
        let updated = svc
            .update_profile(
                id,
                ProfileChanges {
                    name: Some("Ana Sol".into()),
                    ..Default::default()
                },
                &ActorContext::user(id),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana Sol");
    }

    #[tokio::test]
    async fn test_verify_email_twice_writes_once() {
        let user = stored_user("pw-123456");
        let id = user.id;
        let mut verified = user.clone();
        verified.mark_email_verified(Utc::now());
        let mut reads = 0;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(2).returning(move |_| {
            reads += 1;
            Ok(Some(if reads == 1 { user.clone() } else { verified.clone() }))
        });
        users.expect_update().times(1).returning(|u| Ok(u.clone()));
        let mut audit = MockAuditRepository::new();
        audit.expect_append().times(1).returning(|e| Ok(e.clone()));

        let svc = service(users, audit);
        let first = svc.verify_email(id, &ActorContext::user(id)).await.unwrap();
        assert!(first.email_verified_at.is_some());
        let second = svc.verify_email(id, &ActorContext::user(id)).await.unwrap();
        assert!(second.email_verified_at.is_some());
    }

    #[tokio::test]
    async fn test_remove_in_use_is_not_audited() {
        let user = stored_user("pw-123456");
        let id = user.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        users.expect_delete().returning(|id| Err(DomainError::UserInUse(id)));
        let mut audit = MockAuditRepository::new();
        audit.expect_append().never();

        let svc = service(users, audit);
        let result = svc.remove(id, &ActorContext::user(id)).await;
        assert!(matches!(result, Err(DomainError::UserInUse(_))));
    }

    #[tokio::test]
    async fn test_statistics_counts_by_type() {
        let mut users = MockUserRepository::new();
        users.expect_count().returning(|filter| {
            Ok(match filter.user_type {
                None => 10,
                Some(UserType::Artist) => 3,
                Some(UserType::Client) => 6,
                Some(UserType::Admin) => 1,
            })
        });

        let svc = service(users, MockAuditRepository::new());
        let stats = svc.statistics().await.unwrap();
        assert_eq!(stats.total, 10);
        assert_eq!(stats.by_type.clients, 6);
        assert_eq!(stats.percentages.artists, 30.0);
    }
}
