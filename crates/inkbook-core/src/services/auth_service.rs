// ============================================================================
// InkBook Core - Authentication Service
// File: crates/inkbook-core/src/services/auth_service.rs
// ============================================================================
//! Registration, login, logout and token refresh

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use inkbook_security::{JwtService, PasswordService, TokenPair};

use crate::domain::{ActorContext, AuditAction, AuditSeverity, NewAuditEntry, User, UserType};
use crate::error::DomainError;
use crate::repositories::UserRepository;
use crate::services::AuditRecorder;

const RESOURCE_USER: &str = "USER";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub user_type: UserType,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Authentication service for handling user login/register flows
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: Arc<JwtService>,
    audit: Arc<AuditRecorder>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: Arc<JwtService>, audit: Arc<AuditRecorder>) -> Self {
        Self { users, jwt, audit }
    }

    /// Register a new user
    pub async fn register(&self, input: RegisterInput, actor: &ActorContext) -> Result<AuthResult, DomainError> {
        let masked = inkbook_shared::utils::mask_email(&input.email);
        info!("Registration attempt for email: {}", masked);

        // 1. Validate input
        input.validate()?;
        PasswordService::check_length(&input.password)
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        // 2. Check if email already exists
        let email = input.email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            warn!("Registration failed: email already exists: {}", masked);
            return Err(DomainError::EmailAlreadyExists(email));
        }

        // 3. Hash password
        let password_hash = PasswordService::hash(&input.password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        // 4. Create user entity
        let mut user = User::new(email, input.name, input.user_type, password_hash)?;
        user.phone = input.phone;

        // 5. Save
        let user = self.users.create(&user).await?;

        let entry = NewAuditEntry::new(AuditAction::UserCreated, format!("User registered: {}", user.name))
            .actor(&ActorContext {
                actor_id: Some(user.id),
                actor_email: Some(user.email.clone()),
                actor_name: Some(user.name.clone()),
                ..actor.clone()
            })
            .resource(RESOURCE_USER, user.id, Some(user.name.clone()))
            .metadata(serde_json::json!({ "user_type": user.user_type.as_str() }));
        self.audit.log(entry).await;

        // 6. Issue tokens
        let tokens = self.issue_tokens(&user)?;

        info!("Registration successful for: {}", masked);
        Ok(AuthResult { user, tokens })
    }

    /// Login with email and password
    pub async fn login(&self, email: &str, password: &str, actor: &ActorContext) -> Result<AuthResult, DomainError> {
        let masked = inkbook_shared::utils::mask_email(email);
        info!("Login attempt for email: {}", masked);

        // 1. Find user by email
        let email = email.trim().to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!("Login failed: email not found: {}", masked);
            self.record_failed_login(&email, None, "unknown email", actor).await;
            return Err(DomainError::InvalidCredentials);
        };

        // 2. Verify password
        let valid = PasswordService::verify(password, &user.password_hash).unwrap_or(false);
        if !valid {
            warn!("Login failed: invalid password for: {}", masked);
            self.record_failed_login(&email, Some(&user), "invalid password", actor).await;
            return Err(DomainError::InvalidCredentials);
        }

        // 3. Issue tokens
        let tokens = self.issue_tokens(&user)?;

        let entry = NewAuditEntry::new(AuditAction::UserLogin, format!("User logged in: {}", user.name))
            .actor(&ActorContext {
                actor_id: Some(user.id),
                actor_email: Some(user.email.clone()),
                actor_name: Some(user.name.clone()),
                ..actor.clone()
            })
            .resource(RESOURCE_USER, user.id, Some(user.name.clone()));
        self.audit.log(entry).await;

        info!("Login successful for: {}", masked);
        Ok(AuthResult { user, tokens })
    }

    /// Exchange a refresh token for a fresh pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| DomainError::InvalidToken(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| DomainError::InvalidToken(e.to_string()))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::InvalidToken("user no longer exists".to_string()))?;

        self.issue_tokens(&user)
    }

    /// Tokens are stateless, so logout only leaves an audit trail.
    pub async fn logout(&self, user_id: Uuid, actor: &ActorContext) -> Result<(), DomainError> {
        let user = self.users.find_by_id(user_id).await?.ok_or(DomainError::UserNotFound)?;

        let entry = NewAuditEntry::new(AuditAction::UserLogout, format!("User logged out: {}", user.name))
            .actor(actor)
            .resource(RESOURCE_USER, user.id, Some(user.name.clone()));
        self.audit.log(entry).await;

        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    fn issue_tokens(&self, user: &User) -> Result<TokenPair, DomainError> {
        self.jwt
            .generate_pair(&user.id, &user.email, user.user_type.as_str())
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))
    }

    async fn record_failed_login(&self, email: &str, user: Option<&User>, reason: &str, actor: &ActorContext) {
        let entry = NewAuditEntry::new(AuditAction::SecuritySuspiciousLogin, "Failed login attempt")
            .severity(AuditSeverity::Warning)
            .actor(&ActorContext {
                actor_id: user.map(|u| u.id),
                actor_email: Some(email.to_string()),
                ..actor.clone()
            })
            .failed("INVALID_CREDENTIALS", reason);
        self.audit.log(entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockAuditRepository, MockUserRepository};

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new("unit-test-secret".to_string(), 900, 3600))
    }

    fn recorder(audit: MockAuditRepository) -> Arc<AuditRecorder> {
        Arc::new(AuditRecorder::new(Arc::new(audit)))
    }

    fn input() -> RegisterInput {
        RegisterInput {
            email: "New.Client@Ink.test".to_string(),
            password: "s3cure-passw0rd".to_string(),
            name: "New Client".to_string(),
            user_type: UserType::Client,
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_register_issues_tokens() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().times(1).returning(|u| Ok(u.clone()));

        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(|e| e.action == AuditAction::UserCreated)
            .returning(|e| Ok(e.clone()));

        let jwt = jwt();
        let svc = AuthService::new(Arc::new(users), jwt.clone(), recorder(audit));
        let result = svc.register(input(), &ActorContext::default()).await.unwrap();

        assert_eq!(result.user.email, "new.client@ink.test");
        let claims = jwt.validate_access_token(&result.tokens.access_token).unwrap();
        assert_eq!(claims.user_type, "CLIENT");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let existing = User::new("new.client@ink.test".into(), "X".into(), UserType::Client, "h".into()).unwrap();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |_| Ok(Some(existing.clone())));
        users.expect_create().never();

        let svc = AuthService::new(Arc::new(users), jwt(), recorder(MockAuditRepository::new()));
        let result = svc.register(input(), &ActorContext::default()).await;
        assert!(matches!(result, Err(DomainError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let svc = AuthService::new(
            Arc::new(MockUserRepository::new()),
            jwt(),
            recorder(MockAuditRepository::new()),
        );
        let mut bad = input();
        bad.password = "short".to_string();
        let result = svc.register(bad, &ActorContext::default()).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_audited() {
        let hash = PasswordService::hash("the-right-password").unwrap();
        let user = User::new("artist@ink.test".into(), "Artist".into(), UserType::Artist, hash).unwrap();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |_| Ok(Some(user.clone())));

        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(|e| {
                e.action == AuditAction::SecuritySuspiciousLogin
                    && e.severity == AuditSeverity::Warning
                    && !e.success
            })
            .times(1)
            .returning(|e| Ok(e.clone()));

        let svc = AuthService::new(Arc::new(users), jwt(), recorder(audit));
        let result = svc
            .login("artist@ink.test", "the-wrong-password", &ActorContext::default())
            .await;
        assert!(matches!(result, Err(DomainError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let user = User::new("a@ink.test".into(), "A".into(), UserType::Client, "h".into()).unwrap();
        let jwt = jwt();
        let access = jwt.generate_access_token(&user.id, &user.email, "CLIENT").unwrap();

        let svc = AuthService::new(
            Arc::new(MockUserRepository::new()),
            jwt,
            recorder(MockAuditRepository::new()),
        );
        assert!(matches!(svc.refresh(&access).await, Err(DomainError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_logout_is_audited() {
        let user = User::new("a@ink.test".into(), "A".into(), UserType::Client, "h".into()).unwrap();
        let id = user.id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(move |e| e.action == AuditAction::UserLogout && e.resource_id == Some(id))
            .times(1)
            .returning(|e| Ok(e.clone()));

        let svc = AuthService::new(Arc::new(users), jwt(), recorder(audit));
        svc.logout(id, &ActorContext::user(id)).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_unknown_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let svc = AuthService::new(Arc::new(users), jwt(), recorder(MockAuditRepository::new()));
        let result = svc.logout(Uuid::new_v4(), &ActorContext::default()).await;
        assert!(matches!(result, Err(DomainError::UserNotFound)));
    }
}
