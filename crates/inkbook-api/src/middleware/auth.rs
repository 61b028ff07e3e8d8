// ============================================================================
// InkBook API - Request Extractors
// File: crates/inkbook-api/src/middleware/auth.rs
// ============================================================================
//! Bearer authentication, request metadata and JSON body extractors.

use std::convert::Infallible;

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use inkbook_core::{ActorContext, DomainError, UserType};

use crate::error::ApiError;
use crate::state::AppState;

/// Where a request came from. Feeds the audit trail.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: String,
    pub method: String,
}

impl ClientMeta {
    fn from_parts(parts: &Parts) -> Self {
        Self {
            ip_address: client_ip(&parts.headers),
            user_agent: header_str(&parts.headers, header::USER_AGENT.as_str()),
            endpoint: parts.uri.path().to_string(),
            method: parts.method.to_string(),
        }
    }

    /// Actor context for unauthenticated calls (register, login)
    pub fn anonymous(&self) -> ActorContext {
        self.apply(ActorContext {
            actor_type: Some("ANONYMOUS".to_string()),
            ..Default::default()
        })
    }

    fn apply(&self, mut actor: ActorContext) -> ActorContext {
        actor.ip_address = self.ip_address.clone();
        actor.user_agent = self.user_agent.clone();
        actor.endpoint = Some(self.endpoint.clone());
        actor.method = Some(self.method.clone());
        actor
    }
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Authenticated principal from a valid access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub user_type: UserType,
    pub actor: ActorContext,
}

impl AuthUser {
    pub fn is_client(&self) -> bool {
        self.user_type == UserType::Client
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    pub fn require_client(&self) -> Result<(), ApiError> {
        if self.is_client() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Only clients can perform this action".into()))
        }
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.is_client() {
            Err(ApiError::Forbidden("Studio staff only".into()))
        } else {
            Ok(())
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Administrators only".into()))
        }
    }

    /// Account-level writes: the account holder or an administrator.
    pub fn require_self_or_admin(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::NotAccountOwner.into())
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))?;
        let user = authenticate(state, token)?;
        let meta = ClientMeta::from_parts(parts);
        Ok(AuthUser {
            actor: meta.apply(user.actor),
            ..user
        })
    }
}

/// Validates an access token and builds the principal.
pub fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    let id = claims
        .user_id()
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    let user_type = UserType::from_str(&claims.user_type)
        .ok_or_else(|| ApiError::Unauthorized(format!("Unknown user type {}", claims.user_type)))?;

    Ok(AuthUser {
        id,
        actor: ActorContext::user(id).with_email(claims.email.clone()),
        email: claims.email,
        user_type,
    })
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name)?.to_str().ok().map(str::to_string)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|xff| xff.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
}

/// JSON body whose rejection uses the API envelope.
/// Domain payloads are validated by the services.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// JSON body validated with `validator` before the handler runs
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.9"));

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_self_or_admin() {
        let own = Uuid::new_v4();
        let user = |user_type| AuthUser {
            id: own,
            email: "a@ink.test".into(),
            user_type,
            actor: ActorContext::user(own),
        };
        assert!(user(UserType::Client).require_self_or_admin(own).is_ok());
        assert!(user(UserType::Admin).require_self_or_admin(Uuid::new_v4()).is_ok());
        let denied = user(UserType::Artist).require_self_or_admin(Uuid::new_v4()).unwrap_err();
        assert_eq!(denied.status(), axum::http::StatusCode::FORBIDDEN);
    }
}
