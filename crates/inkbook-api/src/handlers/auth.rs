// ============================================================================
// InkBook API - Auth Handlers
// File: crates/inkbook-api/src/handlers/auth.rs
// ============================================================================
//! Registration, login, logout, token refresh and password changes

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use inkbook_core::services::{AuthResult, RegisterInput};
use inkbook_core::{User, UserType};
use inkbook_security::TokenPair;

use crate::dto::{ChangePasswordDto, LoginDto, RefreshDto};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiJson, AuthUser, ClientMeta, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    meta: ClientMeta,
    ApiJson(payload): ApiJson<RegisterInput>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthResult>>)> {
    if payload.user_type == UserType::Admin {
        return Err(ApiError::Forbidden("Administrators cannot self-register".into()));
    }

    let result = state.auth.register(payload, &meta.anonymous()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    meta: ClientMeta,
    ValidatedJson(payload): ValidatedJson<LoginDto>,
) -> ApiResult<Json<ApiResponse<AuthResult>>> {
    let result = state
        .auth
        .login(&payload.email, &payload.password, &meta.anonymous())
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshDto>,
) -> ApiResult<Json<ApiResponse<TokenPair>>> {
    let tokens = state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(ApiResponse::success(tokens)))
}

/// POST /api/v1/auth/logout
///
/// Access tokens stay valid until expiry; clients drop them.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    state.auth.logout(user.id, &user.actor).await?;
    Ok(Json(ApiResponse::success(json!({ "logged_out": true }))))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordDto>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    state
        .users
        .change_password(user.id, &payload.current_password, &payload.new_password, &user.actor)
        .await?;
    Ok(Json(ApiResponse::success(json!({ "password_changed": true }))))
}

/// POST /api/v1/auth/verify-email
pub async fn verify_email(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<ApiResponse<User>>> {
    let account = state.users.verify_email(user.id, &user.actor).await?;
    Ok(Json(ApiResponse::success(account)))
}
