// ============================================================================
// InkBook API - User Handlers
// File: crates/inkbook-api/src/handlers/users.rs
// ============================================================================
//! Account management. Listing and statistics are admin-only; a single
//! account is editable by its holder or an administrator.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use inkbook_core::{ProfileChanges, User, UserStatistics};
use inkbook_shared::Paginated;

use crate::dto::UserListQuery;
use crate::error::ApiResult;
use crate::middleware::{ApiJson, AuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<User>>>> {
    user.require_admin()?;
    let (filter, pagination) = query.into_parts();
    let page = state.users.find_all(&filter, pagination).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/v1/users/statistics
pub async fn statistics(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<UserStatistics>>> {
    user.require_admin()?;
    let stats = state.users.statistics().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /api/v1/users/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<ApiResponse<User>>> {
    let account = state.users.find_one(user.id).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// GET /api/v1/users/{id}
///
/// Staff can look up any account; clients only their own.
pub async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<User>>> {
    if user.is_client() {
        user.require_self_or_admin(id)?;
    }
    let account = state.users.find_one(id).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// PATCH /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(changes): ApiJson<ProfileChanges>,
) -> ApiResult<Json<ApiResponse<User>>> {
    user.require_self_or_admin(id)?;
    let account = state.users.update_profile(id, changes, &user.actor).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// DELETE /api/v1/users/{id}
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    user.require_self_or_admin(id)?;
    state.users.remove(id, &user.actor).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id, "deleted": true }))))
}
