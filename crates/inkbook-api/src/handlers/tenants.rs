// ============================================================================
// InkBook API - Tenant Handlers
// File: crates/inkbook-api/src/handlers/tenants.rs
// ============================================================================
//! Studio onboarding: tenants, staff membership and calendars.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use inkbook_core::{Calendar, NewCalendar, NewTenant, Tenant};
use inkbook_shared::Paginated;

use crate::dto::{AddMemberDto, TenantListQuery};
use crate::error::ApiResult;
use crate::middleware::{ApiJson, AuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/tenants
///
/// The caller becomes the owner.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<NewTenant>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Tenant>>)> {
    user.require_staff()?;
    let tenant = state.tenants.create(payload, user.id, &user.actor).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tenant))))
}

/// GET /api/v1/tenants
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<TenantListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<Tenant>>>> {
    let page = state.tenants.find_all(query.pagination()).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/v1/tenants/{id}
pub async fn get_one(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Tenant>>> {
    let tenant = state.tenants.find_one(id).await?;
    Ok(Json(ApiResponse::success(tenant)))
}

/// POST /api/v1/tenants/{id}/members
pub async fn add_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<AddMemberDto>,
) -> ApiResult<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    user.require_staff()?;
    state
        .tenants
        .add_member(id, payload.user_id, user.id, &user.actor)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({ "tenant_id": id, "user_id": payload.user_id }))),
    ))
}

/// POST /api/v1/tenants/{id}/calendars
pub async fn create_calendar(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<NewCalendar>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Calendar>>)> {
    user.require_staff()?;
    let calendar = state
        .tenants
        .create_calendar(id, payload, user.id, &user.actor)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(calendar))))
}

/// GET /api/v1/tenants/{id}/calendars
pub async fn calendars(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Calendar>>>> {
    let calendars = state.tenants.list_calendars(id).await?;
    Ok(Json(ApiResponse::success(calendars)))
}
