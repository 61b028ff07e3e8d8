//! Read-only audit consultation for studio staff

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use inkbook_core::{AuditEntry, AuditQuery};
use inkbook_shared::Paginated;

use crate::dto::{AuditListQuery, LimitQuery};
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

const ACTOR_HISTORY_LIMIT: u32 = 50;
const TENANT_HISTORY_LIMIT: u32 = 100;
const SECURITY_EVENTS_LIMIT: u32 = 100;

/// GET /api/v1/audit
pub async fn query(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<AuditListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<AuditEntry>>>> {
    user.require_staff()?;
    let page = state.audit.query(&AuditQuery::from(params)).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/v1/audit/{id}
pub async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<AuditEntry>>> {
    user.require_staff()?;
    let entry = state.audit.find_one(id).await?;
    Ok(Json(ApiResponse::success(entry)))
}

/// GET /api/v1/audit/resource/{resource_type}/{resource_id}
pub async fn by_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path((resource_type, resource_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<ApiResponse<Vec<AuditEntry>>>> {
    user.require_staff()?;
    let trail = state
        .audit
        .find_by_resource(&resource_type.to_ascii_uppercase().replace('-', "_"), resource_id)
        .await?;
    Ok(Json(ApiResponse::success(trail)))
}

/// GET /api/v1/audit/actor/{actor_id}
pub async fn by_actor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(actor_id): Path<Uuid>,
    Query(limit): Query<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AuditEntry>>>> {
    user.require_staff()?;
    let entries = state
        .audit
        .find_by_actor(actor_id, limit.resolve(ACTOR_HISTORY_LIMIT))
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/v1/audit/tenant/{tenant_id}
pub async fn by_tenant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tenant_id): Path<Uuid>,
    Query(limit): Query<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AuditEntry>>>> {
    user.require_staff()?;
    let entries = state
        .audit
        .find_by_tenant(tenant_id, limit.resolve(TENANT_HISTORY_LIMIT))
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/v1/audit/security
pub async fn security_events(
    State(state): State<AppState>,
    user: AuthUser,
    Query(limit): Query<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AuditEntry>>>> {
    user.require_staff()?;
    let entries = state
        .audit
        .find_security_events(limit.resolve(SECURITY_EVENTS_LIMIT))
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}
