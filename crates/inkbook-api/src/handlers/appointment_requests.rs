// ============================================================================
// InkBook API - Appointment Request Handlers
// File: crates/inkbook-api/src/handlers/appointment_requests.rs
// ============================================================================
//! Request lifecycle endpoints. Clients open and cancel requests; studio
//! staff browse, accept and convert them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use inkbook_core::services::{ConversionOutcome, RequestConversion};
use inkbook_core::{AppointmentRequest, NewAppointmentRequest};
use inkbook_shared::Paginated;

use crate::dto::{AcceptRequestDto, RequestListQuery};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiJson, AuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/appointment-requests
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<NewAppointmentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AppointmentRequest>>)> {
    user.require_client()?;
    let request = state.requests.create(payload, user.id, &user.actor).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(request))))
}

/// GET /api/v1/appointment-requests
///
/// Clients only ever see their own requests.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(mut query): Query<RequestListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<AppointmentRequest>>>> {
    query.validate()?;
    if user.is_client() {
        query.client_id = Some(user.id);
    }
    let page = state
        .requests
        .find_all(&query.filter(), query.limit, query.offset)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/v1/appointment-requests/mine
pub async fn mine(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<AppointmentRequest>>>> {
    user.require_client()?;
    let requests = state.requests.find_by_client(user.id).await?;
    Ok(Json(ApiResponse::success(requests)))
}

/// GET /api/v1/appointment-requests/available/{tenant_id}
pub async fn available(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tenant_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<AppointmentRequest>>>> {
    user.require_staff()?;
    let requests = state.requests.find_available_for_tenant(tenant_id).await?;
    Ok(Json(ApiResponse::success(requests)))
}

/// GET /api/v1/appointment-requests/{id}
pub async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<AppointmentRequest>>> {
    let request = state.requests.find_by_id(id).await?;
    if user.is_client() && !request.is_owned_by(user.id) {
        return Err(ApiError::Forbidden("Request belongs to another client".into()));
    }
    Ok(Json(ApiResponse::success(request)))
}

/// PATCH /api/v1/appointment-requests/{id}/accept
pub async fn accept(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<AcceptRequestDto>,
) -> ApiResult<Json<ApiResponse<AppointmentRequest>>> {
    user.require_staff()?;
    let request = state.requests.accept(id, body.tenant_id, &user.actor).await?;
    Ok(Json(ApiResponse::success(request)))
}

/// PATCH /api/v1/appointment-requests/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<AppointmentRequest>>> {
    let request = state.requests.cancel(id, user.id, &user.actor).await?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/v1/appointment-requests/{id}/convert-to-appointment
pub async fn convert(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(conversion): ApiJson<RequestConversion>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ConversionOutcome>>)> {
    user.require_staff()?;
    let outcome = state.requests.convert_to_appointment(id, conversion, &user.actor).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

/// POST /api/v1/appointment-requests/expire
pub async fn expire(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    user.require_admin()?;
    let expired = state.requests.expire_requests().await?;
    Ok(Json(ApiResponse::success(json!({ "expired": expired }))))
}
