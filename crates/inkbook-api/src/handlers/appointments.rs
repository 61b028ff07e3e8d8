// ============================================================================
// InkBook API - Appointment Handlers
// File: crates/inkbook-api/src/handlers/appointments.rs
// ============================================================================
//! Appointment CRUD and calendar views. Reads need any authenticated user,
//! writes need studio staff.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use inkbook_core::{Appointment, AppointmentChanges, NewAppointment};
use inkbook_shared::constants::MAX_PAGE_SIZE;
use inkbook_shared::Paginated;

use crate::dto::{AppointmentListQuery, CalendarRangeQuery, UpcomingQuery};
use crate::error::ApiResult;
use crate::middleware::{ApiJson, AuthUser};
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/appointments
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<NewAppointment>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Appointment>>)> {
    user.require_staff()?;
    let appointment = state.appointments.create(payload, &user.actor).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(appointment))))
}

/// GET /api/v1/appointments
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<AppointmentListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<Appointment>>>> {
    let (filter, pagination) = query.into_parts();
    let page = state.appointments.find_all(&filter, pagination).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/v1/appointments/calendar/{calendar_id}
pub async fn by_calendar(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(calendar_id): Path<Uuid>,
    Query(range): Query<CalendarRangeQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Appointment>>>> {
    let appointments = state
        .appointments
        .find_by_calendar(calendar_id, range.start_date, range.end_date)
        .await?;
    Ok(Json(ApiResponse::success(appointments)))
}

/// GET /api/v1/appointments/tenant/{tenant_id}/upcoming
pub async fn upcoming(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(tenant_id): Path<Uuid>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Appointment>>>> {
    let limit = query
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(state.upcoming_default_limit)
        .min(MAX_PAGE_SIZE);
    let appointments = state.appointments.find_upcoming(tenant_id, limit).await?;
    Ok(Json(ApiResponse::success(appointments)))
}

/// GET /api/v1/appointments/{id}
pub async fn get_one(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    let appointment = state.appointments.find_one(id).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

/// PATCH /api/v1/appointments/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(changes): ApiJson<AppointmentChanges>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    user.require_staff()?;
    let appointment = state.appointments.update(id, changes, &user.actor).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

/// DELETE /api/v1/appointments/{id}
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    user.require_staff()?;
    state.appointments.remove(id, &user.actor).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id, "deleted": true }))))
}
