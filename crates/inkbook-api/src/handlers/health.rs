//! Liveness check

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::realtime::{RealtimeStats, RoomRegistry};

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    realtime: RealtimeStats,
}

pub async fn health_check(State(rooms): State<Arc<RoomRegistry>>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            realtime: rooms.stats(),
        }),
    )
}
