// ============================================================================
// InkBook API - Error Mapping
// File: crates/inkbook-api/src/error.rs
// ============================================================================
//! Maps domain and request errors onto HTTP statuses and the response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use inkbook_core::{DomainError, ErrorKind};

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Unauthorized => match e {
                    DomainError::NotRequestOwner
                    | DomainError::ActorNotInTenant(_)
                    | DomainError::NotTenantOwner(_)
                    | DomainError::NotAccountOwner => StatusCode::FORBIDDEN,
                    _ => StatusCode::UNAUTHORIZED,
                },
                ErrorKind::Persistence | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Domain(e) => e.code(),
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Domain(DomainError::from(errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = if status.is_server_error() {
            tracing::error!(code, "Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            tracing::warn!(code, status = status.as_u16(), "Request rejected: {}", self);
            self.to_string()
        };

        (status, Json(ApiResponse::error(code, message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
