//! Domain errors

use thiserror::Error;
use uuid::Uuid;

use crate::domain::RequestStatus;

/// Error taxonomy exposed to callers. Every `DomainError` belongs to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Unauthorized,
    Persistence,
    Internal,
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(Uuid),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(Uuid),

    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    #[error("User not found")]
    UserNotFound,

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(Uuid),

    #[error("Appointment request not found: {0}")]
    RequestNotFound(Uuid),

    #[error("Audit log not found: {0}")]
    AuditEntryNotFound(Uuid),

    #[error("Start time must be before end time")]
    InvalidTimeRange,

    #[error("Calendar {calendar_id} does not belong to tenant {tenant_id}")]
    CalendarTenantMismatch { calendar_id: Uuid, tenant_id: Uuid },

    #[error("User must be of type CLIENT")]
    NotAClient,

    #[error("Request has expired")]
    RequestExpired,

    #[error("Request cannot be accepted in status {0}")]
    RequestNotAcceptable(RequestStatus),

    #[error("Request cannot be cancelled in status {0}")]
    RequestNotCancellable(RequestStatus),

    #[error("Request cannot be expired in status {0}")]
    RequestNotExpirable(RequestStatus),

    #[error("Request must be accepted before converting to appointment (status {0})")]
    RequestNotAccepted(RequestStatus),

    #[error("Request must have an accepted tenant")]
    RequestMissingTenant,

    #[error("There is a time conflict with another appointment in this calendar")]
    TimeConflict,

    #[error("Request has already been accepted by another tenant")]
    RequestAlreadyAccepted,

    #[error("Request changed while being converted (now {0})")]
    ConversionConflict(RequestStatus),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("User {0} still owns studios or bookings")]
    UserInUse(Uuid),

    #[error("Current password is incorrect")]
    InvalidCurrentPassword,

    #[error("Studio owners and members must be ARTIST or ADMIN users")]
    NotStaff,

    #[error("Only the owner can manage tenant {0}")]
    NotTenantOwner(Uuid),

    #[error("Users may only manage their own account")]
    NotAccountOwner,

    #[error("Only the client can cancel their request")]
    NotRequestOwner,

    #[error("Actor does not belong to tenant {0}")]
    ActorNotInTenant(Uuid),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Audit logs are immutable: {0} is not supported")]
    AuditLogImmutable(&'static str),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::TenantNotFound(_)
            | DomainError::CalendarNotFound(_)
            | DomainError::ClientNotFound(_)
            | DomainError::UserNotFound
            | DomainError::AppointmentNotFound(_)
            | DomainError::RequestNotFound(_)
            | DomainError::AuditEntryNotFound(_) => ErrorKind::NotFound,

            DomainError::InvalidTimeRange
            | DomainError::CalendarTenantMismatch { .. }
            | DomainError::NotAClient
            | DomainError::RequestExpired
            | DomainError::RequestNotAcceptable(_)
            | DomainError::RequestNotCancellable(_)
            | DomainError::RequestNotExpirable(_)
            | DomainError::RequestNotAccepted(_)
            | DomainError::RequestMissingTenant
            | DomainError::InvalidCurrentPassword
            | DomainError::NotStaff
            | DomainError::ValidationError(_) => ErrorKind::Validation,

            DomainError::TimeConflict
            | DomainError::RequestAlreadyAccepted
            | DomainError::ConversionConflict(_)
            | DomainError::UserInUse(_)
            | DomainError::EmailAlreadyExists(_) => ErrorKind::Conflict,

            DomainError::NotRequestOwner
            | DomainError::ActorNotInTenant(_)
            | DomainError::NotTenantOwner(_)
            | DomainError::NotAccountOwner
            | DomainError::InvalidCredentials
            | DomainError::InvalidToken(_) => ErrorKind::Unauthorized,

            DomainError::DatabaseError(_) => ErrorKind::Persistence,

            DomainError::AuditLogImmutable(_)
            | DomainError::PasswordHashError(_)
            | DomainError::TokenGenerationError(_)
            | DomainError::NotificationError(_)
            | DomainError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code used in API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::TenantNotFound(_) => "TENANT_NOT_FOUND",
            DomainError::CalendarNotFound(_) => "CALENDAR_NOT_FOUND",
            DomainError::ClientNotFound(_) => "CLIENT_NOT_FOUND",
            DomainError::UserNotFound => "USER_NOT_FOUND",
            DomainError::AppointmentNotFound(_) => "APPOINTMENT_NOT_FOUND",
            DomainError::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            DomainError::AuditEntryNotFound(_) => "AUDIT_NOT_FOUND",
            DomainError::InvalidTimeRange => "INVALID_TIME_RANGE",
            DomainError::CalendarTenantMismatch { .. } => "CALENDAR_TENANT_MISMATCH",
            DomainError::NotAClient => "NOT_A_CLIENT",
            DomainError::RequestExpired => "REQUEST_EXPIRED",
            DomainError::RequestNotAcceptable(_) => "REQUEST_NOT_ACCEPTABLE",
            DomainError::RequestNotCancellable(_) => "REQUEST_NOT_CANCELLABLE",
            DomainError::RequestNotExpirable(_) => "REQUEST_NOT_EXPIRABLE",
            DomainError::RequestNotAccepted(_) => "REQUEST_NOT_ACCEPTED",
            DomainError::RequestMissingTenant => "REQUEST_MISSING_TENANT",
            DomainError::TimeConflict => "TIME_CONFLICT",
            DomainError::RequestAlreadyAccepted => "REQUEST_ALREADY_ACCEPTED",
            DomainError::ConversionConflict(_) => "REQUEST_CONVERSION_CONFLICT",
            DomainError::EmailAlreadyExists(_) => "EMAIL_ALREADY_EXISTS",
            DomainError::UserInUse(_) => "USER_IN_USE",
            DomainError::InvalidCurrentPassword => "INVALID_CURRENT_PASSWORD",
            DomainError::NotStaff => "NOT_STAFF",
            DomainError::NotTenantOwner(_) => "NOT_TENANT_OWNER",
            DomainError::NotAccountOwner => "NOT_ACCOUNT_OWNER",
            DomainError::NotRequestOwner => "NOT_REQUEST_OWNER",
            DomainError::ActorNotInTenant(_) => "ACTOR_NOT_IN_TENANT",
            DomainError::InvalidCredentials => "INVALID_CREDENTIALS",
            DomainError::InvalidToken(_) => "INVALID_TOKEN",
            DomainError::AuditLogImmutable(_) => "AUDIT_LOG_IMMUTABLE",
            DomainError::PasswordHashError(_) => "PASSWORD_HASH_ERROR",
            DomainError::TokenGenerationError(_) => "TOKEN_GENERATION_ERROR",
            DomainError::ValidationError(_) => "VALIDATION_ERROR",
            DomainError::DatabaseError(_) => "DATABASE_ERROR",
            DomainError::NotificationError(_) => "NOTIFICATION_ERROR",
            DomainError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::ValidationError(errors.to_string())
    }
}
