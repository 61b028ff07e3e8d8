//! PostgreSQL repository implementations

pub mod appointment_repo_impl;
pub mod appointment_request_repo_impl;
pub mod audit_repo_impl;
pub mod calendar_repo_impl;
pub mod tenant_repo_impl;
pub mod user_repo_impl;

pub use appointment_repo_impl::PgAppointmentRepository;
pub use appointment_request_repo_impl::PgAppointmentRequestRepository;
pub use audit_repo_impl::PgAuditRepository;
pub use calendar_repo_impl::PgCalendarRepository;
pub use tenant_repo_impl::PgTenantRepository;
pub use user_repo_impl::PgUserRepository;

use inkbook_core::error::DomainError;
use tracing::error;

/// SQLSTATE for `EXCLUDE` constraint violations
pub(crate) const EXCLUSION_VIOLATION: &str = "23P01";
/// SQLSTATE for unique constraint violations
pub(crate) const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for foreign key violations
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";

pub(crate) fn sqlstate(e: &sqlx::Error) -> Option<String> {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

/// `OFFSET` binds are BIGINT; anything larger is a caller error, not a 500.
pub(crate) fn offset_param(offset: u64) -> Result<i64, DomainError> {
    i64::try_from(offset).map_err(|_| DomainError::ValidationError(format!("offset {} is out of range", offset)))
}

/// Escapes `LIKE` wildcards in user-supplied search terms.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub(crate) fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("Database error {}: {}", context, e);
    DomainError::DatabaseError(e.to_string())
}
