//! Database module (PostgreSQL adapters)

pub mod connection;
pub mod postgres;

pub use connection::{create_pool, run_migrations};
pub use postgres::{
    PgAppointmentRepository, PgAppointmentRequestRepository, PgAuditRepository, PgCalendarRepository,
    PgTenantRepository, PgUserRepository,
};
