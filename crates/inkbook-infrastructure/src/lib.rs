//! # InkBook Infrastructure
//!
//! Adapters for the core ports: PostgreSQL and in-memory repositories,
//! mail transports and background jobs.

pub mod database;
pub mod memory;
pub mod mail;
pub mod jobs;

pub use database::{
    create_pool, run_migrations, PgAppointmentRepository, PgAppointmentRequestRepository, PgAuditRepository,
    PgCalendarRepository, PgTenantRepository, PgUserRepository,
};
pub use memory::MemoryStore;
pub use mail::{LogMailer, MailError, SmtpMailer, TemplateRenderer};
pub use jobs::ExpirySweeper;
