//! # InkBook Core - Domain Module
//! 
//! Domain entities for the booking backend.

pub mod appointment;
pub mod appointment_request;
pub mod audit;
pub mod calendar;
pub mod event;
pub mod mail;
pub mod tenant;
pub mod user;

// Re-export all entities and enums
pub use appointment::{
    validate_time_range, Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, NewAppointment,
};
pub use appointment_request::{AcceptOutcome, AppointmentRequest, NewAppointmentRequest, RequestFilter, RequestStatus};
pub use audit::{ActorContext, AuditAction, AuditEntry, AuditQuery, AuditSeverity, NewAuditEntry};
pub use calendar::{Calendar, NewCalendar};
pub use event::{AppointmentEvent, AppointmentEventType, Channel, EventChanges};
pub use mail::{MailBody, MailMessage, MailReceipt, MailTemplate};
pub use tenant::{NewTenant, Tenant, TenantContact};
pub use user::{ProfileChanges, User, UserFilter, UserStatistics, UserType, UserTypeCounts, UserTypePercentages};
