//! Repository traits (ports)

pub mod appointment_repository;
pub mod appointment_request_repository;
pub mod audit_repository;
pub mod calendar_repository;
pub mod tenant_repository;
pub mod user_repository;

pub use appointment_repository::AppointmentRepository;
pub use appointment_request_repository::AppointmentRequestRepository;
pub use audit_repository::AuditRepository;
pub use calendar_repository::CalendarRepository;
pub use tenant_repository::TenantRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use appointment_repository::MockAppointmentRepository;
#[cfg(test)]
pub use appointment_request_repository::MockAppointmentRequestRepository;
#[cfg(test)]
pub use audit_repository::MockAuditRepository;
#[cfg(test)]
pub use calendar_repository::MockCalendarRepository;
#[cfg(test)]
pub use tenant_repository::MockTenantRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
