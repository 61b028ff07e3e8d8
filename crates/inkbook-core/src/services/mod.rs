//! Application services

pub mod appointment_request_service;
pub mod appointment_service;
pub mod audit_service;
pub mod auth_service;
pub mod conflict_checker;
pub mod tenant_service;
pub mod user_service;

pub use appointment_request_service::{
    AppointmentRequestService, ConversionOutcome, RequestConversion, RequestServiceDeps,
};
pub use appointment_service::AppointmentService;
pub use audit_service::AuditRecorder;
pub use auth_service::{AuthResult, AuthService, RegisterInput};
pub use conflict_checker::{intervals_overlap, ConflictChecker};
pub use tenant_service::TenantService;
pub use user_service::UserService;
