//! Request DTOs

pub mod appointment;
pub mod appointment_request;
pub mod audit;
pub mod auth;
pub mod tenant;
pub mod user;

pub use appointment::{AppointmentListQuery, CalendarRangeQuery, UpcomingQuery};
pub use appointment_request::{AcceptRequestDto, RequestListQuery};
pub use audit::{AuditListQuery, LimitQuery};
pub use auth::{LoginDto, RefreshDto};
pub use tenant::{AddMemberDto, TenantListQuery};
pub use user::{ChangePasswordDto, UserListQuery};
