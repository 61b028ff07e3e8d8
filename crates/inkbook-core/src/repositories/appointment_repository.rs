//! Appointment repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use inkbook_shared::Pagination;

use crate::domain::{Appointment, AppointmentFilter};
use crate::error::DomainError;

/// Storage for appointments.
///
/// `create` and `update` must refuse a row that would overlap another
/// non-cancelled appointment in the same calendar, returning
/// `DomainError::TimeConflict`. This closes the window between the
/// service-level conflict check and the write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, DomainError>;
    /// Ordered by start time ascending.
    async fn find_all(
        &self,
        filter: &AppointmentFilter,
        pagination: Pagination,
    ) -> Result<Vec<Appointment>, DomainError>;
    async fn count(&self, filter: &AppointmentFilter) -> Result<u64, DomainError>;
    async fn find_by_calendar(
        &self,
        calendar_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, DomainError>;
    async fn find_upcoming(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Appointment>, DomainError>;
    /// Non-cancelled appointments of the calendar overlapping `[start, end)`,
    /// never including `exclude_id`.
    async fn find_conflicting(
        &self,
        calendar_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, DomainError>;
    async fn update(&self, appointment: &Appointment) -> Result<Appointment, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}
