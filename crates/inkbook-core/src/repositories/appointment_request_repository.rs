//! Appointment request repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AppointmentRequest, RequestFilter, RequestStatus};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRequestRepository: Send + Sync {
    async fn create(&self, request: &AppointmentRequest) -> Result<AppointmentRequest, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AppointmentRequest>, DomainError>;
    /// Newest first.
    async fn find_all(
        &self,
        filter: &RequestFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<AppointmentRequest>, DomainError>;
    async fn count(&self, filter: &RequestFilter) -> Result<u64, DomainError>;
    async fn find_by_client(&self, client_id: Uuid) -> Result<Vec<AppointmentRequest>, DomainError>;
    /// PENDING, not expired at `now`, not accepted by anyone.
    async fn find_available(&self, now: DateTime<Utc>) -> Result<Vec<AppointmentRequest>, DomainError>;
    /// PENDING with `expires_at <= now`.
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<AppointmentRequest>, DomainError>;
    async fn update(&self, request: &AppointmentRequest) -> Result<AppointmentRequest, DomainError>;
    /// Compare-and-set: writes `request` only if the stored status is still
    /// `expected`. Returns `None` when another writer got there first.
    async fn update_if_status(
        &self,
        request: &AppointmentRequest,
        expected: RequestStatus,
    ) -> Result<Option<AppointmentRequest>, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}
