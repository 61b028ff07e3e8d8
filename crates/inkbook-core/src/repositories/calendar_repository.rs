//! Calendar repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Calendar;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarRepository: Send + Sync {
    async fn create(&self, calendar: &Calendar) -> Result<Calendar, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Calendar>, DomainError>;
    async fn find_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Calendar>, DomainError>;
}
