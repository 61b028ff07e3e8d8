//! Appointment query strings

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use inkbook_core::{AppointmentFilter, AppointmentStatus};
use inkbook_shared::constants::DEFAULT_APPOINTMENT_PAGE_SIZE;
use inkbook_shared::Pagination;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub tenant_id: Option<Uuid>,
    pub calendar_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

impl AppointmentListQuery {
    pub fn into_parts(self) -> (AppointmentFilter, Pagination) {
        let pagination = Pagination::new(self.page, self.limit, DEFAULT_APPOINTMENT_PAGE_SIZE);
        let filter = AppointmentFilter {
            tenant_id: self.tenant_id,
            calendar_id: self.calendar_id,
            client_id: self.client_id,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            search: self.search.filter(|s| !s.trim().is_empty()),
        };
        (filter, pagination)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarRangeQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<u32>,
}
