// ============================================================================
// InkBook Core - Appointment Entity
// File: crates/inkbook-core/src/domain/appointment.rs
// ============================================================================
//! Booked appointments on a tenant calendar

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::services::conflict_checker::intervals_overlap;

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(AppointmentStatus::Pending),
            "CONFIRMED" => Some(AppointmentStatus::Confirmed),
            "CANCELLED" => Some(AppointmentStatus::Cancelled),
            "COMPLETED" => Some(AppointmentStatus::Completed),
            _ => None,
        }
    }

    /// Cancelled appointments release their slot.
    pub fn blocks_calendar(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub deposit: Option<f64>,
    pub total_price: Option<f64>,
    pub notes: Option<String>,
    pub design_images: Vec<String>,

    pub tenant_id: Uuid,
    pub calendar_id: Uuid,
    pub client_id: Uuid,
    /// Set when the appointment was produced by converting a request
    pub source_request_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for booking a new appointment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAppointment {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: Option<AppointmentStatus>,
    #[validate(range(min = 0.0))]
    pub deposit: Option<f64>,
    #[validate(range(min = 0.0))]
    pub total_price: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub design_images: Vec<String>,
    pub tenant_id: Uuid,
    pub calendar_id: Uuid,
    pub client_id: Uuid,
    #[serde(default)]
    pub source_request_id: Option<Uuid>,
}

impl NewAppointment {
    /// Field-level validation plus the start < end invariant.
    pub fn check(&self) -> Result<(), DomainError> {
        validate_time_range(self.start_time, self.end_time)?;
        self.validate()?;
        Ok(())
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppointmentChanges {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    #[validate(range(min = 0.0))]
    pub deposit: Option<f64>,
    #[validate(range(min = 0.0))]
    pub total_price: Option<f64>,
    pub notes: Option<String>,
    pub design_images: Option<Vec<String>>,
}

impl AppointmentChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.status.is_none()
            && self.deposit.is_none()
            && self.total_price.is_none()
            && self.notes.is_none()
            && self.design_images.is_none()
    }

    pub fn touches_schedule(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

/// Listing filter. Every populated field narrows the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub tenant_id: Option<Uuid>,
    pub calendar_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Case-insensitive match on title or description
    pub search: Option<String>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        if self.tenant_id.is_some_and(|id| id != appointment.tenant_id) {
            return false;
        }
        if self.calendar_id.is_some_and(|id| id != appointment.calendar_id) {
            return false;
        }
        if self.client_id.is_some_and(|id| id != appointment.client_id) {
            return false;
        }
        if self.status.is_some_and(|s| s != appointment.status) {
            return false;
        }
        if self.start_date.is_some_and(|d| appointment.start_time < d) {
            return false;
        }
        if self.end_date.is_some_and(|d| appointment.end_time > d) {
            return false;
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let in_title = inkbook_shared::utils::contains_ignore_case(&appointment.title, term);
            let in_description = appointment
                .description
                .as_deref()
                .is_some_and(|d| inkbook_shared::utils::contains_ignore_case(d, term));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}

/// Rejects empty or inverted intervals.
pub fn validate_time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), DomainError> {
    if start >= end {
        return Err(DomainError::InvalidTimeRange);
    }
    Ok(())
}

impl Appointment {
    pub fn from_new(new: NewAppointment, now: DateTime<Utc>) -> Result<Self, DomainError> {
        new.check()?;

        Ok(Self {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            start_time: new.start_time,
            end_time: new.end_time,
            status: new.status.unwrap_or_default(),
            deposit: new.deposit,
            total_price: new.total_price,
            notes: new.notes,
            design_images: new.design_images,
            tenant_id: new.tenant_id,
            calendar_id: new.calendar_id,
            client_id: new.client_id,
            source_request_id: new.source_request_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        intervals_overlap(self.start_time, self.end_time, start, end)
    }

    /// Same calendar, both holding their slot, overlapping intervals.
    pub fn conflicts_with(&self, other: &Appointment) -> bool {
        self.id != other.id
            && self.calendar_id == other.calendar_id
            && self.status.blocks_calendar()
            && other.status.blocks_calendar()
            && self.overlaps(other.start_time, other.end_time)
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time >= now
            && !matches!(self.status, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }

    pub fn is_in_progress(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    pub fn can_be_cancelled(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
            && self.start_time > now
    }

    pub fn can_be_rescheduled(&self, now: DateTime<Utc>) -> bool {
        self.can_be_cancelled(now)
    }

    /// Applies a partial update and validates the resulting interval.
    pub fn apply(&mut self, changes: &AppointmentChanges, now: DateTime<Utc>) -> Result<(), DomainError> {
        changes.validate()?;

        let start = changes.start_time.unwrap_or(self.start_time);
        let end = changes.end_time.unwrap_or(self.end_time);
        validate_time_range(start, end)?;

        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(deposit) = changes.deposit {
            self.deposit = Some(deposit);
        }
        if let Some(total_price) = changes.total_price {
            self.total_price = Some(total_price);
        }
        if let Some(notes) = &changes.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(images) = &changes.design_images {
            self.design_images = images.clone();
        }
        self.start_time = start;
        self.end_time = end;
        self.updated_at = now;
        Ok(())
    }
}
