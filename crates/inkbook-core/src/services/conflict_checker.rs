// ============================================================================
// InkBook Core - Conflict Checker
// File: crates/inkbook-core/src/services/conflict_checker.rs
// ============================================================================
//! Calendar time-conflict detection.
//!
//! Intervals are half-open `[start, end)`: an appointment ending at 11:00
//! does not collide with one starting at 11:00.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DomainError;
use crate::repositories::AppointmentRepository;

/// Overlap test for an existing booking `[existing_start, existing_end)`
/// against a candidate `[start, end)`, as the union of three clauses:
/// the existing booking straddles the candidate start, straddles the
/// candidate end, or lies fully inside the candidate.
///
/// Equivalent to `existing_start < end && start < existing_end` for
/// non-empty intervals.
pub fn intervals_overlap(
    existing_start: DateTime<Utc>,
    existing_end: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    let straddles_start = existing_start <= start && existing_end > start;
    let straddles_end = existing_start < end && existing_end >= end;
    let contained = existing_start >= start && existing_end <= end;
    straddles_start || straddles_end || contained
}

pub struct ConflictChecker {
    appointments: Arc<dyn AppointmentRepository>,
}

impl ConflictChecker {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    /// Caller guarantees `start < end`. `exclude_id` skips the appointment
    /// being rescheduled.
    pub async fn has_conflict(
        &self,
        calendar_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        let conflicting = self
            .appointments
            .find_conflicting(calendar_id, start, end, exclude_id)
            .await?;

        debug!(
            calendar_id = %calendar_id,
            found = conflicting.len(),
            "Conflict check"
        );

        Ok(!conflicting.is_empty())
    }

    /// Fails with `TimeConflict` when the slot is taken.
    pub async fn ensure_available(
        &self,
        calendar_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<(), DomainError> {
        if self.has_conflict(calendar_id, start, end, exclude_id).await? {
            warn!(
                calendar_id = %calendar_id,
                start = %start,
                end = %end,
                "Time conflict detected"
            );
            return Err(DomainError::TimeConflict);
        }
        Ok(())
    }
}
