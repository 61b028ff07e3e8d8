//! Appointment event fan-out

use chrono::{DateTime, Utc};

use crate::domain::{Appointment, AppointmentStatus, EventChanges};

/// Publishes appointment lifecycle events to the tenant and calendar channels.
///
/// Fire-and-forget: implementations deliver at most once, never block the
/// caller and log their own failures.
#[cfg_attr(test, mockall::automock)]
pub trait EventNotifier: Send + Sync {
    fn emit_created(&self, appointment: &Appointment);
    fn emit_updated(&self, appointment: &Appointment, changes: Option<EventChanges>);
    fn emit_deleted(&self, appointment: &Appointment);
    fn emit_status_changed(&self, appointment: &Appointment, old_status: AppointmentStatus);
    fn emit_rescheduled(
        &self,
        appointment: &Appointment,
        old_start: DateTime<Utc>,
        old_end: DateTime<Utc>,
    );
}
