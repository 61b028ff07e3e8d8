//! Event notifier backed by the room registry

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use inkbook_core::ports::EventNotifier;
use inkbook_core::{Appointment, AppointmentEvent, AppointmentStatus, EventChanges};

use super::protocol::appointment_frame;
use super::registry::RoomRegistry;

pub struct RealtimeNotifier {
    rooms: Arc<RoomRegistry>,
}

impl RealtimeNotifier {
    pub fn new(rooms: Arc<RoomRegistry>) -> Self {
        Self { rooms }
    }

    fn publish(&self, event: AppointmentEvent) {
        let frame = match appointment_frame(&event) {
            Ok(frame) => frame,
            Err(e) => {
                error!(appointment_id = %event.appointment_id, "Failed to encode event: {}", e);
                return;
            }
        };

        let delivered = self.rooms.publish(&event.channels(), frame);
        debug!(
            appointment_id = %event.appointment_id,
            event = event.event_type.event_name(),
            delivered,
            "Emitted appointment event"
        );
    }
}

impl EventNotifier for RealtimeNotifier {
    fn emit_created(&self, appointment: &Appointment) {
        self.publish(AppointmentEvent::created(appointment));
    }

    fn emit_updated(&self, appointment: &Appointment, changes: Option<EventChanges>) {
        self.publish(AppointmentEvent::updated(appointment, changes));
    }

    fn emit_deleted(&self, appointment: &Appointment) {
        self.publish(AppointmentEvent::deleted(appointment));
    }

    fn emit_status_changed(&self, appointment: &Appointment, old_status: AppointmentStatus) {
        self.publish(AppointmentEvent::status_changed(appointment, old_status));
    }

    fn emit_rescheduled(&self, appointment: &Appointment, old_start: DateTime<Utc>, old_end: DateTime<Utc>) {
        self.publish(AppointmentEvent::rescheduled(appointment, old_start, old_end));
    }
}
