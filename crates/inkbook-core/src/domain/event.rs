//! Appointment lifecycle events fanned out to realtime subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::appointment::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentEventType {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    Rescheduled,
}

impl AppointmentEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentEventType::Created => "created",
            AppointmentEventType::Updated => "updated",
            AppointmentEventType::Deleted => "deleted",
            AppointmentEventType::StatusChanged => "status_changed",
            AppointmentEventType::Rescheduled => "rescheduled",
        }
    }

    /// Name of the event on the wire, e.g. `appointment:created`
    pub fn event_name(&self) -> &'static str {
        match self {
            AppointmentEventType::Created => "appointment:created",
            AppointmentEventType::Updated => "appointment:updated",
            AppointmentEventType::Deleted => "appointment:deleted",
            AppointmentEventType::StatusChanged => "appointment:status_changed",
            AppointmentEventType::Rescheduled => "appointment:rescheduled",
        }
    }
}

/// Topic a subscriber can join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "channel", content = "id", rename_all = "lowercase")]
pub enum Channel {
    Tenant(Uuid),
    Calendar(Uuid),
}

impl Channel {
    pub fn parse(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "tenant" => Some(Channel::Tenant(id)),
            "calendar" => Some(Channel::Calendar(id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Tenant(id) => write!(f, "tenant:{}", id),
            Channel::Calendar(id) => write!(f, "calendar:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub old_value: serde_json::Value,
    pub new_value: serde_json::Value,
}

/// Payload delivered to every subscriber of the appointment's channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentEvent {
    pub appointment_id: Uuid,
    pub tenant_id: Uuid,
    pub calendar_id: Uuid,
    pub client_id: Uuid,
    pub event_type: AppointmentEventType,
    pub timestamp: DateTime<Utc>,
    pub data: Appointment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<EventChanges>,
}

impl AppointmentEvent {
    fn build(
        appointment: &Appointment,
        event_type: AppointmentEventType,
        changes: Option<EventChanges>,
    ) -> Self {
        Self {
            appointment_id: appointment.id,
            tenant_id: appointment.tenant_id,
            calendar_id: appointment.calendar_id,
            client_id: appointment.client_id,
            event_type,
            timestamp: Utc::now(),
            data: appointment.clone(),
            changes,
        }
    }

    pub fn created(appointment: &Appointment) -> Self {
        Self::build(appointment, AppointmentEventType::Created, None)
    }

    pub fn updated(appointment: &Appointment, changes: Option<EventChanges>) -> Self {
        Self::build(appointment, AppointmentEventType::Updated, changes)
    }

    pub fn deleted(appointment: &Appointment) -> Self {
        Self::build(appointment, AppointmentEventType::Deleted, None)
    }

    pub fn status_changed(appointment: &Appointment, old: AppointmentStatus) -> Self {
        let changes = EventChanges {
            field: Some("status".to_string()),
            old_value: serde_json::json!(old.as_str()),
            new_value: serde_json::json!(appointment.status.as_str()),
        };
        Self::build(appointment, AppointmentEventType::StatusChanged, Some(changes))
    }

    pub fn rescheduled(
        appointment: &Appointment,
        old_start: DateTime<Utc>,
        old_end: DateTime<Utc>,
    ) -> Self {
        let changes = EventChanges {
            field: None,
            old_value: serde_json::json!({ "start_time": old_start, "end_time": old_end }),
            new_value: serde_json::json!({
                "start_time": appointment.start_time,
                "end_time": appointment.end_time,
            }),
        };
        Self::build(appointment, AppointmentEventType::Rescheduled, Some(changes))
    }

    /// Every event goes to both the tenant and the calendar channel.
    pub fn channels(&self) -> [Channel; 2] {
        [Channel::Tenant(self.tenant_id), Channel::Calendar(self.calendar_id)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_display_and_parse() {
        let id = Uuid::new_v4();
        assert_eq!(Channel::Tenant(id).to_string(), format!("tenant:{}", id));
        assert_eq!(Channel::parse("calendar", id), Some(Channel::Calendar(id)));
        assert_eq!(Channel::parse("room", id), None);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(AppointmentEventType::StatusChanged.event_name(), "appointment:status_changed");
        assert_eq!(AppointmentEventType::Created.as_str(), "created");
    }
}
