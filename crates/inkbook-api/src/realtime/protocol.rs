//! JSON messages exchanged on the appointments socket.
//!
//! Every server frame is `{"event": <name>, "payload": <object>}`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use inkbook_core::{AppointmentEvent, Channel};

use super::registry::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAction {
    Subscribe,
    Unsubscribe,
}

/// `{"action":"subscribe","channel":"tenant","id":"..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    pub action: ClientAction,
    pub channel: String,
    pub id: Uuid,
}

impl ClientMessage {
    pub fn target(&self) -> Option<Channel> {
        Channel::parse(&self.channel, self.id)
    }
}

#[derive(Debug, Serialize)]
pub struct ServerFrame<'a, T: Serialize> {
    pub event: &'a str,
    pub payload: T,
}

impl<'a, T: Serialize> ServerFrame<'a, T> {
    pub fn new(event: &'a str, payload: T) -> Self {
        Self { event, payload }
    }

    pub fn encode(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::from)
    }
}

pub(crate) fn appointment_frame(event: &AppointmentEvent) -> Result<Frame, serde_json::Error> {
    ServerFrame::new(event.event_type.event_name(), event).encode()
}

pub(crate) fn connected_frame(connection_id: u64) -> Frame {
    json_frame("connected", json!({ "connection_id": connection_id }))
}

pub(crate) fn ack_frame(action: ClientAction, channel: Channel) -> Frame {
    let event = match action {
        ClientAction::Subscribe => "subscribed",
        ClientAction::Unsubscribe => "unsubscribed",
    };
    json_frame(event, serde_json::to_value(channel).unwrap_or_default())
}

pub(crate) fn error_frame(message: &str) -> Frame {
    json_frame("error", json!({ "message": message }))
}

fn json_frame(event: &str, payload: serde_json::Value) -> Frame {
    Frame::from(json!({ "event": event, "payload": payload }).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parses_channel() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"action":"subscribe","channel":"calendar","id":"{}"}}"#, id);
        let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(msg.action, ClientAction::Subscribe);
        assert_eq!(msg.target(), Some(Channel::Calendar(id)));
    }

    #[test]
    fn test_unknown_channel_kind_has_no_target() {
        let msg = ClientMessage {
            action: ClientAction::Unsubscribe,
            channel: "studio".into(),
            id: Uuid::nil(),
        };
        assert!(msg.target().is_none());
    }

    #[test]
    fn test_ack_echoes_channel() {
        let id = Uuid::new_v4();
        let frame = ack_frame(ClientAction::Subscribe, Channel::Tenant(id));
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["event"], "subscribed");
        assert_eq!(value["payload"]["channel"], "tenant");
        assert_eq!(value["payload"]["id"], id.to_string());
    }
}
