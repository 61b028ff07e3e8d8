// ============================================================================
// InkBook API - Appointment WebSocket
// File: crates/inkbook-api/src/handlers/ws.rs
// ============================================================================
//! `GET /ws/appointments`: clients join tenant or calendar rooms and receive
//! appointment events. One writer task drains the connection queue; the
//! reader handles subscribe/unsubscribe messages.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::{authenticate, bearer_token};
use crate::realtime::protocol::{ack_frame, connected_frame, error_frame};
use crate::realtime::{ClientAction, ClientMessage, ConnectionId, RoomRegistry};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Browsers cannot set headers on the upgrade request
    pub token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<WsParams>,
) -> ApiResult<Response> {
    let token = params
        .token
        .as_deref()
        .or_else(|| bearer_token(&headers))
        .ok_or_else(|| ApiError::Unauthorized("Missing access token".into()))?;
    let user = authenticate(&state, token)?;

    let rooms = state.rooms.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, rooms, user.id)))
}

async fn handle_socket(socket: WebSocket, rooms: Arc<RoomRegistry>, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let (connection_id, mut outbound) = rooms.register();
    info!(connection_id, user_id = %user_id, "Appointment socket opened");
    rooms.send_to(connection_id, connected_frame(connection_id));

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                break;
            }
        }
    });

    let inbound_rooms = rooms.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => handle_client_message(&inbound_rooms, connection_id, text.as_str()),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    rooms.disconnect(connection_id);
}

pub(crate) fn handle_client_message(rooms: &RoomRegistry, connection_id: ConnectionId, text: &str) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => match message.target() {
            Some(channel) => {
                match message.action {
                    ClientAction::Subscribe => {
                        rooms.subscribe(connection_id, channel);
                    }
                    ClientAction::Unsubscribe => {
                        rooms.unsubscribe(connection_id, channel);
                    }
                }
                ack_frame(message.action, channel)
            }
            None => error_frame("channel must be 'tenant' or 'calendar'"),
        },
        Err(e) => {
            debug!(connection_id, "Unreadable socket message: {}", e);
            error_frame("expected {\"action\", \"channel\", \"id\"}")
        }
    };
    rooms.send_to(connection_id, reply);
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkbook_core::Channel;

    fn next_event(rx: &mut tokio::sync::mpsc::Receiver<crate::realtime::Frame>) -> serde_json::Value {
        let frame = rx.try_recv().unwrap();
        serde_json::from_str(&frame).unwrap()
    }

    #[test]
    fn test_subscribe_then_unsubscribe() {
        let rooms = RoomRegistry::new(8);
        let (id, mut rx) = rooms.register();
        let tenant = Uuid::new_v4();

        let subscribe = format!(r#"{{"action":"subscribe","channel":"tenant","id":"{}"}}"#, tenant);
        handle_client_message(&rooms, id, &subscribe);
        assert_eq!(next_event(&mut rx)["event"], "subscribed");
        assert_eq!(rooms.stats().tenant_subscribers.get(&tenant), Some(&1));

        let unsubscribe = format!(r#"{{"action":"unsubscribe","channel":"tenant","id":"{}"}}"#, tenant);
        handle_client_message(&rooms, id, &unsubscribe);
        assert_eq!(next_event(&mut rx)["event"], "unsubscribed");
        assert!(rooms.stats().tenant_subscribers.is_empty());
    }

    #[test]
    fn test_bad_messages_get_error_replies() {
        let rooms = RoomRegistry::new(8);
        let (id, mut rx) = rooms.register();

        handle_client_message(&rooms, id, "not json");
        assert_eq!(next_event(&mut rx)["event"], "error");

        let unknown = format!(r#"{{"action":"subscribe","channel":"studio","id":"{}"}}"#, Uuid::new_v4());
        handle_client_message(&rooms, id, &unknown);
        assert_eq!(next_event(&mut rx)["event"], "error");
        assert_eq!(rooms.stats().rooms, 0);
    }

    #[test]
    fn test_subscribed_connection_receives_published_frames() {
        let rooms = RoomRegistry::new(8);
        let (id, mut rx) = rooms.register();
        let calendar = Uuid::new_v4();

        let subscribe = format!(r#"{{"action":"subscribe","channel":"calendar","id":"{}"}}"#, calendar);
        handle_client_message(&rooms, id, &subscribe);
        let _ack = next_event(&mut rx);

        rooms.publish(&[Channel::Calendar(calendar)], Arc::from(r#"{"event":"appointment:created"}"#));
        assert_eq!(next_event(&mut rx)["event"], "appointment:created");
    }
}
