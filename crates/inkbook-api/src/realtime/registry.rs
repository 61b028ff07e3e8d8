// ============================================================================
// InkBook API - Realtime Room Registry
// File: crates/inkbook-api/src/realtime/registry.rs
// ============================================================================
//! Connections, their bounded outbound queues and the rooms they joined.
//!
//! Delivery is at-most-once: a full or closed queue drops the message for
//! that connection only.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use inkbook_core::Channel;

pub type ConnectionId = u64;

/// Pre-serialised frame shared by every recipient
pub type Frame = Arc<str>;

struct Connection {
    sender: mpsc::Sender<Frame>,
    channels: HashSet<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RealtimeStats {
    pub connections: usize,
    pub rooms: usize,
    /// Subscribers per tenant room
    pub tenant_subscribers: HashMap<Uuid, usize>,
}

pub struct RoomRegistry {
    connections: DashMap<ConnectionId, Connection>,
    rooms: DashMap<Channel, HashSet<ConnectionId>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl RoomRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Registers a connection and hands back the receiving end of its queue.
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        self.connections.insert(
            id,
            Connection {
                sender,
                channels: HashSet::new(),
            },
        );
        info!(connection_id = id, "Realtime client connected");
        (id, receiver)
    }

    /// Returns `false` when the connection is unknown.
    pub fn subscribe(&self, connection_id: ConnectionId, channel: Channel) -> bool {
        match self.connections.get_mut(&connection_id) {
            Some(mut connection) => {
                connection.channels.insert(channel);
            }
            None => return false,
        }
        self.rooms.entry(channel).or_default().insert(connection_id);
        info!(connection_id, channel = %channel, "Subscribed");
        true
    }

    /// Returns `true` when the connection was in the room.
    pub fn unsubscribe(&self, connection_id: ConnectionId, channel: Channel) -> bool {
        let was_member = self
            .connections
            .get_mut(&connection_id)
            .map(|mut c| c.channels.remove(&channel))
            .unwrap_or(false);
        self.leave_room(connection_id, channel);
        if was_member {
            info!(connection_id, channel = %channel, "Unsubscribed");
        }
        was_member
    }

    /// Drops the connection and removes it from every room.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        if let Some((_, connection)) = self.connections.remove(&connection_id) {
            for channel in connection.channels {
                self.leave_room(connection_id, channel);
            }
            info!(connection_id, "Realtime client disconnected");
        }
    }

    fn leave_room(&self, connection_id: ConnectionId, channel: Channel) {
        if let Some(mut members) = self.rooms.get_mut(&channel) {
            members.remove(&connection_id);
        }
        self.rooms.remove_if(&channel, |_, members| members.is_empty());
    }

    /// Enqueues `frame` once per connection subscribed to any of `channels`.
    /// Returns how many queues accepted it.
    pub fn publish(&self, channels: &[Channel], frame: Frame) -> usize {
        let mut recipients = HashSet::new();
        for channel in channels {
            if let Some(members) = self.rooms.get(channel) {
                recipients.extend(members.iter().copied());
            }
        }

        recipients
            .into_iter()
            .filter(|id| self.send_to(*id, frame.clone()))
            .count()
    }

    /// Direct reply to one connection
    pub fn send_to(&self, connection_id: ConnectionId, frame: Frame) -> bool {
        let Some(sender) = self.connections.get(&connection_id).map(|c| c.sender.clone()) else {
            return false;
        };
        match sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(connection_id, "Outbound queue full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(connection_id, "Outbound queue closed");
                false
            }
        }
    }

    pub fn stats(&self) -> RealtimeStats {
        let tenant_subscribers = self
            .rooms
            .iter()
            .filter_map(|room| match room.key() {
                Channel::Tenant(id) => Some((*id, room.value().len())),
                Channel::Calendar(_) => None,
            })
            .collect();

        RealtimeStats {
            connections: self.connections.len(),
            rooms: self.rooms.len(),
            tenant_subscribers,
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(inkbook_shared::constants::DEFAULT_REALTIME_QUEUE_CAPACITY)
    }
}
