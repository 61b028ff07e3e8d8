//! Realtime fan-out over WebSocket rooms

mod notifier;
pub(crate) mod protocol;
mod registry;

pub use notifier::RealtimeNotifier;
pub use protocol::{ClientAction, ClientMessage, ServerFrame};
pub use registry::{ConnectionId, Frame, RealtimeStats, RoomRegistry};
