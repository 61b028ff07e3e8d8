//! # InkBook API
//!
//! HTTP handlers, extractors, DTOs, error mapping and the realtime
//! WebSocket surface.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod realtime;
pub mod response;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use realtime::{RealtimeNotifier, RoomRegistry};
pub use router::build_router;
pub use state::{Adapters, AppState};
