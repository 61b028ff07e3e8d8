//! Request extractors

pub mod auth;

pub use auth::{ApiJson, AuthUser, ClientMeta, ValidatedJson};
