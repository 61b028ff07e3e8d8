//! # InkBook Core
//! 
//! Domain entities, services, repository traits and collaborator ports
//! for the tattoo-studio booking backend.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod ports;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::{DomainError, ErrorKind};
