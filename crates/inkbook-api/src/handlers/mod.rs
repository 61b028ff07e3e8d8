//! HTTP handlers

pub mod appointment_requests;
pub mod appointments;
pub mod audit;
pub mod auth;
pub mod health;
pub mod tenants;
pub mod users;
pub mod ws;
