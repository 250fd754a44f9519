//! # CourtRank server
//! This module hosts the HTTP surface for CourtRank. It is responsible for:
//! Authenticating players and admins on incoming requests.
//! Translating requests into calls on the engine's flow APIs.
//! Running the periodic settlement and expiry sweeps.
//! Forwarding engine events to the notification dispatcher.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod notifications;
pub mod routes;
pub mod server;
pub mod sweep_worker;

#[cfg(test)]
mod endpoint_tests;
