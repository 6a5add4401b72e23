//! # Workflows API Library
//!
//! This library provides the core functionality for the Workflows API service,
//! including handlers, models, and server configuration.

pub mod agents;
pub mod auth;
pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod workflow;
pub use migration;
