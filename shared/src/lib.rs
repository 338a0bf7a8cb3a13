//! Shared types for the zone navigation server
//!
//! Wire models, error codes and the API response envelope used by
//! zone-server and its clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
