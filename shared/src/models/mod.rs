//! Data models
//!
//! Shared between zone-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod apartment;
pub mod catalogue;
pub mod navigation;
pub mod project;
pub mod zone;
pub mod zone_image;

// Re-exports
pub use apartment::*;
pub use catalogue::*;
pub use navigation::*;
pub use project::*;
pub use zone::*;
pub use zone_image::*;
