//! Repository Module
//!
//! Free functions for reads shared across services; the `*Repository`
//! structs own the writes that must invalidate caches.

pub mod apartment;
pub mod project;
pub mod zone;
pub mod zone_image;

pub use apartment::ApartmentRepository;
pub use zone::ZoneRepository;
