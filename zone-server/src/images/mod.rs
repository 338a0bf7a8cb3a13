//! Level images: object storage plus the per-slot registry

pub mod manager;
pub mod store;

pub use manager::{FloorImage, FloorImageBatch, ImageFile, RegisterImage, ZoneImageManager};
pub use store::{ImageStore, LocalImageStore, StorageError, StoredImage};
