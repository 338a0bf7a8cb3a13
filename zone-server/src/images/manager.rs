//! Zone image manager
//!
//! One image per (project, level, building?, floor?, image_type) slot.
//! Registering into an occupied slot replaces the previous image: its row is
//! swapped for the new one in a single transaction and its storage object is
//! released once nothing references it.
//!
//! Old objects are released only after the replacing row has committed.
//! Objects are content-addressed and may be shared between slots, so every
//! object write and every reference check plus unlink happens under one lock.

use std::collections::HashSet;
use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{ImageType, ZoneImage, ZoneImageQuery, ZoneImageUpdate};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::{Mutex, MutexGuard};

use crate::audit_log;
use crate::db::repository::zone_image::{ZoneImageChanges, ZoneImageInsert};
use crate::db::repository::{project, zone_image};
use crate::error::ServiceResult;
use crate::images::store::{ImageStore, StoredImage};
use crate::navigation::{LevelContext, NavScope, NavigationCache};
use crate::utils::validation::{MAX_VIEWBOX_LEN, validate_fraction, validate_positive};

/// Used when neither explicit dimensions nor viewbox components are given
pub const DEFAULT_WIDTH: i64 = 1920;
pub const DEFAULT_HEIGHT: i64 = 1080;

pub const DEFAULT_OPACITY: f64 = 1.0;

/// Upper bound of files in one floor batch
pub const MAX_BATCH_FILES: usize = 50;

const RASTER_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Uploaded file: original name plus content
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Image registration request
#[derive(Debug, Clone)]
pub struct RegisterImage {
    pub project_id: i64,
    pub context: LevelContext,
    pub image_type: ImageType,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub viewbox: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub display_order: Option<i32>,
    pub opacity: Option<f64>,
}

/// One floor of a batch upload
#[derive(Debug, Clone)]
pub struct FloorImage {
    pub floor_number: i32,
    pub file: ImageFile,
}

/// Per-floor images of one building, registered in one transaction
///
/// Viewbox and dimensions are shared by every floor of the batch.
#[derive(Debug, Clone)]
pub struct FloorImageBatch {
    pub project_id: i64,
    pub building_id: i64,
    pub image_type: ImageType,
    pub viewbox: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub floors: Vec<FloorImage>,
}

/// Parse `"minX minY width height"` (whitespace or comma separated)
///
/// Fewer than four components is allowed; every present component must be a
/// finite number.
pub fn parse_viewbox(viewbox: &str) -> Result<Vec<f64>, AppError> {
    let invalid = |reason: String| {
        AppError::with_message(ErrorCode::InvalidViewbox, reason).with_detail("field", "viewbox")
    };

    if viewbox.len() > MAX_VIEWBOX_LEN {
        return Err(invalid(format!("viewbox is longer than {MAX_VIEWBOX_LEN} chars")));
    }
    let parts = viewbox
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid(format!("viewbox component '{s}' is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if parts.len() > 4 {
        return Err(invalid("viewbox has more than four components".to_string()));
    }
    Ok(parts)
}

/// Explicit dimensions win, then viewbox components 3 and 4, then 1920×1080
pub fn resolve_dimensions(
    viewbox_parts: &[f64],
    width: Option<i64>,
    height: Option<i64>,
) -> (i64, i64) {
    let from_viewbox = |index: usize| {
        viewbox_parts
            .get(index)
            .map(|v| v.round() as i64)
            .filter(|v| *v > 0)
    };
    (
        width
            .filter(|w| *w > 0)
            .or_else(|| from_viewbox(2))
            .unwrap_or(DEFAULT_WIDTH),
        height
            .filter(|h| *h > 0)
            .or_else(|| from_viewbox(3))
            .unwrap_or(DEFAULT_HEIGHT),
    )
}

/// Stored viewbox and dimensions of a request
///
/// A missing viewbox is stored as `"0 0 {width} {height}"`.
fn resolve_geometry(
    viewbox: Option<&str>,
    width: Option<i64>,
    height: Option<i64>,
) -> Result<(String, i64, i64), AppError> {
    validate_positive(width, "width")?;
    validate_positive(height, "height")?;
    match viewbox.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => {
            let (w, h) = resolve_dimensions(&parse_viewbox(v)?, width, height);
            Ok((v.to_string(), w, h))
        }
        None => {
            let (w, h) = resolve_dimensions(&[], width, height);
            Ok((format!("0 0 {w} {h}"), w, h))
        }
    }
}

/// Validated upload: lower-case extension plus raster size when decodable
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedImage {
    pub extension: String,
    pub dimensions: Option<(u32, u32)>,
}

/// Validate image file size, extension and content
pub fn validate_image(
    data: &[u8],
    file_name: &str,
    max_bytes: usize,
) -> Result<ValidatedImage, AppError> {
    if data.is_empty() {
        return Err(AppError::invalid_field("file", "Empty file provided"));
    }
    if data.len() > max_bytes {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("File too large. Maximum size is {max_bytes} bytes"),
        )
        .with_detail("size", data.len()));
    }

    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::UnsupportedImageFormat,
                format!("Invalid file extension for: {file_name}"),
            )
        })?;

    if extension == "svg" {
        let head = String::from_utf8_lossy(&data[..data.len().min(1024)]);
        if !head.contains("<svg") {
            return Err(AppError::with_message(
                ErrorCode::UnsupportedImageFormat,
                "File is not an SVG document",
            ));
        }
        return Ok(ValidatedImage {
            extension,
            dimensions: None,
        });
    }

    if !RASTER_FORMATS.contains(&extension.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedImageFormat,
            format!(
                "Unsupported file format '{extension}'. Supported: svg, {}",
                RASTER_FORMATS.join(", ")
            ),
        ));
    }

    let img = image::load_from_memory(data).map_err(|e| {
        AppError::with_message(
            ErrorCode::UnsupportedImageFormat,
            format!("Invalid image file ({extension}): {e}"),
        )
    })?;

    Ok(ValidatedImage {
        extension,
        dimensions: Some((img.width(), img.height())),
    })
}

fn replace_failed(e: &crate::error::ServiceError, project_id: i64, slots: usize) -> AppError {
    tracing::error!(project_id, slots, error = ?e, "Image replacement failed");
    AppError::with_message(
        ErrorCode::ImageReplaceFailed,
        "Image replacement failed; the slot was left unchanged",
    )
}

/// Swap the slot's current row for `row`, returning the replaced row
async fn replace_slot(
    conn: &mut SqliteConnection,
    row: ZoneImageInsert<'_>,
) -> ServiceResult<Option<ZoneImage>> {
    let previous =
        zone_image::find_for_slot(&mut *conn, row.project_id, row.context, row.image_type).await?;
    if let Some(old) = &previous {
        zone_image::delete(&mut *conn, old.id).await?;
    }
    zone_image::insert(&mut *conn, row).await?;
    Ok(previous)
}

#[derive(Clone)]
pub struct ZoneImageManager {
    pool: SqlitePool,
    store: Arc<dyn ImageStore>,
    navigation: NavigationCache,
    max_upload_bytes: usize,
    objects: Arc<Mutex<()>>,
}

impl ZoneImageManager {
    pub fn new(
        pool: SqlitePool,
        store: Arc<dyn ImageStore>,
        navigation: NavigationCache,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            pool,
            store,
            navigation,
            max_upload_bytes,
            objects: Arc::new(Mutex::new(())),
        }
    }

    fn with_url(&self, mut image: ZoneImage) -> ZoneImage {
        image.url = self.store.url_for(&image.storage_key);
        image
    }

    async fn require_context(&self, project_id: i64, context: &LevelContext) -> ServiceResult<()> {
        project::require_project(&self.pool, project_id).await?;
        if let Some(building_id) = context.building_id() {
            project::require_building(&self.pool, project_id, building_id).await?;
        }
        Ok(())
    }

    /// Remove a storage object once no row references it
    async fn release_object(&self, _objects: &MutexGuard<'_, ()>, key: &str) {
        match zone_image::is_key_referenced(&self.pool, key).await {
            Ok(false) => {
                if let Err(e) = self.store.delete(key).await {
                    tracing::warn!(key = %key, error = %e, "Orphaned image object left in storage");
                }
            }
            Ok(true) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = ?e, "Could not check image object references");
            }
        }
    }

    async fn release_all<'k>(
        &self,
        objects: &MutexGuard<'_, ()>,
        keys: impl IntoIterator<Item = &'k str>,
    ) {
        let mut seen = HashSet::new();
        for key in keys {
            if seen.insert(key) {
                self.release_object(objects, key).await;
            }
        }
    }

    pub async fn register_image(&self, req: RegisterImage) -> ServiceResult<ZoneImage> {
        self.require_context(req.project_id, &req.context).await?;
        let validated = validate_image(&req.bytes, &req.file_name, self.max_upload_bytes)?;
        let (viewbox, width, height) =
            resolve_geometry(req.viewbox.as_deref(), req.width, req.height)?;
        validate_fraction(req.opacity, "opacity")?;
        if let Some((raster_width, raster_height)) = validated.dimensions {
            tracing::debug!(raster_width, raster_height, width, height, "Raster image decoded");
        }

        let objects = self.objects.lock().await;
        let stored = self
            .store
            .put(req.project_id, &req.bytes, &validated.extension)
            .await?;

        let row = ZoneImageInsert {
            project_id: req.project_id,
            context: &req.context,
            image_type: req.image_type,
            viewbox: &viewbox,
            width,
            height,
            display_order: req.display_order.unwrap_or(0),
            opacity: req.opacity.unwrap_or(DEFAULT_OPACITY),
            storage_key: &stored.key,
            created_at: now_millis(),
        };
        let previous = match self.swap_slot(row).await {
            Ok(previous) => previous,
            Err(e) => {
                self.release_object(&objects, &stored.key).await;
                return Err(replace_failed(&e, req.project_id, 1).into());
            }
        };

        if let Some(old) = &previous {
            self.release_object(&objects, &old.storage_key).await;
        }
        drop(objects);
        self.navigation
            .invalidate(&NavScope::for_context(req.project_id, &req.context));

        let image = zone_image::find_for_slot(&self.pool, req.project_id, &req.context, req.image_type)
            .await?
            .ok_or_else(|| AppError::internal("Registered image disappeared"))?;

        audit_log!(
            "zone_image.register",
            format!("zone_image:{}", image.id),
            format!(
                "project={} level={} building={:?} floor={:?} type={} replaced={:?}",
                req.project_id,
                req.context.level(),
                req.context.building_id(),
                req.context.floor_number(),
                req.image_type,
                previous.as_ref().map(|p| p.id)
            )
        );

        Ok(self.with_url(image))
    }

    async fn swap_slot(&self, row: ZoneImageInsert<'_>) -> ServiceResult<Option<ZoneImage>> {
        let mut tx = self.pool.begin().await?;
        let previous = replace_slot(&mut *tx, row).await?;
        tx.commit().await?;
        Ok(previous)
    }

    /// Register one floor image per entry of `batch`, all or nothing
    ///
    /// Each floor follows the single-slot rule: an existing image of the same
    /// type on that floor is replaced.
    pub async fn register_floor_batch(&self, batch: FloorImageBatch) -> ServiceResult<Vec<ZoneImage>> {
        if batch.floors.is_empty() {
            return Err(AppError::invalid_field("files", "At least one file is required").into());
        }
        if batch.floors.len() > MAX_BATCH_FILES {
            return Err(AppError::invalid_field(
                "files",
                format!("At most {MAX_BATCH_FILES} files per batch"),
            )
            .into());
        }
        let mut floors = HashSet::new();
        for floor in &batch.floors {
            if !floors.insert(floor.floor_number) {
                return Err(AppError::invalid_field(
                    "floor_numbers",
                    format!("Floor {} appears more than once", floor.floor_number),
                )
                .into());
            }
        }

        self.require_context(
            batch.project_id,
            &LevelContext::Building {
                building_id: batch.building_id,
            },
        )
        .await?;
        let (viewbox, width, height) =
            resolve_geometry(batch.viewbox.as_deref(), batch.width, batch.height)?;
        let validated = batch
            .floors
            .iter()
            .map(|f| {
                validate_image(&f.file.bytes, &f.file.file_name, self.max_upload_bytes)
                    .map_err(|e| e.with_detail("floor_number", f.floor_number))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let objects = self.objects.lock().await;
        let mut stored: Vec<StoredImage> = Vec::with_capacity(batch.floors.len());
        for (floor, checked) in batch.floors.iter().zip(&validated) {
            match self
                .store
                .put(batch.project_id, &floor.file.bytes, &checked.extension)
                .await
            {
                Ok(object) => stored.push(object),
                Err(e) => {
                    self.release_all(&objects, stored.iter().map(|s| s.key.as_str()).collect::<Vec<_>>())
                        .await;
                    return Err(e.into());
                }
            }
        }

        let contexts: Vec<LevelContext> = batch
            .floors
            .iter()
            .map(|f| LevelContext::Floor {
                building_id: batch.building_id,
                floor_number: f.floor_number,
            })
            .collect();
        let previous = match self
            .swap_floor_slots(&batch, &contexts, &stored, &viewbox, width, height)
            .await
        {
            Ok(previous) => previous,
            Err(e) => {
                self.release_all(&objects, stored.iter().map(|s| s.key.as_str()).collect::<Vec<_>>())
                    .await;
                return Err(replace_failed(&e, batch.project_id, contexts.len()).into());
            }
        };
        self.release_all(&objects, previous.iter().map(|p| p.storage_key.as_str()).collect::<Vec<_>>())
            .await;
        drop(objects);

        let mut images = Vec::with_capacity(contexts.len());
        for context in &contexts {
            self.navigation
                .invalidate(&NavScope::for_context(batch.project_id, context));
            let image = zone_image::find_for_slot(&self.pool, batch.project_id, context, batch.image_type)
                .await?
                .ok_or_else(|| AppError::internal("Registered image disappeared"))?;
            images.push(self.with_url(image));
        }

        audit_log!(
            "zone_image.register_batch",
            format!("building:{}", batch.building_id),
            format!(
                "project={} type={} floors={:?} replaced={}",
                batch.project_id,
                batch.image_type,
                batch.floors.iter().map(|f| f.floor_number).collect::<Vec<_>>(),
                previous.len()
            )
        );
        Ok(images)
    }

    async fn swap_floor_slots(
        &self,
        batch: &FloorImageBatch,
        contexts: &[LevelContext],
        stored: &[StoredImage],
        viewbox: &str,
        width: i64,
        height: i64,
    ) -> ServiceResult<Vec<ZoneImage>> {
        let created_at = now_millis();
        let mut previous = Vec::new();
        let mut tx = self.pool.begin().await?;
        for (context, object) in contexts.iter().zip(stored) {
            let row = ZoneImageInsert {
                project_id: batch.project_id,
                context,
                image_type: batch.image_type,
                viewbox,
                width,
                height,
                display_order: 0,
                opacity: DEFAULT_OPACITY,
                storage_key: &object.key,
                created_at,
            };
            previous.extend(replace_slot(&mut *tx, row).await?);
        }
        tx.commit().await?;
        Ok(previous)
    }

    /// Edit an image's metadata, optionally swapping its file
    ///
    /// A new viewbox re-derives the dimensions the same way registration
    /// does; otherwise explicit width and height overwrite the stored ones.
    /// The image keeps its slot.
    pub async fn update(
        &self,
        project_id: i64,
        image_id: i64,
        changes: ZoneImageUpdate,
        file: Option<ImageFile>,
    ) -> ServiceResult<ZoneImage> {
        let image = self.require_image(project_id, image_id).await?;
        validate_fraction(changes.opacity, "opacity")?;
        let (viewbox, width, height) = match changes.viewbox.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => resolve_geometry(Some(v), changes.width, changes.height)?,
            _ => {
                validate_positive(changes.width, "width")?;
                validate_positive(changes.height, "height")?;
                (
                    image.viewbox.clone(),
                    changes.width.unwrap_or(image.width),
                    changes.height.unwrap_or(image.height),
                )
            }
        };
        let upload = match file {
            Some(f) => {
                let checked = validate_image(&f.bytes, &f.file_name, self.max_upload_bytes)?;
                Some((f, checked))
            }
            None => None,
        };

        let objects = self.objects.lock().await;
        let stored = match &upload {
            Some((f, checked)) => Some(
                self.store
                    .put(project_id, &f.bytes, &checked.extension)
                    .await?,
            ),
            None => None,
        };
        let storage_key = stored
            .as_ref()
            .map_or(image.storage_key.as_str(), |s| s.key.as_str());

        let updated = match zone_image::update(
            &self.pool,
            image.id,
            ZoneImageChanges {
                viewbox: &viewbox,
                width,
                height,
                display_order: changes.display_order.unwrap_or(image.display_order),
                opacity: changes.opacity.unwrap_or(image.opacity),
                storage_key,
            },
        )
        .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(not_found(image_id).into()),
            Err(e) => Err(e),
        };
        if let Err(e) = updated {
            if let Some(object) = &stored {
                self.release_object(&objects, &object.key).await;
            }
            return Err(e);
        }
        if stored.is_some() {
            self.release_object(&objects, &image.storage_key).await;
        }
        drop(objects);

        let context = LevelContext::new(image.level_type, image.building_id, image.floor_number)?;
        self.navigation
            .invalidate(&NavScope::for_context(project_id, &context));

        audit_log!(
            "zone_image.update",
            format!("zone_image:{}", image.id),
            format!(
                "project={project_id} viewbox={viewbox} size={width}x{height} file_replaced={}",
                stored.is_some()
            )
        );

        let image = self.require_image(project_id, image_id).await?;
        Ok(self.with_url(image))
    }

    async fn require_image(&self, project_id: i64, image_id: i64) -> ServiceResult<ZoneImage> {
        let image = zone_image::find_by_id(&self.pool, project_id, image_id)
            .await?
            .ok_or_else(|| not_found(image_id))?;
        Ok(image)
    }

    pub async fn find_for_slot(
        &self,
        project_id: i64,
        context: &LevelContext,
        image_type: ImageType,
    ) -> ServiceResult<Option<ZoneImage>> {
        let image = zone_image::find_for_slot(&self.pool, project_id, context, image_type).await?;
        Ok(image.map(|i| self.with_url(i)))
    }

    pub async fn list(
        &self,
        project_id: i64,
        query: &ZoneImageQuery,
    ) -> ServiceResult<Vec<ZoneImage>> {
        project::require_project(&self.pool, project_id).await?;
        let images = zone_image::list(&self.pool, project_id, query).await?;
        Ok(images.into_iter().map(|i| self.with_url(i)).collect())
    }

    pub async fn delete(&self, project_id: i64, image_id: i64) -> ServiceResult<()> {
        let image = self.require_image(project_id, image_id).await?;

        let objects = self.objects.lock().await;
        zone_image::delete(&self.pool, image.id).await?;
        self.release_object(&objects, &image.storage_key).await;
        drop(objects);

        let context = LevelContext::new(image.level_type, image.building_id, image.floor_number)?;
        self.navigation
            .invalidate(&NavScope::for_context(project_id, &context));

        audit_log!(
            "zone_image.delete",
            format!("zone_image:{}", image.id),
            format!("project={project_id} key={}", image.storage_key)
        );
        Ok(())
    }
}

fn not_found(image_id: i64) -> AppError {
    AppError::new(ErrorCode::ZoneImageNotFound).with_detail("image_id", image_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewbox() {
        assert_eq!(parse_viewbox("0 0 1200 800").unwrap(), vec![0.0, 0.0, 1200.0, 800.0]);
        assert_eq!(parse_viewbox("0,0,100.5,50").unwrap(), vec![0.0, 0.0, 100.5, 50.0]);
        assert_eq!(parse_viewbox("0 0").unwrap(), vec![0.0, 0.0]);

        let err = parse_viewbox("0 0 wide 800").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidViewbox);
        assert!(parse_viewbox("0 0 1 2 3").is_err());
    }

    #[test]
    fn test_resolve_dimensions_fallbacks() {
        assert_eq!(resolve_dimensions(&[0.0, 0.0, 1200.0, 800.0], None, None), (1200, 800));
        assert_eq!(resolve_dimensions(&[0.0, 0.0, 1200.0, 800.0], Some(600), None), (600, 800));
        assert_eq!(resolve_dimensions(&[0.0, 0.0], None, None), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(resolve_dimensions(&[], None, Some(500)), (DEFAULT_WIDTH, 500));
    }

    #[test]
    fn test_validate_image_rejects_bad_files() {
        let err = validate_image(b"", "a.png", 1024).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = validate_image(&[0u8; 2048], "a.png", 1024).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileTooLarge);

        let err = validate_image(b"GIF89a", "a.gif", 1024).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedImageFormat);

        let err = validate_image(b"not an image", "a.png", 1024).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedImageFormat);

        let err = validate_image(b"<html></html>", "plan.svg", 1024).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedImageFormat);
    }

    #[test]
    fn test_validate_svg() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"></svg>"#;
        let validated = validate_image(svg, "Plan.SVG", 1024).unwrap();
        assert_eq!(validated.extension, "svg");
        assert_eq!(validated.dimensions, None);
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height))
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn register(project_id: i64, context: LevelContext, bytes: Vec<u8>, file_name: &str) -> RegisterImage {
        RegisterImage {
            project_id,
            context,
            image_type: ImageType::Background,
            bytes,
            file_name: file_name.to_string(),
            viewbox: None,
            width: None,
            height: None,
            display_order: None,
            opacity: None,
        }
    }

    #[tokio::test]
    async fn test_register_replaces_slot_and_releases_old_object() {
        let fx = crate::test_support::Fixture::new().await;
        let uploads = fx.dir.path().join("uploads");

        let first = fx
            .images
            .register_image(register(fx.project_id, LevelContext::Overview, png(4, 3), "site.png"))
            .await
            .unwrap();
        assert_eq!((first.width, first.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(first.viewbox, "0 0 1920 1080");
        assert_eq!((first.display_order, first.opacity), (0, DEFAULT_OPACITY));
        assert!(first.url.ends_with(&first.storage_key));
        assert!(uploads.join(&first.storage_key).exists());

        fx.navigation
            .resolve(fx.project_id, LevelContext::Overview)
            .await
            .unwrap();

        let second = fx
            .images
            .register_image(register(fx.project_id, LevelContext::Overview, png(5, 5), "site.png"))
            .await
            .unwrap();
        assert_ne!(first.storage_key, second.storage_key);
        assert!(!uploads.join(&first.storage_key).exists());
        assert!(uploads.join(&second.storage_key).exists());
        assert!(!fx.navigation.contains(fx.project_id, &LevelContext::Overview));

        let listed = fx.images.list(fx.project_id, &ZoneImageQuery::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test]
    async fn test_reupload_of_same_bytes_keeps_object() {
        let fx = crate::test_support::Fixture::new().await;
        let uploads = fx.dir.path().join("uploads");
        let bytes = png(2, 2);

        fx.images
            .register_image(register(fx.project_id, LevelContext::Overview, bytes.clone(), "a.png"))
            .await
            .unwrap();
        let again = fx
            .images
            .register_image(register(fx.project_id, LevelContext::Overview, bytes, "a.png"))
            .await
            .unwrap();
        assert!(uploads.join(&again.storage_key).exists());
    }

    #[tokio::test]
    async fn test_svg_viewbox_dimensions_and_delete() {
        let fx = crate::test_support::Fixture::new().await;
        let context = LevelContext::Floor {
            building_id: fx.building_a,
            floor_number: 1,
        };
        let mut req = register(
            fx.project_id,
            context,
            br#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#.to_vec(),
            "floor1.svg",
        );
        req.viewbox = Some("0 0 1200 800".into());
        let image = fx.images.register_image(req).await.unwrap();
        assert_eq!((image.width, image.height), (1200, 800));
        assert_eq!(image.viewbox, "0 0 1200 800");

        let view = fx
            .navigation
            .resolver()
            .resolve_floor(fx.project_id, fx.building_a, 1)
            .await
            .unwrap();
        assert_eq!(view.image.map(|i| i.viewbox), Some("0 0 1200 800".to_string()));

        fx.images.delete(fx.project_id, image.id).await.unwrap();
        let err = fx.images.delete(fx.project_id, image.id).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ZoneImageNotFound));
        assert!(
            fx.images
                .find_for_slot(fx.project_id, &context, ImageType::Background)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_register_requires_building_of_project() {
        let fx = crate::test_support::Fixture::new().await;
        let err = fx
            .images
            .register_image(register(
                fx.project_id,
                LevelContext::Building { building_id: 9999 },
                png(2, 2),
                "b.png",
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::BuildingNotFound));
    }

    #[tokio::test]
    async fn test_raster_size_never_overrides_viewbox_rule() {
        let fx = crate::test_support::Fixture::new().await;
        let cases = [
            (Some("0 0"), (DEFAULT_WIDTH, DEFAULT_HEIGHT), "0 0"),
            (Some("0 0 800"), (800, DEFAULT_HEIGHT), "0 0 800"),
            (None, (DEFAULT_WIDTH, DEFAULT_HEIGHT), "0 0 1920 1080"),
        ];
        for (viewbox, expected, stored_viewbox) in cases {
            let mut req = register(fx.project_id, LevelContext::Overview, png(64, 48), "site.png");
            req.viewbox = viewbox.map(str::to_string);
            let image = fx.images.register_image(req).await.unwrap();
            assert_eq!((image.width, image.height), expected, "viewbox {viewbox:?}");
            assert_eq!(image.viewbox, stored_viewbox);
        }
    }

    #[tokio::test]
    async fn test_shared_object_survives_release_of_one_slot() {
        let fx = crate::test_support::Fixture::new().await;
        let uploads = fx.dir.path().join("uploads");
        let bytes = png(3, 3);
        let building = LevelContext::Building {
            building_id: fx.building_a,
        };

        let overview = fx
            .images
            .register_image(register(fx.project_id, LevelContext::Overview, bytes.clone(), "a.png"))
            .await
            .unwrap();
        let on_building = fx
            .images
            .register_image(register(fx.project_id, building, bytes.clone(), "a.png"))
            .await
            .unwrap();
        assert_eq!(overview.storage_key, on_building.storage_key);

        let floor = LevelContext::Floor {
            building_id: fx.building_b,
            floor_number: 1,
        };
        let (deleted, registered) = tokio::join!(
            fx.images.delete(fx.project_id, overview.id),
            fx.images
                .register_image(register(fx.project_id, floor, bytes, "a.png")),
        );
        deleted.unwrap();
        let on_floor = registered.unwrap();
        assert!(uploads.join(&on_floor.storage_key).exists());

        fx.images.delete(fx.project_id, on_building.id).await.unwrap();
        assert!(uploads.join(&on_floor.storage_key).exists());

        fx.images.delete(fx.project_id, on_floor.id).await.unwrap();
        assert!(!uploads.join(&on_floor.storage_key).exists());
    }

    #[tokio::test]
    async fn test_update_metadata_keeps_slot() {
        let fx = crate::test_support::Fixture::new().await;
        let context = LevelContext::Building {
            building_id: fx.building_a,
        };
        let image = fx
            .images
            .register_image(register(fx.project_id, context, png(4, 4), "b.png"))
            .await
            .unwrap();
        fx.navigation.resolve(fx.project_id, context).await.unwrap();

        let updated = fx
            .images
            .update(
                fx.project_id,
                image.id,
                ZoneImageUpdate {
                    viewbox: Some("0 0 1200 900".into()),
                    display_order: Some(3),
                    opacity: Some(0.5),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.id, image.id);
        assert_eq!(updated.viewbox, "0 0 1200 900");
        assert_eq!((updated.width, updated.height), (1200, 900));
        assert_eq!((updated.display_order, updated.opacity), (3, 0.5));
        assert_eq!(updated.storage_key, image.storage_key);
        assert!(!fx.navigation.contains(fx.project_id, &context));

        let resized = fx
            .images
            .update(
                fx.project_id,
                image.id,
                ZoneImageUpdate {
                    height: Some(600),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(resized.viewbox, "0 0 1200 900");
        assert_eq!((resized.width, resized.height), (1200, 600));

        let err = fx
            .images
            .update(
                fx.project_id,
                image.id,
                ZoneImageUpdate {
                    opacity: Some(1.5),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationFailed));

        let err = fx
            .images
            .update(fx.project_id, 9999, ZoneImageUpdate::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ZoneImageNotFound));
    }

    #[tokio::test]
    async fn test_update_swaps_file() {
        let fx = crate::test_support::Fixture::new().await;
        let uploads = fx.dir.path().join("uploads");
        let image = fx
            .images
            .register_image(register(fx.project_id, LevelContext::Overview, png(2, 2), "a.png"))
            .await
            .unwrap();

        let updated = fx
            .images
            .update(
                fx.project_id,
                image.id,
                ZoneImageUpdate::default(),
                Some(ImageFile {
                    file_name: "b.png".into(),
                    bytes: png(6, 6),
                }),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, image.id);
        assert_ne!(updated.storage_key, image.storage_key);
        assert!(updated.url.ends_with(&updated.storage_key));
        assert!(uploads.join(&updated.storage_key).exists());
        assert!(!uploads.join(&image.storage_key).exists());

        let err = fx
            .images
            .update(
                fx.project_id,
                image.id,
                ZoneImageUpdate::default(),
                Some(ImageFile {
                    file_name: "c.gif".into(),
                    bytes: b"GIF89a".to_vec(),
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UnsupportedImageFormat));
        assert!(uploads.join(&updated.storage_key).exists());
    }

    fn floor_image(floor_number: i32, bytes: Vec<u8>) -> FloorImage {
        FloorImage {
            floor_number,
            file: ImageFile {
                file_name: format!("floor{floor_number}.png"),
                bytes,
            },
        }
    }

    fn batch(fx: &crate::test_support::Fixture, floors: Vec<FloorImage>) -> FloorImageBatch {
        FloorImageBatch {
            project_id: fx.project_id,
            building_id: fx.building_a,
            image_type: ImageType::Background,
            viewbox: Some("0 0 1000 700".into()),
            width: None,
            height: None,
            floors,
        }
    }

    #[tokio::test]
    async fn test_floor_batch_replaces_each_floor_slot() {
        let fx = crate::test_support::Fixture::new().await;
        let uploads = fx.dir.path().join("uploads");
        let floor1 = LevelContext::Floor {
            building_id: fx.building_a,
            floor_number: 1,
        };
        let old = fx
            .images
            .register_image(register(fx.project_id, floor1, png(1, 1), "old.png"))
            .await
            .unwrap();
        fx.navigation.resolve(fx.project_id, floor1).await.unwrap();

        let images = fx
            .images
            .register_floor_batch(batch(&fx, vec![floor_image(1, png(2, 1)), floor_image(2, png(1, 2))]))
            .await
            .unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].floor_number, Some(1));
        assert_eq!(images[1].floor_number, Some(2));
        assert!(images.iter().all(|i| (i.width, i.height) == (1000, 700)));
        assert!(!uploads.join(&old.storage_key).exists());
        assert!(!fx.navigation.contains(fx.project_id, &floor1));

        let listed = fx
            .images
            .list(fx.project_id, &ZoneImageQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_floor_batch_is_all_or_nothing() {
        let fx = crate::test_support::Fixture::new().await;

        let err = fx
            .images
            .register_floor_batch(batch(&fx, vec![floor_image(1, png(1, 1)), floor_image(1, png(2, 2))]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationFailed));

        let err = fx
            .images
            .register_floor_batch(batch(&fx, vec![floor_image(1, png(1, 1)), floor_image(2, b"junk".to_vec())]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UnsupportedImageFormat));

        let err = fx
            .images
            .register_floor_batch(batch(&fx, Vec::new()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationFailed));

        let listed = fx
            .images
            .list(fx.project_id, &ZoneImageQuery::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
        assert!(!fx.dir.path().join("uploads/zone-images").exists());
    }
}
