//! Zone Image API Handlers
//!
//! Multipart fields of the register request:
//!
//! | 字段 | 必填 | 说明 |
//! |------|------|------|
//! | file | 是 | png / jpg / jpeg / webp / svg |
//! | level | 否 | overview (默认) / building / floor |
//! | building_id | 视层级 | |
//! | floor_number | 视层级 | |
//! | image_type | 否 | background (默认) / overlay / annotation |
//! | viewbox | 否 | "minX minY width height" |
//! | width, height | 否 | 覆盖 viewbox 推导的尺寸 |
//! | display_order | 否 | 叠放顺序, 默认 0 |
//! | opacity | 否 | 0 ~ 1, 默认 1 |
//!
//! The update request accepts the same metadata fields plus an optional
//! `file`; the bulk request takes one `building_id` and repeated
//! `files` / `floor_numbers` fields paired by position.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use shared::error::AppError;
use shared::models::{ImageType, LevelType, ZoneImage, ZoneImageQuery, ZoneImageUpdate};
use tracing::instrument;

use crate::api::{field_text, parse_field};
use crate::core::ServerState;
use crate::images::{FloorImage, FloorImageBatch, ImageFile, RegisterImage};
use crate::navigation::LevelContext;
use crate::utils::{ApiResult, ok};

async fn read_file(field: Field<'_>) -> Result<ImageFile, AppError> {
    let name = field.name().unwrap_or("file").to_string();
    let file_name = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::invalid_field(&name, "No filename provided"))?;
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::invalid_field(&name, format!("Multipart error: {e}")))?;
    Ok(ImageFile {
        file_name,
        bytes: bytes.to_vec(),
    })
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart request: {e}")))
}

fn parse_image_type(text: &str) -> Result<ImageType, AppError> {
    text.parse()
        .map_err(|e: String| AppError::invalid_field("image_type", e))
}

/// GET /api/projects/{project_id}/zone-images
#[instrument(skip(state))]
pub async fn list(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    Query(query): Query<ZoneImageQuery>,
) -> ApiResult<Vec<ZoneImage>> {
    let images = state.images.list(project_id, &query).await?;
    Ok(ok(images))
}

/// POST /api/projects/{project_id}/zone-images - 注册 (或替换) 槽位图片
#[instrument(skip(state, multipart))]
pub async fn register(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<ZoneImage> {
    let mut file: Option<ImageFile> = None;
    let mut level = LevelType::Overview;
    let mut image_type = ImageType::Background;
    let mut building_id = None;
    let mut floor_number = None;
    let mut viewbox = None;
    let mut width = None;
    let mut height = None;
    let mut display_order = None;
    let mut opacity = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => file = Some(read_file(field).await?),
            "level" => {
                let text = field_text(field).await?;
                level = text
                    .parse()
                    .map_err(|e: String| AppError::invalid_field("level", e))?;
            }
            "image_type" => image_type = parse_image_type(&field_text(field).await?)?,
            "building_id" => building_id = parse_field(&name, &field_text(field).await?)?,
            "floor_number" => floor_number = parse_field(&name, &field_text(field).await?)?,
            "width" => width = parse_field(&name, &field_text(field).await?)?,
            "height" => height = parse_field(&name, &field_text(field).await?)?,
            "display_order" => display_order = parse_field(&name, &field_text(field).await?)?,
            "opacity" => opacity = parse_field(&name, &field_text(field).await?)?,
            "viewbox" => viewbox = Some(field_text(field).await?),
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    let file = file.ok_or_else(|| AppError::invalid_field("file", "No 'file' field found"))?;
    let context = LevelContext::new(level, building_id, floor_number)?;

    let image = state
        .images
        .register_image(RegisterImage {
            project_id,
            context,
            image_type,
            bytes: file.bytes,
            file_name: file.file_name,
            viewbox,
            width,
            height,
            display_order,
            opacity,
        })
        .await?;
    Ok(ok(image))
}

/// PUT /api/projects/{project_id}/zone-images/{image_id} - 修改元数据, 可替换文件
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<ServerState>,
    Path((project_id, image_id)): Path<(i64, i64)>,
    mut multipart: Multipart,
) -> ApiResult<ZoneImage> {
    let mut file = None;
    let mut changes = ZoneImageUpdate::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => file = Some(read_file(field).await?),
            "viewbox" => changes.viewbox = Some(field_text(field).await?),
            "width" => changes.width = parse_field(&name, &field_text(field).await?)?,
            "height" => changes.height = parse_field(&name, &field_text(field).await?)?,
            "display_order" => {
                changes.display_order = parse_field(&name, &field_text(field).await?)?
            }
            "opacity" => changes.opacity = parse_field(&name, &field_text(field).await?)?,
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    let image = state
        .images
        .update(project_id, image_id, changes, file)
        .await?;
    Ok(ok(image))
}

/// POST /api/projects/{project_id}/zone-images/bulk - 按楼层批量上传底图
#[instrument(skip(state, multipart))]
pub async fn bulk_register(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<Vec<ZoneImage>> {
    let mut files = Vec::new();
    let mut floor_numbers: Vec<i32> = Vec::new();
    let mut building_id = None;
    let mut image_type = ImageType::Background;
    let mut viewbox = None;
    let mut width = None;
    let mut height = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => files.push(read_file(field).await?),
            "floor_numbers" => {
                let floor = parse_field(&name, &field_text(field).await?)?
                    .ok_or_else(|| AppError::invalid_field(&name, "Floor number must not be empty"))?;
                floor_numbers.push(floor);
            }
            "building_id" => building_id = parse_field(&name, &field_text(field).await?)?,
            "image_type" => image_type = parse_image_type(&field_text(field).await?)?,
            "viewbox" => viewbox = Some(field_text(field).await?),
            "width" => width = parse_field(&name, &field_text(field).await?)?,
            "height" => height = parse_field(&name, &field_text(field).await?)?,
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    let building_id = building_id
        .ok_or_else(|| AppError::invalid_field("building_id", "building_id is required"))?;
    if files.len() != floor_numbers.len() {
        return Err(AppError::invalid_field(
            "floor_numbers",
            format!(
                "Number of files ({}) must match number of floor numbers ({})",
                files.len(),
                floor_numbers.len()
            ),
        ));
    }

    let floors = floor_numbers
        .into_iter()
        .zip(files)
        .map(|(floor_number, file)| FloorImage { floor_number, file })
        .collect();
    let images = state
        .images
        .register_floor_batch(FloorImageBatch {
            project_id,
            building_id,
            image_type,
            viewbox,
            width,
            height,
            floors,
        })
        .await?;
    Ok(ok(images))
}

/// DELETE /api/projects/{project_id}/zone-images/{image_id}
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<ServerState>,
    Path((project_id, image_id)): Path<(i64, i64)>,
) -> ApiResult<bool> {
    state.images.delete(project_id, image_id).await?;
    Ok(ok(true))
}
