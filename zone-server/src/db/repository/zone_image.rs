//! Zone Image Repository

use shared::models::{ImageType, ZoneImage, ZoneImageQuery};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::ServiceResult;
use crate::navigation::LevelContext;

const IMAGE_COLUMNS: &str = "id, project_id, level_type, building_id, floor_number, image_type, \
     viewbox, width, height, display_order, opacity, storage_key, created_at";

/// New row for a slot
pub struct ZoneImageInsert<'a> {
    pub project_id: i64,
    pub context: &'a LevelContext,
    pub image_type: ImageType,
    pub viewbox: &'a str,
    pub width: i64,
    pub height: i64,
    pub display_order: i32,
    pub opacity: f64,
    pub storage_key: &'a str,
    pub created_at: i64,
}

/// Full replacement of a row's editable columns
pub struct ZoneImageChanges<'a> {
    pub viewbox: &'a str,
    pub width: i64,
    pub height: i64,
    pub display_order: i32,
    pub opacity: f64,
    pub storage_key: &'a str,
}

pub async fn find_for_slot<'e, E>(
    executor: E,
    project_id: i64,
    context: &LevelContext,
    image_type: ImageType,
) -> ServiceResult<Option<ZoneImage>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let image = sqlx::query_as::<_, ZoneImage>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM zone_images \
         WHERE project_id = ? AND level_type = ? AND building_id IS ? AND floor_number IS ? \
         AND image_type = ?"
    ))
    .bind(project_id)
    .bind(context.level())
    .bind(context.building_id())
    .bind(context.floor_number())
    .bind(image_type)
    .fetch_optional(executor)
    .await?;
    Ok(image)
}

pub async fn find_by_id(
    pool: &SqlitePool,
    project_id: i64,
    id: i64,
) -> ServiceResult<Option<ZoneImage>> {
    let image = sqlx::query_as::<_, ZoneImage>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM zone_images WHERE id = ? AND project_id = ?"
    ))
    .bind(id)
    .bind(project_id)
    .fetch_optional(pool)
    .await?;
    Ok(image)
}

pub async fn list(
    pool: &SqlitePool,
    project_id: i64,
    query: &ZoneImageQuery,
) -> ServiceResult<Vec<ZoneImage>> {
    let images = sqlx::query_as::<_, ZoneImage>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM zone_images \
         WHERE project_id = ?1 \
         AND (?2 IS NULL OR level_type = ?2) \
         AND (?3 IS NULL OR building_id = ?3) \
         AND (?4 IS NULL OR floor_number = ?4) \
         AND (?5 IS NULL OR image_type = ?5) \
         ORDER BY level_type, building_id, floor_number, image_type"
    ))
    .bind(project_id)
    .bind(query.level_type)
    .bind(query.building_id)
    .bind(query.floor_number)
    .bind(query.image_type)
    .fetch_all(pool)
    .await?;
    Ok(images)
}

pub async fn insert<'e, E>(executor: E, row: ZoneImageInsert<'_>) -> ServiceResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO zone_images (project_id, level_type, building_id, floor_number, image_type, \
         viewbox, width, height, display_order, opacity, storage_key, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(row.project_id)
    .bind(row.context.level())
    .bind(row.context.building_id())
    .bind(row.context.floor_number())
    .bind(row.image_type)
    .bind(row.viewbox)
    .bind(row.width)
    .bind(row.height)
    .bind(row.display_order)
    .bind(row.opacity)
    .bind(row.storage_key)
    .bind(row.created_at)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

pub async fn update<'e, E>(executor: E, id: i64, changes: ZoneImageChanges<'_>) -> ServiceResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE zone_images SET viewbox = ?, width = ?, height = ?, display_order = ?, \
         opacity = ?, storage_key = ? WHERE id = ?",
    )
    .bind(changes.viewbox)
    .bind(changes.width)
    .bind(changes.height)
    .bind(changes.display_order)
    .bind(changes.opacity)
    .bind(changes.storage_key)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e, E>(executor: E, id: i64) -> ServiceResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM zone_images WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Whether any row still points at the storage object
pub async fn is_key_referenced<'e, E>(executor: E, storage_key: &str) -> ServiceResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let referenced: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM zone_images WHERE storage_key = ?)")
            .bind(storage_key)
            .fetch_one(executor)
            .await?;
    Ok(referenced)
}
