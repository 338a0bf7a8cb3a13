//! Project & Building Repository

use shared::error::{AppError, ErrorCode};
use shared::models::{Building, BuildingCreate, Project, ProjectCreate};
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::error::ServiceResult;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};

const PROJECT_COLUMNS: &str = "id, title, location, created_at";
const BUILDING_COLUMNS: &str = "id, project_id, name, identifier, is_active, sort_order, created_at";

pub async fn create_project(pool: &SqlitePool, data: ProjectCreate) -> ServiceResult<Project> {
    validate_required_text(&data.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&data.location, "location", MAX_NAME_LEN)?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO projects (title, location, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(data.title.trim())
    .bind(data.location.as_deref().map(str::trim))
    .bind(now_millis())
    .fetch_one(pool)
    .await?;

    require_project(pool, id).await
}

pub async fn find_project(pool: &SqlitePool, id: i64) -> ServiceResult<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(project)
}

/// Project or `ProjectNotFound`
pub async fn require_project(pool: &SqlitePool, id: i64) -> ServiceResult<Project> {
    find_project(pool, id).await?.ok_or_else(|| {
        AppError::new(ErrorCode::ProjectNotFound)
            .with_detail("project_id", id)
            .into()
    })
}

pub async fn create_building(
    pool: &SqlitePool,
    project_id: i64,
    data: BuildingCreate,
) -> ServiceResult<Building> {
    require_project(pool, project_id).await?;
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&data.identifier, "identifier", MAX_SHORT_TEXT_LEN)?;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM buildings WHERE project_id = ? AND identifier = ?)",
    )
    .bind(project_id)
    .bind(data.identifier.trim())
    .fetch_one(pool)
    .await?;
    if exists {
        return Err(AppError::conflict(format!(
            "Building identifier '{}' already exists in this project",
            data.identifier.trim()
        ))
        .with_detail("field", "identifier")
        .into());
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO buildings (project_id, name, identifier, sort_order, created_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(project_id)
    .bind(data.name.trim())
    .bind(data.identifier.trim())
    .bind(data.sort_order.unwrap_or(0))
    .bind(now_millis())
    .fetch_one(pool)
    .await?;

    require_building(pool, project_id, id).await
}

pub async fn list_buildings(pool: &SqlitePool, project_id: i64) -> ServiceResult<Vec<Building>> {
    let buildings = sqlx::query_as::<_, Building>(&format!(
        "SELECT {BUILDING_COLUMNS} FROM buildings WHERE project_id = ? ORDER BY sort_order, id"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(buildings)
}

/// Building of the given project or `BuildingNotFound`
pub async fn require_building(
    pool: &SqlitePool,
    project_id: i64,
    building_id: i64,
) -> ServiceResult<Building> {
    let building = sqlx::query_as::<_, Building>(&format!(
        "SELECT {BUILDING_COLUMNS} FROM buildings WHERE id = ? AND project_id = ?"
    ))
    .bind(building_id)
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    building.ok_or_else(|| {
        AppError::new(ErrorCode::BuildingNotFound)
            .with_detail("project_id", project_id)
            .with_detail("building_id", building_id)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_project_and_building_lifecycle() {
        let db = DbService::in_memory().await.unwrap();
        let project = create_project(
            &db.pool,
            ProjectCreate {
                title: " Riverside ".into(),
                location: Some("Valencia".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(project.title, "Riverside");

        let building = create_building(
            &db.pool,
            project.id,
            BuildingCreate {
                name: "Tower A".into(),
                identifier: "A".into(),
                sort_order: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(building.project_id, project.id);
        assert!(building.is_active);

        let dup = create_building(
            &db.pool,
            project.id,
            BuildingCreate {
                name: "Tower A bis".into(),
                identifier: "A".into(),
                sort_order: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(dup.code(), Some(ErrorCode::AlreadyExists));

        assert_eq!(list_buildings(&db.pool, project.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_building_scoped_to_project() {
        let db = DbService::in_memory().await.unwrap();
        let a = create_project(&db.pool, ProjectCreate { title: "A".into(), location: None })
            .await
            .unwrap();
        let b = create_project(&db.pool, ProjectCreate { title: "B".into(), location: None })
            .await
            .unwrap();
        let building = create_building(
            &db.pool,
            a.id,
            BuildingCreate {
                name: "One".into(),
                identifier: "1".into(),
                sort_order: None,
            },
        )
        .await
        .unwrap();

        let err = require_building(&db.pool, b.id, building.id).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::BuildingNotFound));

        let err = require_project(&db.pool, 999).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ProjectNotFound));
    }
}
