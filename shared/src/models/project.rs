//! Project and Building Models

use serde::{Deserialize, Serialize};

/// Real-estate development project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub location: Option<String>,
    pub created_at: i64,
}

/// Create project payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub title: String,
    pub location: Option<String>,
}

/// Building inside a project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Building {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    /// Short code shown on the overview (e.g. "A", "B2")
    pub identifier: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: i64,
}

/// Create building payload; the project comes from the path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingCreate {
    pub name: String,
    pub identifier: String,
    pub sort_order: Option<i32>,
}
