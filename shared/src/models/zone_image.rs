//! Zone Image Model

use super::zone::LevelType;
use serde::{Deserialize, Serialize};

/// Role of an image within its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    Background,
    Overlay,
    Annotation,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Background => "background",
            ImageType::Overlay => "overlay",
            ImageType::Annotation => "annotation",
        }
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "background" => Ok(ImageType::Background),
            "overlay" => Ok(ImageType::Overlay),
            "annotation" => Ok(ImageType::Annotation),
            other => Err(format!("unknown image type: {other}")),
        }
    }
}

/// Image registered for a (project, level, building?, floor?, image_type) slot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ZoneImage {
    pub id: i64,
    pub project_id: i64,
    pub level_type: LevelType,
    pub building_id: Option<i64>,
    pub floor_number: Option<i32>,
    pub image_type: ImageType,
    /// Verbatim `"minX minY width height"`
    pub viewbox: String,
    pub width: i64,
    pub height: i64,
    /// Stacking order among the level's images, lowest first
    pub display_order: i32,
    /// 0.0 (transparent) ..= 1.0
    pub opacity: f64,
    pub storage_key: String,
    /// Filled in from the image store, not a column
    #[cfg_attr(feature = "db", sqlx(default))]
    pub url: String,
    pub created_at: i64,
}

/// Optional filters for listing a project's zone images
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneImageQuery {
    pub level_type: Option<LevelType>,
    pub building_id: Option<i64>,
    pub floor_number: Option<i32>,
    pub image_type: Option<ImageType>,
}

/// Metadata edit of a registered image; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneImageUpdate {
    pub viewbox: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub display_order: Option<i32>,
    pub opacity: Option<f64>,
}
