//! Zone Model
//!
//! A zone is a polygon drawn over a background image at one of three
//! navigation levels, bound to the entity a click on it should lead to.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Canonical polygon vertex, serialized as `[x, y]`
pub type Point = [f64; 2];

/// Navigation level a zone or image belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum LevelType {
    Overview,
    Building,
    Floor,
}

impl LevelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelType::Overview => "overview",
            LevelType::Building => "building",
            LevelType::Floor => "floor",
        }
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LevelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overview" => Ok(LevelType::Overview),
            "building" => Ok(LevelType::Building),
            "floor" => Ok(LevelType::Floor),
            other => Err(format!("unknown level type: {other}")),
        }
    }
}

/// What a zone represents on its image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    /// A whole building on the project overview
    BuildingBlock,
    /// One floor on a building elevation
    FloorStrip,
    /// One apartment on a floor plan
    ApartmentUnit,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::BuildingBlock => "building_block",
            ZoneType::FloorStrip => "floor_strip",
            ZoneType::ApartmentUnit => "apartment_unit",
        }
    }

    /// The level this zone type is drawn on
    pub fn level(&self) -> LevelType {
        match self {
            ZoneType::BuildingBlock => LevelType::Overview,
            ZoneType::FloorStrip => LevelType::Building,
            ZoneType::ApartmentUnit => LevelType::Floor,
        }
    }

    /// The only entity kind a zone of this type may be bound to
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            ZoneType::BuildingBlock => EntityKind::Building,
            ZoneType::FloorStrip => EntityKind::FloorNumber,
            ZoneType::ApartmentUnit => EntityKind::Apartment,
        }
    }

    /// Building-block zones are global to the project
    pub fn requires_building(&self) -> bool {
        !matches!(self, ZoneType::BuildingBlock)
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discriminant of [`EntityRef`], stored in the `entity_kind` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Building,
    Apartment,
    FloorNumber,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Building => "building",
            EntityKind::Apartment => "apartment",
            EntityKind::FloorNumber => "floor_number",
        }
    }
}

/// Entity a zone is bound to
///
/// Serialized as `{"kind": "building", "id": 7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Building(i64),
    Apartment(i64),
    FloorNumber(i32),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Building(_) => EntityKind::Building,
            EntityRef::Apartment(_) => EntityKind::Apartment,
            EntityRef::FloorNumber(_) => EntityKind::FloorNumber,
        }
    }

    /// Value stored in the `entity_id` column
    pub fn raw_id(&self) -> i64 {
        match *self {
            EntityRef::Building(id) | EntityRef::Apartment(id) => id,
            EntityRef::FloorNumber(n) => i64::from(n),
        }
    }

    /// Rebuild from the stored (`entity_kind`, `entity_id`) pair
    pub fn from_parts(kind: EntityKind, id: i64) -> Option<Self> {
        match kind {
            EntityKind::Building => Some(EntityRef::Building(id)),
            EntityKind::Apartment => Some(EntityRef::Apartment(id)),
            EntityKind::FloorNumber => i32::try_from(id).ok().map(EntityRef::FloorNumber),
        }
    }
}

/// Axis-aligned bounds of a polygon, always derived server-side
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Zone entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub project_id: i64,
    pub level_type: LevelType,
    pub zone_type: ZoneType,
    pub building_id: Option<i64>,
    pub floor_number: Option<i32>,
    pub entity: EntityRef,
    pub polygon: Vec<Point>,
    pub bounding_box: BoundingBox,
    pub label: Option<String>,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub hover_color: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create zone payload
///
/// Points may be `[x, y]` pairs or `{x, y}` objects. There is no bounding
/// box field; it is always computed from the polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneCreate {
    pub zone_type: ZoneType,
    pub building_id: Option<i64>,
    pub entity: EntityRef,
    pub polygon: Vec<Value>,
    pub label: Option<String>,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub hover_color: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Update zone payload
///
/// Empty strings clear the label and colors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneUpdate {
    pub polygon: Option<Vec<Value>>,
    pub entity: Option<EntityRef>,
    pub label: Option<String>,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub hover_color: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Result of a single zone write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneWrite {
    pub zone: Zone,
    /// Active zones in the same context whose bounding boxes intersect (advisory)
    pub overlapping_zone_ids: Vec<i64>,
}

/// Bulk delete filter; the project always comes from the path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDeleteFilter {
    pub zone_type: Option<ZoneType>,
    pub building_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteResult {
    pub deleted: u64,
}

fn default_label_template() -> String {
    "Floor {floor}".to_string()
}

/// Template replication request: one floor-strip zone per listed floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateReplication {
    pub building_id: i64,
    pub floors: Vec<i32>,
    pub template: Vec<Value>,
    #[serde(default)]
    pub x_offset_per_floor: f64,
    #[serde(default)]
    pub y_offset_per_floor: f64,
    /// `{floor}` is replaced by the floor number
    #[serde(default = "default_label_template")]
    pub label_template: String,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub hover_color: Option<String>,
}

/// One detected or hand-drawn apartment outline to import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneImportItem {
    pub apartment_id: i64,
    pub polygon: Vec<Value>,
    pub label: Option<String>,
}

/// Per-item import of apartment-unit zones for one floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneImport {
    pub building_id: i64,
    /// Every item's apartment must be on this floor
    pub floor_number: i32,
    pub items: Vec<ZoneImportItem>,
}

/// Failure of a single import item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportItemError {
    pub index: usize,
    pub code: crate::error::ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: Vec<i64>,
    pub errors: Vec<ImportItemError>,
}
