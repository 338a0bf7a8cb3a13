//! Navigation Views
//!
//! Response shapes of the three-level drill-down: overview, building, floor.

use super::apartment::{ApartmentStatus, StatusCounts};
use super::zone::{BoundingBox, LevelType, Point};
use serde::{Deserialize, Serialize};

/// Raw navigation query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationQuery {
    pub level: Option<LevelType>,
    pub building_id: Option<i64>,
    pub floor_number: Option<i32>,
}

/// Fill / stroke / hover colors of a rendered zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStyle {
    pub fill: String,
    pub stroke: String,
    pub hover: String,
}

impl ZoneStyle {
    pub const DEFAULT_FILL: &'static str = "#e5e7eb";
    pub const DEFAULT_STROKE: &'static str = "#9ca3af";
    pub const DEFAULT_HOVER: &'static str = "#dbeafe";

    fn from_parts(fill: &str, stroke: &str, hover: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            hover: hover.to_string(),
        }
    }

    /// Operator colors with defaults for the missing ones
    pub fn configured(fill: Option<&str>, stroke: Option<&str>, hover: Option<&str>) -> Self {
        Self::from_parts(
            fill.unwrap_or(Self::DEFAULT_FILL),
            stroke.unwrap_or(Self::DEFAULT_STROKE),
            hover.unwrap_or(Self::DEFAULT_HOVER),
        )
    }

    /// Read-time style of an apartment unit, derived only from its status
    pub fn for_status(status: &ApartmentStatus) -> Self {
        match status {
            ApartmentStatus::Available => Self::from_parts("#4ade80", "#22c55e", "#86efac"),
            ApartmentStatus::Reserved => Self::from_parts("#fbbf24", "#f59e0b", "#fcd34d"),
            ApartmentStatus::Sold => Self::from_parts("#94a3b8", "#64748b", "#cbd5e1"),
            ApartmentStatus::Other(_) => Self::from_parts("#e5e7eb", "#9ca3af", "#f3f4f6"),
        }
    }
}

/// Background image of a level, sized for the SVG viewbox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageView {
    pub url: String,
    pub viewbox: String,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub title: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSummary {
    pub id: i64,
    pub name: String,
    pub identifier: String,
}

/// Drawable part shared by every zone view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneShape {
    pub zone_id: i64,
    pub label: String,
    pub polygon: Vec<Point>,
    pub bounding_box: BoundingBox,
    /// Closed SVG outline, `M x,y L ... Z`
    pub path: String,
}

/// Per-building availability on the overview
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingStats {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub min_floor: Option<i32>,
    pub max_floor: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewZone {
    #[serde(flatten)]
    pub shape: ZoneShape,
    pub building: BuildingSummary,
    pub style: ZoneStyle,
    pub stats: BuildingStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewView {
    pub project: ProjectSummary,
    pub has_multiple_buildings: bool,
    pub image: Option<ImageView>,
    pub zones: Vec<OverviewZone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorZone {
    #[serde(flatten)]
    pub shape: ZoneShape,
    pub floor_number: i32,
    pub style: ZoneStyle,
    pub stats: StatusCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingView {
    pub project: ProjectSummary,
    pub building: BuildingSummary,
    pub image: Option<ImageView>,
    pub zones: Vec<FloorZone>,
    /// Floors the client may preload, ascending
    pub prefetch_floors: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApartmentUnit {
    #[serde(flatten)]
    pub shape: ZoneShape,
    pub apartment_id: i64,
    pub apartment_number: String,
    pub status: ApartmentStatus,
    pub price: Option<f64>,
    pub area_total: Option<f64>,
    pub area_living: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub has_balcony: bool,
    pub style: ZoneStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorView {
    pub project: ProjectSummary,
    pub building: BuildingSummary,
    pub floor_number: i32,
    pub image: Option<ImageView>,
    pub units: Vec<ApartmentUnit>,
    pub stats: StatusCounts,
}

/// Resolved drill-down response, tagged by `level`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum NavigationView {
    Overview(OverviewView),
    Building(BuildingView),
    Floor(FloorView),
}

impl NavigationView {
    pub fn level(&self) -> LevelType {
        match self {
            NavigationView::Overview(_) => LevelType::Overview,
            NavigationView::Building(_) => LevelType::Building,
            NavigationView::Floor(_) => LevelType::Floor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_styles() {
        assert_eq!(
            ZoneStyle::for_status(&ApartmentStatus::Available).fill,
            "#4ade80"
        );
        assert_eq!(
            ZoneStyle::for_status(&ApartmentStatus::Reserved).stroke,
            "#f59e0b"
        );
        assert_eq!(ZoneStyle::for_status(&ApartmentStatus::Sold).hover, "#cbd5e1");
        assert_eq!(
            ZoneStyle::for_status(&ApartmentStatus::Other("hold".into())).hover,
            "#f3f4f6"
        );
    }

    #[test]
    fn test_configured_style_defaults() {
        let style = ZoneStyle::configured(Some("#000000"), None, None);
        assert_eq!(style.fill, "#000000");
        assert_eq!(style.stroke, ZoneStyle::DEFAULT_STROKE);
        assert_eq!(style.hover, ZoneStyle::DEFAULT_HOVER);
    }

    #[test]
    fn test_building_stats_flatten() {
        let mut stats = BuildingStats::default();
        stats.counts.record(&ApartmentStatus::Sold, 4);
        stats.min_floor = Some(1);
        stats.max_floor = Some(9);

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["sold"], 4);
        assert_eq!(json["total"], 4);
        assert_eq!(json["min_floor"], 1);
    }
}
