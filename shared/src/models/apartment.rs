//! Apartment Model

use serde::{Deserialize, Serialize};

/// Sales status of an apartment
///
/// Stored as free text. Anything other than the three known values is kept
/// as [`ApartmentStatus::Other`] and never counted as one of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApartmentStatus {
    Available,
    Reserved,
    Sold,
    Other(String),
}

impl ApartmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ApartmentStatus::Available => "available",
            ApartmentStatus::Reserved => "reserved",
            ApartmentStatus::Sold => "sold",
            ApartmentStatus::Other(s) => s,
        }
    }
}

impl From<String> for ApartmentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "available" => ApartmentStatus::Available,
            "reserved" => ApartmentStatus::Reserved,
            "sold" => ApartmentStatus::Sold,
            _ => ApartmentStatus::Other(s),
        }
    }
}

impl From<ApartmentStatus> for String {
    fn from(status: ApartmentStatus) -> Self {
        match status {
            ApartmentStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ApartmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Apartment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Apartment {
    pub id: i64,
    pub project_id: i64,
    pub building_id: i64,
    pub floor_number: i32,
    pub apartment_number: String,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: ApartmentStatus,
    pub price: Option<f64>,
    pub area_total: Option<f64>,
    pub area_living: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub has_balcony: bool,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create apartment payload; project and building come from the path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApartmentCreate {
    pub floor_number: i32,
    pub apartment_number: String,
    pub status: Option<ApartmentStatus>,
    pub price: Option<f64>,
    pub area_total: Option<f64>,
    pub area_living: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub has_balcony: Option<bool>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Update apartment payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApartmentUpdate {
    pub status: Option<ApartmentStatus>,
    pub price: Option<f64>,
    pub area_total: Option<f64>,
    pub area_living: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub has_balcony: Option<bool>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Quick status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApartmentStatusUpdate {
    pub status: ApartmentStatus,
}

/// Availability counts over active apartments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub available: i64,
    pub reserved: i64,
    pub sold: i64,
    /// Active apartments whose status is none of the above
    pub other: i64,
    pub total: i64,
}

impl StatusCounts {
    /// Add `count` apartments of the given status
    pub fn record(&mut self, status: &ApartmentStatus, count: i64) {
        match status {
            ApartmentStatus::Available => self.available += count,
            ApartmentStatus::Reserved => self.reserved += count,
            ApartmentStatus::Sold => self.sold += count,
            ApartmentStatus::Other(_) => self.other += count,
        }
        self.total += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        let status: ApartmentStatus = serde_json::from_str("\"reserved\"").unwrap();
        assert_eq!(status, ApartmentStatus::Reserved);

        let status: ApartmentStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, ApartmentStatus::Other("on_hold".into()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"on_hold\"");
    }

    #[test]
    fn test_unknown_status_not_folded() {
        let mut counts = StatusCounts::default();
        counts.record(&ApartmentStatus::Available, 2);
        counts.record(&ApartmentStatus::Other("Available ".into()), 1);
        counts.record(&ApartmentStatus::Sold, 3);

        assert_eq!(counts.available, 2);
        assert_eq!(counts.sold, 3);
        assert_eq!(counts.other, 1);
        assert_eq!(counts.total, 6);
    }
}
