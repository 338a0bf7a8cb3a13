//! Catalogue listing
//!
//! Public, filterable listing of available apartments.

use super::apartment::Apartment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogueSort {
    #[default]
    Default,
    Price,
    Area,
    Floor,
    Bedrooms,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogueQuery {
    pub project_id: Option<i64>,
    pub building_id: Option<i64>,
    pub floor_number: Option<i32>,
    pub bedrooms: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub sort_by: Option<CatalogueSort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CataloguePage {
    pub items: Vec<Apartment>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}
