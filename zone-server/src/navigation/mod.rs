//! Drill-down navigation
//!
//! overview → building → floor. Each level is resolved from live data by
//! [`NavigationResolver`] and memoized by [`NavigationCache`] until a write
//! invalidates its scope.

mod cache;
mod resolver;
mod versioned;

pub use cache::{NavKey, NavScope, NavigationCache};
pub use resolver::NavigationResolver;
pub use versioned::VersionedCache;

use shared::error::{AppError, ErrorCode};
use shared::models::{LevelType, NavigationQuery};

/// A validated position in the drill-down
///
/// Also the context zones are listed in and image slots are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelContext {
    Overview,
    Building { building_id: i64 },
    Floor { building_id: i64, floor_number: i32 },
}

impl LevelContext {
    /// Build a context, rejecting missing identifiers
    ///
    /// Identifiers the level does not use are ignored.
    pub fn new(
        level: LevelType,
        building_id: Option<i64>,
        floor_number: Option<i32>,
    ) -> Result<Self, AppError> {
        match level {
            LevelType::Overview => Ok(LevelContext::Overview),
            LevelType::Building => {
                let building_id = building_id.ok_or_else(|| missing(level, "building_id"))?;
                Ok(LevelContext::Building { building_id })
            }
            LevelType::Floor => {
                let building_id = building_id.ok_or_else(|| missing(level, "building_id"))?;
                let floor_number = floor_number.ok_or_else(|| missing(level, "floor_number"))?;
                Ok(LevelContext::Floor {
                    building_id,
                    floor_number,
                })
            }
        }
    }

    pub fn level(&self) -> LevelType {
        match self {
            LevelContext::Overview => LevelType::Overview,
            LevelContext::Building { .. } => LevelType::Building,
            LevelContext::Floor { .. } => LevelType::Floor,
        }
    }

    pub fn building_id(&self) -> Option<i64> {
        match *self {
            LevelContext::Overview => None,
            LevelContext::Building { building_id } | LevelContext::Floor { building_id, .. } => {
                Some(building_id)
            }
        }
    }

    pub fn floor_number(&self) -> Option<i32> {
        match *self {
            LevelContext::Floor { floor_number, .. } => Some(floor_number),
            _ => None,
        }
    }
}

fn missing(level: LevelType, field: &str) -> AppError {
    AppError::with_message(
        ErrorCode::MissingNavigationParameter,
        format!("{field} is required for the {level} level"),
    )
    .with_detail("field", field)
    .with_detail("level", level.as_str())
}

impl TryFrom<&NavigationQuery> for LevelContext {
    type Error = AppError;

    /// The level itself defaults to the overview; identifiers never default.
    fn try_from(query: &NavigationQuery) -> Result<Self, Self::Error> {
        LevelContext::new(
            query.level.unwrap_or(LevelType::Overview),
            query.building_id,
            query.floor_number,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_identifiers_rejected() {
        let err = LevelContext::new(LevelType::Building, None, Some(3)).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingNavigationParameter);
        assert_eq!(err.details.unwrap().get("field").unwrap(), "building_id");

        let err = LevelContext::new(LevelType::Floor, Some(1), None).unwrap_err();
        assert_eq!(err.details.unwrap().get("field").unwrap(), "floor_number");
    }

    #[test]
    fn test_ground_floor_is_valid() {
        let ctx = LevelContext::new(LevelType::Floor, Some(7), Some(0)).unwrap();
        assert_eq!(
            ctx,
            LevelContext::Floor {
                building_id: 7,
                floor_number: 0
            }
        );
    }

    #[test]
    fn test_unused_identifiers_ignored() {
        let ctx = LevelContext::new(LevelType::Overview, Some(1), Some(2)).unwrap();
        assert_eq!(ctx, LevelContext::Overview);
        assert_eq!(ctx.building_id(), None);

        let ctx = LevelContext::new(LevelType::Building, Some(1), Some(2)).unwrap();
        assert_eq!(ctx.floor_number(), None);
    }

    #[test]
    fn test_query_defaults_to_overview() {
        let ctx = LevelContext::try_from(&NavigationQuery::default()).unwrap();
        assert_eq!(ctx.level(), LevelType::Overview);
    }
}
