//! Zone geometry
//!
//! Pure functions over polygon vertex lists. Nothing here touches storage.
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`normalize`] | `[x, y]` / `{x, y}` input → canonical `[x, y]` |
//! | [`bounding_box`] | min/max/width/height, all-zero when empty |
//! | [`outline_path`] | closed SVG path in input order |
//! | [`offset`] | translate every vertex |
//! | [`overlap`] | bounding-box intersection (heuristic) |
//! | [`area`] | shoelace magnitude |

use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{BoundingBox, Point};
use thiserror::Error;

/// Smallest polygon area (px²) accepted for a zone
pub const MIN_ZONE_AREA: f64 = 1.0;

/// Minimum number of vertices of a zone polygon
pub const MIN_POLYGON_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("point {index} is neither [x, y] nor {{x, y}}: {reason}")]
    InvalidPoint { index: usize, reason: String },

    #[error("polygon has {count} points, at least {min} required", min = MIN_POLYGON_POINTS)]
    TooFewPoints { count: usize },

    #[error("polygon area {area} is below the minimum of {min}", min = MIN_ZONE_AREA)]
    DegenerateArea { area: f64 },
}

impl From<GeometryError> for AppError {
    fn from(err: GeometryError) -> Self {
        let message = err.to_string();
        match err {
            GeometryError::InvalidPoint { index, .. } => {
                AppError::with_message(ErrorCode::InvalidGeometry, message)
                    .with_detail("field", "polygon")
                    .with_detail("index", index)
            }
            GeometryError::TooFewPoints { count } => {
                AppError::with_message(ErrorCode::PolygonTooFewPoints, message)
                    .with_detail("field", "polygon")
                    .with_detail("count", count)
            }
            GeometryError::DegenerateArea { area } => {
                AppError::with_message(ErrorCode::PolygonDegenerate, message)
                    .with_detail("field", "polygon")
                    .with_detail("area", area)
            }
        }
    }
}

fn coordinate(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn normalize_point(index: usize, value: &Value) -> Result<Point, GeometryError> {
    let invalid = |reason: &str| GeometryError::InvalidPoint {
        index,
        reason: reason.to_string(),
    };

    match value {
        Value::Array(items) => {
            if items.len() != 2 {
                return Err(invalid("array form must have exactly two numbers"));
            }
            match (coordinate(items.first()), coordinate(items.get(1))) {
                (Some(x), Some(y)) => Ok([x, y]),
                _ => Err(invalid("array components must be numbers")),
            }
        }
        Value::Object(map) => match (coordinate(map.get("x")), coordinate(map.get("y"))) {
            (Some(x), Some(y)) => Ok([x, y]),
            _ => Err(invalid("object form needs numeric x and y")),
        },
        _ => Err(invalid("expected an array or an object")),
    }
}

/// Convert mixed point shapes into canonical `[x, y]` pairs, preserving order
pub fn normalize(points: &[Value]) -> Result<Vec<Point>, GeometryError> {
    points
        .iter()
        .enumerate()
        .map(|(index, value)| normalize_point(index, value))
        .collect()
}

pub fn bounding_box(points: &[Point]) -> BoundingBox {
    let Some(first) = points.first() else {
        return BoundingBox::default();
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first[0], first[1], first[0], first[1]);
    for &[x, y] in &points[1..] {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    BoundingBox {
        min_x,
        min_y,
        max_x,
        max_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Closed SVG path (`M x,y L x,y ... Z`), vertices in input order
pub fn outline_path(points: &[Point]) -> String {
    let mut segments = Vec::with_capacity(points.len() + 1);
    for (i, [x, y]) in points.iter().enumerate() {
        let command = if i == 0 { 'M' } else { 'L' };
        segments.push(format!("{command}{x},{y}"));
    }
    if !segments.is_empty() {
        segments.push("Z".to_string());
    }
    segments.join(" ")
}

pub fn offset(points: &[Point], dx: f64, dy: f64) -> Vec<Point> {
    points.iter().map(|&[x, y]| [x + dx, y + dy]).collect()
}

/// Bounding-box intersection only; shapes that merely share an edge do not
/// overlap and an empty polygon overlaps nothing.
///
/// Concave or diagonal shapes whose boxes intersect are reported as
/// overlapping even when the polygons themselves are disjoint.
pub fn overlap(a: &[Point], b: &[Point]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    boxes_overlap(&bounding_box(a), &bounding_box(b))
}

pub fn boxes_overlap(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.min_x < b.max_x && b.min_x < a.max_x && a.min_y < b.max_y && b.min_y < a.max_y
}

/// Shoelace area magnitude
pub fn area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|([x1, y1], [x2, y2])| x1 * y2 - x2 * y1)
        .sum();
    (twice / 2.0).abs()
}

pub fn validate_polygon(points: &[Point]) -> Result<(), GeometryError> {
    if points.len() < MIN_POLYGON_POINTS {
        return Err(GeometryError::TooFewPoints {
            count: points.len(),
        });
    }
    let area = area(points);
    if area < MIN_ZONE_AREA {
        return Err(GeometryError::DegenerateArea { area });
    }
    Ok(())
}

/// Polygon ready to persist: canonical points plus derived bounds
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPolygon {
    pub points: Vec<Point>,
    pub bounding_box: BoundingBox,
}

impl PreparedPolygon {
    pub fn from_points(points: Vec<Point>) -> Result<Self, GeometryError> {
        validate_polygon(&points)?;
        let bounding_box = bounding_box(&points);
        Ok(Self {
            points,
            bounding_box,
        })
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        let points = offset(&self.points, dx, dy);
        let bounding_box = bounding_box(&points);
        Self {
            points,
            bounding_box,
        }
    }
}

/// Every write path goes through here
pub fn prepare_polygon(raw: &[Value]) -> Result<PreparedPolygon, GeometryError> {
    PreparedPolygon::from_points(normalize(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(size: f64) -> Vec<Point> {
        vec![[0.0, 0.0], [size, 0.0], [size, size], [0.0, size]]
    }

    #[test]
    fn test_normalize_mixed_shapes() {
        let raw = vec![json!([1, 2]), json!({"x": 3.5, "y": 4}), json!([5.0, 6.0])];
        let points = normalize(&raw).unwrap();
        assert_eq!(points, vec![[1.0, 2.0], [3.5, 4.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = vec![json!({"x": 10, "y": 20}), json!([30, 40]), json!({"x": 0.5, "y": 1})];
        let once = normalize(&raw).unwrap();

        let as_values: Vec<Value> = once.iter().map(|p| json!(p)).collect();
        let twice = normalize(&as_values).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_rejects_bad_points() {
        let err = normalize(&[json!([0, 0]), json!("1,2")]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidPoint { index: 1, .. }));

        let err = normalize(&[json!([0, 0, 0])]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidPoint { index: 0, .. }));

        let err = normalize(&[json!({"x": 1})]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidPoint { index: 0, .. }));

        let err = normalize(&[json!(["1", "2"])]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidPoint { index: 0, .. }));
    }

    #[test]
    fn test_bounding_box_square() {
        let bbox = bounding_box(&square(10.0));
        assert_eq!(
            bbox,
            BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 10.0,
                max_y: 10.0,
                width: 10.0,
                height: 10.0,
            }
        );
    }

    #[test]
    fn test_bounding_box_empty_is_zero() {
        assert_eq!(bounding_box(&[]), BoundingBox::default());
    }

    #[test]
    fn test_offset_shifts_bounds() {
        let base = bounding_box(&square(10.0));
        let moved = bounding_box(&offset(&square(10.0), 5.0, -7.5));

        assert_eq!(moved.min_x, base.min_x + 5.0);
        assert_eq!(moved.max_x, base.max_x + 5.0);
        assert_eq!(moved.min_y, base.min_y - 7.5);
        assert_eq!(moved.max_y, base.max_y - 7.5);
        assert_eq!(moved.width, base.width);
        assert_eq!(moved.height, base.height);
    }

    #[test]
    fn test_outline_path_keeps_order() {
        let path = outline_path(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
        assert_eq!(path, "M0,0 L10,0 L10,10 Z");

        let path = outline_path(&[[1.5, 2.25], [0.0, 0.0], [3.0, 1.0]]);
        assert_eq!(path, "M1.5,2.25 L0,0 L3,1 Z");

        assert_eq!(outline_path(&[]), "");
    }

    #[test]
    fn test_overlap_is_bbox_only() {
        // Lower-left and upper-right halves of a square: the triangles are
        // disjoint, their bounding boxes are not.
        let lower_left = vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]];
        let upper_right = vec![[10.0, 10.0], [10.0, 2.0], [2.0, 10.0]];
        assert!(overlap(&lower_left, &upper_right));

        let far_away = offset(&upper_right, 100.0, 0.0);
        assert!(!overlap(&lower_left, &far_away));
    }

    #[test]
    fn test_overlap_edges_and_empty() {
        let a = square(10.0);
        let b = offset(&square(10.0), 10.0, 0.0);
        let c = offset(&square(10.0), 5.0, 5.0);

        assert!(!overlap(&a, &b));
        assert!(overlap(&a, &c));
        assert!(!overlap(&a, &[]));
    }

    #[test]
    fn test_area() {
        assert_eq!(area(&square(10.0)), 100.0);
        // Clockwise order gives the same magnitude
        let mut clockwise = square(10.0);
        clockwise.reverse();
        assert_eq!(area(&clockwise), 100.0);
        assert_eq!(area(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]), 0.0);
    }

    #[test]
    fn test_validate_polygon() {
        assert_eq!(
            validate_polygon(&[[0.0, 0.0], [1.0, 1.0]]),
            Err(GeometryError::TooFewPoints { count: 2 })
        );
        assert!(matches!(
            validate_polygon(&[[0.0, 0.0], [5.0, 5.0], [10.0, 10.0]]),
            Err(GeometryError::DegenerateArea { .. })
        ));
        assert!(validate_polygon(&square(2.0)).is_ok());
    }

    #[test]
    fn test_prepare_polygon() {
        let prepared =
            prepare_polygon(&[json!([0, 0]), json!({"x": 20, "y": 0}), json!([20, 10])]).unwrap();
        assert_eq!(prepared.points.len(), 3);
        assert_eq!(prepared.bounding_box.width, 20.0);
        assert_eq!(prepared.bounding_box.height, 10.0);

        let moved = prepared.offset(0.0, 50.0);
        assert_eq!(moved.bounding_box.min_y, 50.0);
    }

    #[test]
    fn test_geometry_error_to_app_error() {
        let err: AppError = GeometryError::InvalidPoint {
            index: 4,
            reason: "bad".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InvalidGeometry);
        let details = err.details.unwrap();
        assert_eq!(details.get("index").unwrap(), 4);
        assert_eq!(details.get("field").unwrap(), "polygon");
    }
}
