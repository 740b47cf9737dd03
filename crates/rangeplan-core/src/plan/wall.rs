//! Wall segments.

use super::{GeometryError, GeometryResult};
use crate::ids::generate_id;
use kurbo::{Line, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A straight wall segment between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wall {
    pub id: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub thickness: f64,
    pub color: String,
}

impl Wall {
    /// Stroke thickness for newly drawn walls.
    pub const DEFAULT_THICKNESS: f64 = 8.0;
    /// Stroke color for newly drawn walls.
    pub const DEFAULT_COLOR: &'static str = "#4B5563";

    /// Create a wall between two points with a freshly generated id.
    pub fn new(start: Point, end: Point) -> Self {
        Self::with_id(generate_id("wall"), start, end)
    }

    /// Create a wall with a specific id.
    pub fn with_id(id: impl Into<String>, start: Point, end: Point) -> Self {
        Self {
            id: id.into(),
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
            thickness: Self::DEFAULT_THICKNESS,
            color: Self::DEFAULT_COLOR.to_string(),
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// The wall as a kurbo line.
    pub fn line(&self) -> Line {
        Line::new(self.start(), self.end())
    }

    /// Axis-aligned bounds of both endpoints.
    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    /// Move both endpoints by the same delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.x1 += delta.x;
        self.y1 += delta.y;
        self.x2 += delta.x;
        self.y2 += delta.y;
    }

    /// Reject walls carrying NaN or infinite coordinates.
    pub fn validate(&self) -> GeometryResult<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2, self.thickness];
        if coords.iter().all(|c| c.is_finite()) {
            Ok(())
        } else {
            Err(GeometryError::NonFinite(format!("wall {}", self.id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_creation() {
        let wall = Wall::new(Point::new(40.0, 40.0), Point::new(140.0, 40.0));
        assert!(wall.id.starts_with("wall-"));
        assert_eq!(wall.start(), Point::new(40.0, 40.0));
        assert_eq!(wall.end(), Point::new(140.0, 40.0));
        assert!((wall.thickness - Wall::DEFAULT_THICKNESS).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wall_translate_moves_both_ends() {
        let mut wall = Wall::with_id("wall-1", Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        wall.translate(Vec2::new(10.0, -5.0));
        assert_eq!(wall.start(), Point::new(10.0, -5.0));
        assert_eq!(wall.end(), Point::new(110.0, 45.0));
    }

    #[test]
    fn test_wall_bounds_unordered_endpoints() {
        let wall = Wall::with_id("wall-1", Point::new(100.0, 80.0), Point::new(20.0, 10.0));
        let bounds = wall.bounds();
        assert_eq!(bounds, Rect::new(20.0, 10.0, 100.0, 80.0));
    }

    #[test]
    fn test_wall_validate_rejects_nan() {
        let wall = Wall::with_id("wall-1", Point::new(f64::NAN, 0.0), Point::new(1.0, 1.0));
        assert!(wall.validate().is_err());
    }
}
