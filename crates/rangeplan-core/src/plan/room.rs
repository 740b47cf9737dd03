//! Room polygons.

use super::{GeometryError, GeometryResult};
use crate::ids::generate_id;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Default width of a quick-created room.
pub const DEFAULT_ROOM_WIDTH: f64 = 300.0;
/// Default height of a quick-created room.
pub const DEFAULT_ROOM_HEIGHT: f64 = 250.0;
/// Smallest width or height a room can be resized to.
pub const MIN_ROOM_SIZE: f64 = 50.0;

/// A closed room polygon.
///
/// Quick-created rooms are rectangles, but any simple polygon with at least
/// three points is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomShape {
    pub id: String,
    pub name: String,
    pub points: Vec<Point>,
    pub fill_color: String,
    pub stroke_color: String,
    #[serde(default)]
    pub rotation: f64,
}

impl RoomShape {
    pub const DEFAULT_NAME: &'static str = "Room";
    pub const DEFAULT_FILL: &'static str = "#F3F4F6";
    pub const DEFAULT_STROKE: &'static str = "#9CA3AF";

    /// Create a room from an arbitrary polygon, validating it.
    pub fn new(id: impl Into<String>, name: impl Into<String>, points: Vec<Point>) -> GeometryResult<Self> {
        let id = id.into();
        validate_polygon(&id, &points)?;
        Ok(Self {
            id,
            name: name.into(),
            points,
            fill_color: Self::DEFAULT_FILL.to_string(),
            stroke_color: Self::DEFAULT_STROKE.to_string(),
            rotation: 0.0,
        })
    }

    /// Quick-create a default sized rectangular room with its min corner at `origin`.
    pub fn quick(origin: Point) -> Self {
        let max = Point::new(origin.x + DEFAULT_ROOM_WIDTH, origin.y + DEFAULT_ROOM_HEIGHT);
        Self {
            id: generate_id("room"),
            name: Self::DEFAULT_NAME.to_string(),
            points: rectangle_points(origin, max),
            fill_color: Self::DEFAULT_FILL.to_string(),
            stroke_color: Self::DEFAULT_STROKE.to_string(),
            rotation: 0.0,
        }
    }

    /// Axis-aligned bounds of all points.
    pub fn bounds(&self) -> Rect {
        let mut iter = self.points.iter();
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p))
    }

    /// Minimum corner of the bounding box, used as the drag anchor.
    pub fn anchor(&self) -> Point {
        self.bounds().origin()
    }

    /// Translate every point by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    /// Replace the point list after validating it.
    pub fn set_points(&mut self, points: Vec<Point>) -> GeometryResult<()> {
        validate_polygon(&self.id, &points)?;
        self.points = points;
        Ok(())
    }

    pub fn validate(&self) -> GeometryResult<()> {
        if !self.rotation.is_finite() {
            return Err(GeometryError::NonFinite(format!("room {}", self.id)));
        }
        validate_polygon(&self.id, &self.points)
    }
}

/// The four corners of the rectangle spanned by `min` and `max`, clockwise from `min`.
pub fn rectangle_points(min: Point, max: Point) -> Vec<Point> {
    vec![
        Point::new(min.x, min.y),
        Point::new(max.x, min.y),
        Point::new(max.x, max.y),
        Point::new(min.x, max.y),
    ]
}

/// Check that `points` describe a finite, simple polygon with non-zero area.
pub fn validate_polygon(id: &str, points: &[Point]) -> GeometryResult<()> {
    if points.len() < 3 {
        return Err(GeometryError::TooFewPoints(points.len()));
    }
    if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(GeometryError::NonFinite(format!("room {id}")));
    }
    let n = points.len();
    for i in 0..n {
        let a = (points[i], points[(i + 1) % n]);
        // Adjacent edges share a vertex; only compare edges at least two apart.
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let b = (points[j], points[(j + 1) % n]);
            if segments_intersect(a.0, a.1, b.0, b.1) {
                return Err(GeometryError::SelfIntersecting(id.to_string()));
            }
        }
    }
    if signed_area(points).abs() < f64::EPSILON {
        return Err(GeometryError::ZeroArea(id.to_string()));
    }
    Ok(())
}

/// Shoelace formula.
fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let p = points[i];
            let q = points[(i + 1) % n];
            p.x * q.y - q.x * p.y
        })
        .sum();
    twice / 2.0
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross(c - a)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_room_is_default_rectangle() {
        let room = RoomShape::quick(Point::new(100.0, 100.0));
        assert!(room.id.starts_with("room-"));
        assert_eq!(
            room.points,
            vec![
                Point::new(100.0, 100.0),
                Point::new(400.0, 100.0),
                Point::new(400.0, 350.0),
                Point::new(100.0, 350.0),
            ]
        );
        assert!(room.validate().is_ok());
    }

    #[test]
    fn test_room_bounds_and_anchor() {
        let room = RoomShape::new(
            "room-1",
            "Bay",
            vec![Point::new(50.0, 80.0), Point::new(10.0, 20.0), Point::new(90.0, 30.0)],
        )
        .unwrap();
        assert_eq!(room.bounds(), Rect::new(10.0, 20.0, 90.0, 80.0));
        assert_eq!(room.anchor(), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_room_rejects_too_few_points() {
        let result = RoomShape::new("room-1", "x", vec![Point::ZERO, Point::new(1.0, 1.0)]);
        assert!(matches!(result, Err(GeometryError::TooFewPoints(2))));
    }

    #[test]
    fn test_room_rejects_bow_tie() {
        let bow_tie = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
        ];
        let result = RoomShape::new("room-1", "x", bow_tie);
        assert!(matches!(result, Err(GeometryError::SelfIntersecting(_))));
    }

    #[test]
    fn test_room_rejects_collinear_points() {
        let line = vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(100.0, 0.0)];
        let result = RoomShape::new("room-1", "x", line);
        assert!(matches!(result, Err(GeometryError::ZeroArea(_))));
    }

    #[test]
    fn test_room_rejects_non_finite_points() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 0.0), Point::new(0.0, 10.0)];
        assert!(matches!(
            RoomShape::new("room-1", "x", pts),
            Err(GeometryError::NonFinite(_))
        ));
    }

    #[test]
    fn test_room_translate() {
        let mut room = RoomShape::quick(Point::new(0.0, 0.0));
        room.translate(Vec2::new(20.0, 40.0));
        assert_eq!(room.anchor(), Point::new(20.0, 40.0));
        assert_eq!(room.points[2], Point::new(320.0, 290.0));
    }

    #[test]
    fn test_set_points_keeps_old_points_on_error() {
        let mut room = RoomShape::quick(Point::new(0.0, 0.0));
        let before = room.points.clone();
        assert!(room.set_points(vec![Point::ZERO]).is_err());
        assert_eq!(room.points, before);
    }
}
