//! Snap functionality for aligning coordinates to the floor-plan grid.

use kurbo::{Point, Vec2};

/// Default grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Round `value` to the nearest multiple of `grid_size`.
///
/// A non-finite `value` never panics: a warning is logged and `0.0` is
/// returned. A misconfigured grid (non-finite or not positive) leaves the
/// value untouched.
pub fn grid_snap(value: f64, grid_size: f64) -> f64 {
    if !value.is_finite() {
        log::warn!("grid_snap: non-finite value {value}, falling back to 0");
        return 0.0;
    }
    if !grid_size.is_finite() || grid_size <= 0.0 {
        log::warn!("grid_snap: invalid grid size {grid_size}, value left unsnapped");
        return value;
    }
    (value / grid_size).round() * grid_size
}

/// Check that both coordinates of a point are finite.
pub fn is_finite_point(point: Point) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// Check that both components of a vector are finite.
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Session-level snapping function.
///
/// When snapping is disabled this is the identity function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapper {
    /// Whether snapping is enabled for this session.
    pub enabled: bool,
    /// Grid spacing in canvas units.
    pub grid_size: f64,
}

impl Default for Snapper {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_size: GRID_SIZE,
        }
    }
}

impl Snapper {
    /// Create a snapper with the given grid size.
    pub fn new(grid_size: f64, enabled: bool) -> Self {
        Self { enabled, grid_size }
    }

    /// A snapper that never changes its input.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            grid_size: GRID_SIZE,
        }
    }

    /// Snap a single coordinate.
    pub fn snap(&self, value: f64) -> f64 {
        if self.enabled {
            grid_snap(value, self.grid_size)
        } else {
            value
        }
    }

    /// Snap both coordinates of a point.
    pub fn snap_point(&self, point: Point) -> Point {
        Point::new(self.snap(point.x), self.snap(point.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_snap() {
        assert!((grid_snap(23.0, 20.0) - 20.0).abs() < f64::EPSILON);
        assert!((grid_snap(31.0, 20.0) - 40.0).abs() < f64::EPSILON);
        assert!((grid_snap(-23.0, 20.0) + 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grid_snap_exact() {
        assert!((grid_snap(60.0, 20.0) - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grid_snap_idempotent() {
        let values = [-1234.567, -10.0, -0.4, 0.0, 0.49, 7.5, 13.0, 99.99, 1e6 + 0.3];
        for grid in [1.0, 7.0, 10.0, 20.0, 25.5] {
            for v in values {
                let once = grid_snap(v, grid);
                let twice = grid_snap(once, grid);
                assert!((once - twice).abs() < 1e-9, "v={v} grid={grid}");
            }
        }
    }

    #[test]
    fn test_grid_snap_non_finite_is_zero() {
        assert_eq!(grid_snap(f64::NAN, 20.0), 0.0);
        assert_eq!(grid_snap(f64::INFINITY, 20.0), 0.0);
        assert_eq!(grid_snap(f64::NEG_INFINITY, 20.0), 0.0);
    }

    #[test]
    fn test_grid_snap_bad_grid_keeps_value() {
        assert_eq!(grid_snap(13.0, 0.0), 13.0);
        assert_eq!(grid_snap(13.0, -5.0), 13.0);
        assert_eq!(grid_snap(13.0, f64::NAN), 13.0);
    }

    #[test]
    fn test_disabled_snapper_is_identity() {
        let snapper = Snapper::disabled();
        assert_eq!(snapper.snap(13.37), 13.37);
        assert_eq!(snapper.snap_point(Point::new(1.5, 2.5)), Point::new(1.5, 2.5));
    }

    #[test]
    fn test_snapper_snap_point() {
        let snapper = Snapper::new(10.0, true);
        assert_eq!(snapper.snap_point(Point::new(68.0, 54.0)), Point::new(70.0, 50.0));
    }

    #[test]
    fn test_is_finite_point() {
        assert!(is_finite_point(Point::new(1.0, 2.0)));
        assert!(!is_finite_point(Point::new(f64::NAN, 2.0)));
        assert!(!is_finite_point(Point::new(1.0, f64::INFINITY)));
    }
}
