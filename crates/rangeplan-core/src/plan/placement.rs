//! Target placements on the floor plan.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Identifier of a registered physical target.
pub type TargetId = u64;

/// Visual radius of a target marker.
pub const TARGET_RADIUS: f64 = 24.0;

/// Position of a registered target on the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPlacement {
    pub id: TargetId,
    pub x: f64,
    pub y: f64,
}

impl TargetPlacement {
    pub fn new(id: TargetId, position: Point) -> Self {
        Self {
            id,
            x: position.x,
            y: position.y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Extent of the target marker.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - TARGET_RADIUS,
            self.y - TARGET_RADIUS,
            self.x + TARGET_RADIUS,
            self.y + TARGET_RADIUS,
        )
    }
}
