//! Doors and windows: point-anchored openings of fixed height.

use super::{GeometryError, GeometryResult};
use crate::ids::generate_id;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Height shared by every door and window.
pub const OPENING_HEIGHT: f64 = 20.0;
/// Width of a newly placed door.
pub const DEFAULT_DOOR_WIDTH: f64 = 80.0;
/// Width of a newly placed window.
pub const DEFAULT_WINDOW_WIDTH: f64 = 100.0;

/// A door placed on the floor plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Door {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    #[serde(default)]
    pub rotation: f64,
    /// Free-form door style as stored by the backend (e.g. `"single"`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub door_type: Option<String>,
}

impl Door {
    /// Create a default-width door anchored at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            id: generate_id("door"),
            x: position.x,
            y: position.y,
            width: DEFAULT_DOOR_WIDTH,
            rotation: 0.0,
            door_type: None,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounds(&self) -> Rect {
        opening_rect(self.position(), self.width)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn validate(&self) -> GeometryResult<()> {
        validate_opening(&self.id, self.x, self.y, self.width, self.rotation)
    }
}

/// A window placed on the floor plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub window_type: Option<String>,
}

impl Window {
    /// Create a default-width window anchored at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            id: generate_id("window"),
            x: position.x,
            y: position.y,
            width: DEFAULT_WINDOW_WIDTH,
            rotation: 0.0,
            window_type: None,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounds(&self) -> Rect {
        opening_rect(self.position(), self.width)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn validate(&self) -> GeometryResult<()> {
        validate_opening(&self.id, self.x, self.y, self.width, self.rotation)
    }
}

/// Unrotated extent of an opening anchored at its top-left corner.
fn opening_rect(origin: Point, width: f64) -> Rect {
    Rect::new(origin.x, origin.y, origin.x + width, origin.y + OPENING_HEIGHT)
}

fn validate_opening(id: &str, x: f64, y: f64, width: f64, rotation: f64) -> GeometryResult<()> {
    if [x, y, width, rotation].iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::NonFinite(id.to_string()))
    }
}
