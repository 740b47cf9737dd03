//! Floor-plan geometry model.
//!
//! Entities are plain data. Every mutation entry point validates its input
//! so that NaN or infinite coordinates never reach the stored model.

mod group;
mod opening;
mod placement;
mod room;
mod wall;

pub use group::{Group, GroupError, MIN_GROUP_MEMBERS};
pub use opening::{DEFAULT_DOOR_WIDTH, DEFAULT_WINDOW_WIDTH, Door, OPENING_HEIGHT, Window};
pub use placement::{TARGET_RADIUS, TargetId, TargetPlacement};
pub use room::{
    DEFAULT_ROOM_HEIGHT, DEFAULT_ROOM_WIDTH, MIN_ROOM_SIZE, RoomShape, rectangle_points, validate_polygon,
};
pub use wall::Wall;

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Geometry errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Non-finite coordinate in {0}")]
    NonFinite(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: ElementKind, id: String },
    #[error("Target not placed: {0}")]
    TargetNotFound(TargetId),
    #[error("Room needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("Room {0} is self-intersecting")]
    SelfIntersecting(String),
    #[error("Room {0} has zero area")]
    ZeroArea(String),
}

/// Result type for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Kind of floor-plan element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Wall,
    Room,
    Door,
    Window,
}

impl ElementKind {
    /// Wire name of the kind, also used as the id prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Wall => "wall",
            ElementKind::Room => "room",
            ElementKind::Door => "door",
            ElementKind::Window => "window",
        }
    }

    /// Whether the element is made of several points moved together.
    pub fn is_multi_point(self) -> bool {
        matches!(self, ElementKind::Wall | ElementKind::Room)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any floor-plan element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FloorPlanElement {
    Wall(Wall),
    Room(RoomShape),
    Door(Door),
    Window(Window),
}

impl FloorPlanElement {
    pub fn id(&self) -> &str {
        match self {
            FloorPlanElement::Wall(w) => &w.id,
            FloorPlanElement::Room(r) => &r.id,
            FloorPlanElement::Door(d) => &d.id,
            FloorPlanElement::Window(w) => &w.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            FloorPlanElement::Wall(_) => ElementKind::Wall,
            FloorPlanElement::Room(_) => ElementKind::Room,
            FloorPlanElement::Door(_) => ElementKind::Door,
            FloorPlanElement::Window(_) => ElementKind::Window,
        }
    }

    pub fn validate(&self) -> GeometryResult<()> {
        match self {
            FloorPlanElement::Wall(w) => w.validate(),
            FloorPlanElement::Room(r) => r.validate(),
            FloorPlanElement::Door(d) => d.validate(),
            FloorPlanElement::Window(w) => w.validate(),
        }
    }
}

/// Partial geometry update for one element.
///
/// Only the fields an interaction can change are carried; the variant names
/// the element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ElementPatch {
    Wall { x1: f64, y1: f64, x2: f64, y2: f64 },
    Room { points: Vec<Point> },
    Door { x: f64, y: f64 },
    Window { x: f64, y: f64 },
}

impl ElementPatch {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementPatch::Wall { .. } => ElementKind::Wall,
            ElementPatch::Room { .. } => ElementKind::Room,
            ElementPatch::Door { .. } => ElementKind::Door,
            ElementPatch::Window { .. } => ElementKind::Window,
        }
    }

    /// Whether every coordinate in the patch is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            ElementPatch::Wall { x1, y1, x2, y2 } => [x1, y1, x2, y2].iter().all(|v| v.is_finite()),
            ElementPatch::Room { points } => points.iter().all(|p| p.x.is_finite() && p.y.is_finite()),
            ElementPatch::Door { x, y } | ElementPatch::Window { x, y } => x.is_finite() && y.is_finite(),
        }
    }

    /// The same patch moved by `delta`.
    pub fn translated(&self, delta: Vec2) -> Self {
        match self {
            ElementPatch::Wall { x1, y1, x2, y2 } => ElementPatch::Wall {
                x1: x1 + delta.x,
                y1: y1 + delta.y,
                x2: x2 + delta.x,
                y2: y2 + delta.y,
            },
            ElementPatch::Room { points } => ElementPatch::Room {
                points: points.iter().map(|p| *p + delta).collect(),
            },
            ElementPatch::Door { x, y } => ElementPatch::Door {
                x: x + delta.x,
                y: y + delta.y,
            },
            ElementPatch::Window { x, y } => ElementPatch::Window {
                x: x + delta.x,
                y: y + delta.y,
            },
        }
    }
}

/// The rooms, walls, doors and windows of one range room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    #[serde(default)]
    pub rooms: Vec<RoomShape>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub doors: Vec<Door>,
    #[serde(default)]
    pub windows: Vec<Window>,
}

impl FloorPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the floor plan has no elements.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty() && self.walls.is_empty() && self.doors.is_empty() && self.windows.is_empty()
    }

    /// Add a validated element.
    pub fn insert(&mut self, element: FloorPlanElement) -> GeometryResult<()> {
        element.validate()?;
        match element {
            FloorPlanElement::Wall(w) => self.walls.push(w),
            FloorPlanElement::Room(r) => self.rooms.push(r),
            FloorPlanElement::Door(d) => self.doors.push(d),
            FloorPlanElement::Window(w) => self.windows.push(w),
        }
        Ok(())
    }

    /// Remove an element by kind and id.
    pub fn remove(&mut self, kind: ElementKind, id: &str) -> Option<FloorPlanElement> {
        fn take<T>(items: &mut Vec<T>, pos: Option<usize>) -> Option<T> {
            pos.map(|i| items.remove(i))
        }
        match kind {
            ElementKind::Wall => {
                let pos = self.walls.iter().position(|w| w.id == id);
                take(&mut self.walls, pos).map(FloorPlanElement::Wall)
            }
            ElementKind::Room => {
                let pos = self.rooms.iter().position(|r| r.id == id);
                take(&mut self.rooms, pos).map(FloorPlanElement::Room)
            }
            ElementKind::Door => {
                let pos = self.doors.iter().position(|d| d.id == id);
                take(&mut self.doors, pos).map(FloorPlanElement::Door)
            }
            ElementKind::Window => {
                let pos = self.windows.iter().position(|w| w.id == id);
                take(&mut self.windows, pos).map(FloorPlanElement::Window)
            }
        }
    }

    pub fn wall(&self, id: &str) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id == id)
    }

    pub fn room(&self, id: &str) -> Option<&RoomShape> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn door(&self, id: &str) -> Option<&Door> {
        self.doors.iter().find(|d| d.id == id)
    }

    pub fn window(&self, id: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Check whether an element exists.
    pub fn contains(&self, kind: ElementKind, id: &str) -> bool {
        self.bounds_of(kind, id).is_some()
    }

    /// Bounding box of one element.
    pub fn bounds_of(&self, kind: ElementKind, id: &str) -> Option<Rect> {
        match kind {
            ElementKind::Wall => self.wall(id).map(Wall::bounds),
            ElementKind::Room => self.room(id).map(RoomShape::bounds),
            ElementKind::Door => self.door(id).map(Door::bounds),
            ElementKind::Window => self.window(id).map(Window::bounds),
        }
    }

    /// Drag anchor of an element: wall start, room bbox min corner, opening position.
    pub fn anchor(&self, kind: ElementKind, id: &str) -> Option<Point> {
        match kind {
            ElementKind::Wall => self.wall(id).map(Wall::start),
            ElementKind::Room => self.room(id).map(RoomShape::anchor),
            ElementKind::Door => self.door(id).map(Door::position),
            ElementKind::Window => self.window(id).map(Window::position),
        }
    }

    /// Current geometry of an element expressed as a patch.
    pub fn geometry(&self, kind: ElementKind, id: &str) -> Option<ElementPatch> {
        match kind {
            ElementKind::Wall => self.wall(id).map(|w| ElementPatch::Wall {
                x1: w.x1,
                y1: w.y1,
                x2: w.x2,
                y2: w.y2,
            }),
            ElementKind::Room => self.room(id).map(|r| ElementPatch::Room {
                points: r.points.clone(),
            }),
            ElementKind::Door => self.door(id).map(|d| ElementPatch::Door { x: d.x, y: d.y }),
            ElementKind::Window => self.window(id).map(|w| ElementPatch::Window { x: w.x, y: w.y }),
        }
    }

    /// Apply a partial update to the element with the given id.
    pub fn apply_patch(&mut self, id: &str, patch: &ElementPatch) -> GeometryResult<()> {
        if !patch.is_finite() {
            return Err(GeometryError::NonFinite(format!("{} {}", patch.kind(), id)));
        }
        let not_found = || GeometryError::NotFound {
            kind: patch.kind(),
            id: id.to_string(),
        };
        match patch {
            ElementPatch::Wall { x1, y1, x2, y2 } => {
                let wall = self.walls.iter_mut().find(|w| w.id == id).ok_or_else(not_found)?;
                wall.x1 = *x1;
                wall.y1 = *y1;
                wall.x2 = *x2;
                wall.y2 = *y2;
            }
            ElementPatch::Room { points } => {
                let room = self.rooms.iter_mut().find(|r| r.id == id).ok_or_else(not_found)?;
                room.set_points(points.clone())?;
            }
            ElementPatch::Door { x, y } => {
                let door = self.doors.iter_mut().find(|d| d.id == id).ok_or_else(not_found)?;
                door.x = *x;
                door.y = *y;
            }
            ElementPatch::Window { x, y } => {
                let window = self.windows.iter_mut().find(|w| w.id == id).ok_or_else(not_found)?;
                window.x = *x;
                window.y = *y;
            }
        }
        Ok(())
    }

    /// Move an element by `delta`, returning the applied patch.
    pub fn translate(&mut self, kind: ElementKind, id: &str, delta: Vec2) -> GeometryResult<ElementPatch> {
        if !(delta.x.is_finite() && delta.y.is_finite()) {
            return Err(GeometryError::NonFinite(format!("{kind} {id}")));
        }
        let current = self.geometry(kind, id).ok_or_else(|| GeometryError::NotFound {
            kind,
            id: id.to_string(),
        })?;
        let patch = current.translated(delta);
        self.apply_patch(id, &patch)?;
        Ok(patch)
    }
}

/// Target placements and groups of one range room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomLayout {
    #[serde(default)]
    pub layout: Vec<TargetPlacement>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl RoomLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placement(&self, id: TargetId) -> Option<&TargetPlacement> {
        self.layout.iter().find(|p| p.id == id)
    }

    pub fn is_placed(&self, id: TargetId) -> bool {
        self.placement(id).is_some()
    }

    /// Place a target, or move it if already placed. Returns the previous position.
    pub fn place(&mut self, id: TargetId, position: Point) -> GeometryResult<Option<Point>> {
        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(GeometryError::NonFinite(format!("target {id}")));
        }
        match self.layout.iter_mut().find(|p| p.id == id) {
            Some(existing) => {
                let previous = existing.position();
                existing.set_position(position);
                Ok(Some(previous))
            }
            None => {
                self.layout.push(TargetPlacement::new(id, position));
                Ok(None)
            }
        }
    }

    /// Move an already placed target. Returns the previous position.
    pub fn move_to(&mut self, id: TargetId, position: Point) -> GeometryResult<Point> {
        if !self.is_placed(id) {
            return Err(GeometryError::TargetNotFound(id));
        }
        self.place(id, position)?.ok_or(GeometryError::TargetNotFound(id))
    }

    pub fn remove_placement(&mut self, id: TargetId) -> Option<TargetPlacement> {
        let pos = self.layout.iter().position(|p| p.id == id)?;
        Some(self.layout.remove(pos))
    }

    /// First target of `room_targets` that has no placement yet.
    pub fn first_unplaced(&self, room_targets: &[TargetId]) -> Option<TargetId> {
        room_targets.iter().copied().find(|id| !self.is_placed(*id))
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Group containing the given target, if any.
    pub fn group_of(&self, target: TargetId) -> Option<&Group> {
        self.groups.iter().find(|g| g.contains(target))
    }

    pub fn remove_group(&mut self, id: &str) -> Option<Group> {
        let pos = self.groups.iter().position(|g| g.id == id)?;
        Some(self.groups.remove(pos))
    }
}

/// Everything loaded for one room editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    #[serde(default)]
    pub floor_plan: FloorPlan,
    #[serde(flatten)]
    pub layout: RoomLayout,
    /// All targets registered to the room, placed or not.
    #[serde(default)]
    pub targets: Vec<TargetId>,
}

impl RoomSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
