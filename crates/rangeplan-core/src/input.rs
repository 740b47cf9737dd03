//! Input types delivered by the host: clicks, modifiers and drop payloads.

use crate::plan::{ElementKind, TargetId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// MIME key under which the palette puts the dragged target id.
pub const TARGET_ID_MIME: &str = "application/target-id";

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// What a click or pointer-down landed on.
///
/// The host's hit testing decides this; clicks on entities never reach the
/// placement logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTarget {
    /// Empty canvas.
    Canvas,
    /// A placed target marker.
    Target(TargetId),
    /// The synthetic drag node of a group.
    Group(String),
    /// A wall, room, door or window.
    Element(ElementKind, String),
    /// The resize handle of the selected room.
    ResizeHandle(String),
}

impl HitTarget {
    pub fn is_canvas(&self) -> bool {
        matches!(self, HitTarget::Canvas)
    }
}

/// A click on the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Pointer position in stage (screen) coordinates.
    pub position: Point,
    pub hit: HitTarget,
    pub modifiers: Modifiers,
}

impl ClickEvent {
    pub fn on_canvas(position: Point) -> Self {
        Self {
            position,
            hit: HitTarget::Canvas,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn on(hit: HitTarget, position: Point, modifiers: Modifiers) -> Self {
        Self {
            position,
            hit,
            modifiers,
        }
    }
}

/// Data carried by a drag-and-drop from outside the canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    items: HashMap<String, String>,
}

impl DropPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload carrying a single target id, as set by the target palette.
    pub fn for_target(id: TargetId) -> Self {
        let mut payload = Self::new();
        payload.set(TARGET_ID_MIME, id.to_string());
        payload
    }

    pub fn set(&mut self, mime: impl Into<String>, value: impl Into<String>) {
        self.items.insert(mime.into(), value.into());
    }

    pub fn get(&self, mime: &str) -> Option<&str> {
        self.items.get(mime).map(String::as_str)
    }

    /// The dropped target id, if the payload carries a valid one.
    pub fn target_id(&self) -> Option<TargetId> {
        self.get(TARGET_ID_MIME)?.trim().parse().ok()
    }
}

/// Convert client (page) coordinates to stage coordinates using the canvas
/// element's bounding rectangle.
pub fn client_to_stage(client: Point, canvas_rect: Rect) -> Point {
    Point::new(client.x - canvas_rect.x0, client.y - canvas_rect.y0)
}
