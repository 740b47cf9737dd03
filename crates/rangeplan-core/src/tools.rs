//! Drawing tool: turns canvas clicks into new floor-plan entities.

use crate::plan::{Door, FloorPlanElement, RoomShape, TargetId, Wall, Window};
use crate::snap::is_finite_point;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// What a click on the empty canvas creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingMode {
    Wall,
    Room,
    Door,
    Window,
    Target,
}

/// State of the drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawingState {
    /// Waiting for the first click.
    #[default]
    Idle,
    /// Wall start captured, waiting for the end point.
    AwaitingWallEnd { start: Point },
}

/// Result of feeding a click to the drawing tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Nothing to do here; the click belongs to an entity or was rejected.
    Ignored,
    /// First wall point captured.
    WallStarted(Point),
    /// A wall was completed. The layout must be saved right away.
    WallCompleted(Wall),
    /// A room, door or window was placed.
    Created(FloorPlanElement),
    /// The given unplaced target goes to `position`.
    PlaceTarget { id: TargetId, position: Point },
    /// Target mode was active but every target is already placed.
    NoUnplacedTarget,
    /// Click on empty canvas without a drawing mode.
    ClearSelection,
}

/// Manages the current drawing mode and its state.
#[derive(Debug, Clone, Default)]
pub struct DrawingTool {
    mode: Option<DrawingMode>,
    state: DrawingState,
}

impl DrawingTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<DrawingMode> {
        self.mode
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    /// Set the drawing mode. Any pending wall start is discarded.
    pub fn set_mode(&mut self, mode: Option<DrawingMode>) {
        self.mode = mode;
        self.state = DrawingState::Idle;
    }

    /// Start point of a wall being drawn.
    pub fn pending_wall_start(&self) -> Option<Point> {
        match self.state {
            DrawingState::AwaitingWallEnd { start } => Some(start),
            DrawingState::Idle => None,
        }
    }

    /// Handle a click at an already snapped canvas point.
    ///
    /// `on_canvas` is false when the click hit an existing entity; such clicks
    /// never create anything. `next_unplaced` is the first room target not yet
    /// on the floor plan.
    pub fn click(&mut self, point: Point, on_canvas: bool, next_unplaced: Option<TargetId>) -> ClickOutcome {
        if !on_canvas {
            return ClickOutcome::Ignored;
        }
        if !is_finite_point(point) {
            log::warn!("drawing tool: ignoring click at non-finite point {point:?}");
            return ClickOutcome::Ignored;
        }

        let Some(mode) = self.mode else {
            return ClickOutcome::ClearSelection;
        };

        match (mode, self.state) {
            (DrawingMode::Wall, DrawingState::Idle) => {
                self.state = DrawingState::AwaitingWallEnd { start: point };
                ClickOutcome::WallStarted(point)
            }
            (DrawingMode::Wall, DrawingState::AwaitingWallEnd { start }) => {
                self.set_mode(None);
                ClickOutcome::WallCompleted(Wall::new(start, point))
            }
            (DrawingMode::Room, _) => {
                self.set_mode(None);
                ClickOutcome::Created(FloorPlanElement::Room(RoomShape::quick(point)))
            }
            (DrawingMode::Door, _) => {
                self.set_mode(None);
                ClickOutcome::Created(FloorPlanElement::Door(Door::new(point)))
            }
            (DrawingMode::Window, _) => {
                self.set_mode(None);
                ClickOutcome::Created(FloorPlanElement::Window(Window::new(point)))
            }
            (DrawingMode::Target, _) => {
                self.set_mode(None);
                match next_unplaced {
                    Some(id) => ClickOutcome::PlaceTarget { id, position: point },
                    None => {
                        log::warn!("drawing tool: no unplaced target left to place");
                        ClickOutcome::NoUnplacedTarget
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_needs_two_clicks() {
        let mut tool = DrawingTool::new();
        tool.set_mode(Some(DrawingMode::Wall));

        let first = tool.click(Point::new(40.0, 40.0), true, None);
        assert_eq!(first, ClickOutcome::WallStarted(Point::new(40.0, 40.0)));
        assert_eq!(tool.pending_wall_start(), Some(Point::new(40.0, 40.0)));
        assert_eq!(tool.mode(), Some(DrawingMode::Wall));

        let ClickOutcome::WallCompleted(wall) = tool.click(Point::new(140.0, 40.0), true, None) else {
            panic!("expected a completed wall");
        };
        assert_eq!((wall.x1, wall.y1, wall.x2, wall.y2), (40.0, 40.0, 140.0, 40.0));
        assert_eq!(tool.mode(), None);
        assert_eq!(tool.state(), DrawingState::Idle);
    }

    #[test]
    fn test_room_click_creates_default_rectangle() {
        let mut tool = DrawingTool::new();
        tool.set_mode(Some(DrawingMode::Room));
        let outcome = tool.click(Point::new(100.0, 100.0), true, None);
        let ClickOutcome::Created(FloorPlanElement::Room(room)) = outcome else {
            panic!("expected a room");
        };
        assert_eq!(room.points[2], Point::new(400.0, 350.0));
        assert_eq!(tool.mode(), None);
    }

    #[test]
    fn test_door_and_window_placement() {
        let mut tool = DrawingTool::new();
        tool.set_mode(Some(DrawingMode::Door));
        assert!(matches!(
            tool.click(Point::new(20.0, 20.0), true, None),
            ClickOutcome::Created(FloorPlanElement::Door(ref d)) if d.width == 80.0 && d.rotation == 0.0
        ));
        tool.set_mode(Some(DrawingMode::Window));
        assert!(matches!(
            tool.click(Point::new(20.0, 20.0), true, None),
            ClickOutcome::Created(FloorPlanElement::Window(ref w)) if w.width == 100.0
        ));
    }

    #[test]
    fn test_target_mode_places_first_unplaced() {
        let mut tool = DrawingTool::new();
        tool.set_mode(Some(DrawingMode::Target));
        assert_eq!(
            tool.click(Point::new(60.0, 80.0), true, Some(3)),
            ClickOutcome::PlaceTarget {
                id: 3,
                position: Point::new(60.0, 80.0)
            }
        );
    }

    #[test]
    fn test_target_mode_without_unplaced_resets() {
        let mut tool = DrawingTool::new();
        tool.set_mode(Some(DrawingMode::Target));
        assert_eq!(tool.click(Point::ZERO, true, None), ClickOutcome::NoUnplacedTarget);
        assert_eq!(tool.mode(), None);
    }

    #[test]
    fn test_entity_clicks_fall_through() {
        let mut tool = DrawingTool::new();
        tool.set_mode(Some(DrawingMode::Room));
        assert_eq!(tool.click(Point::new(5.0, 5.0), false, None), ClickOutcome::Ignored);
        assert_eq!(tool.mode(), Some(DrawingMode::Room));
    }

    #[test]
    fn test_empty_click_without_mode_clears_selection() {
        let mut tool = DrawingTool::new();
        assert_eq!(tool.click(Point::ZERO, true, None), ClickOutcome::ClearSelection);
    }

    #[test]
    fn test_non_finite_click_ignored() {
        let mut tool = DrawingTool::new();
        tool.set_mode(Some(DrawingMode::Wall));
        assert_eq!(tool.click(Point::new(f64::NAN, 0.0), true, None), ClickOutcome::Ignored);
        assert_eq!(tool.pending_wall_start(), None);
    }

    #[test]
    fn test_mode_change_discards_wall_start() {
        let mut tool = DrawingTool::new();
        tool.set_mode(Some(DrawingMode::Wall));
        tool.click(Point::new(10.0, 10.0), true, None);
        tool.set_mode(Some(DrawingMode::Door));
        assert_eq!(tool.pending_wall_start(), None);
    }
}
