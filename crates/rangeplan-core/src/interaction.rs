//! Drag and resize interactions.
//!
//! The handler tracks one gesture at a time. While a gesture is active the
//! rendering layer owns the dragged node's position; the model is updated
//! when the gesture ends (drag) or on every move (resize).

use crate::plan::{ElementKind, MIN_ROOM_SIZE, RoomShape, TargetId, rectangle_points};
use crate::snap::{Snapper, is_finite_point};
use kurbo::{Point, Rect, Size, Vec2};

/// Hit tolerance around the room resize handle, in canvas units.
pub const RESIZE_HANDLE_TOLERANCE: f64 = 12.0;

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DragSubject {
    Target(TargetId),
    /// The synthetic drag node of a group.
    Group(String),
    Element(ElementKind, String),
}

/// How far an entity extends around its drag anchor.
///
/// `lead` is the extent to the left/top of the anchor, `trail` the extent to
/// the right/bottom. The anchor is kept within `[lead, canvas - trail]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragExtent {
    pub lead: Vec2,
    pub trail: Vec2,
}

impl DragExtent {
    /// Extent of `bounds` around `anchor`.
    pub fn around(anchor: Point, bounds: Rect) -> Self {
        Self {
            lead: Vec2::new((anchor.x - bounds.x0).max(0.0), (anchor.y - bounds.y0).max(0.0)),
            trail: Vec2::new((bounds.x1 - anchor.x).max(0.0), (bounds.y1 - anchor.y).max(0.0)),
        }
    }
}

/// Clamp an in-progress drag position so the entity stays on the canvas.
///
/// Returns `None` for non-finite positions; the caller drops that drag tick.
pub fn drag_bound(pos: Point, extent: &DragExtent, canvas: Size) -> Option<Point> {
    if !is_finite_point(pos) {
        log::warn!("drag bound: ignoring non-finite position {pos:?}");
        return None;
    }
    let axis = |v: f64, lead: f64, trail: f64, size: f64| {
        let max = (size - trail).max(lead);
        v.clamp(lead, max)
    };
    Some(Point::new(
        axis(pos.x, extent.lead.x, extent.trail.x, canvas.width),
        axis(pos.y, extent.lead.y, extent.trail.y, canvas.height),
    ))
}

/// An active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub subject: DragSubject,
    /// Anchor position before the drag started.
    pub origin: Point,
    /// Last accepted anchor position.
    pub current: Point,
    pub extent: DragExtent,
}

impl DragState {
    /// Snapped delta from the origin to the clamped position `pos`.
    ///
    /// An entity anchor lands on the grid. A group's synthetic node sits off
    /// the grid (member radius plus padding), so it moves by whole cells
    /// instead and on-grid members stay on the grid. A step that would carry
    /// the anchor outside `[lead, canvas - trail]` is pulled back by whole
    /// cells.
    pub fn snapped_delta(&self, pos: Point, canvas: Size, snapper: &Snapper) -> Vec2 {
        let step = snapper.grid_size;
        if !snapper.enabled || !(step.is_finite() && step > 0.0) {
            return pos - self.origin;
        }
        let by_cells = matches!(self.subject, DragSubject::Group(_));
        let axis = |pos: f64, origin: f64, lead: f64, trail: f64, size: f64| {
            let base = if by_cells { snapper.snap(origin) } else { origin };
            let mut delta = snapper.snap(pos) - base;
            let max = (size - trail).max(lead);
            if origin + delta > max {
                delta -= ((origin + delta - max) / step).ceil() * step;
            }
            if origin + delta < lead {
                delta += ((lead - origin - delta) / step).ceil() * step;
            }
            delta
        };
        Vec2::new(
            axis(pos.x, self.origin.x, self.extent.lead.x, self.extent.trail.x, canvas.width),
            axis(pos.y, self.origin.y, self.extent.lead.y, self.extent.trail.y, canvas.height),
        )
    }
}

/// Outcome of a finished drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragResult {
    pub subject: DragSubject,
    /// Snapped translation relative to the pre-drag anchor.
    pub delta: Vec2,
    /// Final anchor, the pre-drag anchor plus `delta`.
    pub anchor: Point,
}

/// An active room resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    pub room_id: String,
    /// Fixed min corner.
    pub min: Point,
    /// Max corner when the resize started.
    pub initial_max: Point,
    /// Pointer position when the resize started.
    pub pointer_start: Point,
}

impl ResizeState {
    /// Rectangle points for the given pointer position.
    ///
    /// Each axis of the max corner is snapped and kept at least
    /// [`MIN_ROOM_SIZE`] away from the min corner.
    pub fn points_for(&self, pointer: Point, snapper: &Snapper) -> Option<Vec<Point>> {
        if !is_finite_point(pointer) {
            log::warn!("resize: ignoring non-finite pointer {pointer:?}");
            return None;
        }
        let delta = pointer - self.pointer_start;
        let max = Point::new(
            (self.min.x + MIN_ROOM_SIZE).max(snapper.snap(self.initial_max.x + delta.x)),
            (self.min.y + MIN_ROOM_SIZE).max(snapper.snap(self.initial_max.y + delta.y)),
        );
        Some(rectangle_points(self.min, max))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Drag(DragState),
    Resize(ResizeState),
}

/// Tracks the active drag or resize gesture.
#[derive(Debug, Clone, Default)]
pub struct InteractionHandler {
    gesture: Option<Gesture>,
    /// The click fired on release of a drag must not reach the click handler.
    /// Cleared by that click or by the next press, whichever comes first.
    suppress_click: bool,
}

impl InteractionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag or resize is in progress.
    pub fn is_interacting(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn drag(&self) -> Option<&DragState> {
        match &self.gesture {
            Some(Gesture::Drag(state)) => Some(state),
            _ => None,
        }
    }

    pub fn resize(&self) -> Option<&ResizeState> {
        match &self.gesture {
            Some(Gesture::Resize(state)) => Some(state),
            _ => None,
        }
    }

    /// Start dragging `subject`, whose anchor is at `anchor` and whose
    /// extent is `bounds`.
    pub fn begin_drag(&mut self, subject: DragSubject, anchor: Point, bounds: Rect) {
        log::debug!("drag start: {subject:?} at {anchor:?}");
        self.gesture = Some(Gesture::Drag(DragState {
            subject,
            origin: anchor,
            current: anchor,
            extent: DragExtent::around(anchor, bounds),
        }));
        self.suppress_click = true;
    }

    /// Drag tick. Returns the clamped position for the node, or `None` when
    /// the tick is ignored.
    pub fn drag_move(&mut self, pos: Point, canvas: Size) -> Option<Point> {
        let Some(Gesture::Drag(state)) = &mut self.gesture else {
            return None;
        };
        let clamped = drag_bound(pos, &state.extent, canvas)?;
        state.current = clamped;
        Some(clamped)
    }

    /// Finish the drag at `pos`: clamp, snap and compute the delta from the
    /// pre-drag anchor. A non-finite final position cancels the drag.
    pub fn end_drag(&mut self, pos: Point, canvas: Size, snapper: &Snapper) -> Option<DragResult> {
        let Some(Gesture::Drag(state)) = self.gesture.take() else {
            return None;
        };
        let clamped = drag_bound(pos, &state.extent, canvas)?;
        let delta = state.snapped_delta(clamped, canvas, snapper);
        let anchor = state.origin + delta;
        log::debug!("drag end: {:?} moved by {delta:?}", state.subject);
        Some(DragResult {
            subject: state.subject,
            delta,
            anchor,
        })
    }

    /// Start resizing a room from its handle.
    pub fn begin_resize(&mut self, room: &RoomShape, pointer: Point) -> bool {
        if !is_finite_point(pointer) {
            log::warn!("resize: ignoring non-finite start pointer {pointer:?}");
            return false;
        }
        let bounds = room.bounds();
        self.gesture = Some(Gesture::Resize(ResizeState {
            room_id: room.id.clone(),
            min: Point::new(bounds.x0, bounds.y0),
            initial_max: Point::new(bounds.x1, bounds.y1),
            pointer_start: pointer,
        }));
        self.suppress_click = true;
        true
    }

    /// New room points for a resize pointer move.
    pub fn resize_move(&self, pointer: Point, snapper: &Snapper) -> Option<(String, Vec<Point>)> {
        let state = self.resize()?;
        let points = state.points_for(pointer, snapper)?;
        Some((state.room_id.clone(), points))
    }

    /// Finish the resize. Returns the resized room's id.
    pub fn end_resize(&mut self) -> Option<String> {
        match self.gesture.take() {
            Some(Gesture::Resize(state)) => Some(state.room_id),
            other => {
                self.gesture = other;
                None
            }
        }
    }

    /// Abort any gesture without producing a result.
    pub fn cancel(&mut self) {
        self.gesture = None;
    }

    /// A fresh press. Any click after it is a real click.
    pub fn pointer_down(&mut self) {
        self.suppress_click = false;
    }

    /// Consume the click suppression flag set by the last gesture.
    pub fn take_click_suppression(&mut self) -> bool {
        std::mem::take(&mut self.suppress_click)
    }
}

/// Position of a room's resize handle (bottom-right bbox corner).
pub fn resize_handle_position(room: &RoomShape) -> Point {
    let bounds = room.bounds();
    Point::new(bounds.x1, bounds.y1)
}

/// Check if `point` hits the room's resize handle.
pub fn hit_resize_handle(room: &RoomShape, point: Point) -> bool {
    let handle = resize_handle_position(room);
    let dx = point.x - handle.x;
    let dy = point.y - handle.y;
    dx * dx + dy * dy <= RESIZE_HANDLE_TOLERANCE * RESIZE_HANDLE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::TARGET_RADIUS;

    fn target_rect(center: Point) -> Rect {
        Rect::from_center_size(center, (TARGET_RADIUS * 2.0, TARGET_RADIUS * 2.0))
    }

    #[test]
    fn test_drag_bound_clamps_into_canvas() {
        let canvas = Size::new(800.0, 600.0);
        let extent = DragExtent::around(Point::ZERO, Rect::new(0.0, 0.0, 300.0, 250.0));
        let samples = [
            Point::new(-50.0, -50.0),
            Point::new(100.0, 100.0),
            Point::new(700.0, 500.0),
            Point::new(1e6, -1e6),
        ];
        for p in samples {
            let clamped = drag_bound(p, &extent, canvas).unwrap();
            assert!(clamped.x >= 0.0 && clamped.x <= canvas.width - 300.0);
            assert!(clamped.y >= 0.0 && clamped.y <= canvas.height - 250.0);
        }
        assert_eq!(
            drag_bound(Point::new(100.0, 100.0), &extent, canvas),
            Some(Point::new(100.0, 100.0))
        );
    }

    #[test]
    fn test_drag_bound_rejects_non_finite() {
        let extent = DragExtent::around(Point::ZERO, Rect::ZERO);
        assert_eq!(drag_bound(Point::new(f64::NAN, 0.0), &extent, Size::new(100.0, 100.0)), None);
    }

    #[test]
    fn test_target_extent_is_radius() {
        let extent = DragExtent::around(Point::new(50.0, 50.0), target_rect(Point::new(50.0, 50.0)));
        let clamped = drag_bound(Point::new(0.0, 1000.0), &extent, Size::new(400.0, 400.0)).unwrap();
        assert_eq!(clamped, Point::new(TARGET_RADIUS, 400.0 - TARGET_RADIUS));
    }

    #[test]
    fn test_drag_target_snaps_delta() {
        let mut handler = InteractionHandler::new();
        let origin = Point::new(50.0, 50.0);
        handler.begin_drag(DragSubject::Target(1), origin, target_rect(origin));
        assert!(handler.is_interacting());

        let canvas = Size::new(1000.0, 1000.0);
        handler.drag_move(Point::new(61.0, 52.0), canvas).unwrap();
        assert!(handler.drag_move(Point::new(f64::INFINITY, 0.0), canvas).is_none());
        assert_eq!(handler.drag().unwrap().current, Point::new(61.0, 52.0));

        let result = handler
            .end_drag(Point::new(70.0, 55.0), canvas, &Snapper::new(5.0, true))
            .unwrap();
        assert_eq!(result.anchor, Point::new(70.0, 55.0));
        assert_eq!(result.delta, Vec2::new(20.0, 5.0));
        assert!(!handler.is_interacting());

        // Half a cell rounds up on a coarser grid.
        handler.begin_drag(DragSubject::Target(1), origin, target_rect(origin));
        let result = handler
            .end_drag(Point::new(70.0, 55.0), canvas, &Snapper::new(10.0, true))
            .unwrap();
        assert_eq!(result.anchor, Point::new(70.0, 60.0));
    }

    #[test]
    fn test_off_grid_anchor_moves_by_whole_cells() {
        let mut handler = InteractionHandler::new();
        // Group bounds corner of members at (100,100) and (200,100).
        let origin = Point::new(56.0, 56.0);
        handler.begin_drag(
            DragSubject::Group("group-1".into()),
            origin,
            Rect::new(56.0, 56.0, 244.0, 144.0),
        );
        let result = handler
            .end_drag(origin + Vec2::new(60.0, 40.0), Size::new(1000.0, 1000.0), &Snapper::new(20.0, true))
            .unwrap();
        assert_eq!(result.delta, Vec2::new(60.0, 40.0));
        assert_eq!(result.anchor, Point::new(116.0, 96.0));
    }

    #[test]
    fn test_snapped_end_stays_inside_canvas() {
        let mut handler = InteractionHandler::new();
        let origin = Point::new(100.0, 100.0);
        handler.begin_drag(DragSubject::Target(1), origin, target_rect(origin));
        let canvas = Size::new(1000.0, 1000.0);
        // Clamped to 976, which would snap out to 980.
        let result = handler
            .end_drag(Point::new(2000.0, 2000.0), canvas, &Snapper::new(20.0, true))
            .unwrap();
        assert_eq!(result.anchor, Point::new(960.0, 960.0));
        assert!(result.anchor.x + TARGET_RADIUS <= canvas.width);

        let origin = Point::new(40.0, 40.0);
        handler.begin_drag(DragSubject::Target(1), origin, target_rect(origin));
        let result = handler
            .end_drag(Point::new(-50.0, 25.0), canvas, &Snapper::new(20.0, true))
            .unwrap();
        // 24 snaps to 20, inside the marker radius; pulled back to 40.
        assert_eq!(result.anchor, Point::new(40.0, 40.0));
        assert_eq!(result.delta, Vec2::ZERO);
    }

    #[test]
    fn test_end_drag_non_finite_cancels() {
        let mut handler = InteractionHandler::new();
        handler.begin_drag(DragSubject::Target(1), Point::ZERO, Rect::ZERO);
        let result = handler.end_drag(Point::new(f64::NAN, f64::NAN), Size::new(10.0, 10.0), &Snapper::default());
        assert!(result.is_none());
        assert!(!handler.is_interacting());
    }

    #[test]
    fn test_click_suppressed_once_after_drag() {
        let mut handler = InteractionHandler::new();
        assert!(!handler.take_click_suppression());
        handler.begin_drag(DragSubject::Target(1), Point::ZERO, Rect::ZERO);
        handler.end_drag(Point::ZERO, Size::new(100.0, 100.0), &Snapper::default());
        assert!(handler.take_click_suppression());
        assert!(!handler.take_click_suppression());
    }

    #[test]
    fn test_pointer_down_clears_click_suppression() {
        let mut handler = InteractionHandler::new();
        handler.begin_drag(DragSubject::Target(1), Point::ZERO, Rect::ZERO);
        handler.end_drag(Point::ZERO, Size::new(100.0, 100.0), &Snapper::default());
        handler.pointer_down();
        assert!(!handler.take_click_suppression());
    }

    #[test]
    fn test_resize_enforces_minimum_size() {
        let room = RoomShape::quick(Point::new(100.0, 100.0));
        let mut handler = InteractionHandler::new();
        let handle = resize_handle_position(&room);
        assert!(handler.begin_resize(&room, handle));

        let snapper = Snapper::new(10.0, true);
        for pointer in [Point::new(-500.0, -500.0), Point::new(100.0, 100.0), Point::new(140.0, 380.0)] {
            let (_, points) = handler.resize_move(pointer, &snapper).unwrap();
            let rect = points.iter().fold(Rect::from_points(points[0], points[0]), |r, p| r.union_pt(*p));
            assert!(rect.width() >= MIN_ROOM_SIZE);
            assert!(rect.height() >= MIN_ROOM_SIZE);
            assert_eq!(rect.origin(), Point::new(100.0, 100.0));
        }
    }

    #[test]
    fn test_resize_grows_with_pointer() {
        let room = RoomShape::quick(Point::new(0.0, 0.0));
        let mut handler = InteractionHandler::new();
        handler.begin_resize(&room, Point::new(300.0, 250.0));
        let (id, points) = handler
            .resize_move(Point::new(347.0, 262.0), &Snapper::new(10.0, true))
            .unwrap();
        assert_eq!(id, room.id);
        assert_eq!(points[2], Point::new(350.0, 260.0));
        assert_eq!(handler.end_resize(), Some(room.id.clone()));
        assert!(!handler.is_interacting());
    }

    #[test]
    fn test_end_resize_keeps_drag() {
        let mut handler = InteractionHandler::new();
        handler.begin_drag(DragSubject::Target(1), Point::ZERO, Rect::ZERO);
        assert_eq!(handler.end_resize(), None);
        assert!(handler.drag().is_some());
    }

    #[test]
    fn test_hit_resize_handle() {
        let room = RoomShape::quick(Point::new(0.0, 0.0));
        assert!(hit_resize_handle(&room, Point::new(305.0, 255.0)));
        assert!(!hit_resize_handle(&room, Point::new(150.0, 125.0)));
    }
}
