//! Render driver for the floor plan.
//!
//! The core does not rasterize anything itself. It walks the model and
//! issues primitive draw calls on a [`RenderSurface`] supplied by the host.

use crate::input::HitTarget;
use crate::interaction::{DragSubject, RESIZE_HANDLE_TOLERANCE, hit_resize_handle, resize_handle_position};
use crate::plan::{ElementKind, FloorPlan, RoomLayout, TARGET_RADIUS};
use crate::selection::{Selection, group_bounds};
use crate::viewport::ViewportState;
use kurbo::{Affine, Circle, Line, ParamCurveNearest, Point, Rect, Size, Vec2};
use peniko::Color;
use std::collections::HashMap;

const GRID_COLOR: Color = Color::from_rgba8(229, 231, 235, 255);
const TARGET_COLOR: Color = Color::from_rgba8(220, 38, 38, 255);
const SELECTED_COLOR: Color = Color::from_rgba8(37, 99, 235, 255);
const GROUP_COLOR: Color = Color::from_rgba8(16, 185, 129, 255);
const DOOR_COLOR: Color = Color::from_rgba8(146, 64, 14, 255);
const WINDOW_COLOR: Color = Color::from_rgba8(14, 165, 233, 255);
const FALLBACK_COLOR: Color = Color::from_rgba8(0, 0, 0, 255);
const WHITE: Color = Color::from_rgba8(255, 255, 255, 255);

const WALL_PREVIEW_RADIUS: f64 = 5.0;

/// Primitive drawing backend.
pub trait RenderSurface {
    /// Start a frame of the given stage size.
    fn clear(&mut self, size: Size);

    /// Canvas to stage transform for subsequent calls.
    fn set_transform(&mut self, transform: Affine);

    fn draw_rect(&mut self, rect: Rect, fill: Option<Color>, stroke: Option<Color>, stroke_width: f64);

    fn draw_line(&mut self, line: Line, color: Color, width: f64);

    fn draw_circle(&mut self, circle: Circle, fill: Color, stroke: Option<Color>);

    fn draw_polygon(&mut self, points: &[Point], fill: Color, stroke: Color);
}

/// Parse a `#rgb`, `#rrggbb` or `#rrggbbaa` color.
pub fn parse_hex_color(color: &str) -> Option<Color> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let r = byte(&hex[0..1])? * 17;
            let g = byte(&hex[1..2])? * 17;
            let b = byte(&hex[2..3])? * 17;
            Some(Color::from_rgba8(r, g, b, 255))
        }
        6 => Some(Color::from_rgba8(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255)),
        8 => Some(Color::from_rgba8(
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
        )),
        _ => None,
    }
}

fn color_or_fallback(color: &str) -> Color {
    parse_hex_color(color).unwrap_or_else(|| {
        log::debug!("render: invalid color {color:?}, using fallback");
        FALLBACK_COLOR
    })
}

/// Shadow copy of rendered node positions.
///
/// Nodes follow the model except while an interaction is in progress; then
/// the dragged node keeps the position the pointer gave it.
#[derive(Debug, Clone, Default)]
pub struct NodeSync {
    positions: HashMap<DragSubject, Point>,
}

impl NodeSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy model anchors into the nodes. Skipped while interacting.
    /// Returns whether the nodes were updated.
    pub fn sync(&mut self, plan: &FloorPlan, layout: &RoomLayout, interacting: bool) -> bool {
        if interacting {
            return false;
        }
        self.positions.clear();
        for placement in &layout.layout {
            self.positions
                .insert(DragSubject::Target(placement.id), placement.position());
        }
        for wall in &plan.walls {
            self.positions
                .insert(DragSubject::Element(ElementKind::Wall, wall.id.clone()), wall.start());
        }
        for room in &plan.rooms {
            self.positions
                .insert(DragSubject::Element(ElementKind::Room, room.id.clone()), room.anchor());
        }
        for door in &plan.doors {
            self.positions
                .insert(DragSubject::Element(ElementKind::Door, door.id.clone()), door.position());
        }
        for window in &plan.windows {
            self.positions
                .insert(DragSubject::Element(ElementKind::Window, window.id.clone()), window.position());
        }
        for group in &layout.groups {
            if let Some(bounds) = group_bounds(group, layout) {
                self.positions
                    .insert(DragSubject::Group(group.id.clone()), bounds.origin());
            }
        }
        true
    }

    /// Position set by the pointer during a drag.
    pub fn set_dragged(&mut self, subject: DragSubject, position: Point) {
        self.positions.insert(subject, position);
    }

    pub fn position(&self, subject: &DragSubject) -> Option<Point> {
        self.positions.get(subject).copied()
    }

    /// Offset of a node from its model anchor.
    fn offset(&self, subject: &DragSubject, model: Point) -> Vec2 {
        self.position(subject).map(|p| p - model).unwrap_or(Vec2::ZERO)
    }
}

/// Everything needed to render one frame.
pub struct RenderContext<'a> {
    pub plan: &'a FloorPlan,
    pub layout: &'a RoomLayout,
    pub viewport: &'a ViewportState,
    pub nodes: &'a NodeSync,
    pub selection: Option<&'a Selection>,
    pub grid_size: Option<f64>,
    pub wall_preview: Option<Point>,
}

impl<'a> RenderContext<'a> {
    pub fn new(plan: &'a FloorPlan, layout: &'a RoomLayout, viewport: &'a ViewportState, nodes: &'a NodeSync) -> Self {
        Self {
            plan,
            layout,
            viewport,
            nodes,
            selection: None,
            grid_size: None,
            wall_preview: None,
        }
    }

    pub fn with_selection(mut self, selection: &'a Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_grid(mut self, grid_size: f64) -> Self {
        self.grid_size = Some(grid_size);
        self
    }

    /// Mark the start point of a wall being drawn.
    pub fn with_wall_preview(mut self, start: Option<Point>) -> Self {
        self.wall_preview = start;
        self
    }

    fn transform(&self) -> Affine {
        Affine::translate(self.viewport.stage_position.to_vec2()) * Affine::scale(self.viewport.stage_scale)
    }
}

/// Draw the floor plan onto `surface`.
pub fn render_floor_plan(surface: &mut dyn RenderSurface, ctx: &RenderContext<'_>) {
    surface.clear(ctx.viewport.stage_size);
    surface.set_transform(ctx.transform());

    if let Some(grid) = ctx.grid_size.filter(|g| g.is_finite() && *g > 0.0) {
        render_grid(surface, ctx.viewport.canvas_size, grid);
    }

    let selected_element = ctx.selection.and_then(|s| s.element());
    let is_selected = |kind: ElementKind, id: &str| selected_element == Some((kind, id));

    for room in &ctx.plan.rooms {
        let subject = DragSubject::Element(ElementKind::Room, room.id.clone());
        let offset = ctx.nodes.offset(&subject, room.anchor());
        let points: Vec<Point> = room.points.iter().map(|p| *p + offset).collect();
        let stroke = if is_selected(ElementKind::Room, &room.id) {
            SELECTED_COLOR
        } else {
            color_or_fallback(&room.stroke_color)
        };
        surface.draw_polygon(&points, color_or_fallback(&room.fill_color), stroke);
        if is_selected(ElementKind::Room, &room.id) {
            let handle = resize_handle_position(room) + offset;
            surface.draw_circle(
                Circle::new(handle, RESIZE_HANDLE_TOLERANCE / 2.0),
                WHITE,
                Some(SELECTED_COLOR),
            );
        }
    }

    for wall in &ctx.plan.walls {
        let subject = DragSubject::Element(ElementKind::Wall, wall.id.clone());
        let offset = ctx.nodes.offset(&subject, wall.start());
        let color = if is_selected(ElementKind::Wall, &wall.id) {
            SELECTED_COLOR
        } else {
            color_or_fallback(&wall.color)
        };
        surface.draw_line(Line::new(wall.start() + offset, wall.end() + offset), color, wall.thickness);
    }

    for door in &ctx.plan.doors {
        let subject = DragSubject::Element(ElementKind::Door, door.id.clone());
        let rect = door.bounds() + ctx.nodes.offset(&subject, door.position());
        surface.draw_rect(rect, Some(DOOR_COLOR), None, 0.0);
    }

    for window in &ctx.plan.windows {
        let subject = DragSubject::Element(ElementKind::Window, window.id.clone());
        let rect = window.bounds() + ctx.nodes.offset(&subject, window.position());
        surface.draw_rect(rect, Some(WINDOW_COLOR), Some(WHITE), 1.0);
    }

    for group in &ctx.layout.groups {
        let Some(bounds) = group_bounds(group, ctx.layout) else {
            continue;
        };
        let bounds = bounds + ctx.nodes.offset(&DragSubject::Group(group.id.clone()), bounds.origin());
        let width = if ctx.selection.and_then(|s| s.group()) == Some(group.id.as_str()) {
            3.0
        } else {
            1.5
        };
        surface.draw_rect(bounds, None, Some(GROUP_COLOR), width);
    }

    for placement in &ctx.layout.layout {
        let subject = DragSubject::Target(placement.id);
        let center = ctx.nodes.position(&subject).unwrap_or(placement.position());
        let fill = if ctx.selection.is_some_and(|s| s.is_target_selected(placement.id)) {
            SELECTED_COLOR
        } else {
            TARGET_COLOR
        };
        surface.draw_circle(Circle::new(center, TARGET_RADIUS), fill, Some(WHITE));
    }

    if let Some(start) = ctx.wall_preview {
        surface.draw_circle(Circle::new(start, WALL_PREVIEW_RADIUS), SELECTED_COLOR, None);
    }
}

fn render_grid(surface: &mut dyn RenderSurface, canvas: Size, grid: f64) {
    let mut x = 0.0;
    while x <= canvas.width {
        surface.draw_line(Line::new((x, 0.0), (x, canvas.height)), GRID_COLOR, 1.0);
        x += grid;
    }
    let mut y = 0.0;
    while y <= canvas.height {
        surface.draw_line(Line::new((0.0, y), (canvas.width, y)), GRID_COLOR, 1.0);
        y += grid;
    }
}

/// Node under `point` (canvas coordinates), topmost first: resize handle of
/// the selected room, targets, groups, openings, walls, rooms.
pub fn hit_test(plan: &FloorPlan, layout: &RoomLayout, selection: &Selection, point: Point) -> HitTarget {
    if let Some(room) = selection.room().and_then(|id| plan.room(id)) {
        if hit_resize_handle(room, point) {
            return HitTarget::ResizeHandle(room.id.clone());
        }
    }
    if let Some(p) = layout.layout.iter().rev().find(|p| p.position().distance(point) <= TARGET_RADIUS) {
        return HitTarget::Target(p.id);
    }
    if let Some(g) = layout
        .groups
        .iter()
        .find(|g| group_bounds(g, layout).is_some_and(|b| b.contains(point)))
    {
        return HitTarget::Group(g.id.clone());
    }
    if let Some(d) = plan.doors.iter().find(|d| d.bounds().contains(point)) {
        return HitTarget::Element(ElementKind::Door, d.id.clone());
    }
    if let Some(w) = plan.windows.iter().find(|w| w.bounds().contains(point)) {
        return HitTarget::Element(ElementKind::Window, w.id.clone());
    }
    if let Some(w) = plan
        .walls
        .iter()
        .find(|w| w.line().nearest(point, 1e-6).distance_sq.sqrt() <= w.thickness.max(RESIZE_HANDLE_TOLERANCE) / 2.0)
    {
        return HitTarget::Element(ElementKind::Wall, w.id.clone());
    }
    if let Some(r) = plan.rooms.iter().rev().find(|r| r.bounds().contains(point)) {
        return HitTarget::Element(ElementKind::Room, r.id.clone());
    }
    HitTarget::Canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{FloorPlanElement, RoomShape, Wall};

    #[derive(Default)]
    struct RecordingSurface {
        rects: usize,
        lines: Vec<Line>,
        circles: Vec<Circle>,
        polygons: Vec<Vec<Point>>,
    }

    impl RenderSurface for RecordingSurface {
        fn clear(&mut self, _size: Size) {}
        fn set_transform(&mut self, _transform: Affine) {}
        fn draw_rect(&mut self, _rect: Rect, _fill: Option<Color>, _stroke: Option<Color>, _w: f64) {
            self.rects += 1;
        }
        fn draw_line(&mut self, line: Line, _color: Color, _width: f64) {
            self.lines.push(line);
        }
        fn draw_circle(&mut self, circle: Circle, _fill: Color, _stroke: Option<Color>) {
            self.circles.push(circle);
        }
        fn draw_polygon(&mut self, points: &[Point], _fill: Color, _stroke: Color) {
            self.polygons.push(points.to_vec());
        }
    }

    fn rgba(color: Color) -> [u8; 4] {
        let c = color.to_rgba8();
        [c.r, c.g, c.b, c.a]
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(rgba(parse_hex_color("#4B5563").unwrap()), [75, 85, 99, 255]);
        assert_eq!(rgba(parse_hex_color("#fff").unwrap()), [255, 255, 255, 255]);
        assert_eq!(rgba(parse_hex_color("#00000080").unwrap()), [0, 0, 0, 128]);
        assert!(parse_hex_color("4B5563").is_none());
        assert!(parse_hex_color("#12345").is_none());
        assert!(parse_hex_color("#zzzzzz").is_none());
    }

    #[test]
    fn test_node_sync_skipped_while_interacting() {
        let mut layout = RoomLayout::new();
        layout.place(1, Point::new(100.0, 100.0)).unwrap();
        let plan = FloorPlan::new();
        let mut nodes = NodeSync::new();
        assert!(nodes.sync(&plan, &layout, false));

        nodes.set_dragged(DragSubject::Target(1), Point::new(130.0, 90.0));
        layout.place(1, Point::new(200.0, 200.0)).unwrap();
        assert!(!nodes.sync(&plan, &layout, true));
        assert_eq!(nodes.position(&DragSubject::Target(1)), Some(Point::new(130.0, 90.0)));

        assert!(nodes.sync(&plan, &layout, false));
        assert_eq!(nodes.position(&DragSubject::Target(1)), Some(Point::new(200.0, 200.0)));
    }

    #[test]
    fn test_render_uses_node_positions() {
        let mut plan = FloorPlan::new();
        let wall = Wall::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        plan.insert(FloorPlanElement::Wall(wall.clone())).unwrap();
        plan.insert(FloorPlanElement::Room(RoomShape::quick(Point::new(200.0, 200.0))))
            .unwrap();
        let mut layout = RoomLayout::new();
        layout.place(1, Point::new(50.0, 50.0)).unwrap();

        let mut nodes = NodeSync::new();
        nodes.sync(&plan, &layout, false);
        nodes.set_dragged(DragSubject::Element(ElementKind::Wall, wall.id.clone()), Point::new(10.0, 20.0));

        let viewport = ViewportState::default();
        let ctx = RenderContext::new(&plan, &layout, &viewport, &nodes);
        let mut surface = RecordingSurface::default();
        render_floor_plan(&mut surface, &ctx);

        assert_eq!(surface.lines, vec![Line::new((10.0, 20.0), (110.0, 20.0))]);
        assert_eq!(surface.polygons.len(), 1);
        assert_eq!(surface.circles.len(), 1);
        assert_eq!(surface.circles[0].center, Point::new(50.0, 50.0));
        assert_eq!(surface.rects, 0);
    }

    #[test]
    fn test_hit_test_order() {
        let mut plan = FloorPlan::new();
        let room = RoomShape::quick(Point::new(0.0, 0.0));
        plan.insert(FloorPlanElement::Room(room.clone())).unwrap();
        let mut layout = RoomLayout::new();
        layout.place(5, Point::new(100.0, 100.0)).unwrap();
        let mut selection = Selection::new();

        assert_eq!(hit_test(&plan, &layout, &selection, Point::new(110.0, 100.0)), HitTarget::Target(5));
        assert_eq!(
            hit_test(&plan, &layout, &selection, Point::new(250.0, 200.0)),
            HitTarget::Element(ElementKind::Room, room.id.clone())
        );
        assert_eq!(hit_test(&plan, &layout, &selection, Point::new(500.0, 500.0)), HitTarget::Canvas);

        selection.select_element(ElementKind::Room, room.id.clone());
        assert_eq!(
            hit_test(&plan, &layout, &selection, Point::new(298.0, 248.0)),
            HitTarget::ResizeHandle(room.id.clone())
        );
    }
}
