//! Content bounds of a floor plan.
//!
//! This is the single source of truth for "what area must be visible". Every
//! entity collection feeds the same min/max accumulation.

use crate::plan::{FloorPlan, OPENING_HEIGHT, RoomLayout, TARGET_RADIUS};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Padding added on every side of the content bounds.
pub const BOUNDS_PADDING: f64 = 50.0;

/// Padded axis-aligned bounds of all placed content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ContentBounds {
    fn from_extremes(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn min(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }
}

/// Running min/max over every contributed coordinate.
#[derive(Debug, Default)]
struct Accumulator {
    extent: Option<(f64, f64, f64, f64)>,
}

impl Accumulator {
    fn add(&mut self, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            log::warn!("compute_bounds: skipping non-finite point ({x}, {y})");
            return;
        }
        self.extent = Some(match self.extent {
            Some((min_x, min_y, max_x, max_y)) => (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)),
            None => (x, y, x, y),
        });
    }

    fn add_rect(&mut self, rect: Rect) {
        self.add(rect.x0, rect.y0);
        self.add(rect.x1, rect.y1);
    }
}

/// Compute the padded bounds of every room, wall, door, window and target.
///
/// Returns `None` when there is nothing on the floor plan.
pub fn compute_bounds(plan: &FloorPlan, layout: &RoomLayout) -> Option<ContentBounds> {
    let mut acc = Accumulator::default();

    for room in &plan.rooms {
        for p in &room.points {
            acc.add(p.x, p.y);
        }
    }
    for wall in &plan.walls {
        acc.add(wall.x1, wall.y1);
        acc.add(wall.x2, wall.y2);
    }
    for door in &plan.doors {
        acc.add_rect(Rect::new(door.x, door.y, door.x + door.width, door.y + OPENING_HEIGHT));
    }
    for window in &plan.windows {
        acc.add_rect(Rect::new(
            window.x,
            window.y,
            window.x + window.width,
            window.y + OPENING_HEIGHT,
        ));
    }
    for target in &layout.layout {
        acc.add(target.x - TARGET_RADIUS, target.y - TARGET_RADIUS);
        acc.add(target.x + TARGET_RADIUS, target.y + TARGET_RADIUS);
    }

    acc.extent.map(|(min_x, min_y, max_x, max_y)| {
        ContentBounds::from_extremes(
            min_x - BOUNDS_PADDING,
            min_y - BOUNDS_PADDING,
            max_x + BOUNDS_PADDING,
            max_y + BOUNDS_PADDING,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Door, FloorPlanElement, RoomShape, TargetPlacement, Wall, Window};

    #[test]
    fn test_empty_plan_has_no_bounds() {
        assert!(compute_bounds(&FloorPlan::new(), &RoomLayout::new()).is_none());
    }

    #[test]
    fn test_single_target_bounds() {
        let mut layout = RoomLayout::new();
        layout.layout.push(TargetPlacement::new(1, Point::new(100.0, 100.0)));
        let bounds = compute_bounds(&FloorPlan::new(), &layout).unwrap();
        assert_eq!(bounds.min_x, 26.0);
        assert_eq!(bounds.min_y, 26.0);
        assert_eq!(bounds.max_x, 174.0);
        assert_eq!(bounds.max_y, 174.0);
        assert_eq!(bounds.width, 148.0);
        assert_eq!(bounds.height, 148.0);
    }

    #[test]
    fn test_each_collection_alone_yields_bounds() {
        let layout = RoomLayout::new();
        let elements = [
            FloorPlanElement::Wall(Wall::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0))),
            FloorPlanElement::Room(RoomShape::quick(Point::new(0.0, 0.0))),
            FloorPlanElement::Door(Door::new(Point::new(0.0, 0.0))),
            FloorPlanElement::Window(Window::new(Point::new(0.0, 0.0))),
        ];
        for element in elements {
            let mut plan = FloorPlan::new();
            plan.insert(element).unwrap();
            assert!(compute_bounds(&plan, &layout).is_some());
        }
    }

    #[test]
    fn test_padding_on_all_sides() {
        let mut plan = FloorPlan::new();
        plan.insert(FloorPlanElement::Wall(Wall::new(
            Point::new(200.0, 300.0),
            Point::new(400.0, 500.0),
        )))
        .unwrap();
        let bounds = compute_bounds(&plan, &RoomLayout::new()).unwrap();
        assert_eq!(bounds.to_rect(), Rect::new(150.0, 250.0, 450.0, 550.0));
    }

    #[test]
    fn test_mixed_content_union() {
        let mut plan = FloorPlan::new();
        plan.insert(FloorPlanElement::Door(Door::new(Point::new(500.0, 40.0))))
            .unwrap();
        plan.insert(FloorPlanElement::Room(RoomShape::quick(Point::new(100.0, 100.0))))
            .unwrap();
        let mut layout = RoomLayout::new();
        layout.layout.push(TargetPlacement::new(1, Point::new(30.0, 600.0)));

        let bounds = compute_bounds(&plan, &layout).unwrap();
        // Door right edge 580, target left edge 6, door top 40, target bottom 624.
        assert_eq!(bounds.to_rect(), Rect::new(6.0 - 50.0, -10.0, 630.0, 674.0));
    }

    #[test]
    fn test_non_finite_state_is_skipped() {
        let mut layout = RoomLayout::new();
        layout.layout.push(TargetPlacement {
            id: 1,
            x: f64::NAN,
            y: 0.0,
        });
        assert!(compute_bounds(&FloorPlan::new(), &layout).is_none());
        layout.layout.push(TargetPlacement::new(2, Point::new(100.0, 100.0)));
        assert_eq!(compute_bounds(&FloorPlan::new(), &layout).unwrap().min_x, 26.0);
    }
}
