//! In-memory persistence backend.

use super::{BoxFuture, PersistenceAdapter, StorageError, StorageResult};
use crate::plan::{Door, ElementPatch, FloorPlanElement, RoomLayout, RoomShape, RoomSnapshot, TargetId, Wall, Window};
use kurbo::Point;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterCall {
    pub operation: &'static str,
    pub room_id: String,
    pub entity: Option<String>,
}

#[derive(Default)]
struct State {
    rooms: HashMap<String, RoomSnapshot>,
    calls: Vec<AdapterCall>,
    failing: HashSet<&'static str>,
    fail_once: HashSet<&'static str>,
}

/// In-memory backend for testing and offline use.
///
/// Records every call, applies successful ones to its stored rooms and can
/// be told to fail specific operations.
#[derive(Default)]
pub struct MemoryAdapter {
    state: RwLock<State>,
}

impl MemoryAdapter {
    /// Create a new empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a room snapshot, replacing any previous one.
    pub fn insert_room(&self, room_id: impl Into<String>, snapshot: RoomSnapshot) {
        if let Ok(mut state) = self.state.write() {
            state.rooms.insert(room_id.into(), snapshot);
        }
    }

    /// Current stored snapshot of a room.
    pub fn room(&self, room_id: &str) -> Option<RoomSnapshot> {
        self.state.read().ok()?.rooms.get(room_id).cloned()
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.state.read().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Make every future call to `operation` fail with [`StorageError::Rejected`].
    pub fn fail_operation(&self, operation: &'static str) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(operation);
        }
    }

    /// Make only the next call to `operation` fail.
    pub fn fail_next(&self, operation: &'static str) {
        if let Ok(mut state) = self.state.write() {
            state.fail_once.insert(operation);
        }
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.write() {
            state.failing.clear();
            state.fail_once.clear();
        }
    }

    /// Record the call, check auth and injected failures, then run `apply`
    /// against the stored room.
    fn call<T>(
        &self,
        operation: &'static str,
        token: &str,
        room_id: &str,
        entity: Option<String>,
        apply: impl FnOnce(&mut RoomSnapshot) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut state = self
            .state
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        state.calls.push(AdapterCall {
            operation,
            room_id: room_id.to_string(),
            entity: entity.clone(),
        });
        if token.is_empty() {
            return Err(StorageError::Unauthorized);
        }
        if state.fail_once.remove(operation) || state.failing.contains(operation) {
            return Err(StorageError::Rejected(format!(
                "{operation} failed for {}",
                entity.as_deref().unwrap_or(room_id)
            )));
        }
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| StorageError::NotFound(room_id.to_string()))?;
        apply(room)
    }

    fn add_element(
        &self,
        operation: &'static str,
        token: &str,
        room_id: &str,
        element: FloorPlanElement,
    ) -> StorageResult<()> {
        let entity = Some(element.id().to_string());
        self.call(operation, token, room_id, entity, |room| {
            room.floor_plan
                .insert(element)
                .map_err(|e| StorageError::Rejected(e.to_string()))
        })
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load_room(&self, token: &str, room_id: &str) -> BoxFuture<'_, StorageResult<RoomSnapshot>> {
        let result = self.call("load_room", token, room_id, None, |room| Ok(room.clone()));
        Box::pin(async move { result })
    }

    fn add_wall(&self, token: &str, room_id: &str, wall: &Wall) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.add_element("add_wall", token, room_id, FloorPlanElement::Wall(wall.clone()));
        Box::pin(async move { result })
    }

    fn add_room(&self, token: &str, room_id: &str, room: &RoomShape) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.add_element("add_room", token, room_id, FloorPlanElement::Room(room.clone()));
        Box::pin(async move { result })
    }

    fn add_door(&self, token: &str, room_id: &str, door: &Door) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.add_element("add_door", token, room_id, FloorPlanElement::Door(door.clone()));
        Box::pin(async move { result })
    }

    fn add_window(&self, token: &str, room_id: &str, window: &Window) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.add_element("add_window", token, room_id, FloorPlanElement::Window(window.clone()));
        Box::pin(async move { result })
    }

    fn update_floor_plan_element(
        &self,
        token: &str,
        room_id: &str,
        element_id: &str,
        patch: &ElementPatch,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.call(
            "update_floor_plan_element",
            token,
            room_id,
            Some(element_id.to_string()),
            |room| {
                room.floor_plan
                    .apply_patch(element_id, patch)
                    .map_err(|e| StorageError::Rejected(e.to_string()))
            },
        );
        Box::pin(async move { result })
    }

    fn move_target(
        &self,
        token: &str,
        room_id: &str,
        target: TargetId,
        position: Point,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.call("move_target", token, room_id, Some(target.to_string()), |room| {
            room.layout
                .move_to(target, position)
                .map(|_| ())
                .map_err(|e| StorageError::Rejected(e.to_string()))
        });
        Box::pin(async move { result })
    }

    fn place_target(
        &self,
        token: &str,
        room_id: &str,
        target: TargetId,
        position: Point,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.call("place_target", token, room_id, Some(target.to_string()), |room| {
            room.layout
                .place(target, position)
                .map(|_| ())
                .map_err(|e| StorageError::Rejected(e.to_string()))
        });
        Box::pin(async move { result })
    }

    fn save_layout(&self, token: &str, room_id: &str, layout: &RoomLayout) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.call("save_layout", token, room_id, None, |room| {
            room.layout = layout.clone();
            Ok(())
        });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{PersistCommand, dispatch};
    use pollster::block_on;

    const TOKEN: &str = "token-abc";

    fn adapter_with_room() -> MemoryAdapter {
        let adapter = MemoryAdapter::new();
        adapter.insert_room(
            "range-1",
            RoomSnapshot {
                targets: vec![1, 2, 3],
                ..Default::default()
            },
        );
        adapter
    }

    #[test]
    fn test_load_room() {
        let adapter = adapter_with_room();
        let snapshot = block_on(adapter.load_room(TOKEN, "range-1")).unwrap();
        assert_eq!(snapshot.targets, vec![1, 2, 3]);
    }

    #[test]
    fn test_not_found() {
        let adapter = MemoryAdapter::new();
        let result = block_on(adapter.load_room(TOKEN, "nowhere"));
        assert_eq!(result, Err(StorageError::NotFound("nowhere".into())));
    }

    #[test]
    fn test_empty_token_unauthorized() {
        let adapter = adapter_with_room();
        let result = block_on(adapter.load_room("", "range-1"));
        assert_eq!(result, Err(StorageError::Unauthorized));
    }

    #[test]
    fn test_add_and_update_wall() {
        let adapter = adapter_with_room();
        let wall = Wall::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        block_on(adapter.add_wall(TOKEN, "range-1", &wall)).unwrap();

        let patch = ElementPatch::Wall {
            x1: 20.0,
            y1: 20.0,
            x2: 120.0,
            y2: 20.0,
        };
        block_on(adapter.update_floor_plan_element(TOKEN, "range-1", &wall.id, &patch)).unwrap();

        let stored = adapter.room("range-1").unwrap();
        assert_eq!(stored.floor_plan.wall(&wall.id).unwrap().x2, 120.0);
    }

    #[test]
    fn test_place_then_move_target() {
        let adapter = adapter_with_room();
        block_on(adapter.place_target(TOKEN, "range-1", 2, Point::new(40.0, 40.0))).unwrap();
        block_on(adapter.move_target(TOKEN, "range-1", 2, Point::new(80.0, 40.0))).unwrap();
        let stored = adapter.room("range-1").unwrap();
        assert_eq!(stored.layout.placement(2).unwrap().position(), Point::new(80.0, 40.0));

        let missing = block_on(adapter.move_target(TOKEN, "range-1", 3, Point::ZERO));
        assert!(matches!(missing, Err(StorageError::Rejected(_))));
    }

    #[test]
    fn test_failure_injection_and_call_log() {
        let adapter = adapter_with_room();
        adapter.fail_operation("move_target");
        let cmd = PersistCommand::MoveTarget {
            id: 1,
            to: Point::new(10.0, 10.0),
            from: Point::ZERO,
        };
        let result = block_on(dispatch(&adapter, TOKEN, "range-1", &cmd));
        assert!(matches!(result, Err(StorageError::Rejected(_))));

        adapter.clear_failures();
        block_on(dispatch(&adapter, TOKEN, "range-1", &PersistCommand::SaveLayout(RoomLayout::new()))).unwrap();

        let calls = adapter.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].operation, "move_target");
        assert_eq!(calls[0].entity.as_deref(), Some("1"));
        assert_eq!(calls[1].operation, "save_layout");
    }

    #[test]
    fn test_fail_next_fails_once() {
        let adapter = adapter_with_room();
        block_on(adapter.place_target(TOKEN, "range-1", 1, Point::new(20.0, 20.0))).unwrap();
        adapter.fail_next("move_target");
        let first = block_on(adapter.move_target(TOKEN, "range-1", 1, Point::new(40.0, 20.0)));
        assert!(matches!(first, Err(StorageError::Rejected(_))));
        block_on(adapter.move_target(TOKEN, "range-1", 1, Point::new(60.0, 20.0))).unwrap();
        let stored = adapter.room("range-1").unwrap();
        assert_eq!(stored.layout.placement(1).unwrap().position(), Point::new(60.0, 20.0));
    }
}
