//! Persistence abstraction for room floor plans.
//!
//! The editor never awaits the backend while handling input. Every model
//! mutation is recorded as a [`PersistCommand`] that the host dispatches
//! afterwards; a failed command can be reverted by the editor.

mod memory;

pub use memory::{AdapterCall, MemoryAdapter};

use crate::plan::{Door, ElementPatch, RoomLayout, RoomShape, RoomSnapshot, TargetId, Wall, Window};
use kurbo::Point;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("Room not found: {0}")]
    NotFound(String),
    #[error("Not authorized")]
    Unauthorized,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Rejected by backend: {0}")]
    Rejected(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Send + Sync on native platforms. On WASM these bounds are relaxed since
/// it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

/// Backend that stores room floor plans and target layouts.
///
/// Every call takes the caller's auth token. Implementations report
/// failures through [`StorageError`]; nothing is retried.
pub trait PersistenceAdapter: MaybeSend {
    /// Load everything needed to edit a room.
    fn load_room(&self, token: &str, room_id: &str) -> BoxFuture<'_, StorageResult<RoomSnapshot>>;

    fn add_wall(&self, token: &str, room_id: &str, wall: &Wall) -> BoxFuture<'_, StorageResult<()>>;

    fn add_room(&self, token: &str, room_id: &str, room: &RoomShape) -> BoxFuture<'_, StorageResult<()>>;

    fn add_door(&self, token: &str, room_id: &str, door: &Door) -> BoxFuture<'_, StorageResult<()>>;

    fn add_window(&self, token: &str, room_id: &str, window: &Window) -> BoxFuture<'_, StorageResult<()>>;

    /// Apply a partial geometry update to an existing element.
    fn update_floor_plan_element(
        &self,
        token: &str,
        room_id: &str,
        element_id: &str,
        patch: &ElementPatch,
    ) -> BoxFuture<'_, StorageResult<()>>;

    /// Move an already placed target.
    fn move_target(
        &self,
        token: &str,
        room_id: &str,
        target: TargetId,
        position: Point,
    ) -> BoxFuture<'_, StorageResult<()>>;

    /// Put a target on the floor plan for the first time.
    fn place_target(
        &self,
        token: &str,
        room_id: &str,
        target: TargetId,
        position: Point,
    ) -> BoxFuture<'_, StorageResult<()>>;

    /// Store the full target layout and groups.
    fn save_layout(&self, token: &str, room_id: &str, layout: &RoomLayout) -> BoxFuture<'_, StorageResult<()>>;
}

/// A queued persistence call.
///
/// Update commands carry the state they replaced so the editor can restore
/// it when the call fails.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistCommand {
    AddWall(Wall),
    AddRoom(RoomShape),
    AddDoor(Door),
    AddWindow(Window),
    UpdateElement {
        id: String,
        patch: ElementPatch,
        previous: ElementPatch,
    },
    MoveTarget {
        id: TargetId,
        to: Point,
        from: Point,
    },
    PlaceTarget {
        id: TargetId,
        to: Point,
        /// Position before the placement, if the target was already placed.
        previous: Option<Point>,
    },
    SaveLayout(RoomLayout),
}

impl PersistCommand {
    /// Name of the backend operation this command maps to.
    pub fn operation(&self) -> &'static str {
        match self {
            PersistCommand::AddWall(_) => "add_wall",
            PersistCommand::AddRoom(_) => "add_room",
            PersistCommand::AddDoor(_) => "add_door",
            PersistCommand::AddWindow(_) => "add_window",
            PersistCommand::UpdateElement { .. } => "update_floor_plan_element",
            PersistCommand::MoveTarget { .. } => "move_target",
            PersistCommand::PlaceTarget { .. } => "place_target",
            PersistCommand::SaveLayout(_) => "save_layout",
        }
    }

    /// Id of the entity the command touches.
    pub fn entity_id(&self) -> Option<String> {
        match self {
            PersistCommand::AddWall(wall) => Some(wall.id.clone()),
            PersistCommand::AddRoom(room) => Some(room.id.clone()),
            PersistCommand::AddDoor(door) => Some(door.id.clone()),
            PersistCommand::AddWindow(window) => Some(window.id.clone()),
            PersistCommand::UpdateElement { id, .. } => Some(id.clone()),
            PersistCommand::MoveTarget { id, .. } | PersistCommand::PlaceTarget { id, .. } => Some(id.to_string()),
            PersistCommand::SaveLayout(_) => None,
        }
    }

    /// Take over the replaced state of an earlier command for the same
    /// entity that the backend rejected, so reverting `self` restores what
    /// the backend last accepted. Returns false if the two commands do not
    /// chain.
    pub fn rebase_onto(&mut self, failed: &PersistCommand) -> bool {
        match failed {
            PersistCommand::MoveTarget { id, from, .. } => self.rebase_target(*id, Some(*from)),
            PersistCommand::PlaceTarget { id, previous, .. } => self.rebase_target(*id, *previous),
            PersistCommand::UpdateElement {
                id: failed_id,
                previous: failed_previous,
                ..
            } => match self {
                PersistCommand::UpdateElement { id, previous, .. } if id == failed_id => {
                    *previous = failed_previous.clone();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// A target the backend never saw placed has to be placed, not moved.
    fn rebase_target(&mut self, target: TargetId, prior: Option<Point>) -> bool {
        let (id, to) = match self {
            PersistCommand::MoveTarget { id, to, .. } | PersistCommand::PlaceTarget { id, to, .. } if *id == target => {
                (*id, *to)
            }
            _ => return false,
        };
        *self = match prior {
            Some(from) => PersistCommand::MoveTarget { id, to, from },
            None => PersistCommand::PlaceTarget { id, to, previous: None },
        };
        true
    }
}

/// Run one command against the backend.
///
/// Failures are logged with the operation and entity id and returned to the
/// caller, which decides whether to revert.
pub async fn dispatch(
    adapter: &dyn PersistenceAdapter,
    token: &str,
    room_id: &str,
    command: &PersistCommand,
) -> StorageResult<()> {
    let result = match command {
        PersistCommand::AddWall(wall) => adapter.add_wall(token, room_id, wall).await,
        PersistCommand::AddRoom(room) => adapter.add_room(token, room_id, room).await,
        PersistCommand::AddDoor(door) => adapter.add_door(token, room_id, door).await,
        PersistCommand::AddWindow(window) => adapter.add_window(token, room_id, window).await,
        PersistCommand::UpdateElement { id, patch, .. } => {
            adapter.update_floor_plan_element(token, room_id, id, patch).await
        }
        PersistCommand::MoveTarget { id, to, .. } => adapter.move_target(token, room_id, *id, *to).await,
        PersistCommand::PlaceTarget { id, to, .. } => adapter.place_target(token, room_id, *id, *to).await,
        PersistCommand::SaveLayout(layout) => adapter.save_layout(token, room_id, layout).await,
    };
    if let Err(err) = &result {
        log::error!(
            "{} failed for {} in room {room_id}: {err}",
            command.operation(),
            command.entity_id().as_deref().unwrap_or("layout"),
        );
    }
    result
}
