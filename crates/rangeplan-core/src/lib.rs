//! RangePlan Core Library
//!
//! Platform-agnostic floor-plan editor core for shooting-range rooms: the
//! geometry model, grid snapping, viewport fitting, drawing and drag tools,
//! target grouping and the persistence contract.

pub mod bounds;
pub mod config;
pub mod editor;
pub mod ids;
pub mod input;
pub mod interaction;
pub mod plan;
pub mod render;
pub mod selection;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod trace;
pub mod viewport;

pub use bounds::{BOUNDS_PADDING, ContentBounds, compute_bounds};
pub use config::{ConfigError, EditorConfig};
pub use editor::{EditorError, FloorPlanEditor, FlushReport, Notice, NoticeLevel};
pub use input::{ClickEvent, DropPayload, HitTarget, Modifiers, TARGET_ID_MIME};
pub use interaction::{DragResult, DragSubject, InteractionHandler, drag_bound};
pub use plan::{
    Door, ElementKind, ElementPatch, FloorPlan, FloorPlanElement, GeometryError, Group, GroupError, RoomLayout,
    RoomShape, RoomSnapshot, TargetId, TargetPlacement, Wall, Window,
};
pub use render::{NodeSync, RenderSurface, parse_hex_color};
pub use selection::Selection;
pub use snap::{GRID_SIZE, Snapper, grid_snap};
pub use storage::{MemoryAdapter, PersistCommand, PersistenceAdapter, StorageError, StorageResult};
pub use tools::{ClickOutcome, DrawingMode, DrawingTool};
pub use trace::{LogTrace, NoopTrace, Trace, TraceEvent};
pub use viewport::{DeviceClass, ViewportController, ViewportState, auto_fit, compute_viewport};
