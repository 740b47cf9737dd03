//! Editing session for one room's floor plan.
//!
//! [`FloorPlanEditor`] owns the model and every controller, routes host
//! events through them and queues a [`PersistCommand`] for each mutation.
//! Mutations are applied immediately; the host drains the queue with
//! [`FloorPlanEditor::take_pending`] or [`FloorPlanEditor::flush`]. A failed
//! command is undone with [`FloorPlanEditor::revert`], which also leaves a
//! [`Notice`] for the user.

use crate::bounds::compute_bounds;
use crate::config::{ConfigError, EditorConfig};
use crate::input::{ClickEvent, DropPayload, HitTarget, client_to_stage};
use crate::interaction::{DragResult, DragSubject, InteractionHandler};
use crate::plan::{
    ElementKind, ElementPatch, FloorPlan, FloorPlanElement, Group, GroupError, RoomLayout, RoomSnapshot, TargetId,
};
use crate::render::{NodeSync, RenderContext, RenderSurface, hit_test, render_floor_plan};
use crate::selection::{self, Selection, group_bounds};
use crate::snap::{Snapper, is_finite_point};
use crate::storage::{PersistCommand, PersistenceAdapter, StorageError, dispatch};
use crate::tools::{ClickOutcome, DrawingMode, DrawingTool};
use crate::trace::{NoopTrace, Trace, TraceEvent};
use crate::viewport::{DeviceClass, ViewportController, ViewportState};
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::VecDeque;
use thiserror::Error;
use uuid::Uuid;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to load room: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Result of [`FloorPlanEditor::flush`].
#[derive(Debug, Default)]
pub struct FlushReport {
    pub dispatched: usize,
    /// Commands that failed and were reverted.
    pub failed: Vec<(PersistCommand, StorageError)>,
}

/// One room editing session.
pub struct FloorPlanEditor {
    room_id: String,
    session_id: Uuid,
    config: EditorConfig,
    snapper: Snapper,
    plan: FloorPlan,
    layout: RoomLayout,
    /// Every target registered to the room, placed or not.
    targets: Vec<TargetId>,
    selection: Selection,
    tool: DrawingTool,
    interaction: InteractionHandler,
    viewport: ViewportController,
    nodes: NodeSync,
    trace: Box<dyn Trace>,
    notices: Vec<Notice>,
    outbox: VecDeque<PersistCommand>,
}

impl FloorPlanEditor {
    /// Start a session on an already loaded room.
    pub fn new(
        room_id: impl Into<String>,
        snapshot: RoomSnapshot,
        config: EditorConfig,
        container: Size,
        device: DeviceClass,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut viewport = ViewportController::new(container, device);
        viewport.debounce = config.resize_debounce();
        viewport.threshold = config.resize_threshold;
        viewport.auto_fit = config.auto_fit;

        let mut editor = Self {
            room_id: room_id.into(),
            session_id: Uuid::new_v4(),
            snapper: config.snapper(),
            config,
            plan: snapshot.floor_plan,
            layout: snapshot.layout,
            targets: snapshot.targets,
            selection: Selection::new(),
            tool: DrawingTool::new(),
            interaction: InteractionHandler::new(),
            viewport,
            nodes: NodeSync::new(),
            trace: Box::new(NoopTrace),
            notices: Vec::new(),
            outbox: VecDeque::new(),
        };
        editor
            .viewport
            .set_bounds(compute_bounds(&editor.plan, &editor.layout), false);
        editor.viewport.recompute();
        editor.nodes.sync(&editor.plan, &editor.layout, false);
        log::info!(
            "session {} opened room {} ({} targets, {} placed)",
            editor.session_id,
            editor.room_id,
            editor.targets.len(),
            editor.layout.layout.len()
        );
        Ok(editor)
    }

    /// Load a room from the backend and start a session on it.
    pub async fn load(
        adapter: &dyn PersistenceAdapter,
        token: &str,
        room_id: &str,
        config: EditorConfig,
        container: Size,
        device: DeviceClass,
    ) -> Result<Self, EditorError> {
        config.validate()?;
        let snapshot = adapter.load_room(token, room_id).await.map_err(|err| {
            log::error!("load_room failed for {room_id}: {err}");
            err
        })?;
        Ok(Self::new(room_id, snapshot, config, container, device)?)
    }

    /// Replace the trace sink.
    pub fn with_trace(mut self, trace: Box<dyn Trace>) -> Self {
        self.trace = trace;
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn plan(&self) -> &FloorPlan {
        &self.plan
    }

    pub fn layout(&self) -> &RoomLayout {
        &self.layout
    }

    pub fn targets(&self) -> &[TargetId] {
        &self.targets
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn drawing_mode(&self) -> Option<DrawingMode> {
        self.tool.mode()
    }

    pub fn viewport(&self) -> &ViewportState {
        self.viewport.state()
    }

    pub fn nodes(&self) -> &NodeSync {
        &self.nodes
    }

    pub fn is_interacting(&self) -> bool {
        self.interaction.is_interacting()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Snapshot of the current model.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            floor_plan: self.plan.clone(),
            layout: self.layout.clone(),
            targets: self.targets.clone(),
        }
    }

    fn record(&self, event: TraceEvent) {
        self.trace.record(self.session_id, &event);
    }

    fn queue(&mut self, command: PersistCommand) {
        log::debug!("queue {} {:?}", command.operation(), command.entity_id());
        self.record(TraceEvent::CommandQueued(command.operation()));
        self.outbox.push_back(command);
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice::new(level, message));
    }

    /// Recompute bounds and node positions after a model change.
    fn refresh(&mut self) {
        let interacting = self.interaction.is_interacting();
        self.viewport
            .set_bounds(compute_bounds(&self.plan, &self.layout), interacting);
        self.nodes.sync(&self.plan, &self.layout, interacting);
    }

    /// Canvas-space area available for dragging.
    fn drag_area(&self) -> Size {
        let state = self.viewport.state();
        let scale = if state.stage_scale > 0.0 { state.stage_scale } else { 1.0 };
        Size::new(state.stage_size.width / scale, state.stage_size.height / scale)
    }

    /// Entity under a stage point.
    pub fn hit_test(&self, stage_point: Point) -> HitTarget {
        let point = self.viewport.state().to_canvas(stage_point);
        hit_test(&self.plan, &self.layout, &self.selection, point)
    }

    /// Draw the current frame.
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        let ctx = RenderContext::new(&self.plan, &self.layout, self.viewport.state(), &self.nodes)
            .with_selection(&self.selection)
            .with_grid(self.config.grid_size)
            .with_wall_preview(self.tool.pending_wall_start());
        render_floor_plan(surface, &ctx);
    }

    pub fn set_drawing_mode(&mut self, mode: Option<DrawingMode>) {
        self.interaction.pointer_down();
        self.tool.set_mode(mode);
        self.record(TraceEvent::ModeChanged(mode));
    }

    /// A press on the stage. The click that follows it is never mistaken for
    /// a drag release.
    pub fn pointer_down(&mut self) {
        self.interaction.pointer_down();
    }

    /// Handle a click on the stage.
    pub fn handle_click(&mut self, event: &ClickEvent) -> ClickOutcome {
        if self.interaction.take_click_suppression() {
            log::debug!("click after drag release ignored");
            return ClickOutcome::Ignored;
        }
        self.record(TraceEvent::Click {
            position: event.position,
            hit: event.hit.clone(),
        });

        match &event.hit {
            HitTarget::Canvas => {}
            HitTarget::Target(id) => {
                self.selection.click_target(*id, event.modifiers.shift);
                return ClickOutcome::Ignored;
            }
            HitTarget::Group(id) => {
                self.selection.select_group(id.clone());
                return ClickOutcome::Ignored;
            }
            HitTarget::Element(kind, id) => {
                self.selection.select_element(*kind, id.clone());
                return ClickOutcome::Ignored;
            }
            HitTarget::ResizeHandle(_) => return ClickOutcome::Ignored,
        }

        let point = self.viewport.state().to_canvas(event.position);
        if !is_finite_point(point) {
            log::warn!("click at non-finite position {:?} ignored", event.position);
            return ClickOutcome::Ignored;
        }
        let snapped = self.snapper.snap_point(point);
        let next_unplaced = self.layout.first_unplaced(&self.targets);
        let outcome = self.tool.click(snapped, true, next_unplaced);

        match &outcome {
            ClickOutcome::Ignored | ClickOutcome::WallStarted(_) => {}
            ClickOutcome::WallCompleted(wall) => {
                if self.insert_element(FloorPlanElement::Wall(wall.clone())) {
                    self.queue(PersistCommand::SaveLayout(self.layout.clone()));
                }
            }
            ClickOutcome::Created(element) => {
                self.insert_element(element.clone());
            }
            ClickOutcome::PlaceTarget { id, position } => {
                self.place_target(*id, *position);
            }
            ClickOutcome::NoUnplacedTarget => {
                self.notify(NoticeLevel::Info, "All targets in this room are already placed");
            }
            ClickOutcome::ClearSelection => self.selection.clear(),
        }
        outcome
    }

    fn insert_element(&mut self, element: FloorPlanElement) -> bool {
        if let Err(err) = self.plan.insert(element.clone()) {
            log::warn!("rejected new {}: {err}", element.kind());
            return false;
        }
        let command = match element {
            FloorPlanElement::Wall(wall) => PersistCommand::AddWall(wall),
            FloorPlanElement::Room(room) => PersistCommand::AddRoom(room),
            FloorPlanElement::Door(door) => PersistCommand::AddDoor(door),
            FloorPlanElement::Window(window) => PersistCommand::AddWindow(window),
        };
        self.queue(command);
        self.refresh();
        true
    }

    /// Place a target, or move it when it already has a position.
    fn place_target(&mut self, id: TargetId, position: Point) -> bool {
        match self.layout.place(id, position) {
            Ok(None) => self.queue(PersistCommand::PlaceTarget {
                id,
                to: position,
                previous: None,
            }),
            Ok(Some(from)) => self.queue(PersistCommand::MoveTarget { id, to: position, from }),
            Err(err) => {
                log::warn!("target {id} not placed: {err}");
                return false;
            }
        }
        self.refresh();
        true
    }

    /// Handle a target dropped from the palette.
    ///
    /// `client` is the drop point in page coordinates and `canvas_rect` the
    /// canvas element's bounding rectangle in the same space.
    pub fn handle_drop(&mut self, payload: &DropPayload, client: Point, canvas_rect: Rect) -> Option<TargetId> {
        self.interaction.pointer_down();
        let Some(id) = payload.target_id() else {
            log::warn!("drop without a valid target id ignored");
            return None;
        };
        if !self.targets.contains(&id) {
            log::warn!("dropped target {id} is not registered to room {}", self.room_id);
            return None;
        }
        let point = self.viewport.state().to_canvas(client_to_stage(client, canvas_rect));
        if !is_finite_point(point) {
            log::warn!("drop at non-finite position {client:?} ignored");
            return None;
        }
        let position = self.snapper.snap_point(point);
        if !self.place_target(id, position) {
            return None;
        }
        self.record(TraceEvent::Dropped { target: id, position });
        Some(id)
    }

    /// Start dragging an entity. Returns false if it does not exist.
    pub fn begin_drag(&mut self, subject: DragSubject) -> bool {
        let extent = match &subject {
            DragSubject::Target(id) => self.layout.placement(*id).map(|p| (p.position(), p.bounds())),
            DragSubject::Element(kind, id) => self.plan.anchor(*kind, id).zip(self.plan.bounds_of(*kind, id)),
            DragSubject::Group(id) => self
                .layout
                .group(id)
                .and_then(|g| group_bounds(g, &self.layout))
                .map(|b| (b.origin(), b)),
        };
        let Some((anchor, bounds)) = extent else {
            log::warn!("drag start on unknown {subject:?}");
            return false;
        };
        if let DragSubject::Element(kind, id) = &subject {
            if kind.is_multi_point() {
                self.selection.select_element(*kind, id.clone());
            }
        }
        self.record(TraceEvent::DragStarted(subject.clone()));
        self.interaction.begin_drag(subject, anchor, bounds);
        true
    }

    /// Drag tick with the node's canvas position. Returns the clamped
    /// position the node should take.
    pub fn drag_move(&mut self, position: Point) -> Option<Point> {
        let area = self.drag_area();
        let clamped = self.interaction.drag_move(position, area)?;
        if let Some(drag) = self.interaction.drag() {
            self.nodes.set_dragged(drag.subject.clone(), clamped);
        }
        Some(clamped)
    }

    /// Finish the drag with the node's final canvas position.
    pub fn end_drag(&mut self, position: Point) -> Option<DragResult> {
        let area = self.drag_area();
        let Some(result) = self.interaction.end_drag(position, area, &self.snapper) else {
            self.refresh();
            return None;
        };
        if result.delta != Vec2::ZERO {
            self.apply_drag(&result);
        }
        self.record(TraceEvent::DragEnded {
            subject: result.subject.clone(),
            delta: result.delta,
        });
        self.refresh();
        Some(result)
    }

    fn apply_drag(&mut self, result: &DragResult) {
        match &result.subject {
            DragSubject::Target(id) => self.move_target_by(*id, result.delta),
            DragSubject::Element(kind, id) => {
                let Some(previous) = self.plan.geometry(*kind, id) else {
                    log::warn!("dragged {kind} {id} no longer exists");
                    return;
                };
                match self.plan.translate(*kind, id, result.delta) {
                    Ok(patch) => self.queue(PersistCommand::UpdateElement {
                        id: id.clone(),
                        patch,
                        previous,
                    }),
                    Err(err) => log::warn!("drag of {kind} {id} rejected: {err}"),
                }
            }
            DragSubject::Group(group_id) => {
                let Some(members) = self.layout.group(group_id).map(|g| g.target_ids.clone()) else {
                    log::warn!("dragged group {group_id} no longer exists");
                    return;
                };
                for id in members {
                    self.move_target_by(id, result.delta);
                }
            }
        }
    }

    fn move_target_by(&mut self, id: TargetId, delta: Vec2) {
        let Some(from) = self.layout.placement(id).map(|p| p.position()) else {
            return;
        };
        let to = from + delta;
        match self.layout.move_to(id, to) {
            Ok(from) => self.queue(PersistCommand::MoveTarget { id, to, from }),
            Err(err) => log::warn!("move of target {id} rejected: {err}"),
        }
    }

    /// Start resizing a room from its handle at a stage point.
    pub fn begin_resize(&mut self, room_id: &str, stage_pointer: Point) -> bool {
        let pointer = self.viewport.state().to_canvas(stage_pointer);
        let Some(room) = self.plan.room(room_id) else {
            log::warn!("resize start on unknown room {room_id}");
            return false;
        };
        if !self.interaction.begin_resize(room, pointer) {
            return false;
        }
        self.selection.select_element(ElementKind::Room, room_id);
        self.record(TraceEvent::ResizeStarted(room_id.to_string()));
        true
    }

    /// Resize pointer move. The room is updated and persisted on every move.
    pub fn resize_move(&mut self, stage_pointer: Point) -> bool {
        let pointer = self.viewport.state().to_canvas(stage_pointer);
        let Some((id, points)) = self.interaction.resize_move(pointer, &self.snapper) else {
            return false;
        };
        let Some(previous) = self.plan.geometry(ElementKind::Room, &id) else {
            log::warn!("resized room {id} no longer exists");
            return false;
        };
        let patch = ElementPatch::Room { points };
        if patch == previous {
            return false;
        }
        if let Err(err) = self.plan.apply_patch(&id, &patch) {
            log::warn!("resize of room {id} rejected: {err}");
            return false;
        }
        self.queue(PersistCommand::UpdateElement { id, patch, previous });
        true
    }

    pub fn end_resize(&mut self) -> Option<String> {
        let id = self.interaction.end_resize()?;
        self.record(TraceEvent::ResizeEnded(id.clone()));
        self.refresh();
        Some(id)
    }

    /// Group the selected targets. Rejections also leave a notice.
    pub fn create_group(&mut self, name: impl Into<String>) -> Result<Group, GroupError> {
        match selection::create_group(&mut self.selection, &mut self.layout, name) {
            Ok(group) => {
                self.queue(PersistCommand::SaveLayout(self.layout.clone()));
                self.refresh();
                Ok(group)
            }
            Err(err) => {
                log::warn!("group creation rejected: {err}");
                self.notify(NoticeLevel::Warning, err.to_string());
                Err(err)
            }
        }
    }

    pub fn ungroup(&mut self, group_id: &str) -> Result<Group, GroupError> {
        let group = selection::ungroup(&mut self.selection, &mut self.layout, group_id)?;
        self.queue(PersistCommand::SaveLayout(self.layout.clone()));
        self.refresh();
        Ok(group)
    }

    /// Record a container resize; applied by [`Self::tick`] after the debounce.
    pub fn on_container_resize(&mut self, size: Size, now: Instant) {
        self.viewport.on_container_resize(size, now);
    }

    pub fn set_device(&mut self, device: DeviceClass) {
        let interacting = self.interaction.is_interacting();
        self.viewport.set_device(device, interacting);
    }

    /// Advance timers. Returns true if the viewport was recomputed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let recomputed = self.viewport.tick(now, self.interaction.is_interacting());
        if recomputed {
            let state = *self.viewport.state();
            self.record(TraceEvent::ViewportRecomputed {
                canvas: state.canvas_size,
                scale: state.stage_scale,
            });
        }
        recomputed
    }

    /// Fit the content again right away.
    pub fn refit(&mut self) {
        self.viewport
            .set_bounds(compute_bounds(&self.plan, &self.layout), false);
        self.viewport.recompute();
    }

    /// Drain queued commands in order.
    pub fn take_pending(&mut self) -> Vec<PersistCommand> {
        self.outbox.drain(..).collect()
    }

    /// Dispatch every queued command in order. Failed commands are reverted.
    ///
    /// A later queued command for the same entity takes over the failed
    /// command's prior state, and the model keeps the later change. Updates
    /// queued for an element whose creation failed are dropped.
    pub async fn flush(&mut self, adapter: &dyn PersistenceAdapter, token: &str) -> FlushReport {
        let mut report = FlushReport::default();
        while let Some(command) = self.outbox.pop_front() {
            report.dispatched += 1;
            if let Err(err) = dispatch(adapter, token, &self.room_id, &command).await {
                self.record(TraceEvent::CommandFailed {
                    operation: command.operation(),
                    entity: command.entity_id(),
                });
                self.settle_failure(&command);
                self.revert(&command, &err);
                report.failed.push((command, err));
            }
        }
        report
    }

    fn settle_failure(&mut self, failed: &PersistCommand) {
        match failed {
            PersistCommand::AddWall(_)
            | PersistCommand::AddRoom(_)
            | PersistCommand::AddDoor(_)
            | PersistCommand::AddWindow(_) => {
                let entity = failed.entity_id();
                let before = self.outbox.len();
                self.outbox
                    .retain(|later| !(matches!(later, PersistCommand::UpdateElement { .. }) && later.entity_id() == entity));
                if self.outbox.len() < before {
                    log::debug!("dropped {} queued updates of {entity:?}", before - self.outbox.len());
                }
            }
            _ => {
                if self.outbox.iter_mut().any(|later| later.rebase_onto(failed)) {
                    log::debug!("{} of {:?} superseded by a queued change", failed.operation(), failed.entity_id());
                }
            }
        }
    }

    /// Undo the local effect of a command the backend rejected and tell the
    /// user about it.
    ///
    /// Updates are only undone while the entity still holds the state the
    /// command produced; a later change is left in place.
    pub fn revert(&mut self, command: &PersistCommand, error: &StorageError) {
        let restored = if self.is_current(command) {
            self.restore(command)
        } else {
            log::debug!("{} of {:?} superseded, model kept", command.operation(), command.entity_id());
            false
        };

        let message = if restored {
            format!("Could not save change ({}): {error}. The change was undone.", command.operation())
        } else {
            format!("Could not save change ({}): {error}", command.operation())
        };
        log::warn!("{message}");
        self.notify(NoticeLevel::Error, message);
        self.record(TraceEvent::Reverted(command.operation()));
        self.refresh();
    }

    fn restore(&mut self, command: &PersistCommand) -> bool {
        match command {
            PersistCommand::AddWall(wall) => self.remove_element(ElementKind::Wall, &wall.id),
            PersistCommand::AddRoom(room) => self.remove_element(ElementKind::Room, &room.id),
            PersistCommand::AddDoor(door) => self.remove_element(ElementKind::Door, &door.id),
            PersistCommand::AddWindow(window) => self.remove_element(ElementKind::Window, &window.id),
            PersistCommand::UpdateElement { id, previous, .. } => match self.plan.apply_patch(id, previous) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("revert of {id} failed: {err}");
                    false
                }
            },
            PersistCommand::MoveTarget { id, from, .. } => self.layout.move_to(*id, *from).is_ok(),
            PersistCommand::PlaceTarget { id, previous, .. } => match previous {
                Some(p) => self.layout.place(*id, *p).is_ok(),
                None => self.layout.remove_placement(*id).is_some(),
            },
            PersistCommand::SaveLayout(_) => false,
        }
    }

    /// Whether the model still holds the state `command` produced.
    fn is_current(&self, command: &PersistCommand) -> bool {
        match command {
            PersistCommand::UpdateElement { id, patch, .. } => {
                self.plan.geometry(patch.kind(), id).as_ref() == Some(patch)
            }
            PersistCommand::MoveTarget { id, to, .. } | PersistCommand::PlaceTarget { id, to, .. } => {
                self.layout.placement(*id).map(|p| p.position()) == Some(*to)
            }
            _ => true,
        }
    }

    fn remove_element(&mut self, kind: ElementKind, id: &str) -> bool {
        if self.selection.element() == Some((kind, id)) {
            self.selection.clear();
        }
        self.plan.remove(kind, id).is_some()
    }
}
