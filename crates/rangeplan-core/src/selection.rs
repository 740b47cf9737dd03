//! Selection state and target grouping.
//!
//! Target selection, group selection and element selection are mutually
//! exclusive: selecting one kind clears the others.

use crate::plan::{ElementKind, Group, GroupError, RoomLayout, TargetId};
use kurbo::Rect;

/// Padding drawn around a group's member targets.
pub const GROUP_PADDING: f64 = 20.0;

/// Current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    targets: Vec<TargetId>,
    group: Option<String>,
    element: Option<(ElementKind, String)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a target. With `toggle` (shift-click) the target's membership in
    /// the multi-selection flips and the rest is kept.
    pub fn click_target(&mut self, id: TargetId, toggle: bool) {
        self.group = None;
        self.element = None;
        if toggle {
            if let Some(pos) = self.targets.iter().position(|t| *t == id) {
                self.targets.remove(pos);
            } else {
                self.targets.push(id);
            }
        } else {
            self.targets.clear();
            self.targets.push(id);
        }
    }

    /// Replace the target selection.
    pub fn set_targets(&mut self, ids: impl IntoIterator<Item = TargetId>) {
        self.clear();
        for id in ids {
            if !self.targets.contains(&id) {
                self.targets.push(id);
            }
        }
    }

    pub fn select_group(&mut self, id: impl Into<String>) {
        self.targets.clear();
        self.element = None;
        self.group = Some(id.into());
    }

    pub fn select_element(&mut self, kind: ElementKind, id: impl Into<String>) {
        self.targets.clear();
        self.group = None;
        self.element = Some((kind, id.into()));
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.group = None;
        self.element = None;
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.group.is_none() && self.element.is_none()
    }

    pub fn targets(&self) -> &[TargetId] {
        &self.targets
    }

    pub fn is_target_selected(&self, id: TargetId) -> bool {
        self.targets.contains(&id)
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn element(&self) -> Option<(ElementKind, &str)> {
        self.element.as_ref().map(|(kind, id)| (*kind, id.as_str()))
    }

    /// Id of the selected room, if the element selection is a room.
    pub fn room(&self) -> Option<&str> {
        match &self.element {
            Some((ElementKind::Room, id)) => Some(id),
            _ => None,
        }
    }
}

/// Create a group from the selected targets and select it.
///
/// Fails without touching anything when fewer than two targets are selected.
pub fn create_group(
    selection: &mut Selection,
    layout: &mut RoomLayout,
    name: impl Into<String>,
) -> Result<Group, GroupError> {
    let group = Group::new(name, selection.targets().iter().copied())?;
    log::info!("created group {} with {} targets", group.id, group.target_ids.len());
    layout.groups.push(group.clone());
    selection.select_group(group.id.clone());
    Ok(group)
}

/// Dissolve a group and select its former members.
pub fn ungroup(selection: &mut Selection, layout: &mut RoomLayout, group_id: &str) -> Result<Group, GroupError> {
    let group = layout
        .remove_group(group_id)
        .ok_or_else(|| GroupError::NotFound(group_id.to_string()))?;
    selection.set_targets(group.target_ids.iter().copied());
    Ok(group)
}

/// Visual bounds of a group, derived from the current member positions
/// (each member contributes its marker radius) plus [`GROUP_PADDING`].
///
/// Returns `None` when none of the members is placed.
pub fn group_bounds(group: &Group, layout: &RoomLayout) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    for placement in group.target_ids.iter().filter_map(|id| layout.placement(*id)) {
        let extent = placement.bounds();
        bounds = Some(match bounds {
            Some(b) => b.union(extent),
            None => extent,
        });
    }
    bounds.map(|b| b.inflate(GROUP_PADDING, GROUP_PADDING))
}
