//! Named groups of targets.

use super::placement::TargetId;
use crate::ids::generate_id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of distinct targets in a group.
pub const MIN_GROUP_MEMBERS: usize = 2;

/// Group errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("Select at least 2 targets to create a group ({0} selected)")]
    TooFewMembers(usize),
    #[error("Group not found: {0}")]
    NotFound(String),
}

/// A named cluster of targets moved and bounded as one unit.
///
/// Groups have no geometry of their own; their bounds are derived from the
/// current member placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub target_ids: Vec<TargetId>,
}

impl Group {
    /// Create a group from the given members, ignoring duplicates.
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = TargetId>) -> Result<Self, GroupError> {
        let mut target_ids: Vec<TargetId> = Vec::new();
        for id in members {
            if !target_ids.contains(&id) {
                target_ids.push(id);
            }
        }
        if target_ids.len() < MIN_GROUP_MEMBERS {
            return Err(GroupError::TooFewMembers(target_ids.len()));
        }
        Ok(Self {
            id: generate_id("group"),
            name: name.into(),
            target_ids,
        })
    }

    pub fn contains(&self, target: TargetId) -> bool {
        self.target_ids.contains(&target)
    }
}
