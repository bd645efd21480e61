//! Mission progression — the verification gate and toggle semantics.
//!
//! The gate is session-scoped, not per-mission: the coach unlocks it by
//! certifying the user's proof of work, and completing any one mission
//! consumes it. Un-completing a mission is always allowed and is never
//! persisted remotely; only forward completion is committed. Whether the
//! store should also record reversals is an open product decision — the
//! asymmetry is deliberate and pinned by tests.

use serde::{Deserialize, Serialize};

use crate::error::ProgressError;
use crate::roadmap::model::Roadmap;

/// The verification gate for the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Manual completion is rejected until the coach certifies.
    #[default]
    Locked,
    /// The coach certified; the next completion consumes the unlock.
    Unlocked,
}

impl Gate {
    /// Completion event from the chat engine. Idempotent.
    pub fn unlock(&mut self) {
        *self = Self::Unlocked;
    }

    /// Consume the unlock if present. Returns whether it was consumed.
    pub fn try_consume(&mut self) -> bool {
        match self {
            Self::Unlocked => {
                *self = Self::Locked;
                true
            }
            Self::Locked => false,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked)
    }
}

/// What a successful toggle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    /// Forward completion: persisted remotely and re-locks the gate.
    Completed { mission_id: String },
    /// Reversal: local only, gate untouched.
    Uncompleted { mission_id: String },
}

/// Apply a user toggle to the in-memory roadmap.
///
/// Forward completion while the gate is locked is rejected with
/// [`ProgressError::NotVerified`] and mutates nothing. The caller owns the
/// follow-up for `Completed`: the remote commit and the auto-advance turn.
pub fn apply_toggle(
    roadmap: &mut Roadmap,
    gate: &mut Gate,
    week_index: usize,
    mission_index: usize,
) -> Result<ToggleAction, ProgressError> {
    let mission = roadmap
        .curriculum
        .get_mut(week_index)
        .and_then(|week| week.missions.get_mut(mission_index))
        .ok_or(ProgressError::UnknownMission {
            week_index,
            mission_index,
        })?;

    if mission.is_completed {
        mission.is_completed = false;
        return Ok(ToggleAction::Uncompleted {
            mission_id: mission.id.clone(),
        });
    }

    if !gate.try_consume() {
        return Err(ProgressError::NotVerified);
    }
    mission.is_completed = true;
    Ok(ToggleAction::Completed {
        mission_id: mission.id.clone(),
    })
}
