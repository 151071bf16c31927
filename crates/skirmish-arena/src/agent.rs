use serde::{Deserialize, Serialize};

/// Snapshot of one combatant's state at a tick boundary.
///
/// This is the unit of state recorded into episode archives and fed into
/// observation encoding. `current_action` holds the numeric id of an
/// in-progress timed action (attack, dodge, fallback) and `action_ticks_left`
/// how many ticks remain before the agent is free again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub x: f32,
    pub y: f32,
    /// Heading in degrees, 0 pointing along +x, counter-clockwise positive.
    pub angle: f32,
    pub health: i32,
    pub current_action: Option<u8>,
    pub action_ticks_left: u32,
}

impl AgentState {
    #[must_use]
    pub fn new(x: f32, y: f32, angle: f32, health: i32) -> Self {
        Self {
            x,
            y,
            angle,
            health,
            current_action: None,
            action_ticks_left: 0,
        }
    }

    /// Whether a timed action is still playing out. Busy agents ignore new
    /// commands until the action expires.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.current_action.is_some()
    }

    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    /// Observation encoding of the in-progress action: the action id, or
    /// -1.0 when idle.
    #[must_use]
    pub fn observed_action_id(&self) -> f32 {
        self.current_action.map_or(-1.0, f32::from)
    }

    pub(crate) fn begin_timed_action(&mut self, id: u8, duration: u32) {
        self.current_action = Some(id);
        self.action_ticks_left = duration;
    }

    pub(crate) fn clear_timed_action(&mut self) {
        self.current_action = None;
        self.action_ticks_left = 0;
    }

    pub(crate) fn take_damage(&mut self, damage: i32) {
        self.health = (self.health - damage).max(0);
    }
}
