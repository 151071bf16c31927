use crate::agent::AgentState;

/// Number of scalar inputs a policy receives each tick.
pub const OBSERVATION_LEN: usize = 8;

/// Fixed-order policy input vector.
pub type Observation = [f32; OBSERVATION_LEN];

/// Encodes the observation for one side: itself first, opponent second.
///
/// Slot layout (frozen contract - reordering invalidates every trained
/// policy):
///
/// 0. own x position
/// 1. own y position
/// 2. own heading angle
/// 3. opponent x position
/// 4. opponent y position
/// 5. opponent heading angle
/// 6. opponent in-progress action id, or -1 when idle
/// 7. ticks remaining in the opponent's action
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn encode_observation(own: &AgentState, opponent: &AgentState) -> Observation {
    [
        own.x,
        own.y,
        own.angle,
        opponent.x,
        opponent.y,
        opponent.angle,
        opponent.observed_action_id(),
        opponent.action_ticks_left as f32,
    ]
}
