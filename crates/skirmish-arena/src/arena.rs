use crate::{
    action::{AttackProfile, CombatAction, RaiderAction, WardenAction},
    agent::AgentState,
};

pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 600.0;

pub const RAIDER_START_HEALTH: i32 = 100;
pub const WARDEN_START_HEALTH: i32 = 160;

const RAIDER_SPEED: f32 = 5.0;
const WARDEN_SPEED: f32 = 4.0;
const TURN_RATE_DEG: f32 = 9.0;

const DODGE_HOP: f32 = 36.0;
const FALLBACK_HOP: f32 = 40.0;

/// Half-angle of the frontal cone inside which attacks connect.
const ATTACK_ARC_DEG: f32 = 60.0;

/// Result of advancing the simulation by one tick.
///
/// Defeat is ordinary control flow here, not an error: the episode runner
/// matches on the variant to drive its terminal state machine. The Raider's
/// defeat check runs before the Warden's, so a same-tick double kill always
/// surfaces as `RaiderDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum TickOutcome {
    Continue,
    RaiderDown,
    WardenDown,
}

/// The combat simulation: two agents in a bounded rectangle.
///
/// All state transitions are pure functions of the applied actions; the
/// arena holds no random state and never blocks on wall-clock time.
#[derive(Debug, Clone)]
pub struct Arena {
    raider: AgentState,
    warden: AgentState,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Creates an arena with both combatants at their spawn points, facing
    /// each other across the centerline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raider: AgentState::new(200.0, 300.0, 0.0, RAIDER_START_HEALTH),
            warden: AgentState::new(600.0, 300.0, 180.0, WARDEN_START_HEALTH),
        }
    }

    /// Creates an arena from explicit agent states.
    #[must_use]
    pub fn with_states(raider: AgentState, warden: AgentState) -> Self {
        Self { raider, warden }
    }

    #[must_use]
    pub fn raider(&self) -> &AgentState {
        &self.raider
    }

    #[must_use]
    pub fn warden(&self) -> &AgentState {
        &self.warden
    }

    /// Applies the Raider's resolved action set for this tick.
    ///
    /// A busy agent (mid attack, dodge, or fallback) ignores the entire set.
    pub fn apply_raider_actions(&mut self, actions: &[RaiderAction]) {
        if self.raider.is_busy() {
            return;
        }
        for action in actions {
            match action {
                RaiderAction::StrafeLeft => step(&mut self.raider, 90.0, RAIDER_SPEED),
                RaiderAction::StrafeRight => step(&mut self.raider, -90.0, RAIDER_SPEED),
                RaiderAction::Forward => step(&mut self.raider, 0.0, RAIDER_SPEED),
                RaiderAction::Back => step(&mut self.raider, 180.0, RAIDER_SPEED),
                RaiderAction::TurnLeft => turn(&mut self.raider, TURN_RATE_DEG),
                RaiderAction::TurnRight => turn(&mut self.raider, -TURN_RATE_DEG),
                RaiderAction::Dodge | RaiderAction::Strike => {
                    if !self.raider.is_busy() {
                        self.raider
                            .begin_timed_action(action.id(), action.duration());
                        if *action == RaiderAction::Dodge {
                            step(&mut self.raider, 180.0, DODGE_HOP);
                        }
                    }
                }
            }
        }
    }

    /// Applies the Warden's resolved action set for this tick.
    pub fn apply_warden_actions(&mut self, actions: &[WardenAction]) {
        if self.warden.is_busy() {
            return;
        }
        for action in actions {
            match action {
                WardenAction::StrafeLeft => step(&mut self.warden, 90.0, WARDEN_SPEED),
                WardenAction::StrafeRight => step(&mut self.warden, -90.0, WARDEN_SPEED),
                WardenAction::Forward => step(&mut self.warden, 0.0, WARDEN_SPEED),
                WardenAction::Back => step(&mut self.warden, 180.0, WARDEN_SPEED),
                WardenAction::TurnLeft => turn(&mut self.warden, TURN_RATE_DEG),
                WardenAction::TurnRight => turn(&mut self.warden, -TURN_RATE_DEG),
                WardenAction::Fallback
                | WardenAction::Slash
                | WardenAction::Backslash
                | WardenAction::KnifeVolley => {
                    if !self.warden.is_busy() {
                        self.warden
                            .begin_timed_action(action.id(), action.duration());
                        if *action == WardenAction::Fallback {
                            step(&mut self.warden, 180.0, FALLBACK_HOP);
                        }
                    }
                }
            }
        }
    }

    /// Advances both agents' timed actions by one tick, lands any attacks
    /// that reach their strike frame, and reports the terminal outcome.
    ///
    /// The Raider's action resolves before the Warden's, matching the
    /// side-A-first ordering used when actions are applied.
    pub fn advance(&mut self) -> TickOutcome {
        if let Some(profile) = tick_timed_action::<RaiderAction>(&mut self.raider) {
            if in_strike_zone(&self.raider, &self.warden, profile.range) {
                self.warden.take_damage(profile.damage);
            }
        }
        if let Some(profile) = tick_timed_action::<WardenAction>(&mut self.warden) {
            if !self.raider_is_evading()
                && in_strike_zone(&self.warden, &self.raider, profile.range)
            {
                self.raider.take_damage(profile.damage);
            }
        }

        clamp_to_bounds(&mut self.raider);
        clamp_to_bounds(&mut self.warden);

        if self.raider.is_defeated() {
            return TickOutcome::RaiderDown;
        }
        if self.warden.is_defeated() {
            return TickOutcome::WardenDown;
        }
        TickOutcome::Continue
    }

    fn raider_is_evading(&self) -> bool {
        self.raider.current_action == Some(RaiderAction::Dodge.id())
            && self.raider.action_ticks_left > 0
    }
}

fn step(state: &mut AgentState, angle_offset_deg: f32, distance: f32) {
    let heading = (state.angle + angle_offset_deg).to_radians();
    state.x += heading.cos() * distance;
    state.y += heading.sin() * distance;
}

fn turn(state: &mut AgentState, delta_deg: f32) {
    state.angle = (state.angle + delta_deg).rem_euclid(360.0);
}

fn clamp_to_bounds(state: &mut AgentState) {
    state.x = state.x.clamp(0.0, ARENA_WIDTH);
    state.y = state.y.clamp(0.0, ARENA_HEIGHT);
}

/// Decrements an in-progress timed action and returns the attack profile if
/// this tick is the action's strike frame.
fn tick_timed_action<A>(state: &mut AgentState) -> Option<AttackProfile>
where
    A: CombatAction + LookupById,
{
    let id = state.current_action?;
    let action = A::from_id(id);
    state.action_ticks_left = state.action_ticks_left.saturating_sub(1);

    let strikes_now = state.action_ticks_left == action.duration() / 2;
    let profile = if strikes_now { action.attack() } else { None };

    if state.action_ticks_left == 0 {
        state.clear_timed_action();
    }
    profile
}

/// Recovers an action from the stable id stored in an agent snapshot.
trait LookupById: CombatAction {
    fn from_id(id: u8) -> Self;
}

impl LookupById for RaiderAction {
    fn from_id(id: u8) -> Self {
        Self::OUTPUT_ORDER[usize::from(id)]
    }
}

impl LookupById for WardenAction {
    fn from_id(id: u8) -> Self {
        Self::OUTPUT_ORDER[usize::from(id)]
    }
}

fn in_strike_zone(attacker: &AgentState, victim: &AgentState, range: f32) -> bool {
    let dx = victim.x - attacker.x;
    let dy = victim.y - attacker.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance > range {
        return false;
    }
    let bearing = dy.atan2(dx).to_degrees();
    let off_axis = (bearing - attacker.angle).rem_euclid(360.0);
    off_axis <= ATTACK_ARC_DEG || off_axis >= 360.0 - ATTACK_ARC_DEG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_positions_and_health() {
        let arena = Arena::new();
        assert_eq!(arena.raider().health, RAIDER_START_HEALTH);
        assert_eq!(arena.warden().health, WARDEN_START_HEALTH);
        assert!(arena.raider().x < arena.warden().x);
        assert!(!arena.raider().is_busy());
    }

    #[test]
    fn test_forward_moves_along_heading() {
        let mut arena = Arena::new();
        let x0 = arena.raider().x;
        arena.apply_raider_actions(&[RaiderAction::Forward]);
        assert!((arena.raider().x - (x0 + RAIDER_SPEED)).abs() < 1e-3);
        assert!((arena.raider().y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_turning_wraps_around() {
        let mut arena = Arena::new();
        for _ in 0..50 {
            arena.apply_raider_actions(&[RaiderAction::TurnRight]);
        }
        let angle = arena.raider().angle;
        assert!((0.0..360.0).contains(&angle));
    }

    #[test]
    fn test_positions_are_clamped_to_bounds() {
        let mut arena = Arena::with_states(
            AgentState::new(2.0, 300.0, 180.0, RAIDER_START_HEALTH),
            AgentState::new(600.0, 300.0, 180.0, WARDEN_START_HEALTH),
        );
        arena.apply_raider_actions(&[RaiderAction::Forward]);
        let outcome = arena.advance();
        assert!(outcome.is_continue());
        assert!(arena.raider().x >= 0.0);
    }

    #[test]
    fn test_busy_agent_ignores_new_commands() {
        let mut arena = Arena::new();
        arena.apply_raider_actions(&[RaiderAction::Strike]);
        assert!(arena.raider().is_busy());
        let x0 = arena.raider().x;
        arena.apply_raider_actions(&[RaiderAction::Forward, RaiderAction::Dodge]);
        assert!((arena.raider().x - x0).abs() < f32::EPSILON);
        assert_eq!(
            arena.raider().current_action,
            Some(RaiderAction::Strike.id())
        );
    }

    #[test]
    fn test_strike_lands_on_its_strike_frame() {
        let mut arena = Arena::with_states(
            AgentState::new(100.0, 300.0, 0.0, RAIDER_START_HEALTH),
            AgentState::new(150.0, 300.0, 180.0, WARDEN_START_HEALTH),
        );
        arena.apply_raider_actions(&[RaiderAction::Strike]);

        let duration = RaiderAction::Strike.duration();
        let strike_frame = duration - duration / 2;
        for tick in 1..=duration {
            arena.advance();
            let expected = if tick >= strike_frame {
                WARDEN_START_HEALTH - 12
            } else {
                WARDEN_START_HEALTH
            };
            assert_eq!(arena.warden().health, expected, "tick {tick}");
        }
        assert!(!arena.raider().is_busy());
    }

    #[test]
    fn test_strike_misses_out_of_range() {
        let mut arena = Arena::with_states(
            AgentState::new(100.0, 300.0, 0.0, RAIDER_START_HEALTH),
            AgentState::new(400.0, 300.0, 180.0, WARDEN_START_HEALTH),
        );
        arena.apply_raider_actions(&[RaiderAction::Strike]);
        for _ in 0..RaiderAction::Strike.duration() {
            arena.advance();
        }
        assert_eq!(arena.warden().health, WARDEN_START_HEALTH);
    }

    #[test]
    fn test_strike_misses_when_facing_away() {
        let mut arena = Arena::with_states(
            AgentState::new(100.0, 300.0, 180.0, RAIDER_START_HEALTH),
            AgentState::new(150.0, 300.0, 180.0, WARDEN_START_HEALTH),
        );
        arena.apply_raider_actions(&[RaiderAction::Strike]);
        for _ in 0..RaiderAction::Strike.duration() {
            arena.advance();
        }
        assert_eq!(arena.warden().health, WARDEN_START_HEALTH);
    }

    #[test]
    fn test_dodge_grants_immunity_while_active() {
        let mut arena = Arena::with_states(
            AgentState::new(100.0, 300.0, 0.0, RAIDER_START_HEALTH),
            AgentState::new(150.0, 300.0, 180.0, WARDEN_START_HEALTH),
        );
        arena.apply_raider_actions(&[RaiderAction::Dodge]);
        arena.apply_warden_actions(&[WardenAction::Slash]);
        for _ in 0..WardenAction::Slash.duration() / 2 {
            arena.advance();
        }
        assert_eq!(arena.raider().health, RAIDER_START_HEALTH);
    }

    #[test]
    fn test_slash_connects_against_idle_raider() {
        let mut arena = Arena::with_states(
            AgentState::new(100.0, 300.0, 0.0, RAIDER_START_HEALTH),
            AgentState::new(150.0, 300.0, 180.0, WARDEN_START_HEALTH),
        );
        arena.apply_warden_actions(&[WardenAction::Slash]);
        for _ in 0..WardenAction::Slash.duration() {
            arena.advance();
        }
        assert_eq!(arena.raider().health, RAIDER_START_HEALTH - 10);
    }

    #[test]
    fn test_defeat_is_reported_for_the_downed_side() {
        let mut arena = Arena::with_states(
            AgentState::new(100.0, 300.0, 0.0, RAIDER_START_HEALTH),
            AgentState::new(150.0, 300.0, 180.0, 5),
        );
        arena.apply_raider_actions(&[RaiderAction::Strike]);
        let mut outcome = TickOutcome::Continue;
        for _ in 0..RaiderAction::Strike.duration() {
            outcome = arena.advance();
            if !outcome.is_continue() {
                break;
            }
        }
        assert_eq!(outcome, TickOutcome::WardenDown);
        assert_eq!(arena.warden().health, 0);
    }

    #[test]
    fn test_simultaneous_defeat_resolves_to_raider_down() {
        // Both sides at zero health on the same tick: the Raider's check
        // runs first, so the Warden takes the win.
        let mut arena = Arena::with_states(
            AgentState::new(100.0, 300.0, 0.0, 0),
            AgentState::new(150.0, 300.0, 180.0, 0),
        );
        assert_eq!(arena.advance(), TickOutcome::RaiderDown);
    }
}
