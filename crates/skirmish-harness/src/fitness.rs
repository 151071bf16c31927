use std::collections::BTreeMap;

use skirmish_arena::{
    ARENA_HEIGHT, ARENA_WIDTH, AgentState, RAIDER_START_HEALTH, Side, WARDEN_START_HEALTH,
};
use skirmish_archive::{EpisodeRecord, FitnessReport, Winner};

/// Version tag of the fitness formula.
///
/// Checkpoint runs are scoped to this value: changing the formula starts a
/// fresh run-directory family, and archived records embed it so replays can
/// tell which formula scored them.
pub const FITNESS_VERSION: &str = "v2";

/// Scores a completed episode for one side.
///
/// Evaluators consume the full record (every tick plus the terminal
/// outcome) and return a scalar with its named components. They run exactly
/// once per side per episode, on every completion path.
pub trait FitnessEvaluator: std::fmt::Debug + Send + Sync {
    fn evaluate(&self, record: &EpisodeRecord, side: Side) -> FitnessReport;
}

/// The standard scoring formula.
///
/// Both sides are rewarded for damage dealt and penalized for damage taken,
/// with a flat bonus for winning. The Raider is additionally pushed toward
/// the Warden (mean-distance pressure keeps early random populations from
/// circling the walls); the Warden is rewarded for staying alive.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFitness;

const WIN_BONUS: f32 = 1000.0;
const DAMAGE_DEALT_WEIGHT: f32 = 4.0;
const DAMAGE_TAKEN_WEIGHT: f32 = 2.0;
const SURVIVAL_PER_TICK: f32 = 0.2;
const PROXIMITY_SCALE: f32 = 100.0;

impl FitnessEvaluator for StandardFitness {
    #[expect(clippy::cast_precision_loss)]
    fn evaluate(&self, record: &EpisodeRecord, side: Side) -> FitnessReport {
        let (own_start, opp_start) = match side {
            Side::Raider => (RAIDER_START_HEALTH, WARDEN_START_HEALTH),
            Side::Warden => (WARDEN_START_HEALTH, RAIDER_START_HEALTH),
        };
        let (own_final, opp_final) = record.ticks.last().map_or(
            (own_start, opp_start),
            |tick| match side {
                Side::Raider => (tick.raider.state.health, tick.warden.state.health),
                Side::Warden => (tick.warden.state.health, tick.raider.state.health),
            },
        );

        let damage_dealt = (opp_start - opp_final).max(0) as f32;
        let damage_taken = (own_start - own_final).max(0) as f32;
        let win_bonus = if record.winner == Winner::from_side(side) {
            WIN_BONUS
        } else {
            0.0
        };

        let mut breakdown = BTreeMap::new();
        breakdown.insert("damage_dealt".to_owned(), damage_dealt * DAMAGE_DEALT_WEIGHT);
        breakdown.insert("damage_taken".to_owned(), -damage_taken * DAMAGE_TAKEN_WEIGHT);
        breakdown.insert("win_bonus".to_owned(), win_bonus);

        match side {
            Side::Raider => {
                breakdown.insert("proximity".to_owned(), proximity_pressure(record));
            }
            Side::Warden => {
                breakdown.insert(
                    "survival".to_owned(),
                    record.ticks.len() as f32 * SURVIVAL_PER_TICK,
                );
            }
        }

        FitnessReport {
            score: breakdown.values().sum(),
            breakdown,
        }
    }
}

/// Rewards the Raider for closing distance, scaled so a full episode spent
/// adjacent to the Warden is worth [`PROXIMITY_SCALE`].
#[expect(clippy::cast_precision_loss)]
fn proximity_pressure(record: &EpisodeRecord) -> f32 {
    if record.ticks.is_empty() {
        return 0.0;
    }
    let max_distance = ARENA_WIDTH.hypot(ARENA_HEIGHT);
    let mean_distance = record
        .ticks
        .iter()
        .map(|tick| distance(&tick.raider.state, &tick.warden.state))
        .sum::<f32>()
        / record.ticks.len() as f32;
    ((max_distance - mean_distance) / max_distance).max(0.0) * PROXIMITY_SCALE
}

fn distance(a: &AgentState, b: &AgentState) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}
