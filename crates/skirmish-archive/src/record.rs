use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skirmish_arena::{AgentState, RaiderAction, Side, WardenAction};

/// Terminal result of one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Raider,
    Warden,
    Draw,
}

impl Winner {
    #[must_use]
    pub const fn from_side(side: Side) -> Self {
        match side {
            Side::Raider => Winner::Raider,
            Side::Warden => Winner::Warden,
        }
    }
}

/// Scalar fitness plus its named components, as returned by a fitness
/// evaluator for one side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessReport {
    pub score: f32,
    pub breakdown: BTreeMap<String, f32>,
}

/// One side's slice of a tick: the state snapshot taken at the top of the
/// tick and the action set that was resolved from the policy output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideTick<A> {
    pub state: AgentState,
    pub actions: Vec<A>,
}

/// One simulation tick. Appended in temporal order; the ordering is
/// load-bearing for replay and for terminal-state resynchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u32,
    pub raider: SideTick<RaiderAction>,
    pub warden: SideTick<WardenAction>,
}

/// A completed episode, fully populated by the time it reaches the archive
/// and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub winner: Winner,
    pub raider_fitness: f32,
    pub warden_fitness: f32,
    pub raider_fitness_breakdown: BTreeMap<String, f32>,
    pub warden_fitness_breakdown: BTreeMap<String, f32>,
    pub game_version: String,
    pub fitness_version: String,
    /// Which side's population was being optimized when this episode ran.
    pub trainer: Side,
    /// 1-indexed generation this episode belongs to.
    pub generation: u32,
    /// 1-indexed position of the policy pair within its generation.
    pub population: u32,
    pub recorded_at: DateTime<Utc>,
    pub notes: String,
    pub ticks: Vec<TickRecord>,
}

impl EpisodeRecord {
    /// Creates a record with default outcome fields, to be filled in as the
    /// episode completes. The winner starts as a draw so an episode that
    /// ends at the tick budget needs no correction.
    #[must_use]
    pub fn begin(
        trainer: Side,
        generation: u32,
        population: u32,
        game_version: &str,
        fitness_version: &str,
    ) -> Self {
        Self {
            winner: Winner::Draw,
            raider_fitness: 0.0,
            warden_fitness: 0.0,
            raider_fitness_breakdown: BTreeMap::new(),
            warden_fitness_breakdown: BTreeMap::new(),
            game_version: game_version.to_owned(),
            fitness_version: fitness_version.to_owned(),
            trainer,
            generation,
            population,
            recorded_at: Utc::now(),
            notes: String::new(),
            ticks: Vec::new(),
        }
    }

    #[must_use]
    pub fn fitness_for(&self, side: Side) -> f32 {
        match side {
            Side::Raider => self.raider_fitness,
            Side::Warden => self.warden_fitness,
        }
    }

    pub fn set_fitness(&mut self, side: Side, report: FitnessReport) {
        match side {
            Side::Raider => {
                self.raider_fitness = report.score;
                self.raider_fitness_breakdown = report.breakdown;
            }
            Side::Warden => {
                self.warden_fitness = report.score;
                self.warden_fitness_breakdown = report.breakdown;
            }
        }
    }
}
