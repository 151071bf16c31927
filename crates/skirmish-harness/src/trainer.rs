use rand::Rng;
use skirmish_arena::Side;
use skirmish_evolve::EvolutionEngine;

use crate::{
    checkpoint::{CheckpointError, CheckpointManager},
    generation::{EvaluationError, GenerationEvaluator},
};

/// Errors that halt a training run.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TrainingError {
    #[display("{_0}")]
    Evaluation(EvaluationError),
    #[display("{_0}")]
    Checkpoint(CheckpointError),
}

impl From<EvaluationError> for TrainingError {
    fn from(source: EvaluationError) -> Self {
        TrainingError::Evaluation(source)
    }
}

impl From<CheckpointError> for TrainingError {
    fn from(source: CheckpointError) -> Self {
        TrainingError::Checkpoint(source)
    }
}

/// Schedule parameters for a co-training run.
#[derive(Debug, Clone)]
pub struct TrainingSettings {
    /// Total generations to train each side.
    pub max_generations: u32,
    /// Generations one side trains before handing over to the other.
    pub training_interval: u32,
    /// Worker threads for parallel evaluation; 0 evaluates serially.
    pub workers: usize,
}

/// Alternates the two sides' engines through the co-training schedule.
///
/// Each phase trains one side for `training_interval` generations while the
/// opponent population stays frozen; the opponent's genomes still receive
/// fitness (the pairing produces both numbers), it just does not evolve on
/// them. Checkpoints are written strictly before the next generation
/// begins, so an interrupted process resumes exactly at a generation
/// boundary.
pub struct Trainer<'a> {
    raider_engine: EvolutionEngine,
    warden_engine: EvolutionEngine,
    evaluator: GenerationEvaluator<'a>,
    checkpoints: Option<&'a CheckpointManager>,
    settings: TrainingSettings,
}

impl<'a> Trainer<'a> {
    #[must_use]
    pub fn new(
        raider_engine: EvolutionEngine,
        warden_engine: EvolutionEngine,
        evaluator: GenerationEvaluator<'a>,
        checkpoints: Option<&'a CheckpointManager>,
        settings: TrainingSettings,
    ) -> Self {
        Self {
            raider_engine,
            warden_engine,
            evaluator,
            checkpoints,
            settings,
        }
    }

    #[must_use]
    pub fn raider_engine(&self) -> &EvolutionEngine {
        &self.raider_engine
    }

    #[must_use]
    pub fn warden_engine(&self) -> &EvolutionEngine {
        &self.warden_engine
    }

    /// Runs the schedule to completion.
    ///
    /// If a restored Warden engine lags the Raider engine (the process was
    /// stopped mid-cycle, during the Warden's phase), the Warden trains
    /// alone first until the sides are level again.
    pub fn run<R>(&mut self, rng: &mut R) -> Result<(), TrainingError>
    where
        R: Rng + ?Sized,
    {
        while self.warden_engine.completed_generations()
            < self.raider_engine.completed_generations()
        {
            self.train_one(Side::Warden, rng)?;
        }

        while self.raider_engine.completed_generations() < self.settings.max_generations {
            let remaining =
                self.settings.max_generations - self.raider_engine.completed_generations();
            let span = self.settings.training_interval.clamp(1, remaining);
            for _ in 0..span {
                self.train_one(Side::Raider, rng)?;
            }
            for _ in 0..span {
                self.train_one(Side::Warden, rng)?;
            }
        }
        Ok(())
    }

    fn train_one<R>(&mut self, side: Side, rng: &mut R) -> Result<(), TrainingError>
    where
        R: Rng + ?Sized,
    {
        let generation = match side {
            Side::Raider => self.raider_engine.completed_generations() + 1,
            Side::Warden => self.warden_engine.completed_generations() + 1,
        };
        eprintln!("Training {} generation {generation}", side.label());

        let raiders = self.raider_engine.population_mut();
        let wardens = self.warden_engine.population_mut();
        if self.settings.workers == 0 {
            self.evaluator
                .evaluate_serial(side, generation, raiders, wardens)?;
        } else {
            self.evaluator.evaluate_parallel(
                side,
                generation,
                raiders,
                wardens,
                self.settings.workers,
            )?;
        }

        let engine = match side {
            Side::Raider => &mut self.raider_engine,
            Side::Warden => &mut self.warden_engine,
        };
        engine.complete_generation(rng);

        if let Some(checkpoints) = self.checkpoints {
            checkpoints.maybe_save(side, engine.completed_generations(), &engine.snapshot())?;
        }
        Ok(())
    }
}
