use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    evolver::PopulationEvolver,
    policy::FeedForwardPolicy,
    population::{GenomeKey, Population},
    reporter::GenerationReporter,
};

/// Serializable snapshot of an engine, taken between generations.
///
/// `completed_generations` is the 1-indexed count of generations whose
/// evaluation and evolution have fully finished; the population inside the
/// snapshot is the one the next generation would evaluate. Restoring a
/// snapshot therefore resumes training with generation
/// `completed_generations + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    pub completed_generations: u32,
    pub population: Population,
}

/// A restored snapshot whose genomes do not fit the declared topology.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display(
    "engine state is corrupt: genome {key} carries {got} weights, expected {expected}"
)]
pub struct EngineStateError {
    pub key: GenomeKey,
    pub got: usize,
    pub expected: usize,
}

/// Drives one side's population through generations.
///
/// The engine owns the population, the evolution parameters, the 1-indexed
/// completed-generation counter, and the per-generation reporter hooks. It
/// does not know how fitness is produced; the harness assigns fitness onto
/// the population and then calls [`complete_generation`](Self::complete_generation).
pub struct EvolutionEngine {
    population: Population,
    evolver: PopulationEvolver,
    completed_generations: u32,
    reporters: Vec<Box<dyn GenerationReporter>>,
}

impl std::fmt::Debug for EvolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionEngine")
            .field("population", &self.population)
            .field("evolver", &self.evolver)
            .field("completed_generations", &self.completed_generations)
            .field("reporters", &self.reporters.len())
            .finish()
    }
}

impl EvolutionEngine {
    /// Creates a fresh engine around an initial population.
    #[must_use]
    pub fn new(population: Population, evolver: PopulationEvolver) -> Self {
        Self {
            population,
            evolver,
            completed_generations: 0,
            reporters: Vec::new(),
        }
    }

    /// Rebuilds an engine from a checkpointed snapshot.
    pub fn from_state(
        state: EngineState,
        evolver: PopulationEvolver,
    ) -> Result<Self, EngineStateError> {
        let expected = FeedForwardPolicy::weight_len(
            state.population.input_len(),
            state.population.output_len(),
        );
        for genome in state.population.genomes() {
            if genome.weights().len() != expected {
                return Err(EngineStateError {
                    key: genome.key(),
                    got: genome.weights().len(),
                    expected,
                });
            }
        }
        Ok(Self {
            population: state.population,
            evolver,
            completed_generations: state.completed_generations,
            reporters: Vec::new(),
        })
    }

    /// Captures the engine state for checkpointing.
    #[must_use]
    pub fn snapshot(&self) -> EngineState {
        EngineState {
            completed_generations: self.completed_generations,
            population: self.population.clone(),
        }
    }

    pub fn add_reporter(&mut self, reporter: Box<dyn GenerationReporter>) {
        self.reporters.push(reporter);
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    /// Count of fully completed generations (1-indexed; 0 before any).
    #[must_use]
    pub fn completed_generations(&self) -> u32 {
        self.completed_generations
    }

    /// Finishes the current generation after fitness has been assigned:
    /// sorts the population, notifies reporters, and evolves the next one.
    pub fn complete_generation<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.population.sort_by_fitness_desc();
        self.completed_generations += 1;
        for reporter in &mut self.reporters {
            reporter.generation_complete(self.completed_generations, &self.population);
        }
        self.population = self.evolver.evolve(&self.population, rng);
    }
}
