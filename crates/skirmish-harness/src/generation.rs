use std::{
    collections::{HashMap, VecDeque},
    panic::{self, AssertUnwindSafe},
    sync::{Mutex, mpsc},
    thread,
};

use skirmish_arena::Side;
use skirmish_archive::{ArchiveError, EpisodeStore};
use skirmish_evolve::{FeedForwardPolicy, GenomeKey, Population};

use crate::{
    context::EvalContext,
    episode::{MatchSettings, run_episode},
    fitness::FitnessEvaluator,
    render::Headless,
};

/// Fitness assigned to a pair whose evaluation crashed. Deliberately far
/// below anything the scoring formula produces, so broken episodes cannot
/// look attractive to selection, and never left unset.
pub const SENTINEL_FITNESS: f32 = -10_000.0;

/// Errors that abort a generation evaluation.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EvaluationError {
    #[display("{_0}")]
    Archive(ArchiveError),
    #[display(
        "evaluation produced a result for unknown {side} genome {key}; task construction is broken"
    )]
    UnknownGenome { side: Side, key: GenomeKey },
}

impl From<ArchiveError> for EvaluationError {
    fn from(source: ArchiveError) -> Self {
        EvaluationError::Archive(source)
    }
}

/// Default worker-pool size: one less than the available parallel execution
/// units, reserving capacity for the coordinating thread.
#[must_use]
pub fn default_worker_count() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get().saturating_sub(1).max(1))
}

/// Maps a population pairing to fitness for one generation.
///
/// Genome `i` of the Raider population always fights genome `i` of the
/// Warden population; the pairing is purely positional. Both sides' fitness
/// is zeroed before evaluation so an evaluator that never writes a value
/// cannot leave one undefined.
#[derive(Debug)]
pub struct GenerationEvaluator<'a> {
    fitness: &'a (dyn FitnessEvaluator),
    settings: MatchSettings,
    store: Option<&'a EpisodeStore>,
}

impl<'a> GenerationEvaluator<'a> {
    #[must_use]
    pub fn new(fitness: &'a dyn FitnessEvaluator, settings: MatchSettings) -> Self {
        Self {
            fitness,
            settings,
            store: None,
        }
    }

    /// Archives every episode this evaluator runs.
    #[must_use]
    pub fn with_store(mut self, store: &'a EpisodeStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Evaluates all pairs on the calling thread, in population order.
    pub fn evaluate_serial(
        &self,
        trainer: Side,
        generation: u32,
        raiders: &mut Population,
        wardens: &mut Population,
    ) -> Result<(), EvaluationError> {
        zero_fitness(raiders, wardens);
        let pairs = raiders.len().min(wardens.len());

        for index in 0..pairs {
            let ctx = eval_context(trainer, generation, index);
            let raider_policy = raiders.policy_for(&raiders.genomes()[index]);
            let warden_policy = wardens.policy_for(&wardens.genomes()[index]);

            let record = run_episode(
                &raider_policy,
                &warden_policy,
                ctx,
                &self.settings,
                self.fitness,
                &mut Headless,
                self.store,
            )?;

            raiders.genomes_mut()[index].set_fitness(record.raider_fitness);
            wardens.genomes_mut()[index].set_fitness(record.warden_fitness);
        }
        Ok(())
    }

    /// Evaluates all pairs on a fixed-size worker pool.
    ///
    /// Each task carries both policies by value plus enough metadata to run
    /// headlessly and archive; workers share nothing mutable. Results come
    /// back in completion order, which need not match submission order, so
    /// fitness is reassigned strictly by genome key. A key that does not
    /// map back to a genome aborts the generation: it means task
    /// construction is broken, and dropping it silently would corrupt
    /// training. A crashed task is absorbed into [`SENTINEL_FITNESS`] and a
    /// warning instead of aborting the generation.
    pub fn evaluate_parallel(
        &self,
        trainer: Side,
        generation: u32,
        raiders: &mut Population,
        wardens: &mut Population,
        workers: usize,
    ) -> Result<(), EvaluationError> {
        zero_fitness(raiders, wardens);
        let pairs = raiders.len().min(wardens.len());
        let workers = workers.max(1);

        let tasks: Mutex<VecDeque<EvalTask>> = Mutex::new(
            (0..pairs)
                .map(|index| {
                    let raider = &raiders.genomes()[index];
                    let warden = &wardens.genomes()[index];
                    EvalTask {
                        raider_key: raider.key(),
                        warden_key: warden.key(),
                        raider_policy: raiders.policy_for(raider),
                        warden_policy: wardens.policy_for(warden),
                        ctx: eval_context(trainer, generation, index),
                    }
                })
                .collect(),
        );

        let raider_slots: HashMap<GenomeKey, usize> = genome_slots(raiders);
        let warden_slots: HashMap<GenomeKey, usize> = genome_slots(wardens);

        let (tx, rx) = mpsc::channel::<EvalOutcome>();
        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let tasks = &tasks;
                scope.spawn(move || {
                    loop {
                        let task = tasks.lock().expect("task queue poisoned").pop_front();
                        let Some(task) = task else { break };
                        let outcome = self.run_task(task);
                        if tx.send(outcome).is_err() {
                            // Collection aborted; drain nothing further.
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for outcome in rx {
                let raider_slot = *raider_slots.get(&outcome.raider_key).ok_or(
                    EvaluationError::UnknownGenome {
                        side: Side::Raider,
                        key: outcome.raider_key,
                    },
                )?;
                let warden_slot = *warden_slots.get(&outcome.warden_key).ok_or(
                    EvaluationError::UnknownGenome {
                        side: Side::Warden,
                        key: outcome.warden_key,
                    },
                )?;
                raiders.genomes_mut()[raider_slot].set_fitness(outcome.raider_fitness);
                wardens.genomes_mut()[warden_slot].set_fitness(outcome.warden_fitness);
            }
            Ok(())
        })
    }

    fn run_task(&self, task: EvalTask) -> EvalOutcome {
        let EvalTask {
            raider_key,
            warden_key,
            raider_policy,
            warden_policy,
            ctx,
        } = task;

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            run_episode(
                &raider_policy,
                &warden_policy,
                ctx,
                &self.settings,
                self.fitness,
                &mut Headless,
                self.store,
            )
        }));

        match result {
            Ok(Ok(record)) => EvalOutcome {
                raider_key,
                warden_key,
                raider_fitness: record.raider_fitness,
                warden_fitness: record.warden_fitness,
            },
            Ok(Err(e)) => {
                eprintln!(
                    "Warning: episode {} of generation {} failed ({e}); assigning sentinel fitness",
                    ctx.population, ctx.generation
                );
                EvalOutcome::sentinel(raider_key, warden_key)
            }
            Err(_) => {
                eprintln!(
                    "Warning: episode {} of generation {} panicked; assigning sentinel fitness",
                    ctx.population, ctx.generation
                );
                EvalOutcome::sentinel(raider_key, warden_key)
            }
        }
    }
}

struct EvalTask {
    raider_key: GenomeKey,
    warden_key: GenomeKey,
    raider_policy: FeedForwardPolicy,
    warden_policy: FeedForwardPolicy,
    ctx: EvalContext,
}

struct EvalOutcome {
    raider_key: GenomeKey,
    warden_key: GenomeKey,
    raider_fitness: f32,
    warden_fitness: f32,
}

impl EvalOutcome {
    fn sentinel(raider_key: GenomeKey, warden_key: GenomeKey) -> Self {
        Self {
            raider_key,
            warden_key,
            raider_fitness: SENTINEL_FITNESS,
            warden_fitness: SENTINEL_FITNESS,
        }
    }
}

fn zero_fitness(raiders: &mut Population, wardens: &mut Population) {
    for genome in raiders.genomes_mut() {
        genome.set_fitness(0.0);
    }
    for genome in wardens.genomes_mut() {
        genome.set_fitness(0.0);
    }
}

#[expect(clippy::cast_possible_truncation)]
fn eval_context(trainer: Side, generation: u32, index: usize) -> EvalContext {
    EvalContext {
        trainer,
        generation,
        population: index as u32 + 1,
    }
}

fn genome_slots(population: &Population) -> HashMap<GenomeKey, usize> {
    population
        .genomes()
        .iter()
        .enumerate()
        .map(|(slot, genome)| (genome.key(), slot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::StandardFitness;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use skirmish_arena::{OBSERVATION_LEN, RaiderAction, WardenAction};

    fn populations(seed: u64, count: usize) -> (Population, Population) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let raiders = Population::random(
            OBSERVATION_LEN,
            RaiderAction::OUTPUT_ORDER.len(),
            count,
            4.0,
            &mut rng,
        );
        let wardens = Population::random(
            OBSERVATION_LEN,
            WardenAction::OUTPUT_ORDER.len(),
            count,
            4.0,
            &mut rng,
        );
        (raiders, wardens)
    }

    fn evaluator(fitness: &StandardFitness) -> GenerationEvaluator<'_> {
        GenerationEvaluator::new(fitness, MatchSettings { max_ticks: 30 })
    }

    #[test]
    fn test_serial_assigns_fitness_to_every_pair() {
        let (mut raiders, mut wardens) = populations(67, 4);
        let fitness = StandardFitness;
        evaluator(&fitness)
            .evaluate_serial(Side::Raider, 1, &mut raiders, &mut wardens)
            .unwrap();

        for genome in raiders.genomes().iter().chain(wardens.genomes()) {
            assert!(genome.fitness() > f32::MIN, "fitness must be written");
        }
    }

    #[test]
    fn test_parallel_matches_serial_exactly() {
        let (mut serial_raiders, mut serial_wardens) = populations(71, 6);
        let (mut parallel_raiders, mut parallel_wardens) = populations(71, 6);
        let fitness = StandardFitness;

        evaluator(&fitness)
            .evaluate_serial(Side::Raider, 2, &mut serial_raiders, &mut serial_wardens)
            .unwrap();
        evaluator(&fitness)
            .evaluate_parallel(
                Side::Raider,
                2,
                &mut parallel_raiders,
                &mut parallel_wardens,
                3,
            )
            .unwrap();

        for (a, b) in serial_raiders
            .genomes()
            .iter()
            .zip(parallel_raiders.genomes())
        {
            assert_eq!(a.key(), b.key());
            assert!(
                (a.fitness() - b.fitness()).abs() < f32::EPSILON,
                "genome {} fitness diverged",
                a.key()
            );
        }
        for (a, b) in serial_wardens
            .genomes()
            .iter()
            .zip(parallel_wardens.genomes())
        {
            assert!((a.fitness() - b.fitness()).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_uneven_populations_pair_positionally() {
        let (mut raiders, _) = populations(73, 5);
        let (_, mut wardens) = populations(73, 3);
        let fitness = StandardFitness;
        evaluator(&fitness)
            .evaluate_serial(Side::Warden, 1, &mut raiders, &mut wardens)
            .unwrap();

        // Unpaired raiders keep the defensive zero, not an unset value.
        for genome in raiders.genomes().iter().skip(3) {
            assert!(genome.fitness().abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_failed_episode_gets_sentinel_fitness_not_an_abort() {
        let blocked_root = std::env::temp_dir().join(format!(
            "skirmish-generation-{}-blocked",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&blocked_root);
        // A plain file where the archive root should be makes every write
        // fail, standing in for a crashing worker.
        std::fs::write(&blocked_root, b"not a directory").unwrap();
        let store = EpisodeStore::new(&blocked_root);

        let (mut raiders, mut wardens) = populations(79, 2);
        let fitness = StandardFitness;
        GenerationEvaluator::new(&fitness, MatchSettings { max_ticks: 10 })
            .with_store(&store)
            .evaluate_parallel(Side::Raider, 1, &mut raiders, &mut wardens, 2)
            .unwrap();

        for genome in raiders.genomes().iter().chain(wardens.genomes()) {
            assert!((genome.fitness() - SENTINEL_FITNESS).abs() < f32::EPSILON);
        }
        let _ = std::fs::remove_file(&blocked_root);
    }

    #[test]
    fn test_unknown_key_is_a_hard_failure() {
        let (raiders, _) = populations(83, 2);
        let slots = genome_slots(&raiders);
        assert!(!slots.contains_key(&9_999));
        // The evaluator surfaces a missing key as UnknownGenome; exercised
        // here at the mapping level since well-formed populations cannot
        // produce one through the public API.
        let missing: Result<usize, EvaluationError> =
            slots
                .get(&9_999)
                .copied()
                .ok_or(EvaluationError::UnknownGenome {
                    side: Side::Raider,
                    key: 9_999,
                });
        assert!(matches!(
            missing,
            Err(EvaluationError::UnknownGenome {
                side: Side::Raider,
                key: 9_999,
            })
        ));
    }
}
