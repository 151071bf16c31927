use std::{fs, io, path::PathBuf};

use anyhow::Context as _;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use skirmish_arena::{OBSERVATION_LEN, RaiderAction, Side, WardenAction};
use skirmish_archive::EpisodeStore;
use skirmish_evolve::{EvolutionEngine, Population, PopulationEvolver, StdOutReporter};
use skirmish_harness::{
    CheckpointManager, FITNESS_VERSION, GenerationEvaluator, MatchSettings, StandardFitness,
    Trainer, TrainingSettings, default_worker_count,
};

const MAX_GENERATIONS: u32 = 300;
const TRAINING_INTERVAL: u32 = 5;
const CHECKPOINT_INTERVAL: u32 = 5;

const POPULATION_COUNT: usize = 30;
const MAX_WEIGHT: f32 = 4.0;

const DEFAULT_GAMESTATES_ROOT: &str = "data/gamestates";
const DEFAULT_CHECKPOINTS_ROOT: &str = "data/checkpoints";

/// Unrecoverable training errors are mirrored here for postmortems before
/// the process exits.
const DEBUG_ARTIFACT: &str = "debug.txt";

const fn evolver() -> PopulationEvolver {
    PopulationEvolver {
        elite_count: 2,
        tournament_size: 2,
        mutation_sigma: 0.3,
        blx_alpha: 0.3,
        mutation_rate: 0.2,
        max_weight: MAX_WEIGHT,
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Ignore existing checkpoints and start a fresh run
    #[arg(short, long)]
    reset: bool,
    /// Evaluate episodes on a worker pool instead of serially
    #[arg(long)]
    parallel: bool,
    /// Worker threads for parallel evaluation (implies --parallel);
    /// defaults to the available cores minus one
    #[arg(long)]
    jobs: Option<usize>,
    /// Keep previously archived gamestates instead of clearing them
    #[arg(long)]
    keep_archive: bool,
    /// Skip the startup cleanup entirely
    #[arg(long)]
    no_clean: bool,
    /// Seed for deterministic population initialization
    #[arg(long)]
    seed: Option<u64>,
    /// Total generations to train each side
    #[arg(long, default_value_t = MAX_GENERATIONS)]
    generations: u32,
    /// Directory episode records are archived under
    #[arg(long, default_value = DEFAULT_GAMESTATES_ROOT)]
    gamestates_root: PathBuf,
    /// Directory checkpoint runs are stored under
    #[arg(long, default_value = DEFAULT_CHECKPOINTS_ROOT)]
    checkpoints_root: PathBuf,
}

impl Default for TrainArg {
    fn default() -> Self {
        Self {
            reset: false,
            parallel: false,
            jobs: None,
            keep_archive: false,
            no_clean: false,
            seed: None,
            generations: MAX_GENERATIONS,
            gamestates_root: DEFAULT_GAMESTATES_ROOT.into(),
            checkpoints_root: DEFAULT_CHECKPOINTS_ROOT.into(),
        }
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let store = EpisodeStore::new(&arg.gamestates_root);

    if !arg.no_clean && !arg.keep_archive {
        eprintln!("Cleaning up previous gamestates");
        store
            .clear()
            .context("failed to clear the episode archive")?;
        // A stale debug artifact would mask this run's failures.
        if let Err(e) = fs::remove_file(DEBUG_ARTIFACT) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(e).context("failed to remove the previous debug artifact");
            }
        }
    }

    let manager = CheckpointManager::open(
        &arg.checkpoints_root,
        FITNESS_VERSION,
        true,
        arg.reset,
        CHECKPOINT_INTERVAL,
        arg.generations,
    )?;

    let mut rng = match arg.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };

    let raider_engine = build_engine(
        &manager,
        Side::Raider,
        RaiderAction::OUTPUT_ORDER.len(),
        arg.reset,
        &mut rng,
    )?;
    let warden_engine = build_engine(
        &manager,
        Side::Warden,
        WardenAction::OUTPUT_ORDER.len(),
        arg.reset,
        &mut rng,
    )?;

    let workers = if arg.parallel || arg.jobs.is_some() {
        arg.jobs.unwrap_or_else(default_worker_count)
    } else {
        0
    };
    if workers > 0 {
        eprintln!("Evaluating generations on {workers} worker threads");
    }

    let fitness = StandardFitness;
    let evaluator =
        GenerationEvaluator::new(&fitness, MatchSettings::default()).with_store(&store);
    let mut trainer = Trainer::new(
        raider_engine,
        warden_engine,
        evaluator,
        Some(&manager),
        TrainingSettings {
            max_generations: arg.generations,
            training_interval: TRAINING_INTERVAL,
            workers,
        },
    );

    if let Err(e) = trainer.run(&mut rng) {
        // Capture the failure for postmortem, then halt; training never
        // continues on partial state.
        let _ = fs::write(DEBUG_ARTIFACT, format!("{e}\n"));
        return Err(anyhow::Error::new(e).context("training halted"));
    }

    eprintln!(
        "Training complete: {} generations per side in run {}",
        trainer.raider_engine().completed_generations(),
        manager.run_number(),
    );
    Ok(())
}

fn build_engine(
    manager: &CheckpointManager,
    side: Side,
    output_len: usize,
    reset: bool,
    rng: &mut Pcg32,
) -> anyhow::Result<EvolutionEngine> {
    let restored = if reset {
        None
    } else {
        manager.restore_side(side)?
    };

    let mut engine = match restored {
        Some(envelope) => {
            eprintln!(
                "Resuming {} after generation {}",
                side.label(),
                envelope.generation
            );
            EvolutionEngine::from_state(envelope.state, evolver())?
        }
        None => {
            eprintln!(
                "No checkpoint for {}; starting fresh. If this was expected, disregard.",
                side.label()
            );
            let population =
                Population::random(OBSERVATION_LEN, output_len, POPULATION_COUNT, MAX_WEIGHT, rng);
            EvolutionEngine::new(population, evolver())
        }
    };
    engine.add_reporter(Box::new(StdOutReporter::new(side.label())));
    Ok(engine)
}
