use std::path::PathBuf;

use skirmish_arena::Side;
use skirmish_archive::{EpisodeStore, GenerationQuery, select_best};

use crate::presenter;

const DEFAULT_NUM_BEST: usize = 3;
const DEFAULT_GAMESTATES_ROOT: &str = "data/gamestates";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Play back one specific episode file
    #[arg(short = 'p', long)]
    file: Option<PathBuf>,
    /// How many of each generation's best episodes to play (0 = all)
    #[arg(short, long)]
    best: Option<usize>,
    /// Which generations to process: no values = all, one = the last N,
    /// two = an inclusive range, more = exactly those generations
    #[arg(short, long, num_args = 0.., value_name = "GEN")]
    generations: Option<Vec<u32>>,
    /// Restrict playback to one trainer; both when omitted
    #[arg(short, long)]
    trainer: Option<Side>,
    /// Directory episode records are archived under
    #[arg(long, default_value = DEFAULT_GAMESTATES_ROOT)]
    gamestates_root: PathBuf,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    if let Some(file) = &arg.file {
        eprintln!("Replaying {}", file.display());
        let record = EpisodeStore::read(file)?;
        presenter::present_record(&record, None);
        return Ok(());
    }

    let store = EpisodeStore::new(&arg.gamestates_root);
    let available = store.generations()?;
    let selected = GenerationQuery::from_args(arg.generations.as_deref()).resolve(&available)?;

    let trainers = match arg.trainer {
        Some(side) => vec![side],
        None => vec![Side::Raider, Side::Warden],
    };
    let num_best = arg.best.unwrap_or(DEFAULT_NUM_BEST);

    for trainer in trainers {
        // Walk newest generations first; the most recent policies are the
        // interesting ones.
        for &generation in selected.iter().rev() {
            let selection = select_best(&store, generation, trainer, num_best)?;
            eprintln!(
                "Generation {generation}, trainer {}: {} episodes, mean {:.1}, best {:.1}",
                trainer.label(),
                selection.episodes.len(),
                selection.mean_fitness,
                selection.best_fitness,
            );
            for episode in &selection.episodes {
                presenter::present_record(
                    &episode.record,
                    Some((selection.mean_fitness, selection.best_fitness)),
                );
            }
        }
    }
    Ok(())
}
