use std::path::PathBuf;

use skirmish_arena::Side;

use crate::{
    record::EpisodeRecord,
    store::{ArchiveError, EpisodeStore},
};

/// Errors raised while resolving and ranking replay requests.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SelectError {
    #[display("the archive contains no generations")]
    NoGenerations,
    #[display(
        "requested generations {requested:?} have no overlap with those on disk {available:?}"
    )]
    NoMatchingGenerations {
        requested: Vec<u32>,
        available: Vec<u32>,
    },
    #[display("no episodes archived for generation {generation} and trainer {trainer}")]
    EmptyGeneration { generation: u32, trainer: Side },
    #[display("{_0}")]
    Archive(ArchiveError),
}

impl From<ArchiveError> for SelectError {
    fn from(source: ArchiveError) -> Self {
        SelectError::Archive(source)
    }
}

/// Which generations a replay request refers to.
///
/// The CLI's `--generations` argument takes any number of values: none
/// selects every generation on disk, one selects the most recent N, two an
/// inclusive range, and three or more an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationQuery {
    All,
    LastN(usize),
    Range(u32, u32),
    Explicit(Vec<u32>),
}

impl GenerationQuery {
    /// Interprets the raw argument values. `None` (argument absent) and an
    /// empty list both mean "all generations".
    #[must_use]
    pub fn from_args(values: Option<&[u32]>) -> Self {
        match values {
            None | Some([]) => GenerationQuery::All,
            Some([n]) => GenerationQuery::LastN(*n as usize),
            Some([lo, hi]) => GenerationQuery::Range(*lo, *hi),
            Some(list) => GenerationQuery::Explicit(list.to_vec()),
        }
    }

    /// Resolves the query against the sorted generations actually on disk.
    ///
    /// Range and explicit queries are intersected with what exists; an
    /// empty intersection is an explicit failure so a typo cannot silently
    /// select nothing.
    pub fn resolve(&self, available: &[u32]) -> Result<Vec<u32>, SelectError> {
        if available.is_empty() {
            return Err(SelectError::NoGenerations);
        }
        match self {
            GenerationQuery::All => Ok(available.to_vec()),
            GenerationQuery::LastN(n) => {
                let start = available.len().saturating_sub(*n);
                Ok(available[start..].to_vec())
            }
            GenerationQuery::Range(lo, hi) => {
                let requested: Vec<u32> = (*lo..=*hi).collect();
                intersect(&requested, available)
            }
            GenerationQuery::Explicit(list) => intersect(list, available),
        }
    }
}

fn intersect(requested: &[u32], available: &[u32]) -> Result<Vec<u32>, SelectError> {
    let mut matched: Vec<u32> = requested
        .iter()
        .copied()
        .filter(|g| available.contains(g))
        .collect();
    matched.sort_unstable();
    matched.dedup();
    if matched.is_empty() {
        return Err(SelectError::NoMatchingGenerations {
            requested: requested.to_vec(),
            available: available.to_vec(),
        });
    }
    Ok(matched)
}

/// One archived episode with its load path, ranked by trainer fitness.
#[derive(Debug)]
pub struct RankedEpisode {
    pub path: PathBuf,
    pub record: EpisodeRecord,
}

/// The ranked slice of one generation for one trainer.
#[derive(Debug)]
pub struct GenerationSelection {
    pub generation: u32,
    pub trainer: Side,
    /// Mean fitness across every matching episode, for display context.
    pub mean_fitness: f32,
    /// Fitness of the generation's best episode.
    pub best_fitness: f32,
    /// Episodes sorted by fitness descending, truncated to the requested
    /// count.
    pub episodes: Vec<RankedEpisode>,
}

/// Loads a generation's episodes for one trainer and returns the top
/// `num_best` by that trainer's fitness, best first. `num_best = 0` yields
/// the whole generation. Fails explicitly when nothing matches.
#[expect(clippy::cast_precision_loss)]
pub fn select_best(
    store: &EpisodeStore,
    generation: u32,
    trainer: Side,
    num_best: usize,
) -> Result<GenerationSelection, SelectError> {
    let paths = store.list_generation(generation, Some(trainer))?;
    if paths.is_empty() {
        return Err(SelectError::EmptyGeneration {
            generation,
            trainer,
        });
    }

    let mut episodes = Vec::with_capacity(paths.len());
    let mut fitness_sum = 0.0f32;
    for path in paths {
        let record = EpisodeStore::read(&path)?;
        fitness_sum += record.fitness_for(trainer);
        episodes.push(RankedEpisode { path, record });
    }
    let mean_fitness = fitness_sum / episodes.len() as f32;

    episodes.sort_by(|a, b| {
        b.record
            .fitness_for(trainer)
            .total_cmp(&a.record.fitness_for(trainer))
    });
    let best_fitness = episodes[0].record.fitness_for(trainer);

    if num_best > 0 {
        episodes.truncate(num_best);
    }

    Ok(GenerationSelection {
        generation,
        trainer,
        mean_fitness,
        best_fitness,
        episodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EpisodeRecord;

    mod query_resolution {
        use super::*;

        const AVAILABLE: &[u32] = &[1, 2, 3, 5, 8];

        #[test]
        fn test_absent_argument_selects_all() {
            let resolved = GenerationQuery::from_args(None).resolve(AVAILABLE).unwrap();
            assert_eq!(resolved, AVAILABLE);
        }

        #[test]
        fn test_empty_argument_selects_all() {
            let resolved = GenerationQuery::from_args(Some(&[]))
                .resolve(AVAILABLE)
                .unwrap();
            assert_eq!(resolved, AVAILABLE);
        }

        #[test]
        fn test_single_value_selects_last_n() {
            let query = GenerationQuery::from_args(Some(&[2]));
            assert_eq!(query, GenerationQuery::LastN(2));
            assert_eq!(query.resolve(AVAILABLE).unwrap(), vec![5, 8]);
        }

        #[test]
        fn test_last_n_larger_than_available_returns_everything() {
            let resolved = GenerationQuery::LastN(99).resolve(AVAILABLE).unwrap();
            assert_eq!(resolved, AVAILABLE);
        }

        #[test]
        fn test_two_values_select_an_inclusive_range() {
            let query = GenerationQuery::from_args(Some(&[2, 5]));
            assert_eq!(query.resolve(AVAILABLE).unwrap(), vec![2, 3, 5]);
        }

        #[test]
        fn test_many_values_select_an_explicit_list() {
            let query = GenerationQuery::from_args(Some(&[8, 1, 40]));
            assert_eq!(query.resolve(AVAILABLE).unwrap(), vec![1, 8]);
        }

        #[test]
        fn test_disjoint_request_fails_loudly() {
            let query = GenerationQuery::Range(20, 30);
            let err = query.resolve(AVAILABLE).unwrap_err();
            assert!(matches!(err, SelectError::NoMatchingGenerations { .. }));
        }

        #[test]
        fn test_empty_archive_fails() {
            let err = GenerationQuery::All.resolve(&[]).unwrap_err();
            assert!(matches!(err, SelectError::NoGenerations));
        }
    }

    mod ranking {
        use super::*;

        fn temp_store(name: &str) -> EpisodeStore {
            let dir = std::env::temp_dir().join(format!(
                "skirmish-select-{}-{name}",
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&dir);
            EpisodeStore::new(dir)
        }

        fn scored_record(population: u32, score: f32) -> EpisodeRecord {
            let mut record = EpisodeRecord::begin(Side::Raider, 5, population, "0.1", "v1");
            record.raider_fitness = score;
            record
        }

        #[test]
        fn test_best_two_are_returned_in_descending_order() {
            let store = temp_store("best-two");
            store.write(&scored_record(1, 10.0)).unwrap();
            store.write(&scored_record(2, 30.0)).unwrap();
            store.write(&scored_record(3, 20.0)).unwrap();

            let selection = select_best(&store, 5, Side::Raider, 2).unwrap();
            assert_eq!(selection.episodes.len(), 2);
            assert!(selection.episodes[0].path.ends_with("gen_5/2_Raider.json"));
            assert!(selection.episodes[1].path.ends_with("gen_5/3_Raider.json"));
            assert!((selection.episodes[0].record.raider_fitness - 30.0).abs() < f32::EPSILON);
            assert!((selection.best_fitness - 30.0).abs() < f32::EPSILON);
            assert!((selection.mean_fitness - 20.0).abs() < f32::EPSILON);
            let _ = std::fs::remove_dir_all(store.root());
        }

        #[test]
        fn test_request_larger_than_generation_returns_all() {
            let store = temp_store("min-k");
            store.write(&scored_record(1, 1.0)).unwrap();
            store.write(&scored_record(2, 2.0)).unwrap();

            let selection = select_best(&store, 5, Side::Raider, 3).unwrap();
            assert_eq!(selection.episodes.len(), 2);
            let _ = std::fs::remove_dir_all(store.root());
        }

        #[test]
        fn test_zero_means_whole_generation() {
            let store = temp_store("all");
            for population in 1..=4u32 {
                #[expect(clippy::cast_precision_loss)]
                store
                    .write(&scored_record(population, population as f32))
                    .unwrap();
            }
            let selection = select_best(&store, 5, Side::Raider, 0).unwrap();
            assert_eq!(selection.episodes.len(), 4);
            let _ = std::fs::remove_dir_all(store.root());
        }

        #[test]
        fn test_wrong_trainer_fails_explicitly() {
            let store = temp_store("wrong-trainer");
            store.write(&scored_record(1, 1.0)).unwrap();
            let err = select_best(&store, 5, Side::Warden, 1).unwrap_err();
            assert!(matches!(
                err,
                SelectError::EmptyGeneration {
                    generation: 5,
                    trainer: Side::Warden,
                }
            ));
            let _ = std::fs::remove_dir_all(store.root());
        }
    }
}
