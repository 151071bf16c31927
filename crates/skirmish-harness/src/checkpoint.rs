use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skirmish_arena::Side;
use skirmish_evolve::EngineState;

/// Ceiling on run directories per fitness version. Hitting it means the
/// same formula has been retried too many times; revise the formula instead
/// of piling up more runs against it.
pub const MAX_RUNS_PER_FITNESS_VERSION: u32 = 9;

/// Errors raised by checkpoint persistence.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CheckpointError {
    #[display(
        "fitness version {fitness_version:?} has hit the run-directory ceiling; \
         revise the fitness function before training it again"
    )]
    TooManyRuns { fitness_version: String },
    #[display("checkpoint file name {name:?} carries no parseable generation number")]
    MalformedName { name: String },
    #[display("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("malformed checkpoint {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// On-disk checkpoint contents: the engine snapshot plus bookkeeping.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointEnvelope {
    pub saved_at: DateTime<Utc>,
    /// 1-indexed count of completed generations at save time.
    pub generation: u32,
    pub state: EngineState,
}

/// Resumable persistence of per-side engine state for one training run.
///
/// Checkpoints live under `{root}/{fitness_version}/run_{K}` with
/// `K` between 1 and [`MAX_RUNS_PER_FITNESS_VERSION`]. One file per side
/// per interval, named `{side}-{generation}` where the generation is the
/// completed count - 1-indexed, so a directory listing reads as
/// "checkpoint after generation N" rather than an internal zero-based
/// counter.
#[derive(Debug)]
pub struct CheckpointManager {
    run_dir: PathBuf,
    run_number: u32,
    interval: u32,
    max_generations: u32,
}

impl CheckpointManager {
    /// Selects (and creates) the run directory for this training process.
    ///
    /// Existing runs are scanned under the fitness-version directory: when
    /// restoring, the highest existing run is reused so training continues
    /// where it stopped; when restoration is off or a reset was requested,
    /// the first unused number is allocated. More than
    /// [`MAX_RUNS_PER_FITNESS_VERSION`] existing runs is a configuration
    /// error.
    pub fn open(
        root: &Path,
        fitness_version: &str,
        restore: bool,
        reset: bool,
        interval: u32,
        max_generations: u32,
    ) -> Result<Self, CheckpointError> {
        let version_dir = root.join(fitness_version);
        fs::create_dir_all(&version_dir).map_err(|source| CheckpointError::Io {
            path: version_dir.clone(),
            source,
        })?;

        let existing = list_names(&version_dir)?;
        eprintln!(
            "Existing runs under {}: {existing:?}",
            version_dir.display()
        );

        let mut run_number = 1;
        let mut selected = None;
        for i in 1..=MAX_RUNS_PER_FITNESS_VERSION {
            if existing.iter().all(|name| name != &format!("run_{i}")) {
                if !restore || reset {
                    run_number = i;
                }
                selected = Some(run_number);
                break;
            }
            run_number = i;
        }
        let Some(run_number) = selected else {
            return Err(CheckpointError::TooManyRuns {
                fitness_version: fitness_version.to_owned(),
            });
        };

        let run_dir = version_dir.join(format!("run_{run_number}"));
        fs::create_dir_all(&run_dir).map_err(|source| CheckpointError::Io {
            path: run_dir.clone(),
            source,
        })?;
        eprintln!("Using run directory {}", run_dir.display());

        Ok(Self {
            run_dir,
            run_number,
            interval,
            max_generations,
        })
    }

    #[must_use]
    pub fn run_number(&self) -> u32 {
        self.run_number
    }

    #[must_use]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Restores the newest checkpoint for one side, if any exists.
    ///
    /// The newest file is the one whose name carries the largest generation
    /// suffix. An empty run directory is not an error - the caller starts
    /// that side fresh - but a file whose name fails to parse is fatal: it
    /// means the directory was corrupted or hand-edited, and silently
    /// skipping it could resume from the wrong generation.
    pub fn restore_side(&self, side: Side) -> Result<Option<CheckpointEnvelope>, CheckpointError> {
        let prefix = side_prefix(side);
        let names = list_names(&self.run_dir)?;

        let mut newest: Option<(u32, String)> = None;
        for name in names {
            if !name.starts_with(prefix) {
                continue;
            }
            let generation = parse_generation_suffix(&name, self.max_generations)?;
            if newest.as_ref().is_none_or(|(best, _)| generation > *best) {
                newest = Some((generation, name));
            }
        }

        let Some((_, name)) = newest else {
            return Ok(None);
        };
        let path = self.run_dir.join(&name);
        let file = File::open(&path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        let envelope =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                CheckpointError::Json {
                    path: path.clone(),
                    source,
                }
            })?;
        eprintln!("Restoring {} from {}", side.label(), path.display());
        Ok(Some(envelope))
    }

    /// Saves a checkpoint when the completed-generation count lands on the
    /// configured interval. Returns the written path if a save happened.
    pub fn maybe_save(
        &self,
        side: Side,
        completed_generations: u32,
        state: &EngineState,
    ) -> Result<Option<PathBuf>, CheckpointError> {
        if self.interval == 0 || completed_generations % self.interval != 0 {
            return Ok(None);
        }
        self.save(side, completed_generations, state).map(Some)
    }

    /// Writes one checkpoint file tagged with the completed (1-indexed)
    /// generation count.
    pub fn save(
        &self,
        side: Side,
        completed_generations: u32,
        state: &EngineState,
    ) -> Result<PathBuf, CheckpointError> {
        assert!(
            completed_generations >= 1,
            "checkpoints are tagged with completed generations, which are 1-indexed"
        );
        let path = self
            .run_dir
            .join(format!("{}{completed_generations}", side_prefix(side)));
        let envelope = CheckpointEnvelope {
            saved_at: Utc::now(),
            generation: completed_generations,
            state: state.clone(),
        };

        let file = File::create(&path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &envelope).map_err(|source| {
            CheckpointError::Json {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn side_prefix(side: Side) -> &'static str {
    match side {
        Side::Raider => "raider-",
        Side::Warden => "warden-",
    }
}

/// Extracts the generation number from a checkpoint file name.
///
/// The suffix is parsed with a fixed-width assumption: only as many
/// trailing characters as the maximum configured generation count has
/// digits are examined. Within that tail, everything after the last
/// separator is the number; a tail with no separator must itself be the
/// number.
fn parse_generation_suffix(name: &str, max_generations: u32) -> Result<u32, CheckpointError> {
    if name.ends_with('-') {
        return Err(CheckpointError::MalformedName {
            name: name.to_owned(),
        });
    }
    let width = max_generations.to_string().len();
    let tail = &name[name.len().saturating_sub(width)..];
    let digits = match tail.find('-') {
        Some(pos) => &tail[pos + 1..],
        None => tail,
    };
    digits
        .parse()
        .map_err(|_| CheckpointError::MalformedName {
            name: name.to_owned(),
        })
}

fn list_names(dir: &Path) -> Result<Vec<String>, CheckpointError> {
    let entries = fs::read_dir(dir).map_err(|source| CheckpointError::Io {
        path: dir.to_owned(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CheckpointError::Io {
            path: dir.to_owned(),
            source,
        })?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use skirmish_evolve::Population;

    const MAX_GENERATIONS: u32 = 300;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "skirmish-checkpoint-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn open(root: &Path, restore: bool, reset: bool) -> Result<CheckpointManager, CheckpointError> {
        CheckpointManager::open(root, "v-test", restore, reset, 5, MAX_GENERATIONS)
    }

    fn engine_state(completed_generations: u32) -> EngineState {
        let mut rng = Pcg32::seed_from_u64(97);
        EngineState {
            completed_generations,
            population: Population::random(8, 8, 2, 4.0, &mut rng),
        }
    }

    mod run_selection {
        use super::*;

        #[test]
        fn test_first_invocation_allocates_run_1() {
            let root = temp_root("first");
            let manager = open(&root, true, false).unwrap();
            assert_eq!(manager.run_number(), 1);
            assert!(root.join("v-test/run_1").is_dir());
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_restore_reuses_the_highest_existing_run() {
            let root = temp_root("reuse");
            for i in 1..=3 {
                fs::create_dir_all(root.join(format!("v-test/run_{i}"))).unwrap();
            }
            let manager = open(&root, true, false).unwrap();
            assert_eq!(manager.run_number(), 3);
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_reset_allocates_the_next_unused_run() {
            let root = temp_root("reset");
            for i in 1..=3 {
                fs::create_dir_all(root.join(format!("v-test/run_{i}"))).unwrap();
            }
            let manager = open(&root, true, true).unwrap();
            assert_eq!(manager.run_number(), 4);
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_restore_disabled_allocates_the_next_unused_run() {
            let root = temp_root("no-restore");
            fs::create_dir_all(root.join("v-test/run_1")).unwrap();
            let manager = open(&root, false, false).unwrap();
            assert_eq!(manager.run_number(), 2);
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_nine_existing_runs_is_a_configuration_error() {
            let root = temp_root("ceiling");
            for i in 1..=MAX_RUNS_PER_FITNESS_VERSION {
                fs::create_dir_all(root.join(format!("v-test/run_{i}"))).unwrap();
            }
            let err = open(&root, true, false).unwrap_err();
            assert!(matches!(err, CheckpointError::TooManyRuns { .. }));
            let _ = fs::remove_dir_all(&root);
        }
    }

    mod save_and_restore {
        use super::*;

        #[test]
        fn test_save_tags_files_with_completed_generations() {
            let root = temp_root("save");
            let manager = open(&root, true, false).unwrap();
            let path = manager.save(Side::Raider, 5, &engine_state(5)).unwrap();
            assert!(path.ends_with("raider-5"));
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_maybe_save_honours_the_interval() {
            let root = temp_root("interval");
            let manager = open(&root, true, false).unwrap();
            assert!(
                manager
                    .maybe_save(Side::Warden, 4, &engine_state(4))
                    .unwrap()
                    .is_none()
            );
            assert!(
                manager
                    .maybe_save(Side::Warden, 5, &engine_state(5))
                    .unwrap()
                    .is_some()
            );
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_restore_picks_the_largest_generation() {
            let root = temp_root("newest");
            let manager = open(&root, true, false).unwrap();
            for generation in [5, 15, 10] {
                manager
                    .save(Side::Raider, generation, &engine_state(generation))
                    .unwrap();
            }
            manager.save(Side::Warden, 20, &engine_state(20)).unwrap();

            let envelope = manager.restore_side(Side::Raider).unwrap().unwrap();
            assert_eq!(envelope.generation, 15);
            assert_eq!(envelope.state.completed_generations, 15);
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_restore_of_empty_run_is_none_not_an_error() {
            let root = temp_root("empty");
            let manager = open(&root, true, false).unwrap();
            assert!(manager.restore_side(Side::Raider).unwrap().is_none());
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_malformed_file_name_is_fatal() {
            let root = temp_root("malformed");
            let manager = open(&root, true, false).unwrap();
            fs::write(manager.run_dir().join("raider-"), b"{}").unwrap();
            let err = manager.restore_side(Side::Raider).unwrap_err();
            assert!(matches!(err, CheckpointError::MalformedName { .. }));
            let _ = fs::remove_dir_all(&root);
        }

        #[test]
        fn test_restored_state_roundtrips() {
            let root = temp_root("roundtrip");
            let manager = open(&root, true, false).unwrap();
            let state = engine_state(10);
            manager.save(Side::Warden, 10, &state).unwrap();

            let envelope = manager.restore_side(Side::Warden).unwrap().unwrap();
            assert_eq!(
                envelope.state.population.len(),
                state.population.len()
            );
        }
    }

    mod suffix_parsing {
        use super::*;

        #[test]
        fn test_parse_with_separator() {
            assert_eq!(parse_generation_suffix("raider-7", 300).unwrap(), 7);
            assert_eq!(parse_generation_suffix("warden-123", 300).unwrap(), 123);
        }

        #[test]
        fn test_parse_numeric_tail_without_separator_in_window() {
            // Width is 3 for 300 generations, so the window over
            // "raider-300" is exactly "300".
            assert_eq!(parse_generation_suffix("raider-300", 300).unwrap(), 300);
        }

        #[test]
        fn test_trailing_separator_is_malformed() {
            assert!(parse_generation_suffix("raider-", 300).is_err());
        }

        #[test]
        fn test_non_numeric_tail_is_malformed() {
            assert!(parse_generation_suffix("raider-abc", 300).is_err());
        }
    }
}
