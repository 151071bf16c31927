use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use skirmish_arena::Side;

use crate::record::EpisodeRecord;

/// Errors raised by archive I/O.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ArchiveError {
    #[display("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("malformed episode record {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("no archived episodes for generation {generation}")]
    MissingGeneration { generation: u32 },
}

/// Replaces characters that are unsafe in file names (such as the colons
/// some trainer labels carry) with underscores.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Episode archive rooted at one directory.
///
/// Layout: `{root}/gen_{generation}/{population}_{trainer}.json`. Generation
/// directories are created lazily on the first write, and creation is
/// idempotent, so the store can be called for every episode without any
/// coordination.
#[derive(Debug, Clone)]
pub struct EpisodeStore {
    root: PathBuf,
}

impl EpisodeStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn generation_dir(&self, generation: u32) -> PathBuf {
        self.root.join(format!("gen_{generation}"))
    }

    /// Persists a completed episode, creating its generation directory if
    /// needed. The file name is unique per (generation, population, trainer)
    /// triple. Returns the written path.
    pub fn write(&self, record: &EpisodeRecord) -> Result<PathBuf, ArchiveError> {
        let dir = self.generation_dir(record.generation);
        fs::create_dir_all(&dir).map_err(|source| ArchiveError::Io {
            path: dir.clone(),
            source,
        })?;

        let file_name = sanitize_file_name(&format!(
            "{}_{}.json",
            record.population,
            record.trainer.label()
        ));
        let path = dir.join(file_name);

        let file = File::create(&path).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record).map_err(|source| {
            ArchiveError::Json {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    /// Reads one archived episode back.
    pub fn read(path: &Path) -> Result<EpisodeRecord, ArchiveError> {
        let file = File::open(path).map_err(|source| ArchiveError::Io {
            path: path.to_owned(),
            source,
        })?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|source| ArchiveError::Json {
            path: path.to_owned(),
            source,
        })
    }

    /// Sorted list of generation numbers present on disk. An absent archive
    /// root reads as no generations, not as an error.
    pub fn generations(&self) -> Result<Vec<u32>, ArchiveError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ArchiveError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut generations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ArchiveError::Io {
                path: self.root.clone(),
                source,
            })?;
            let name = entry.file_name();
            if let Some(number) = name
                .to_str()
                .and_then(|n| n.strip_prefix("gen_"))
                .and_then(|n| n.parse::<u32>().ok())
            {
                generations.push(number);
            }
        }
        generations.sort_unstable();
        Ok(generations)
    }

    /// Lists episode files for one generation, optionally restricted to one
    /// trainer by label substring. A missing generation directory is a data
    /// error for this request.
    pub fn list_generation(
        &self,
        generation: u32,
        trainer: Option<Side>,
    ) -> Result<Vec<PathBuf>, ArchiveError> {
        let dir = self.generation_dir(generation);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArchiveError::MissingGeneration { generation });
            }
            Err(source) => return Err(ArchiveError::Io { path: dir, source }),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ArchiveError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }
            if let Some(side) = trainer {
                if !name.contains(side.label()) {
                    continue;
                }
            }
            paths.push(path);
        }
        paths.sort();
        Ok(paths)
    }

    /// Deletes everything under the archive root. Destructive; used by the
    /// training CLI's startup cleanup. A missing root is fine.
    pub fn clear(&self) -> Result<(), ArchiveError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ArchiveError::Io {
                path: self.root.clone(),
                source,
            }),
        }
    }
}
