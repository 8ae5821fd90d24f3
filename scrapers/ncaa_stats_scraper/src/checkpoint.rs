use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    error::StorageError,
    types::{ScrapeResult, TableKind},
};

const ERROR_PLAYERS_STEM: &str = "error_player_list";

/// Somewhere to put a full snapshot of the run so far.
pub trait CheckpointSink {
    fn save(&mut self, result: &ScrapeResult) -> Result<(), StorageError>;
}

impl<S: CheckpointSink + ?Sized> CheckpointSink for &mut S {
    fn save(&mut self, result: &ScrapeResult) -> Result<(), StorageError> {
        (**self).save(result)
    }
}

/// Points at the generation directory holding the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CheckpointManifest {
    generation: u64,
    artifacts: String,
}

/// Writes the result as five newline-delimited JSON files.
///
/// Every save goes into a fresh generation directory under `dir`. Only once
/// all five files are on disk is the manifest (`checkpoint_<suffix>.json`)
/// atomically replaced to point at it, so the five artifacts always come from
/// the same snapshot. The superseded generation is removed afterwards.
#[derive(Debug, Clone)]
pub struct JsonlCheckpoint {
    dir: PathBuf,
    suffix: String,
}

impl JsonlCheckpoint {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(format!("checkpoint_{}.json", self.suffix))
    }

    pub fn error_players_file_name(&self) -> String {
        self.artifact_name(ERROR_PLAYERS_STEM)
    }

    pub fn records_file_name(&self, kind: TableKind) -> String {
        self.artifact_name(kind.artifact_stem())
    }

    fn artifact_name(&self, stem: &str) -> String {
        format!("{}_{}.jsonl", stem, self.suffix)
    }

    fn generation_dir_name(&self, generation: u64) -> String {
        format!("checkpoint_{}.{}", self.suffix, generation)
    }

    /// Directory holding the five artifacts of the last completed save.
    pub fn current_artifacts(&self) -> Result<Option<PathBuf>, StorageError> {
        Ok(self.read_manifest()?.map(|m| self.dir.join(m.artifacts)))
    }

    fn read_manifest(&self) -> Result<Option<CheckpointManifest>, StorageError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let manifest = serde_json::from_reader(BufReader::new(File::open(&path)?))
            .map_err(|source| StorageError::Manifest { path, source })?;
        Ok(Some(manifest))
    }

    /// Reads back the last completed snapshot. No manifest means nothing was
    /// saved yet.
    pub fn load(&self) -> Result<ScrapeResult, StorageError> {
        let Some(artifacts) = self.current_artifacts()? else {
            return Ok(ScrapeResult::default());
        };

        let mut result = ScrapeResult {
            errors: read_jsonl(&artifacts.join(self.error_players_file_name()))?,
            ..ScrapeResult::default()
        };
        for kind in TableKind::ALL {
            *result.records_mut(kind) = read_jsonl(&artifacts.join(self.records_file_name(kind)))?;
        }
        Ok(result)
    }
}

impl CheckpointSink for JsonlCheckpoint {
    fn save(&mut self, result: &ScrapeResult) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let previous = self.read_manifest()?;
        let generation = previous.as_ref().map_or(1, |m| m.generation + 1);
        let manifest = CheckpointManifest {
            generation,
            artifacts: self.generation_dir_name(generation),
        };

        let artifacts = self.dir.join(&manifest.artifacts);
        // Left over from a save that died before its manifest was written.
        if artifacts.exists() {
            fs::remove_dir_all(&artifacts)?;
        }
        fs::create_dir(&artifacts)?;

        write_jsonl(&artifacts.join(self.error_players_file_name()), &result.errors)?;
        for kind in TableKind::ALL {
            write_jsonl(&artifacts.join(self.records_file_name(kind)), result.records(kind))?;
        }

        persist_atomically(&self.manifest_path(), |writer| {
            serde_json::to_writer_pretty(&mut *writer, &manifest)?;
            Ok(())
        })?;

        if let Some(previous) = previous.filter(|p| p.artifacts != manifest.artifacts) {
            let stale = self.dir.join(&previous.artifacts);
            if let Err(e) = fs::remove_dir_all(&stale) {
                warn!("Failed to remove old checkpoint {:?}: {}", stale, e);
            }
        }

        info!(
            "Saved checkpoint {} to {:?} ({} per game, {} per 40, {} per 100, {} advanced, {} errors)",
            generation,
            artifacts,
            result.per_game.len(),
            result.per_min.len(),
            result.per_poss.len(),
            result.advanced.len(),
            result.errors.len()
        );
        Ok(())
    }
}

/// Writes `path` through a temp file in the same directory and renames it
/// into place.
fn persist_atomically<F>(path: &Path, write: F) -> Result<(), StorageError>
where
    F: FnOnce(&mut BufWriter<NamedTempFile>) -> Result<(), StorageError>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut writer = BufWriter::new(NamedTempFile::new_in(dir)?);
    write(&mut writer)?;

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StorageError> {
    persist_atomically(path, |writer| {
        for item in items {
            serde_json::to_writer(&mut *writer, item)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    })?;
    debug!("Wrote {} lines to {:?}", items.len(), path);
    Ok(())
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        items.push(item);
    }
    Ok(items)
}
