//! Per-chunk run manifests.
//!
//! Next to every chunk result file the runner drops a small JSON record of
//! how the chunk was produced. The manifests are diagnostics for long
//! batches; nothing downstream depends on them.

use chrono::{DateTime, Utc};
use meo_core::{ChunkAnchor, MeoError, MeoResult, SolverKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRunRecord {
    pub chunk: ChunkAnchor,
    pub solver: SolverKind,
    pub started_at: DateTime<Utc>,
    /// Wall-clock seconds for the whole chunk, input loading included.
    pub runtime_seconds: f64,
    pub pixels_total: usize,
    pub pixels_sea: usize,
    pub pixels_solved: usize,
    /// The chunk result file this record describes.
    pub output: PathBuf,
}

impl ChunkRunRecord {
    /// Manifest path for a chunk result at `output`.
    pub fn path_for(output: &Path) -> PathBuf {
        let mut name = output
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".run.json");
        output.with_file_name(name)
    }

    pub fn write(&self, path: &Path) -> MeoResult<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|err| MeoError::Parse(err.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn load(path: &Path) -> MeoResult<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|err| MeoError::Parse(err.to_string()))
    }
}
