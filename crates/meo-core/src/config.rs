//! Run configuration.
//!
//! One `RunConfig` value is loaded from a TOML file and passed explicitly
//! into the chunk runner, optimizer, and dispatcher. Validation happens
//! before any work starts.

use crate::error::{MeoError, MeoResult};
use crate::grid::ChunkGrid;
use crate::params::ModelParameters;
use crate::solver::{ParamValue, SolverKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn default_num_workers() -> usize {
    4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Pixel index range to cover, half-open.
    pub x_range: (usize, usize),
    pub y_range: (usize, usize),
    /// Chunk width and height in pixels.
    pub chunk_size: (usize, usize),

    /// Concurrency bound: worker processes in local mode, chunks per
    /// cluster job in SLURM mode. `0` means one per CPU.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    #[serde(default)]
    pub solver: SolverKind,
    /// Caller overrides merged on top of the solver's tuned defaults.
    #[serde(default)]
    pub solver_params: BTreeMap<String, ParamValue>,

    /// Target time resolution in hours per step; input flows are
    /// block-averaged down to it. `None` keeps the native resolution.
    #[serde(default)]
    pub time_resolution: Option<usize>,

    /// Root of the data tree (`input/`, `interim/`, `output/`).
    pub data_dir: PathBuf,
    /// Explicit input file overrides; defaults derive from `data_dir`.
    #[serde(default)]
    pub wind_file: Option<PathBuf>,
    #[serde(default)]
    pub pv_file: Option<PathBuf>,
    #[serde(default)]
    pub mask_file: Option<PathBuf>,

    /// Batch script submitted per chunk group in SLURM mode.
    #[serde(default)]
    pub slurm_script: Option<PathBuf>,

    #[serde(default)]
    pub model: ModelParameters,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> MeoResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            MeoError::Config(format!("cannot read config '{}': {err}", path.display()))
        })?;
        let config: RunConfig = toml::from_str(&text)?;
        config.validate()?;
        let chunks = config.chunk_grid()?.num_chunks();
        debug!(
            path = %path.display(),
            solver = %config.solver,
            chunks,
            "loaded run configuration"
        );
        Ok(config)
    }

    /// Check everything that can fail before any chunk work starts.
    pub fn validate(&self) -> MeoResult<()> {
        self.chunk_grid()?;
        if let Some(resolution) = self.time_resolution {
            if resolution == 0 {
                return Err(MeoError::Config(
                    "time_resolution must be at least one hour per step".into(),
                ));
            }
        }
        if self.model.methanol_demand <= 0.0 {
            return Err(MeoError::Config(format!(
                "methanol_demand {} must be positive",
                self.model.methanol_demand
            )));
        }
        Ok(())
    }

    pub fn chunk_grid(&self) -> MeoResult<ChunkGrid> {
        ChunkGrid::new(self.x_range, self.y_range, self.chunk_size)
    }

    /// Hours represented by one model time step.
    pub fn step_hours(&self) -> f64 {
        self.time_resolution.unwrap_or(1) as f64
    }

    pub fn wind_path(&self) -> PathBuf {
        self.wind_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("interim").join("wind").join("wind.nc"))
    }

    pub fn pv_path(&self) -> PathBuf {
        self.pv_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("interim").join("pv").join("pv.nc"))
    }

    pub fn mask_path(&self) -> PathBuf {
        self.mask_file.clone().unwrap_or_else(|| {
            self.data_dir
                .join("input")
                .join("era5")
                .join("land_sea_mask.nc")
        })
    }

    /// Directory holding one result file per computed chunk.
    pub fn solution_dir(&self) -> PathBuf {
        self.data_dir.join("interim").join("network_solution")
    }

    /// Final concatenated result file.
    pub fn output_path(&self) -> PathBuf {
        self.data_dir
            .join("output")
            .join("network_solution")
            .join("network_solution.nc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        x_range = [0, 20]
        y_range = [0, 20]
        chunk_size = [5, 5]
        data_dir = "data"
    "#;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: RunConfig = toml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();
        assert_eq!(config.solver, SolverKind::Highs);
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.step_hours(), 1.0);
        assert_eq!(config.chunk_grid().unwrap().num_chunks(), 16);
        assert!(config.wind_path().ends_with("interim/wind/wind.nc"));
        assert!(config.mask_path().ends_with("input/era5/land_sea_mask.nc"));
    }

    #[test]
    fn solver_params_and_overrides_parse() {
        let text = format!(
            "{MINIMAL}\nsolver = \"gurobi\"\n[solver_params]\nMethod = 1\nTimeLimit = 600.0\n"
        );
        let config: RunConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.solver, SolverKind::Gurobi);
        assert_eq!(config.solver_params.get("Method"), Some(&ParamValue::Int(1)));
    }

    #[test]
    fn invalid_chunk_size_fails_validation() {
        let text = MINIMAL.replace("[5, 5]", "[0, 5]");
        let config: RunConfig = toml::from_str(&text).unwrap();
        assert!(matches!(config.validate(), Err(MeoError::Config(_))));
    }

    #[test]
    fn zero_time_resolution_fails_validation() {
        let text = format!("{MINIMAL}\ntime_resolution = 0\n");
        let config: RunConfig = toml::from_str(&text).unwrap();
        assert!(matches!(config.validate(), Err(MeoError::Config(_))));
    }

    #[test]
    fn from_file_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = RunConfig::from_file(file.path()).unwrap();
        assert_eq!(config.x_range, (0, 20));

        let missing = RunConfig::from_file(Path::new("/nonexistent/meo.toml"));
        assert!(matches!(missing, Err(MeoError::Config(_))));
    }
}
