//! Solve one chunk end to end.

use crate::manifest::ChunkRunRecord;
use chrono::Utc;
use meo_core::{ChunkAnchor, MeoError, MeoResult, PixelSolution, RunConfig, Technology};
use meo_io::{chunk_file_name, load_input_flow, ChunkSolution, LandSeaMask};
use meo_model::PixelOptimizer;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Runs single chunks against a loaded configuration.
///
/// Fails fast: the first pixel whose solve fails aborts the chunk and no
/// result file is written. Sea pixels are not failures; they produce the
/// all-NaN sentinel record and the chunk stays rectangular.
pub struct ChunkRunner<'a> {
    config: &'a RunConfig,
}

impl<'a> ChunkRunner<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Solve the chunk at `anchor` and return the written result path.
    pub fn run(&self, anchor: ChunkAnchor) -> MeoResult<PathBuf> {
        let started = Instant::now();
        let started_at = Utc::now();
        let config = self.config;

        let grid = config.chunk_grid()?;
        let (x_range, y_range) = grid.chunk_extent(anchor)?;
        info!(%anchor, ?x_range, ?y_range, "running chunk");

        let wind = load_input_flow(
            &config.wind_path(),
            Technology::Wind,
            x_range.clone(),
            y_range.clone(),
            config.time_resolution,
        )?;
        let pv = load_input_flow(
            &config.pv_path(),
            Technology::SolarPv,
            x_range,
            y_range,
            config.time_resolution,
        )?;
        if !wind.aligned_with(&pv) {
            return Err(MeoError::DataUnavailable(
                "wind and pv inputs disagree on grid or horizon".into(),
            ));
        }
        let mask = LandSeaMask::load(&config.mask_path())?;

        let optimizer = PixelOptimizer::new(
            config.model.clone(),
            config.solver,
            &config.solver_params,
            config.step_hours(),
        );

        let mut pixels = Vec::with_capacity(wind.x.len() * wind.y.len());
        let mut pixels_sea = 0usize;
        for ix in 0..wind.x.len() {
            for iy in 0..wind.y.len() {
                let (lon, lat) = (wind.x[ix], wind.y[iy]);
                if !mask.is_land(lon, lat)? {
                    debug!(lon, lat, "sea pixel, skipping solve");
                    pixels.push(PixelSolution::empty(lon, lat));
                    pixels_sea += 1;
                    continue;
                }
                let solution =
                    optimizer.optimize_pixel(lon, lat, &wind.pixel(ix, iy), &pv.pixel(ix, iy))?;
                pixels.push(solution);
            }
        }

        let chunk = ChunkSolution::from_pixels(&pixels)?;
        let dir = config.solution_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(chunk_file_name(anchor));
        chunk.write(&path)?;

        let record = ChunkRunRecord {
            chunk: anchor,
            solver: config.solver,
            started_at,
            runtime_seconds: started.elapsed().as_secs_f64(),
            pixels_total: pixels.len(),
            pixels_sea,
            pixels_solved: pixels.len() - pixels_sea,
            output: path.clone(),
        };
        record.write(&ChunkRunRecord::path_for(&path))?;

        info!(
            %anchor,
            pixels = record.pixels_total,
            sea = record.pixels_sea,
            runtime = record.runtime_seconds,
            "chunk finished"
        );
        Ok(path)
    }
}
