//! Renewable generation time-series slicing.
//!
//! Input files hold one variable per technology with dimensions
//! `(time, y, x)` plus coordinate variables `x` (longitudes) and `y`
//! (latitudes). Only the requested spatial sub-range is read from disk;
//! the full grid is never materialized.

use crate::data_error;
use meo_core::{MeoResult, Technology};
use ndarray::Array3;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// One technology's generation time series for a chunk's spatial extent.
#[derive(Debug, Clone)]
pub struct InputFlow {
    pub technology: Technology,
    /// Longitude values of the sliced x indices.
    pub x: Vec<f64>,
    /// Latitude values of the sliced y indices.
    pub y: Vec<f64>,
    /// Generation per unit capacity, shape `(time, y, x)`.
    data: Array3<f64>,
}

impl InputFlow {
    pub fn n_steps(&self) -> usize {
        self.data.shape()[0]
    }

    /// The full time series of the pixel at slice-local indices
    /// `(ix, iy)`.
    pub fn pixel(&self, ix: usize, iy: usize) -> Vec<f64> {
        self.data
            .slice(ndarray::s![.., iy, ix])
            .iter()
            .copied()
            .collect()
    }

    /// Same spatial extent and time length as `other`.
    pub fn aligned_with(&self, other: &InputFlow) -> bool {
        self.x == other.x && self.y == other.y && self.n_steps() == other.n_steps()
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        technology: Technology,
        x: Vec<f64>,
        y: Vec<f64>,
        data: Array3<f64>,
    ) -> Self {
        Self {
            technology,
            x,
            y,
            data,
        }
    }
}

/// Load one technology's time series restricted to `x_range`/`y_range`
/// pixel indices, optionally block-averaged to `time_resolution` hours per
/// step.
pub fn load_input_flow(
    path: &Path,
    technology: Technology,
    x_range: Range<usize>,
    y_range: Range<usize>,
    time_resolution: Option<usize>,
) -> MeoResult<InputFlow> {
    let file = netcdf::open(path).map_err(|err| data_error(path, err))?;

    let var = file.variable(technology.var_name()).ok_or_else(|| {
        data_error(
            path,
            format!("variable '{}' not found", technology.var_name()),
        )
    })?;

    let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    if dim_names != ["time", "y", "x"] {
        return Err(data_error(
            path,
            format!(
                "variable '{}' has dimensions {dim_names:?}, expected [\"time\", \"y\", \"x\"]",
                technology.var_name()
            ),
        ));
    }

    let n_time = var.dimensions()[0].len();
    let n_y = var.dimensions()[1].len();
    let n_x = var.dimensions()[2].len();
    if x_range.end > n_x || y_range.end > n_y {
        return Err(data_error(
            path,
            format!(
                "requested slice x={x_range:?} y={y_range:?} exceeds grid {n_x}x{n_y}"
            ),
        ));
    }

    let x = coordinate_values(&file, path, "x", x_range.clone())?;
    let y = coordinate_values(&file, path, "y", y_range.clone())?;

    let values: Vec<f64> = var
        .get_values((0..n_time, y_range.clone(), x_range.clone()))
        .map_err(|err| data_error(path, err))?;
    let data = Array3::from_shape_vec((n_time, y_range.len(), x_range.len()), values)
        .map_err(|err| data_error(path, err))?;

    let data = match time_resolution {
        Some(block) if block > 1 => block_average_time(data, block),
        _ => data,
    };

    debug!(
        technology = technology.var_name(),
        n_steps = data.shape()[0],
        n_x = x.len(),
        n_y = y.len(),
        "loaded input flow slice"
    );

    Ok(InputFlow {
        technology,
        x,
        y,
        data,
    })
}

fn coordinate_values(
    file: &netcdf::File,
    path: &Path,
    name: &str,
    range: Range<usize>,
) -> MeoResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| data_error(path, format!("coordinate variable '{name}' not found")))?;
    var.get_values(range).map_err(|err| data_error(path, err))
}

/// Downsample the time axis by averaging consecutive blocks of `block`
/// steps. Time order is preserved; an incomplete trailing block is dropped
/// so the output stays equidistant.
fn block_average_time(data: Array3<f64>, block: usize) -> Array3<f64> {
    let (n_time, n_y, n_x) = data.dim();
    let n_out = n_time / block;
    Array3::from_shape_fn((n_out, n_y, n_x), |(t, iy, ix)| {
        let start = t * block;
        let mut sum = 0.0;
        for step in start..start + block {
            sum += data[(step, iy, ix)];
        }
        sum / block as f64
    })
}
