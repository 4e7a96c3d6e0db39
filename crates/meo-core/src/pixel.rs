//! Per-pixel result records.

use serde::{Deserialize, Serialize};

/// Renewable input technologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Wind,
    #[serde(rename = "pv")]
    SolarPv,
}

impl Technology {
    /// Variable and directory name used in the input files.
    pub fn var_name(&self) -> &'static str {
        match self {
            Technology::Wind => "wind",
            Technology::SolarPv => "pv",
        }
    }
}

/// Output fields tracked per pixel, in the order they appear in result
/// files. Full per-timestep solver state is discarded to bound output size.
pub const OUTPUT_VARS: [&str; 11] = [
    "runtime",
    "runtime_solver",
    "size_solar_pv",
    "size_wind",
    "size_storage_electricity",
    "size_storage_electrolyzer",
    "size_electrolyzer",
    "size_storage_co2",
    "size_co2",
    "size_storage_methanol_synthesis",
    "size_methanol_synthesis",
];

/// Solved asset sizes for one pixel, tagged with its grid coordinates.
///
/// Created once per pixel per chunk run and never mutated afterwards. Sea
/// pixels carry the all-NaN sentinel produced by [`PixelSolution::empty`];
/// a solver failure never produces a sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSolution {
    /// Longitude value of the pixel's x index.
    pub x: f64,
    /// Latitude value of the pixel's y index.
    pub y: f64,
    /// Wall-clock optimizer runtime in seconds.
    pub runtime: f64,
    /// Solver-reported internal solve time in seconds; NaN when the
    /// backend cannot provide it.
    pub runtime_solver: f64,
    pub size_solar_pv: f64,
    pub size_wind: f64,
    pub size_storage_electricity: f64,
    pub size_storage_electrolyzer: f64,
    pub size_electrolyzer: f64,
    pub size_storage_co2: f64,
    pub size_co2: f64,
    pub size_storage_methanol_synthesis: f64,
    pub size_methanol_synthesis: f64,
}

impl PixelSolution {
    /// Sentinel record for a pixel excluded by the land/sea filter: every
    /// tracked field is NaN, but the coordinate slot is occupied so the
    /// chunk merge stays rectangular and gap-free.
    pub fn empty(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            runtime: f64::NAN,
            runtime_solver: f64::NAN,
            size_solar_pv: f64::NAN,
            size_wind: f64::NAN,
            size_storage_electricity: f64::NAN,
            size_storage_electrolyzer: f64::NAN,
            size_electrolyzer: f64::NAN,
            size_storage_co2: f64::NAN,
            size_co2: f64::NAN,
            size_storage_methanol_synthesis: f64::NAN,
            size_methanol_synthesis: f64::NAN,
        }
    }

    /// Value of one tracked output field by name.
    pub fn value(&self, var: &str) -> f64 {
        match var {
            "runtime" => self.runtime,
            "runtime_solver" => self.runtime_solver,
            "size_solar_pv" => self.size_solar_pv,
            "size_wind" => self.size_wind,
            "size_storage_electricity" => self.size_storage_electricity,
            "size_storage_electrolyzer" => self.size_storage_electrolyzer,
            "size_electrolyzer" => self.size_electrolyzer,
            "size_storage_co2" => self.size_storage_co2,
            "size_co2" => self.size_co2,
            "size_storage_methanol_synthesis" => self.size_storage_methanol_synthesis,
            "size_methanol_synthesis" => self.size_methanol_synthesis,
            _ => f64::NAN,
        }
    }

    /// True when every tracked field is NaN (a sea-pixel sentinel).
    pub fn is_sentinel(&self) -> bool {
        OUTPUT_VARS.iter().all(|var| self.value(var).is_nan())
    }
}
