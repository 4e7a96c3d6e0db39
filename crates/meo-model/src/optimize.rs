//! Per-pixel optimization driver.

use crate::backend::{backend_for, SolverBackend};
use crate::network::build_methanol_network;
use meo_core::{
    MeoResult, ModelParameters, ParamValue, PixelSolution, SolverKind, SolverParams,
};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

/// Solves the methanol network for one pixel at a time.
///
/// Built once per chunk run; carries the model parameters, the chosen
/// backend, and the merged solver tuning so per-pixel calls only supply
/// the generation profiles.
pub struct PixelOptimizer {
    model: ModelParameters,
    backend: Box<dyn SolverBackend>,
    solver_params: SolverParams,
    step_hours: f64,
}

impl PixelOptimizer {
    /// `overrides` are merged on top of the solver's tuned defaults and
    /// win on key conflict.
    pub fn new(
        model: ModelParameters,
        solver: SolverKind,
        overrides: &BTreeMap<String, ParamValue>,
        step_hours: f64,
    ) -> Self {
        Self {
            model,
            backend: backend_for(solver),
            solver_params: SolverParams::defaults(solver).merged_with(overrides),
            step_hours,
        }
    }

    /// Solve one pixel and return its sized assets.
    ///
    /// `x`/`y` are the pixel's coordinate values; `wind` and `pv` its
    /// per-unit-capacity generation profiles. Any solver failure
    /// propagates; no placeholder record is ever produced here.
    pub fn optimize_pixel(
        &self,
        x: f64,
        y: f64,
        wind: &[f64],
        pv: &[f64],
    ) -> MeoResult<PixelSolution> {
        let started = Instant::now();
        let (lp, vars) = build_methanol_network(wind, pv, &self.model, self.step_hours)?;
        let outcome = self.backend.solve(&lp, &self.solver_params)?;
        let runtime = started.elapsed().as_secs_f64();
        debug!(x, y, runtime, objective = outcome.objective, "pixel solved");

        Ok(PixelSolution {
            x,
            y,
            runtime,
            runtime_solver: outcome.runtime_solver,
            size_solar_pv: outcome.value(vars.size_solar_pv),
            size_wind: outcome.value(vars.size_wind),
            size_storage_electricity: outcome.value(vars.size_storage_electricity),
            size_storage_electrolyzer: outcome.value(vars.size_storage_electrolyzer),
            size_electrolyzer: outcome.value(vars.size_electrolyzer),
            size_storage_co2: outcome.value(vars.size_storage_co2),
            size_co2: outcome.value(vars.size_co2),
            size_storage_methanol_synthesis: outcome.value(vars.size_storage_methanol_synthesis),
            size_methanol_synthesis: outcome.value(vars.size_methanol_synthesis),
        })
    }
}
