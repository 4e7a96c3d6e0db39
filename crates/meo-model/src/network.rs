//! The methanol network LP for one pixel.
//!
//! Decision variables are the nine asset sizes plus, per time step, the
//! flows between them: curtailment, electricity into electrolysis and
//! direct air capture, hydrogen and CO2 into synthesis, and the
//! charge/discharge/level triple of each storage. All flows are in
//! per-step quantities (kWh or tons); sizes are capacities (kW, tons of
//! storage, or tons per hour of conversion throughput).

use crate::lp::{LinearProgram, RowBound, VarId};
use meo_core::{MeoError, MeoResult, ModelParameters, StorageParams};

/// Handles to the size variables of one built network, used to read the
/// solved capacities back out of the solution vector.
#[derive(Debug, Clone, Copy)]
pub struct NetworkVariables {
    pub size_wind: VarId,
    pub size_solar_pv: VarId,
    pub size_storage_electricity: VarId,
    pub size_electrolyzer: VarId,
    pub size_storage_electrolyzer: VarId,
    pub size_co2: VarId,
    pub size_storage_co2: VarId,
    pub size_methanol_synthesis: VarId,
    pub size_storage_methanol_synthesis: VarId,
}

struct StorageVars {
    size: VarId,
    charge: Vec<VarId>,
    discharge: Vec<VarId>,
    level: Vec<VarId>,
}

/// Build the LP for one pixel from its renewable generation profiles.
///
/// `wind` and `pv` are per-unit-capacity generation per hour; one entry
/// per time step of `step_hours` hours. The methanol demand appears as a
/// single delivery at the final step, backed by a free methanol buffer,
/// which makes it a production target over the whole horizon rather than
/// a delivery schedule.
pub fn build_methanol_network(
    wind: &[f64],
    pv: &[f64],
    params: &ModelParameters,
    step_hours: f64,
) -> MeoResult<(LinearProgram, NetworkVariables)> {
    check_profiles(wind, pv)?;

    let n_steps = wind.len();
    let dt = step_hours;
    let mut lp = LinearProgram::new();

    let size_wind = lp.add_var("size_wind", 0.0, f64::INFINITY, params.wind_cost);
    let size_solar_pv = lp.add_var("size_solar_pv", 0.0, f64::INFINITY, params.pv_cost);
    // Conversion sizes are output capacities; the electrolyzer cost is
    // quoted per unit of electricity input and rescaled accordingly.
    let size_electrolyzer = lp.add_var(
        "size_electrolyzer",
        0.0,
        f64::INFINITY,
        params.electrolyzer_cost / params.electrolyzer_convert_factor,
    );
    let size_co2 = lp.add_var("size_co2", 0.0, f64::INFINITY, params.co2_cost);
    let size_methanol_synthesis = lp.add_var(
        "size_methanol_synthesis",
        0.0,
        f64::INFINITY,
        params.methanol_synthesis_cost,
    );

    let electricity = add_storage(&mut lp, "electricity", &params.electricity_storage, n_steps, dt);
    let hydrogen = add_storage(&mut lp, "electrolyzer", &params.hydrogen_storage, n_steps, dt);
    let co2 = add_storage(&mut lp, "co2", &params.co2_storage, n_steps, dt);
    let methanol = add_storage(
        &mut lp,
        "methanol_synthesis",
        &params.methanol_storage,
        n_steps,
        dt,
    );

    let curtail: Vec<VarId> = (0..n_steps)
        .map(|t| lp.add_var(format!("curtail_{t}"), 0.0, f64::INFINITY, 0.0))
        .collect();
    let el_to_h2: Vec<VarId> = (0..n_steps)
        .map(|t| lp.add_var(format!("el_to_h2_{t}"), 0.0, f64::INFINITY, 0.0))
        .collect();
    let el_to_co2: Vec<VarId> = (0..n_steps)
        .map(|t| lp.add_var(format!("el_to_co2_{t}"), 0.0, f64::INFINITY, 0.0))
        .collect();
    let h2_to_syn: Vec<VarId> = (0..n_steps)
        .map(|t| lp.add_var(format!("h2_to_syn_{t}"), 0.0, f64::INFINITY, 0.0))
        .collect();
    let co2_to_syn: Vec<VarId> = (0..n_steps)
        .map(|t| lp.add_var(format!("co2_to_syn_{t}"), 0.0, f64::INFINITY, 0.0))
        .collect();

    for t in 0..n_steps {
        // Electricity pool: generation and battery discharge cover
        // curtailment, battery charge, and the two conversion draws.
        lp.add_row(
            format!("balance_electricity_{t}"),
            RowBound::Eq(0.0),
            vec![
                (size_wind, wind[t] * dt),
                (size_solar_pv, pv[t] * dt),
                (electricity.discharge[t], 1.0),
                (electricity.charge[t], -1.0),
                (curtail[t], -1.0),
                (el_to_h2[t], -1.0),
                (el_to_co2[t], -1.0),
            ],
        );

        lp.add_row(
            format!("balance_hydrogen_{t}"),
            RowBound::Eq(0.0),
            vec![
                (el_to_h2[t], params.electrolyzer_convert_factor),
                (hydrogen.discharge[t], 1.0),
                (hydrogen.charge[t], -1.0),
                (h2_to_syn[t], -1.0),
            ],
        );

        lp.add_row(
            format!("balance_co2_{t}"),
            RowBound::Eq(0.0),
            vec![
                (el_to_co2[t], params.co2_convert_factor),
                (co2.discharge[t], 1.0),
                (co2.charge[t], -1.0),
                (co2_to_syn[t], -1.0),
            ],
        );

        // The whole yearly target is delivered at the final step; the free
        // methanol buffer spreads production across the horizon.
        let demand = if t == n_steps - 1 {
            params.methanol_demand
        } else {
            0.0
        };
        lp.add_row(
            format!("balance_methanol_{t}"),
            RowBound::Eq(demand),
            vec![
                (h2_to_syn[t], params.methanol_synthesis_convert_factor),
                (methanol.discharge[t], 1.0),
                (methanol.charge[t], -1.0),
            ],
        );

        // Synthesis consumes CO2 and H2 in a fixed mass blend.
        lp.add_row(
            format!("blend_{t}"),
            RowBound::Eq(0.0),
            vec![
                (co2_to_syn[t], params.methanol_synthesis_h2_share()),
                (h2_to_syn[t], -params.methanol_synthesis_co2_share),
            ],
        );

        lp.add_row(
            format!("cap_electrolyzer_{t}"),
            RowBound::Le(0.0),
            vec![
                (el_to_h2[t], params.electrolyzer_convert_factor),
                (size_electrolyzer, -dt),
            ],
        );
        lp.add_row(
            format!("cap_co2_{t}"),
            RowBound::Le(0.0),
            vec![
                (el_to_co2[t], params.co2_convert_factor),
                (size_co2, -dt),
            ],
        );
        lp.add_row(
            format!("cap_methanol_synthesis_{t}"),
            RowBound::Le(0.0),
            vec![
                (h2_to_syn[t], params.methanol_synthesis_convert_factor),
                (size_methanol_synthesis, -dt),
            ],
        );
    }

    let vars = NetworkVariables {
        size_wind,
        size_solar_pv,
        size_storage_electricity: electricity.size,
        size_electrolyzer,
        size_storage_electrolyzer: hydrogen.size,
        size_co2,
        size_storage_co2: co2.size,
        size_methanol_synthesis,
        size_storage_methanol_synthesis: methanol.size,
    };
    Ok((lp, vars))
}

/// Add one storage unit: a size variable, per-step charge/discharge/level
/// variables, the level recursion, and the capacity and rate limits.
/// Storages start the horizon empty.
fn add_storage(
    lp: &mut LinearProgram,
    name: &str,
    params: &StorageParams,
    n_steps: usize,
    dt: f64,
) -> StorageVars {
    let size = lp.add_var(
        format!("size_storage_{name}"),
        0.0,
        f64::INFINITY,
        params.cost,
    );
    let charge: Vec<VarId> = (0..n_steps)
        .map(|t| lp.add_var(format!("charge_{name}_{t}"), 0.0, f64::INFINITY, 0.0))
        .collect();
    let discharge: Vec<VarId> = (0..n_steps)
        .map(|t| lp.add_var(format!("discharge_{name}_{t}"), 0.0, f64::INFINITY, 0.0))
        .collect();
    let level: Vec<VarId> = (0..n_steps)
        .map(|t| lp.add_var(format!("level_{name}_{t}"), 0.0, f64::INFINITY, 0.0))
        .collect();

    let retention = (1.0 - params.storage_loss).powf(dt);
    let charge_yield = 1.0 - params.charging_loss;

    for t in 0..n_steps {
        let mut terms = vec![
            (level[t], 1.0),
            (charge[t], -charge_yield),
            (discharge[t], 1.0),
        ];
        if t > 0 {
            terms.push((level[t - 1], -retention));
        }
        lp.add_row(format!("level_{name}_{t}"), RowBound::Eq(0.0), terms);

        lp.add_row(
            format!("cap_level_{name}_{t}"),
            RowBound::Le(0.0),
            vec![(level[t], 1.0), (size, -1.0)],
        );
        lp.add_row(
            format!("rate_charge_{name}_{t}"),
            RowBound::Le(0.0),
            vec![(charge[t], 1.0), (size, -params.max_charging_speed * dt)],
        );
        lp.add_row(
            format!("rate_discharge_{name}_{t}"),
            RowBound::Le(0.0),
            vec![
                (discharge[t], 1.0),
                (size, -params.max_charging_speed * dt),
            ],
        );
    }

    StorageVars {
        size,
        charge,
        discharge,
        level,
    }
}

fn check_profiles(wind: &[f64], pv: &[f64]) -> MeoResult<()> {
    if wind.is_empty() {
        return Err(MeoError::InvalidInput(
            "generation profiles are empty".into(),
        ));
    }
    if wind.len() != pv.len() {
        return Err(MeoError::InvalidInput(format!(
            "wind profile has {} steps but pv has {}",
            wind.len(),
            pv.len()
        )));
    }
    for (name, profile) in [("wind", wind), ("pv", pv)] {
        for (t, &value) in profile.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(MeoError::InvalidInput(format!(
                    "{name} profile has invalid value {value} at step {t}"
                )));
            }
        }
    }
    Ok(())
}
