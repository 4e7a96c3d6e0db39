//! Cost and conversion parameters of the methanol network model.
//!
//! Units are fixed throughout: electricity in kWh, hydrogen, CO2 and
//! methanol in tons, costs in EUR per unit of annualized capacity.
//! Defaults assume an 8% discount rate over a 20 year life time,
//! `n = 20; i = 0.08; ((1+i)^n * i) / ((1+i)^n - 1) ~= 0.10185`.

use serde::{Deserialize, Serialize};

/// Capital recovery factor for 8% / 20y.
pub const CAPITAL_RECOVERY_FACTOR: f64 = 0.10185221;

/// Parameters of one storage unit attached to a network node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageParams {
    /// EUR per unit of storage capacity per year.
    pub cost: f64,
    /// Maximum charge/discharge per hour as a fraction of capacity.
    pub max_charging_speed: f64,
    /// Fraction of the stored amount lost per hour.
    pub storage_loss: f64,
    /// Fraction of the charged amount lost while charging.
    pub charging_loss: f64,
}

/// Full parameter set for one pixel's optimization problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    /// EUR/kW/a.
    pub pv_cost: f64,
    /// EUR/kW/a, annualized from wind-class investment costs.
    pub wind_cost: f64,
    /// Tons of methanol that must be delivered over the horizon.
    pub methanol_demand: f64,

    pub electricity_storage: StorageParams,
    pub hydrogen_storage: StorageParams,
    pub co2_storage: StorageParams,
    /// Free buffer that turns the terminal demand spike into a yearly
    /// production target.
    pub methanol_storage: StorageParams,

    /// EUR/kW/a, per unit of electricity input capacity.
    pub electrolyzer_cost: f64,
    /// Tons of H2 per kWh of electricity.
    pub electrolyzer_convert_factor: f64,

    /// EUR/(t CO2/h)/a for direct air capture.
    pub co2_cost: f64,
    /// Tons of CO2 per kWh of electricity (includes heat supplied by a
    /// COP-3 heat pump).
    pub co2_convert_factor: f64,

    /// EUR/(t MeOH/h)/a.
    pub methanol_synthesis_cost: f64,
    /// Tons of methanol per ton of H2 input.
    pub methanol_synthesis_convert_factor: f64,
    /// Mass share of CO2 in the fixed CO2+H2 input blend.
    pub methanol_synthesis_co2_share: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        // CO2:H2 mass balance of the synthesis reaction.
        let balance_co2_h2 = 7.268519_f64;
        let co2_share = 1.0 - 1.0 / (balance_co2_h2 + 1.0);
        let synthesis_efficiency = 5.093 * 5.54 * 1e3;

        // Direct air capture, Keith et al. 2018 (Joule), table 2 scenario C,
        // converted with the 2018 average exchange rate.
        let dollar_to_eur = 0.848;
        let co2_cost_lifetime = 694.0; // $/(t/year)
        let co2_cost = dollar_to_eur * CAPITAL_RECOVERY_FACTOR * co2_cost_lifetime * 8760.0;

        let co2_electricity_input = 366.0; // kWh/t
        let co2_gas_input = 5.25; // GJ/t
        let gj_to_kwh = 1.0 / 3.6e-3;
        let gas_efficiency = 1.0 / 3.0;
        let co2_convert_factor =
            1.0 / (gj_to_kwh * co2_gas_input * gas_efficiency + co2_electricity_input);

        Self {
            pv_cost: 53.0,
            // Wind class 3 reference turbine, 2020 capex 1395 EUR/kW with a
            // 29% tower share; at 80 m hub height the tower factor clamps to
            // 0.5: 0.29 * 0.5 * 1395 + 0.71 * 1395.
            wind_cost: CAPITAL_RECOVERY_FACTOR * 1192.725,
            methanol_demand: 1000.0,
            electricity_storage: StorageParams {
                cost: 33.0, // EUR/kWh/a battery
                max_charging_speed: 0.4,
                storage_loss: 0.01,
                charging_loss: 0.1,
            },
            hydrogen_storage: StorageParams {
                cost: 1e3 * 74.0, // EUR/kg/a scaled to tons
                max_charging_speed: 0.2,
                storage_loss: 0.0,
                charging_loss: 0.0,
            },
            co2_storage: StorageParams {
                cost: 1e3 * 0.049,
                max_charging_speed: 0.2,
                storage_loss: 0.0,
                charging_loss: 0.0,
            },
            methanol_storage: StorageParams {
                cost: 0.0,
                max_charging_speed: 1.0,
                storage_loss: 0.0,
                charging_loss: 0.0,
            },
            electrolyzer_cost: 30.0,
            // 1 kWh of electricity yields 0.019 kg of H2 (63% efficiency).
            electrolyzer_convert_factor: 0.019 * 1e-3,
            co2_cost,
            co2_convert_factor,
            methanol_synthesis_cost: 42.0,
            methanol_synthesis_convert_factor: 1.0 / (balance_co2_h2 + 1.0)
                * synthesis_efficiency,
            methanol_synthesis_co2_share: co2_share,
        }
    }
}

impl ModelParameters {
    /// Mass share of H2 in the synthesis input blend.
    pub fn methanol_synthesis_h2_share(&self) -> f64 {
        1.0 - self.methanol_synthesis_co2_share
    }
}
