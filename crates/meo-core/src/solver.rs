//! Solver selection and tuning parameters.
//!
//! The supported solvers form a closed enum rather than an open
//! string-keyed registry. Each solver carries a typed default parameter
//! set; caller-supplied overrides always win on key conflict.

use crate::error::{MeoError, MeoResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Supported LP solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// HiGHS, solved in-process. Always available.
    #[default]
    Highs,
    /// Gurobi via the `gurobi_cl` command-line tool.
    Gurobi,
    /// CPLEX via the `cplex` interactive optimizer.
    Cplex,
}

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Highs => "highs",
            SolverKind::Gurobi => "gurobi",
            SolverKind::Cplex => "cplex",
        }
    }

    /// Name of the vendor executable, for solvers that run as a subprocess.
    pub fn binary_name(&self) -> Option<&'static str> {
        match self {
            SolverKind::Highs => None,
            SolverKind::Gurobi => Some("gurobi_cl"),
            SolverKind::Cplex => Some("cplex"),
        }
    }

    pub fn all() -> &'static [SolverKind] {
        &[SolverKind::Highs, SolverKind::Gurobi, SolverKind::Cplex]
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SolverKind {
    type Err = MeoError;

    fn from_str(s: &str) -> MeoResult<Self> {
        match s.to_lowercase().as_str() {
            "highs" => Ok(SolverKind::Highs),
            "gurobi" => Ok(SolverKind::Gurobi),
            "cplex" => Ok(SolverKind::Cplex),
            _ => Err(MeoError::Config(format!("unknown solver '{s}'"))),
        }
    }
}

/// A single solver tuning value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "{v}"),
        }
    }
}

/// Ordered set of solver tuning parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    entries: BTreeMap<String, ParamValue>,
}

impl SolverParams {
    /// Tuned defaults per solver, recovered with the vendors' own tuning
    /// tools on representative pixel problems.
    pub fn defaults(kind: SolverKind) -> Self {
        let mut params = SolverParams::default();
        match kind {
            SolverKind::Highs => {}
            SolverKind::Gurobi => {
                params.set("BarHomogeneous", ParamValue::Int(1));
                params.set("ScaleFlag", ParamValue::Int(0));
                params.set("Method", ParamValue::Int(2));
                params.set("Aggregate", ParamValue::Int(2));
                params.set("AggFill", ParamValue::Int(0));
                params.set("PrePasses", ParamValue::Int(8));
            }
            SolverKind::Cplex => {
                params.set(
                    "simplex.perturbation.constant",
                    ParamValue::Float(1e-6),
                );
                params.set("simplex.perturbation.indicator", ParamValue::Bool(true));
            }
        }
        params
    }

    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Merge `overrides` on top of `self`; override keys always win.
    pub fn merged_with(mut self, overrides: &BTreeMap<String, ParamValue>) -> Self {
        for (key, value) in overrides {
            self.entries.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
