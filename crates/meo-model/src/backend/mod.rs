//! Solver backends.
//!
//! HiGHS runs in-process and is always available; Gurobi and CPLEX run as
//! vendor subprocesses fed an LP file. All backends consume the same
//! solver-neutral program and the caller never sees which path was taken.

use crate::lp::LinearProgram;
use meo_core::{MeoResult, SolverKind, SolverParams};

mod highs;
mod subprocess;

pub use self::highs::HighsBackend;
pub use self::subprocess::{CplexBackend, GurobiBackend};

/// Result of one successful solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// One value per LP variable, in insertion order.
    pub values: Vec<f64>,
    pub objective: f64,
    /// Solver-internal solve time in seconds, scraped from the vendor log;
    /// NaN when the backend does not report one.
    pub runtime_solver: f64,
}

impl SolveOutcome {
    pub fn value(&self, var: crate::lp::VarId) -> f64 {
        self.values[var.index()]
    }
}

/// A way of solving one LP to optimality.
pub trait SolverBackend: Send + Sync {
    fn solve(&self, lp: &LinearProgram, params: &SolverParams) -> MeoResult<SolveOutcome>;
}

/// The backend implementing `kind`.
pub fn backend_for(kind: SolverKind) -> Box<dyn SolverBackend> {
    match kind {
        SolverKind::Highs => Box::new(HighsBackend),
        SolverKind::Gurobi => Box::new(GurobiBackend),
        SolverKind::Cplex => Box::new(CplexBackend),
    }
}
