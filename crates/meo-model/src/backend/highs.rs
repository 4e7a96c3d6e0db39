//! In-process HiGHS backend.

use crate::backend::{SolveOutcome, SolverBackend};
use crate::lp::{LinearProgram, RowBound};
use highs::{HighsModelStatus, RowProblem, Sense};
use meo_core::{MeoError, MeoResult, ParamValue, SolverParams};
use tracing::trace;

/// Solves in-process through the bundled HiGHS library. The default
/// backend; needs no vendor installation.
pub struct HighsBackend;

impl SolverBackend for HighsBackend {
    fn solve(&self, lp: &LinearProgram, params: &SolverParams) -> MeoResult<SolveOutcome> {
        let mut problem = RowProblem::default();

        let cols: Vec<highs::Col> = lp
            .columns()
            .iter()
            .map(|column| {
                if column.upper == f64::INFINITY {
                    problem.add_column(column.objective, column.lower..)
                } else {
                    problem.add_column(column.objective, column.lower..column.upper)
                }
            })
            .collect();

        for row in lp.rows() {
            let terms: Vec<(highs::Col, f64)> = row
                .terms
                .iter()
                .map(|&(var, coefficient)| (cols[var.index()], coefficient))
                .collect();
            match row.bound {
                RowBound::Eq(rhs) => problem.add_row(rhs..=rhs, terms),
                RowBound::Le(rhs) => problem.add_row(..=rhs, terms),
                RowBound::Ge(rhs) => problem.add_row(rhs.., terms),
            };
        }

        let mut model = problem.optimise(Sense::Minimise);
        model.set_option("output_flag", false);
        for (key, value) in params.iter() {
            match value {
                ParamValue::Bool(v) => model.set_option(key, *v),
                ParamValue::Int(v) => model.set_option(key, *v as i32),
                ParamValue::Float(v) => model.set_option(key, *v),
                ParamValue::Str(v) => model.set_option(key, v.as_str()),
            }
        }

        let solved = model
            .try_solve()
            .map_err(|status| MeoError::Solve(format!("highs returned status {status:?}")))?;
        match solved.status() {
            HighsModelStatus::Optimal => {}
            status => {
                return Err(MeoError::Solve(format!(
                    "highs finished without an optimal solution: {status:?}"
                )))
            }
        }

        let values: Vec<f64> = solved.get_solution().columns().to_vec();
        let objective = lp.objective_value(&values);
        trace!(objective, n_vars = values.len(), "highs solve finished");

        Ok(SolveOutcome {
            values,
            objective,
            // HiGHS exposes no separate internal timer through this path.
            runtime_solver: f64::NAN,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn solves_a_two_variable_program() {
        // min 2a + 3b  st  a + b >= 4, a <= 1.5
        let mut lp = LinearProgram::new();
        let a = lp.add_var("a", 0.0, 1.5, 2.0);
        let b = lp.add_var("b", 0.0, f64::INFINITY, 3.0);
        lp.add_row("demand", RowBound::Ge(4.0), vec![(a, 1.0), (b, 1.0)]);

        let outcome = HighsBackend.solve(&lp, &SolverParams::default()).unwrap();
        assert_approx_eq!(f64, outcome.value(a), 1.5, epsilon = 1e-6);
        assert_approx_eq!(f64, outcome.value(b), 2.5, epsilon = 1e-6);
        assert_approx_eq!(f64, outcome.objective, 10.5, epsilon = 1e-6);
        assert!(outcome.runtime_solver.is_nan());
    }

    #[test]
    fn infeasible_program_is_a_solve_error() {
        // x <= 1 and x >= 2 cannot both hold
        let mut lp = LinearProgram::new();
        let x = lp.add_var("x", 0.0, 1.0, 1.0);
        lp.add_row("floor", RowBound::Ge(2.0), vec![(x, 1.0)]);

        let result = HighsBackend.solve(&lp, &SolverParams::default());
        assert!(matches!(result, Err(MeoError::Solve(_))));
    }

    #[test]
    fn equality_rows_are_honored() {
        let mut lp = LinearProgram::new();
        let x = lp.add_var("x", 0.0, f64::INFINITY, 1.0);
        let y = lp.add_var("y", 0.0, f64::INFINITY, 1.0);
        lp.add_row("pin", RowBound::Eq(3.0), vec![(x, 1.0), (y, 2.0)]);

        let outcome = HighsBackend.solve(&lp, &SolverParams::default()).unwrap();
        assert_approx_eq!(
            f64,
            outcome.value(x) + 2.0 * outcome.value(y),
            3.0,
            epsilon = 1e-6
        );
    }
}
