//! LP-format rendering for the subprocess backends.
//!
//! Both `gurobi_cl` and the CPLEX interactive optimizer read the same LP
//! file dialect. Variables default to `0 <= x < +inf` in that format, so
//! only non-default bounds are written out.

use crate::lp::{LinearProgram, Row, RowBound};
use std::fmt::Write;

/// Render the program as an LP-format string.
pub fn render_lp(lp: &LinearProgram) -> String {
    let mut out = String::new();
    out.push_str("Minimize\n obj:");
    let mut first = true;
    for column in lp.columns() {
        if column.objective != 0.0 {
            push_term(&mut out, &mut first, column.objective, &column.name);
        }
    }
    if first {
        out.push_str(" 0");
    }
    out.push('\n');

    out.push_str("Subject To\n");
    for row in lp.rows() {
        push_row(&mut out, lp, row);
    }

    let mut bounds = String::new();
    for column in lp.columns() {
        let default = column.lower == 0.0 && column.upper == f64::INFINITY;
        if !default {
            if column.upper == f64::INFINITY {
                writeln!(bounds, " {} >= {}", column.name, column.lower).unwrap();
            } else {
                writeln!(bounds, " {} <= {} <= {}", column.lower, column.name, column.upper)
                    .unwrap();
            }
        }
    }
    if !bounds.is_empty() {
        out.push_str("Bounds\n");
        out.push_str(&bounds);
    }

    out.push_str("End\n");
    out
}

fn push_row(out: &mut String, lp: &LinearProgram, row: &Row) {
    write!(out, " {}:", row.name).unwrap();
    let mut first = true;
    for &(var, coefficient) in &row.terms {
        push_term(out, &mut first, coefficient, lp.var_name(var));
    }
    let (op, rhs) = match row.bound {
        RowBound::Eq(rhs) => ("=", rhs),
        RowBound::Le(rhs) => ("<=", rhs),
        RowBound::Ge(rhs) => (">=", rhs),
    };
    writeln!(out, " {op} {rhs}").unwrap();
}

fn push_term(out: &mut String, first: &mut bool, coefficient: f64, name: &str) {
    let sign = if coefficient < 0.0 {
        " -"
    } else if *first {
        ""
    } else {
        " +"
    };
    write!(out, "{sign} {} {name}", coefficient.abs()).unwrap();
    *first = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::LinearProgram;

    #[test]
    fn renders_objective_rows_and_bounds() {
        let mut lp = LinearProgram::new();
        let a = lp.add_var("alpha", 0.0, f64::INFINITY, 2.5);
        let b = lp.add_var("beta", 1.0, 4.0, 0.0);
        lp.add_row("r0", RowBound::Eq(3.0), vec![(a, 1.0), (b, -2.0)]);
        lp.add_row("r1", RowBound::Le(0.0), vec![(b, 1.0)]);

        let text = render_lp(&lp);
        assert!(text.starts_with("Minimize\n obj: 2.5 alpha\n"));
        assert!(text.contains(" r0: 1 alpha - 2 beta = 3\n"));
        assert!(text.contains(" r1: 1 beta <= 0\n"));
        assert!(text.contains("Bounds\n 1 <= beta <= 4\n"));
        assert!(text.ends_with("End\n"));
        // default-bounded variables get no Bounds entry
        assert!(!text.contains("alpha >="));
    }

    #[test]
    fn empty_objective_still_parses() {
        let mut lp = LinearProgram::new();
        let a = lp.add_var("x", 0.0, f64::INFINITY, 0.0);
        lp.add_row("r0", RowBound::Ge(1.0), vec![(a, 1.0)]);
        let text = render_lp(&lp);
        assert!(text.contains("obj: 0\n"));
        assert!(text.contains(" r0: 1 x >= 1\n"));
    }
}
