//! Solver-neutral linear program representation.
//!
//! The network builder emits into this structure; each backend lowers it
//! to its own input format (in-process columns for HiGHS, an LP file for
//! the subprocess solvers). Variables are identified by insertion order.

/// Handle to one decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in the solution vector.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One decision variable with its bounds and objective coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
}

/// Right-hand side of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowBound {
    Eq(f64),
    Le(f64),
    Ge(f64),
}

/// One constraint row as a sparse linear expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub bound: RowBound,
    pub terms: Vec<(VarId, f64)>,
}

/// A minimization LP over non-negative (by convention) variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProgram {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        objective: f64,
    ) -> VarId {
        let id = VarId(self.columns.len());
        self.columns.push(Column {
            name: name.into(),
            lower,
            upper,
            objective,
        });
        id
    }

    pub fn add_row(&mut self, name: impl Into<String>, bound: RowBound, terms: Vec<(VarId, f64)>) {
        self.rows.push(Row {
            name: name.into(),
            bound,
            terms,
        });
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_vars(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn var_name(&self, var: VarId) -> &str {
        &self.columns[var.0].name
    }

    /// Objective value of a candidate solution vector.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(values)
            .map(|(column, value)| column.objective * value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_are_identified_by_insertion_order() {
        let mut lp = LinearProgram::new();
        let a = lp.add_var("a", 0.0, f64::INFINITY, 1.0);
        let b = lp.add_var("b", 0.0, 10.0, 2.0);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(lp.var_name(b), "b");
        assert_eq!(lp.num_vars(), 2);
    }

    #[test]
    fn objective_is_a_dot_product() {
        let mut lp = LinearProgram::new();
        lp.add_var("a", 0.0, f64::INFINITY, 1.5);
        lp.add_var("b", 0.0, f64::INFINITY, 2.0);
        assert_eq!(lp.objective_value(&[2.0, 3.0]), 9.0);
    }

    #[test]
    fn rows_keep_their_sparse_terms() {
        let mut lp = LinearProgram::new();
        let a = lp.add_var("a", 0.0, f64::INFINITY, 0.0);
        let b = lp.add_var("b", 0.0, f64::INFINITY, 0.0);
        lp.add_row("balance", RowBound::Eq(4.0), vec![(a, 1.0), (b, -2.0)]);
        assert_eq!(lp.num_rows(), 1);
        assert_eq!(lp.rows()[0].bound, RowBound::Eq(4.0));
        assert_eq!(lp.rows()[0].terms.len(), 2);
    }
}
