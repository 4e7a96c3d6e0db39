//! Vendor solvers driven as subprocesses.
//!
//! Gurobi and CPLEX are licensed binaries that cannot be linked in; both
//! are fed an LP file in a scratch directory and report back through a
//! solution file plus their console log. The internal solve time is
//! scraped from the log and becomes NaN when the expected line is absent,
//! never an error.

use crate::backend::{SolveOutcome, SolverBackend};
use crate::lp::LinearProgram;
use crate::lp_file::render_lp;
use meo_core::{MeoError, MeoResult, ParamValue, SolverKind, SolverParams};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;
use tracing::debug;

/// Gurobi via `gurobi_cl`.
pub struct GurobiBackend;

/// CPLEX via its interactive optimizer.
pub struct CplexBackend;

impl SolverBackend for GurobiBackend {
    fn solve(&self, lp: &LinearProgram, params: &SolverParams) -> MeoResult<SolveOutcome> {
        let binary = locate(SolverKind::Gurobi)?;
        let dir = tempfile::tempdir()?;
        let problem = dir.path().join("problem.lp");
        let solution = dir.path().join("solution.sol");
        fs::write(&problem, render_lp(lp))?;

        let mut command = Command::new(binary);
        command.arg(format!("ResultFile={}", solution.display()));
        for (key, value) in params.iter() {
            command.arg(format!("{key}={value}"));
        }
        command.arg(&problem);

        let log = run_captured(command, "gurobi_cl")?;
        if log.contains("Model is infeasible") || log.contains("Infeasible model") {
            return Err(MeoError::Solve("gurobi: model is infeasible".into()));
        }
        if !solution.exists() {
            return Err(MeoError::Solve(
                "gurobi finished without writing a solution file".into(),
            ));
        }

        let text = fs::read_to_string(&solution)?;
        let values = assign_values(lp, parse_gurobi_sol(&text))?;
        let objective = lp.objective_value(&values);
        let runtime_solver = scrape_runtime(gurobi_runtime_regex(), &log);
        debug!(objective, runtime_solver, "gurobi solve finished");

        Ok(SolveOutcome {
            values,
            objective,
            runtime_solver,
        })
    }
}

impl SolverBackend for CplexBackend {
    fn solve(&self, lp: &LinearProgram, params: &SolverParams) -> MeoResult<SolveOutcome> {
        let binary = locate(SolverKind::Cplex)?;
        let dir = tempfile::tempdir()?;
        let problem = dir.path().join("problem.lp");
        let solution = dir.path().join("solution.sol");
        fs::write(&problem, render_lp(lp))?;

        let mut command = Command::new(binary);
        command.arg("-c");
        command.arg(format!("read {}", problem.display()));
        for (key, value) in params.iter() {
            command.arg(cplex_set_command(key, value));
        }
        command.arg("optimize");
        command.arg(format!("write {}", solution.display()));

        let log = run_captured(command, "cplex")?;
        if !solution.exists() {
            let reason = if log.to_lowercase().contains("infeasible") {
                "cplex: model is infeasible"
            } else {
                "cplex finished without writing a solution file"
            };
            return Err(MeoError::Solve(reason.into()));
        }

        let text = fs::read_to_string(&solution)?;
        let values = assign_values(lp, parse_cplex_sol(&text)?)?;
        let objective = lp.objective_value(&values);
        let runtime_solver = scrape_runtime(cplex_runtime_regex(), &log);
        debug!(objective, runtime_solver, "cplex solve finished");

        Ok(SolveOutcome {
            values,
            objective,
            runtime_solver,
        })
    }
}

fn locate(kind: SolverKind) -> MeoResult<PathBuf> {
    let Some(name) = kind.binary_name() else {
        return Err(MeoError::Config(format!(
            "solver '{kind}' does not run as a subprocess"
        )));
    };
    which::which(name).map_err(|_| {
        MeoError::Config(format!("solver '{kind}' requires '{name}' on the PATH"))
    })
}

/// Run the solver and return its combined console output. A non-zero exit
/// is a solve failure carrying the log tail.
fn run_captured(mut command: Command, name: &str) -> MeoResult<String> {
    let output = command
        .output()
        .map_err(|err| MeoError::Solve(format!("failed to launch {name}: {err}")))?;
    let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
    log.push_str(&String::from_utf8_lossy(&output.stderr));
    if !output.status.success() {
        let tail: String = log.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
        return Err(MeoError::Solve(format!(
            "{name} exited with {}: {tail}",
            output.status
        )));
    }
    Ok(log)
}

/// Gurobi `.sol`: one `name value` pair per line, `#` comments.
fn parse_gurobi_sol(text: &str) -> HashMap<String, f64> {
    let mut values = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((name, value)) = line.split_once(char::is_whitespace) {
            if let Ok(value) = value.trim().parse::<f64>() {
                values.insert(name.to_string(), value);
            }
        }
    }
    values
}

/// CPLEX `.sol`: an XML document with one `<variable name=.. value=..>`
/// element per column.
fn parse_cplex_sol(text: &str) -> MeoResult<HashMap<String, f64>> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(text);
    let mut values = HashMap::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(element)) | Ok(Event::Start(element))
                if element.name().as_ref() == b"variable" =>
            {
                let mut name = None;
                let mut value = None;
                for attribute in element.attributes().flatten() {
                    match attribute.key.as_ref() {
                        b"name" => {
                            name = Some(String::from_utf8_lossy(&attribute.value).into_owned())
                        }
                        b"value" => {
                            value = String::from_utf8_lossy(&attribute.value).parse::<f64>().ok()
                        }
                        _ => {}
                    }
                }
                if let (Some(name), Some(value)) = (name, value) {
                    values.insert(name, value);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(MeoError::Parse(format!(
                    "malformed cplex solution file: {err}"
                )))
            }
        }
    }
    Ok(values)
}

/// Order the name-keyed solution values into the LP's variable order.
/// Solvers may omit variables at zero.
fn assign_values(lp: &LinearProgram, by_name: HashMap<String, f64>) -> MeoResult<Vec<f64>> {
    if by_name.is_empty() {
        return Err(MeoError::Solve("solution file holds no variables".into()));
    }
    Ok(lp
        .columns()
        .iter()
        .map(|column| by_name.get(&column.name).copied().unwrap_or(0.0))
        .collect())
}

/// Dotted parameter keys become the interactive optimizer's word-separated
/// `set` command, e.g. `simplex.perturbation.constant` turns into
/// `set simplex perturbation constant <v>`.
fn cplex_set_command(key: &str, value: &ParamValue) -> String {
    let rendered = match value {
        ParamValue::Bool(true) => "y".to_string(),
        ParamValue::Bool(false) => "n".to_string(),
        other => other.to_string(),
    };
    format!("set {} {rendered}", key.replace('.', " "))
}

fn scrape_runtime(regex: &Regex, log: &str) -> f64 {
    regex
        .captures(log)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(f64::NAN)
}

fn gurobi_runtime_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"Solved in \d+ iterations and ([0-9.]+) seconds").unwrap()
    })
}

fn cplex_runtime_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"Solution time =\s*([0-9.]+) sec").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::RowBound;

    fn two_var_lp() -> LinearProgram {
        let mut lp = LinearProgram::new();
        let a = lp.add_var("alpha", 0.0, f64::INFINITY, 1.0);
        let b = lp.add_var("beta", 0.0, f64::INFINITY, 1.0);
        lp.add_row("r0", RowBound::Ge(1.0), vec![(a, 1.0), (b, 1.0)]);
        lp
    }

    #[test]
    fn gurobi_sol_parses_and_orders_by_lp_columns() {
        let text = "# Solution for model obj\n# Objective value = 2.5\nbeta 2.5\nalpha 0\n";
        let values = assign_values(&two_var_lp(), parse_gurobi_sol(text)).unwrap();
        assert_eq!(values, vec![0.0, 2.5]);
    }

    #[test]
    fn omitted_variables_default_to_zero() {
        let text = "beta 1.25\n";
        let values = assign_values(&two_var_lp(), parse_gurobi_sol(text)).unwrap();
        assert_eq!(values, vec![0.0, 1.25]);
    }

    #[test]
    fn empty_solution_file_is_a_solve_error() {
        let result = assign_values(&two_var_lp(), HashMap::new());
        assert!(matches!(result, Err(MeoError::Solve(_))));
    }

    #[test]
    fn cplex_sol_xml_parses() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<CPLEXSolution version="1.2">
 <header problemName="problem.lp" objectiveValue="2.5"/>
 <variables>
  <variable name="alpha" index="0" value="1"/>
  <variable name="beta" index="1" value="1.5"/>
 </variables>
</CPLEXSolution>"#;
        let values = assign_values(&two_var_lp(), parse_cplex_sol(text).unwrap()).unwrap();
        assert_eq!(values, vec![1.0, 1.5]);
    }

    #[test]
    fn malformed_cplex_sol_is_a_parse_error() {
        let result = parse_cplex_sol("<variables><variable name=\"a\"");
        assert!(matches!(result, Err(MeoError::Parse(_))));
    }

    #[test]
    fn runtime_is_scraped_from_the_vendor_log() {
        let gurobi = "Iteration log...\nSolved in 1234 iterations and 2.08 seconds (0.5 work units)\nOptimal objective  1e3\n";
        assert_eq!(scrape_runtime(gurobi_runtime_regex(), gurobi), 2.08);

        let cplex = "...\nSolution time =    0.43 sec.  Iterations = 120\n";
        assert_eq!(scrape_runtime(cplex_runtime_regex(), cplex), 0.43);

        assert!(scrape_runtime(gurobi_runtime_regex(), "no such line").is_nan());
    }

    #[test]
    fn binaryless_solver_cannot_be_located() {
        let result = locate(SolverKind::Highs);
        assert!(matches!(result, Err(MeoError::Config(_))));
    }

    #[test]
    fn cplex_set_commands_expand_dotted_keys() {
        assert_eq!(
            cplex_set_command("simplex.perturbation.constant", &ParamValue::Float(1e-6)),
            "set simplex perturbation constant 0.000001"
        );
        assert_eq!(
            cplex_set_command("simplex.perturbation.indicator", &ParamValue::Bool(true)),
            "set simplex perturbation indicator y"
        );
    }
}
