//! Problem files for the `raphson` command-line tool.
//!
//! A problem file is line-oriented: directives start with `.`, comments
//! with `#` or `;`, and every other non-empty line is one equation.
//!
//! ```text
//! problem   = { line }
//! line      = comment | directive | equation | empty
//! comment   = ('#' | ';') { any_char }
//! directive = ".vars" identifier+
//!           | ".guess" number+
//!           | ".tol" number
//!           | ".maxiter" integer
//!           | ".history" ("on" | "off")
//! ```
//!
//! # Example
//!
//! ```text
//! # Circle meets line
//! .vars x y
//! .guess 1 1
//! .tol 1e-10
//!
//! x^2 + y^2 - 4
//! x = y
//! ```

use crate::error::{RaphsonError, Result};
use crate::solver::SolverConfig;
use crate::symbolic::SymbolicSystem;

/// Parsed contents of a problem file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    pub variables: Vec<String>,
    pub equations: Vec<String>,
    pub initial_guess: Vec<f64>,
    pub tolerance: Option<f64>,
    pub max_iterations: Option<usize>,
    pub record_history: Option<bool>,
}

impl Problem {
    /// Build the symbolic system described by the file.
    pub fn build_system(&self) -> Result<SymbolicSystem> {
        SymbolicSystem::build(&self.variables, &self.equations)
    }

    /// Apply the file's overrides on top of `base`.
    pub fn solver_config(&self, base: SolverConfig) -> SolverConfig {
        SolverConfig {
            tolerance: self.tolerance.unwrap_or(base.tolerance),
            max_iterations: self.max_iterations.unwrap_or(base.max_iterations),
            record_history: self.record_history.unwrap_or(base.record_history),
        }
    }
}

/// Parse a problem description.
pub fn parse(input: &str) -> Result<Problem> {
    let mut problem = Problem::default();
    let mut saw_vars = false;
    let mut saw_guess = false;

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }

        let Some(directive) = text.strip_prefix('.') else {
            problem.equations.push(text.to_string());
            continue;
        };

        let mut words = directive.split_whitespace();
        let name = words.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        match name.as_str() {
            "vars" => {
                if saw_vars {
                    return Err(RaphsonError::problem_file(line, "duplicate .vars directive"));
                }
                if args.is_empty() {
                    return Err(RaphsonError::problem_file(line, ".vars needs at least one name"));
                }
                problem.variables = args.iter().map(|s| s.to_string()).collect();
                saw_vars = true;
            }
            "guess" => {
                if saw_guess {
                    return Err(RaphsonError::problem_file(line, "duplicate .guess directive"));
                }
                if args.is_empty() {
                    return Err(RaphsonError::problem_file(line, ".guess needs at least one value"));
                }
                problem.initial_guess = args
                    .iter()
                    .map(|s| parse_number(line, s))
                    .collect::<Result<_>>()?;
                saw_guess = true;
            }
            "tol" => {
                let value = single_arg(line, ".tol", &args)?;
                problem.tolerance = Some(parse_number(line, value)?);
            }
            "maxiter" => {
                let value = single_arg(line, ".maxiter", &args)?;
                let n = value.parse::<usize>().map_err(|_| {
                    RaphsonError::problem_file(line, format!("invalid iteration count: {}", value))
                })?;
                problem.max_iterations = Some(n);
            }
            "history" => {
                let value = single_arg(line, ".history", &args)?;
                problem.record_history = Some(match value.to_lowercase().as_str() {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    _ => {
                        return Err(RaphsonError::problem_file(
                            line,
                            format!("expected on or off, got {}", value),
                        ))
                    }
                });
            }
            _ => {
                return Err(RaphsonError::problem_file(
                    line,
                    format!("unknown directive: .{}", name),
                ));
            }
        }
    }

    if !saw_vars {
        return Err(RaphsonError::problem_file(0, "missing .vars directive"));
    }
    if !saw_guess {
        return Err(RaphsonError::problem_file(0, "missing .guess directive"));
    }

    Ok(problem)
}

/// Parse a problem file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<Problem> {
    let content = std::fs::read_to_string(path).map_err(|e| RaphsonError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}

fn strip_comment(line: &str) -> &str {
    match line.find(|c: char| c == '#' || c == ';') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn single_arg<'a>(line: usize, directive: &str, args: &[&'a str]) -> Result<&'a str> {
    match args {
        [value] => Ok(*value),
        _ => Err(RaphsonError::problem_file(
            line,
            format!("{} takes exactly one value", directive),
        )),
    }
}

fn parse_number(line: usize, text: &str) -> Result<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RaphsonError::problem_file(line, format!("invalid number: {}", text)))
}
