//! Nonlinear systems built from equation strings.
//!
//! [`SymbolicSystem::build`] parses one expression per equation, then
//! differentiates every equation with respect to every variable to form the
//! Jacobian symbolically. Evaluation later substitutes numbers into the
//! stored trees; no finite differences are involved.
//!
//! # Example
//!
//! ```
//! use raphson_core::solver::{self, SolverConfig};
//! use raphson_core::symbolic::SymbolicSystem;
//!
//! let system = SymbolicSystem::build(&["x", "y"], &["x^2 + y^2 - 4", "x - y"]).unwrap();
//! let result = solver::solve(&system, &[1.0, 1.0], &SolverConfig::default()).unwrap();
//!
//! assert!(result.converged);
//! assert!((result.solution[0] - 2f64.sqrt()).abs() < 1e-6);
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::error::{RaphsonError, Result};
use crate::expr::{self, Expr, Function};
use crate::linalg::Matrix;
use crate::solver::{NewtonRaphson, SolveResult, SolverConfig};
use crate::system::NonlinearSystem;

/// One parsed equation.
#[derive(Debug, Clone)]
struct Equation {
    source: String,
    expr: Expr,
}

/// A system of equations with a symbolic Jacobian.
///
/// May have more equations than variables; such a system can be evaluated
/// but the Newton-Raphson engine rejects it as non-square.
#[derive(Debug, Clone)]
pub struct SymbolicSystem {
    variables: Vec<String>,
    equations: Vec<Equation>,
    /// `jacobian[i][j]` = d equation_i / d variable_j
    jacobian: Vec<Vec<Expr>>,
}

impl SymbolicSystem {
    /// Parse `equations` over `variables` and derive the Jacobian.
    ///
    /// # Errors
    ///
    /// - [`RaphsonError::InvalidVariable`] for an empty variable list or a
    ///   name that is not an identifier or collides with a function name
    /// - [`RaphsonError::DuplicateVariable`] for a repeated name
    /// - [`RaphsonError::DimensionMismatch`] if there are fewer equations
    ///   than variables
    /// - [`RaphsonError::ParseError`] or [`RaphsonError::UnknownSymbol`] for
    ///   an equation that does not parse
    pub fn build<V, E>(variables: &[V], equations: &[E]) -> Result<Self>
    where
        V: AsRef<str>,
        E: AsRef<str>,
    {
        let variables = validate_variables(variables)?;

        if equations.len() < variables.len() {
            return Err(RaphsonError::dimension_mismatch(
                "equations (at least one per variable)",
                variables.len(),
                equations.len(),
            ));
        }

        let equations = equations
            .iter()
            .map(|source| {
                let source = source.as_ref().trim().to_string();
                let expr = expr::parse_equation(&source, &variables)?;
                Ok(Equation { source, expr })
            })
            .collect::<Result<Vec<_>>>()?;

        let jacobian: Vec<Vec<Expr>> = equations
            .iter()
            .map(|eq| (0..variables.len()).map(|j| eq.expr.derivative(j)).collect())
            .collect();

        debug!(
            variables = variables.len(),
            equations = equations.len(),
            "built symbolic system"
        );

        Ok(Self {
            variables,
            equations,
            jacobian,
        })
    }

    /// Variable names, in unknown-vector order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Equation strings as given (trimmed).
    pub fn equations(&self) -> impl Iterator<Item = &str> {
        self.equations.iter().map(|eq| eq.source.as_str())
    }

    /// The symbolic Jacobian rendered as text, one row per equation.
    pub fn jacobian_expressions(&self) -> Vec<Vec<String>> {
        self.jacobian
            .iter()
            .map(|row| row.iter().map(|d| d.render(&self.variables)).collect())
            .collect()
    }

    /// Pair each variable name with its value in `x`.
    pub fn assignments<'a>(&'a self, x: &'a [f64]) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.variables
            .iter()
            .map(String::as_str)
            .zip(x.iter().copied())
    }

    /// Solve the system with Newton-Raphson.
    pub fn solve(&self, initial_guess: &[f64], config: &SolverConfig) -> Result<SolveResult> {
        NewtonRaphson::new(*config).solve(self, initial_guess)
    }

    fn check_point(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.variables.len() {
            return Err(RaphsonError::dimension_mismatch(
                "point",
                self.variables.len(),
                x.len(),
            ));
        }
        Ok(())
    }
}

impl NonlinearSystem for SymbolicSystem {
    fn dimension(&self) -> usize {
        self.variables.len()
    }

    fn equation_count(&self) -> usize {
        self.equations.len()
    }

    fn residual(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_point(x)?;
        self.equations
            .iter()
            .map(|eq| {
                eq.expr
                    .eval(x)
                    .map_err(|e| RaphsonError::evaluation(&eq.source, e.message))
            })
            .collect()
    }

    fn jacobian(&self, x: &[f64]) -> Result<Matrix> {
        self.check_point(x)?;
        let rows = self.equations.len();
        let cols = self.variables.len();
        let mut j = Matrix::zeros(rows, cols);
        for (i, row) in self.jacobian.iter().enumerate() {
            for (k, derivative) in row.iter().enumerate() {
                let value = derivative.eval(x).map_err(|e| {
                    RaphsonError::evaluation(
                        format!(
                            "d({})/d{}",
                            self.equations[i].source, self.variables[k]
                        ),
                        e.message,
                    )
                })?;
                j.set(i, k, value);
            }
        }
        Ok(j)
    }
}

fn validate_variables<V: AsRef<str>>(variables: &[V]) -> Result<Vec<String>> {
    if variables.is_empty() {
        return Err(RaphsonError::InvalidVariable {
            name: String::new(),
            message: "at least one variable is required".to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(variables.len());
    for name in variables {
        let name = name.as_ref().trim();
        if !expr::is_valid_identifier(name) {
            return Err(RaphsonError::InvalidVariable {
                name: name.to_string(),
                message: "not an identifier".to_string(),
            });
        }
        if Function::from_name(name).is_some() {
            return Err(RaphsonError::InvalidVariable {
                name: name.to_string(),
                message: "collides with a function name".to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(RaphsonError::DuplicateVariable {
                name: name.to_string(),
            });
        }
        names.push(name.to_string());
    }
    Ok(names)
}
