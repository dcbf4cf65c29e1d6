//! Newton-Raphson iteration for square nonlinear systems.

use tracing::{debug, info, instrument, warn};

use super::config::SolverConfig;
use super::norm;
use super::result::{HistoryEntry, SolveResult};
use crate::error::{RaphsonError, Result};
use crate::linalg::{solve_dense, LinearSolution, Matrix, SolveMethod};
use crate::system::NonlinearSystem;

/// Newton-Raphson solver.
///
/// Holds only configuration; every call to [`solve`](Self::solve) starts
/// from scratch and returns its own [`SolveResult`].
#[derive(Debug, Clone, Default)]
pub struct NewtonRaphson {
    config: SolverConfig,
}

impl NewtonRaphson {
    /// Create a solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solve `F(x) = 0` starting from `initial_guess`.
    ///
    /// Each iteration solves `J(x) Δx = -F(x)`, updates `x ← x + Δx` and
    /// stops as soon as `‖Δx‖₂ < tolerance`. A singular Jacobian is handled
    /// by the pseudo-inverse step and iteration continues.
    ///
    /// # Errors
    ///
    /// - [`RaphsonError::InvalidConfig`] for a bad tolerance or iteration cap
    /// - [`RaphsonError::DimensionMismatch`] if the system is not square, the
    ///   guess has the wrong length, or the system returns wrongly sized values
    /// - [`RaphsonError::NonFiniteValue`] if a residual, Jacobian or step
    ///   contains NaN or infinity
    /// - any error returned by the system itself, unchanged
    ///
    /// Running out of iterations is not an error: the result has
    /// `converged == false`.
    #[instrument(skip_all, fields(n = system.dimension(), max_iterations = self.config.max_iterations))]
    pub fn solve<S>(&self, system: &S, initial_guess: &[f64]) -> Result<SolveResult>
    where
        S: NonlinearSystem + ?Sized,
    {
        self.config.validate()?;

        let n = system.dimension();
        if system.equation_count() != n {
            return Err(RaphsonError::dimension_mismatch(
                "equation count (system must be square)",
                n,
                system.equation_count(),
            ));
        }
        if initial_guess.len() != n {
            return Err(RaphsonError::dimension_mismatch(
                "initial guess",
                n,
                initial_guess.len(),
            ));
        }
        check_finite(initial_guess, "initial guess", 0)?;

        let mut x = initial_guess.to_vec();
        let mut history = Vec::new();

        // Residual at the current x, when already known from the history snapshot
        let mut pending_residual = None;

        if self.config.record_history {
            let residual = evaluate_residual(system, &x, 0)?;
            history.push(HistoryEntry::initial(x.clone(), residual.clone()));
            pending_residual = Some(residual);
        }

        let mut last_step_norm = f64::INFINITY;

        for iter in 0..self.config.max_iterations {
            let f = match pending_residual.take() {
                Some(f) => f,
                None => evaluate_residual(system, &x, iter)?,
            };
            let j = evaluate_jacobian(system, &x, iter)?;

            let rhs: Vec<f64> = f.iter().map(|v| -v).collect();
            let LinearSolution { x: step, method } = solve_dense(&j, &rhs)?;
            if method == SolveMethod::PseudoInverse {
                debug!(iteration = iter + 1, "singular Jacobian, taking pseudo-inverse step");
            }
            check_finite(&step, "step", iter + 1)?;

            for (xi, dxi) in x.iter_mut().zip(&step) {
                *xi += dxi;
            }
            let step_norm = norm(&step);
            last_step_norm = step_norm;
            debug!(iteration = iter + 1, step_norm, "newton update");

            if self.config.record_history {
                let residual = evaluate_residual(system, &x, iter + 1)?;
                history.push(HistoryEntry {
                    iteration: iter + 1,
                    x: x.clone(),
                    residual: residual.clone(),
                    step_norm: Some(step_norm),
                    step: Some(step),
                    method: Some(method),
                });
                pending_residual = Some(residual);
            }

            if step_norm < self.config.tolerance {
                info!(iterations = iter + 1, step_norm, "converged");
                return Ok(SolveResult {
                    solution: x,
                    iterations_performed: iter + 1,
                    converged: true,
                    last_step_norm,
                    history,
                });
            }
        }

        warn!(
            iterations = self.config.max_iterations,
            last_step_norm, "iteration limit reached without convergence"
        );
        Ok(SolveResult {
            solution: x,
            iterations_performed: self.config.max_iterations,
            converged: false,
            last_step_norm,
            history,
        })
    }
}

/// Solve `F(x) = 0` with a one-off solver.
pub fn solve<S>(system: &S, initial_guess: &[f64], config: &SolverConfig) -> Result<SolveResult>
where
    S: NonlinearSystem + ?Sized,
{
    NewtonRaphson::new(*config).solve(system, initial_guess)
}

fn evaluate_residual<S>(system: &S, x: &[f64], iteration: usize) -> Result<Vec<f64>>
where
    S: NonlinearSystem + ?Sized,
{
    let f = system.residual(x)?;
    if f.len() != system.equation_count() {
        return Err(RaphsonError::dimension_mismatch(
            "residual length",
            system.equation_count(),
            f.len(),
        ));
    }
    check_finite(&f, "residual", iteration)?;
    Ok(f)
}

fn evaluate_jacobian<S>(system: &S, x: &[f64], iteration: usize) -> Result<Matrix>
where
    S: NonlinearSystem + ?Sized,
{
    let j = system.jacobian(x)?;
    let n = system.dimension();
    if j.rows() != n {
        return Err(RaphsonError::dimension_mismatch("jacobian rows", n, j.rows()));
    }
    if j.cols() != n {
        return Err(RaphsonError::dimension_mismatch("jacobian columns", n, j.cols()));
    }
    if let Some(index) = j.first_non_finite() {
        return Err(RaphsonError::NonFiniteValue {
            quantity: "jacobian",
            iteration,
            index,
        });
    }
    Ok(j)
}

fn check_finite(values: &[f64], quantity: &'static str, iteration: usize) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(RaphsonError::NonFiniteValue {
            quantity,
            iteration,
            index,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::FnSystem;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::SQRT_2;

    /// x^2 + y^2 = 4 intersected with x = y.
    fn circle_line() -> impl NonlinearSystem {
        FnSystem::new(
            2,
            |x: &[f64]| Ok(vec![x[0] * x[0] + x[1] * x[1] - 4.0, x[0] - x[1]]),
            |x: &[f64]| Matrix::from_rows(vec![vec![2.0 * x[0], 2.0 * x[1]], vec![1.0, -1.0]]),
        )
    }

    /// tan(x) = 0, y = cos(10x): oscillates badly from (1, 1).
    fn tan_cos() -> impl NonlinearSystem {
        FnSystem::new(
            2,
            |x: &[f64]| Ok(vec![x[0].tan(), x[1] - (10.0 * x[0]).cos()]),
            |x: &[f64]| {
                Matrix::from_rows(vec![
                    vec![1.0 / x[0].cos().powi(2), 0.0],
                    vec![10.0 * (10.0 * x[0]).sin(), 1.0],
                ])
            },
        )
    }

    #[test]
    fn test_circle_line_positive_root() {
        let result = solve(&circle_line(), &[1.0, 1.0], &SolverConfig::default()).unwrap();

        assert!(result.converged);
        assert_abs_diff_eq!(result.solution[0], SQRT_2, epsilon = 1e-6);
        assert_abs_diff_eq!(result.solution[1], SQRT_2, epsilon = 1e-6);
        // Five updates, the fifth being the one that drops below tolerance
        assert_eq!(result.iterations_performed, 5);
        assert!(result.last_step_norm < 1e-6);
        assert!(result.history.is_empty());
    }

    #[test]
    fn test_circle_line_negative_root() {
        let result = solve(&circle_line(), &[-1.0, -1.0], &SolverConfig::default()).unwrap();

        assert!(result.converged);
        assert_abs_diff_eq!(result.solution[0], -SQRT_2, epsilon = 1e-6);
        assert_abs_diff_eq!(result.solution[1], -SQRT_2, epsilon = 1e-6);
    }

    #[test]
    fn test_residual_small_at_solution() {
        let system = circle_line();
        let result = solve(&system, &[1.0, 1.0], &SolverConfig::default()).unwrap();
        let f = system.residual(&result.solution).unwrap();
        assert!(norm(&f) < 1e-6);
    }

    #[test]
    fn test_no_convergence_within_cap() {
        let config = SolverConfig::default().with_max_iterations(5);
        let result = solve(&tan_cos(), &[1.0, 1.0], &config).unwrap();

        assert!(!result.converged);
        assert_eq!(result.iterations_performed, 5);
    }

    #[test]
    fn test_history_length_invariant() {
        let config = SolverConfig::default().with_history(true);
        let result = solve(&circle_line(), &[1.0, 1.0], &config).unwrap();
        assert_eq!(result.history.len(), result.iterations_performed + 1);

        let config = SolverConfig::default().with_history(true).with_max_iterations(5);
        let result = solve(&tan_cos(), &[1.0, 1.0], &config).unwrap();
        assert_eq!(result.history.len(), 6);
    }

    #[test]
    fn test_history_contents() {
        let config = SolverConfig::default().with_history(true);
        let result = solve(&circle_line(), &[1.0, 1.0], &config).unwrap();

        let first = &result.history[0];
        assert_eq!(first.iteration, 0);
        assert_eq!(first.x, vec![1.0, 1.0]);
        assert_eq!(first.residual, vec![-2.0, 0.0]);
        assert_eq!(first.step_norm, None);
        assert_eq!(first.step, None);

        let second = &result.history[1];
        assert_eq!(second.iteration, 1);
        assert_abs_diff_eq!(second.x[0], 1.5, epsilon = 1e-15);
        assert_abs_diff_eq!(second.step_norm.unwrap(), 0.5_f64.sqrt(), epsilon = 1e-15);
        assert_eq!(second.method, Some(SolveMethod::Lu));
        assert_eq!(second.step.as_ref().unwrap().len(), 2);

        for (k, entry) in result.history.iter().enumerate() {
            assert_eq!(entry.iteration, k);
        }
        assert_eq!(result.history.last().unwrap().x, result.solution);
    }

    #[test]
    fn test_history_snapshots_are_independent() {
        let system = circle_line();
        let config = SolverConfig::default().with_history(true);
        let mut result = solve(&system, &[1.0, 1.0], &config).unwrap();

        // Each snapshot is the previous one plus its own step, and its
        // residual was evaluated at that point
        for k in 1..result.history.len() {
            let prev = &result.history[k - 1];
            let entry = &result.history[k];
            let step = entry.step.as_ref().unwrap();
            let expected: Vec<f64> = prev.x.iter().zip(step).map(|(x, dx)| x + dx).collect();
            assert_eq!(entry.x, expected);
            assert_eq!(entry.residual, system.residual(&entry.x).unwrap());
            assert_eq!(entry.step_norm, Some(norm(step)));
        }

        let stored = result.history.last().unwrap().x.clone();
        result.solution[0] = 100.0;
        assert_eq!(result.history.last().unwrap().x, stored);
    }

    #[test]
    fn test_history_does_not_change_outcome() {
        let plain = solve(&circle_line(), &[1.0, 1.0], &SolverConfig::default()).unwrap();
        let traced = solve(
            &circle_line(),
            &[1.0, 1.0],
            &SolverConfig::default().with_history(true),
        )
        .unwrap();

        assert_eq!(plain.solution, traced.solution);
        assert_eq!(plain.iterations_performed, traced.iterations_performed);
    }

    #[test]
    fn test_deterministic() {
        let solver = NewtonRaphson::new(SolverConfig::default().with_history(true));
        let system = circle_line();
        let a = solver.solve(&system, &[0.3, 2.0]).unwrap();
        let b = solver.solve(&system, &[0.3, 2.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_iteration_cap_respected() {
        for cap in 1..=4 {
            let config = SolverConfig::default().with_max_iterations(cap);
            let result = solve(&circle_line(), &[1.0, 1.0], &config).unwrap();
            assert!(!result.converged);
            assert_eq!(result.iterations_performed, cap);
        }
    }

    #[test]
    fn test_singular_jacobian_recovers() {
        // J = [[2x, 0], [0, 1]] is singular at x = 0
        let system = FnSystem::new(
            2,
            |x: &[f64]| Ok(vec![x[0] * x[0] - 1.0, x[1] - 1.0]),
            |x: &[f64]| Matrix::from_rows(vec![vec![2.0 * x[0], 0.0], vec![0.0, 1.0]]),
        );
        let config = SolverConfig::default().with_history(true);
        let result = solve(&system, &[0.0, 0.0], &config).unwrap();

        assert_eq!(result.history[1].method, Some(SolveMethod::PseudoInverse));
        assert_abs_diff_eq!(result.solution[1], 1.0, epsilon = 1e-12);
        assert_eq!(result.solution[0], 0.0);
        assert_eq!(result.history.len(), result.iterations_performed + 1);
    }

    #[test]
    fn test_zero_jacobian_does_not_raise() {
        let system = FnSystem::new(
            1,
            |x: &[f64]| Ok(vec![x[0] * x[0] + 1.0]),
            |_: &[f64]| Ok(Matrix::zeros(1, 1)),
        );
        let config = SolverConfig::default().with_max_iterations(3);
        let result = solve(&system, &[0.5], &config).unwrap();
        // Zero step counts as converged in step-norm terms
        assert!(result.converged);
        assert_eq!(result.solution, vec![0.5]);
    }

    #[test]
    fn test_dimension_mismatch_guess() {
        let err = solve(&circle_line(), &[1.0], &SolverConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            RaphsonError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_jacobian_shape() {
        let system = FnSystem::new(
            2,
            |x: &[f64]| Ok(vec![x[0], x[1]]),
            |_: &[f64]| Ok(Matrix::identity(3)),
        );
        let err = solve(&system, &[1.0, 1.0], &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, RaphsonError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SolverConfig::default().with_tolerance(-1.0);
        let err = solve(&circle_line(), &[1.0, 1.0], &config).unwrap_err();
        assert!(matches!(err, RaphsonError::InvalidConfig { .. }));
    }

    #[test]
    fn test_nan_residual_fails_solve() {
        let system = FnSystem::new(
            1,
            |x: &[f64]| Ok(vec![x[0].ln()]),
            |x: &[f64]| Ok(Matrix::from_rows(vec![vec![1.0 / x[0]]])?),
        );
        let err = solve(&system, &[-1.0], &SolverConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            RaphsonError::NonFiniteValue {
                quantity: "residual",
                iteration: 0,
                index: 0,
            }
        ));
    }

    #[test]
    fn test_nan_jacobian_fails_solve() {
        // Finite at the guess, NaN once the first update lands on x = 1
        let system = FnSystem::new(
            1,
            |x: &[f64]| Ok(vec![x[0] - 1.0]),
            |x: &[f64]| {
                let slope = if x[0] > 0.5 { f64::NAN } else { 1.0 };
                Matrix::from_rows(vec![vec![slope]])
            },
        );
        let err = solve(&system, &[0.0], &SolverConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            RaphsonError::NonFiniteValue {
                quantity: "jacobian",
                iteration: 1,
                index: 0,
            }
        ));
    }

    #[test]
    fn test_system_error_propagates() {
        let system = FnSystem::new(
            1,
            |_: &[f64]| Err(RaphsonError::evaluation("f", "boom")),
            |_: &[f64]| Ok(Matrix::identity(1)),
        );
        let err = solve(&system, &[1.0], &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, RaphsonError::Evaluation { .. }));
    }
}
