//! Dense linear algebra for the Newton step.
//!
//! Each Newton iteration solves `J * dx = -F`. The primary path is an LU
//! decomposition with partial pivoting. When `J` is singular (a pivot
//! vanishes) or the LU result is not finite, the solve falls back to the
//! Moore-Penrose pseudo-inverse computed from an SVD, which yields the
//! minimal-norm least-squares step.
//!
//! The fallback is reported through [`SolveMethod`] on the returned
//! [`LinearSolution`]; it is never an error.

mod lu;
mod matrix;
mod pinv;

pub use lu::LuFactors;
pub use matrix::Matrix;
pub use pinv::pseudo_inverse_solve;

use tracing::debug;

use crate::error::{RaphsonError, Result};

/// Pivot magnitude below which a matrix is treated as singular.
pub const SINGULAR_PIVOT_THRESHOLD: f64 = 1e-15;

/// Relative cutoff for small singular values in the pseudo-inverse.
pub const PINV_RCOND: f64 = 1e-15;

/// Which path produced a linear solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    /// Exact solve through LU factorization
    Lu,
    /// Least-squares solve through the SVD pseudo-inverse
    PseudoInverse,
}

/// Result of [`solve_dense`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSolution {
    /// Solution vector
    pub x: Vec<f64>,
    /// Path that produced `x`
    pub method: SolveMethod,
}

/// Solve `a * x = b`.
///
/// Square, well-conditioned systems are solved exactly. Singular and
/// non-square systems get the pseudo-inverse solution. The only failure is a
/// right-hand side whose length differs from `a.rows()`.
pub fn solve_dense(a: &Matrix, b: &[f64]) -> Result<LinearSolution> {
    if b.len() != a.rows() {
        return Err(RaphsonError::dimension_mismatch(
            "right-hand side",
            a.rows(),
            b.len(),
        ));
    }

    if let Some(x) = LuFactors::factor(a).and_then(|lu| lu.solve(b)) {
        return Ok(LinearSolution {
            x,
            method: SolveMethod::Lu,
        });
    }

    debug!(rows = a.rows(), cols = a.cols(), "LU failed, using pseudo-inverse");
    Ok(LinearSolution {
        x: pseudo_inverse_solve(a, b),
        method: SolveMethod::PseudoInverse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_solve_dense_regular() {
        let a = Matrix::from_rows(vec![vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
        let sol = solve_dense(&a, &[3.0, 5.0]).unwrap();
        assert_eq!(sol.method, SolveMethod::Lu);
        assert_abs_diff_eq!(sol.x[0], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(sol.x[1], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_dense_singular_falls_back() {
        let a = Matrix::from_rows(vec![vec![0.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let sol = solve_dense(&a, &[1.0, 2.0]).unwrap();
        assert_eq!(sol.method, SolveMethod::PseudoInverse);
        assert_abs_diff_eq!(sol.x[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sol.x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_dense_dimension_mismatch() {
        let a = Matrix::identity(3);
        let err = solve_dense(&a, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            RaphsonError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }
}
