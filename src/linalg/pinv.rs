//! Moore-Penrose pseudo-inverse solve via SVD.

use nalgebra::{DMatrix, DVector};
use tracing::warn;

use super::{Matrix, PINV_RCOND};

/// Minimal-norm least-squares solution of `A x = b`.
///
/// Singular values at or below `PINV_RCOND * sigma_max` are treated as zero.
/// Works for any shape of `A`; `b` must have `A.rows()` entries. Never fails:
/// if the decomposition cannot be applied the zero vector is returned.
pub fn pseudo_inverse_solve(a: &Matrix, b: &[f64]) -> Vec<f64> {
    let m = DMatrix::from_row_slice(a.rows(), a.cols(), a.as_slice());
    let rhs = DVector::from_column_slice(b);

    let svd = m.svd(true, true);
    let sigma_max = svd.singular_values.max();
    let eps = PINV_RCOND * sigma_max;

    match svd.solve(&rhs, eps) {
        Ok(x) => x.iter().copied().collect(),
        Err(message) => {
            warn!(reason = message, "pseudo-inverse solve unavailable, using zero step");
            vec![0.0; a.cols()]
        }
    }
}
