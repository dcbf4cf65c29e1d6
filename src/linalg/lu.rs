//! LU decomposition with partial pivoting.

use super::{Matrix, SINGULAR_PIVOT_THRESHOLD};

/// Packed LU factors of a square matrix: unit-lower L below the diagonal,
/// U on and above it.
#[derive(Debug, Clone)]
pub struct LuFactors {
    lu: Vec<f64>,
    pivots: Vec<usize>,
    size: usize,
}

impl LuFactors {
    /// Factor a square matrix.
    ///
    /// Returns `None` when the matrix is not square or a pivot falls below
    /// [`SINGULAR_PIVOT_THRESHOLD`].
    pub fn factor(a: &Matrix) -> Option<Self> {
        if !a.is_square() {
            return None;
        }

        let n = a.rows();
        let mut lu = a.as_slice().to_vec();
        let mut pivots: Vec<usize> = (0..n).collect();

        for k in 0..n {
            // Find pivot
            let mut max_val = lu[k * n + k].abs();
            let mut max_row = k;

            for i in (k + 1)..n {
                let val = lu[i * n + k].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            if max_val.is_nan() || max_val < SINGULAR_PIVOT_THRESHOLD {
                return None;
            }

            if max_row != k {
                pivots.swap(k, max_row);
                for j in 0..n {
                    lu.swap(k * n + j, max_row * n + j);
                }
            }

            // Eliminate
            let pivot = lu[k * n + k];
            for i in (k + 1)..n {
                let factor = lu[i * n + k] / pivot;
                lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    lu[i * n + j] -= factor * lu[k * n + j];
                }
            }
        }

        Some(Self { lu, pivots, size: n })
    }

    /// Solve `A x = b` with the stored factors.
    ///
    /// Returns `None` if `b` has the wrong length or the result is not finite.
    pub fn solve(&self, b: &[f64]) -> Option<Vec<f64>> {
        let n = self.size;
        if b.len() != n {
            return None;
        }

        // Apply pivot permutation
        let mut x: Vec<f64> = self.pivots.iter().map(|&p| b[p]).collect();

        // Forward substitution (L * y = Pb)
        for i in 0..n {
            for j in 0..i {
                x[i] -= self.lu[i * n + j] * x[j];
            }
        }

        // Back substitution (U * x = y)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                x[i] -= self.lu[i * n + j] * x[j];
            }
            x[i] /= self.lu[i * n + i];
        }

        x.iter().all(|v| v.is_finite()).then_some(x)
    }
}
