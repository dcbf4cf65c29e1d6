//! Nonlinear system abstraction.
//!
//! A [`NonlinearSystem`] supplies the residual `F(x)` and the Jacobian
//! `J(x)` that the Newton-Raphson engine iterates on. The crate ships three
//! implementations:
//!
//! - [`FnSystem`] - a hand-written pair of closures
//! - [`SymbolicSystem`](crate::symbolic::SymbolicSystem) - built from
//!   equation strings with symbolic derivatives
//! - [`DiodeCircuit`](crate::circuit::DiodeCircuit) - the reference circuit

use crate::error::Result;
use crate::linalg::Matrix;

/// A system of equations `F(x) = 0` with an analytic Jacobian.
///
/// Implementations must be pure functions of `x`: the engine may call
/// `residual` several times at the same point and expects the same answer.
pub trait NonlinearSystem {
    /// Number of unknowns.
    fn dimension(&self) -> usize;

    /// Number of equations. Equal to [`dimension`](Self::dimension) for
    /// square systems.
    fn equation_count(&self) -> usize {
        self.dimension()
    }

    /// Evaluate `F(x)`.
    fn residual(&self, x: &[f64]) -> Result<Vec<f64>>;

    /// Evaluate `J(x)`, with `J[i][j] = dF_i / dx_j`.
    fn jacobian(&self, x: &[f64]) -> Result<Matrix>;
}

impl<S: NonlinearSystem + ?Sized> NonlinearSystem for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn equation_count(&self) -> usize {
        (**self).equation_count()
    }

    fn residual(&self, x: &[f64]) -> Result<Vec<f64>> {
        (**self).residual(x)
    }

    fn jacobian(&self, x: &[f64]) -> Result<Matrix> {
        (**self).jacobian(x)
    }
}

/// Square system defined by a residual closure and a Jacobian closure.
pub struct FnSystem<F, J> {
    dimension: usize,
    residual: F,
    jacobian: J,
}

impl<F, J> FnSystem<F, J>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
    J: Fn(&[f64]) -> Result<Matrix>,
{
    /// Create a system of `dimension` equations in `dimension` unknowns.
    pub fn new(dimension: usize, residual: F, jacobian: J) -> Self {
        Self {
            dimension,
            residual,
            jacobian,
        }
    }
}

impl<F, J> NonlinearSystem for FnSystem<F, J>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
    J: Fn(&[f64]) -> Result<Matrix>,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn residual(&self, x: &[f64]) -> Result<Vec<f64>> {
        (self.residual)(x)
    }

    fn jacobian(&self, x: &[f64]) -> Result<Matrix> {
        (self.jacobian)(x)
    }
}

impl<F, J> std::fmt::Debug for FnSystem<F, J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSystem")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_system_evaluates_closures() {
        let system = FnSystem::new(
            2,
            |x: &[f64]| Ok(vec![x[0] * x[1], x[0] - x[1]]),
            |x: &[f64]| Matrix::from_rows(vec![vec![x[1], x[0]], vec![1.0, -1.0]]),
        );

        assert_eq!(system.dimension(), 2);
        assert_eq!(system.equation_count(), 2);
        assert_eq!(system.residual(&[2.0, 3.0]).unwrap(), vec![6.0, -1.0]);

        let j = system.jacobian(&[2.0, 3.0]).unwrap();
        assert_eq!(j[(0, 0)], 3.0);
        assert_eq!(j[(0, 1)], 2.0);
    }

    #[test]
    fn test_reference_forwards() {
        let system = FnSystem::new(
            1,
            |x: &[f64]| Ok(vec![x[0] - 1.0]),
            |_: &[f64]| Ok(Matrix::identity(1)),
        );
        let by_ref: &dyn NonlinearSystem = &system;
        assert_eq!((&by_ref).residual(&[3.0]).unwrap(), vec![2.0]);
    }
}
