//! Newton-Raphson engine.
//!
//! For a system `F(x) = 0` with Jacobian `J(x)`, each iteration:
//!
//! 1. Evaluates `F(x)` and `J(x)`
//! 2. Solves `J Δx = -F` (LU, or the pseudo-inverse when `J` is singular)
//! 3. Updates `x ← x + Δx`
//! 4. Stops when `‖Δx‖₂ < tolerance`
//!
//! ```text
//! Init ──► Iterating ──► Converged
//!              │
//!              └───────► Exhausted (converged = false)
//! ```
//!
//! The iteration that produces the small step counts towards
//! `iterations_performed`, and a recorded history has exactly
//! `iterations_performed + 1` entries.

mod config;
mod newton;
mod result;

pub use config::SolverConfig;
pub use newton::{solve, NewtonRaphson};
pub use result::{HistoryEntry, HistoryTable, SolveResult};

/// Default convergence tolerance on the step norm.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default maximum number of Newton updates.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Euclidean norm.
pub(crate) fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
