//! # Raphson Core
//!
//! A multivariate Newton-Raphson solver for systems of nonlinear equations.
//!
//! This library provides:
//! - A dense linear solver (LU with partial pivoting, SVD pseudo-inverse fallback)
//! - The [`NonlinearSystem`] trait with closure-based and symbolic implementations
//! - A Newton-Raphson engine with optional per-iteration history
//! - A small expression language with symbolic differentiation
//! - A diode-circuit reference system
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`linalg`] - Dense matrices and linear solves
//! - [`system`] - The nonlinear-system abstraction
//! - [`solver`] - Newton-Raphson iteration and results
//! - [`expr`] - Equation parsing, evaluation and differentiation
//! - [`symbolic`] - Systems built from equation strings
//! - [`circuit`] - Diode-circuit reference system
//! - [`problem`] - Problem files for the `raphson` CLI
//!
//! ## Usage
//!
//! ### Library
//!
//! ```
//! use raphson_core::{SolverConfig, SymbolicSystem};
//!
//! let system = SymbolicSystem::build(&["x", "y"], &["x^2 + y^2 - 4", "x - y"]).unwrap();
//! let result = system.solve(&[1.0, 1.0], &SolverConfig::default()).unwrap();
//! assert!(result.converged);
//! ```
//!
//! ### Native CLI
//!
//! ```bash
//! raphson system circle.nr --history --jacobian
//! raphson diode --vs 5 --r 1000
//! ```
//!
//! ## Solution Method
//!
//! Each iteration solves `J(x) Δx = -F(x)` and updates `x ← x + Δx` until
//! `‖Δx‖₂` drops below the tolerance or the iteration cap is reached. A
//! singular Jacobian falls back to the minimum-norm least-squares step.

pub mod circuit;
pub mod error;
pub mod expr;
pub mod linalg;
pub mod problem;
pub mod solver;
pub mod symbolic;
pub mod system;

// Re-export main types for convenience
pub use error::{RaphsonError, Result};
pub use linalg::Matrix;
pub use solver::{NewtonRaphson, SolveResult, SolverConfig};
pub use symbolic::SymbolicSystem;
pub use system::{FnSystem, NonlinearSystem};
