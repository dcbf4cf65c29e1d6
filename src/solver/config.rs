//! Solver configuration.

use super::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use crate::error::{RaphsonError, Result};

/// Settings for one Newton-Raphson solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Convergence threshold on the Euclidean norm of the Newton step
    pub tolerance: f64,
    /// Maximum number of Newton updates
    pub max_iterations: usize,
    /// Whether to keep a snapshot of every iterate
    pub record_history: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            record_history: false,
        }
    }
}

impl SolverConfig {
    /// Set the step-norm tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable or disable history recording.
    pub fn with_history(mut self, record_history: bool) -> Self {
        self.record_history = record_history;
        self
    }

    /// Check that the tolerance is positive and finite and the cap is non-zero.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(RaphsonError::invalid_config(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(RaphsonError::invalid_config(
                "max_iterations must be at least 1",
            ));
        }
        Ok(())
    }
}
