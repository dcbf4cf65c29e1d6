//! Solve results and iteration history.

use std::fmt;

use crate::linalg::SolveMethod;

/// Snapshot of one iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// 0 for the initial guess, then one per Newton update
    pub iteration: usize,
    /// Iterate after this update
    pub x: Vec<f64>,
    /// `F(x)` at this iterate
    pub residual: Vec<f64>,
    /// `‖Δx‖₂` of the update that produced `x`; `None` for the initial guess
    pub step_norm: Option<f64>,
    /// The update `Δx`; `None` for the initial guess
    pub step: Option<Vec<f64>>,
    /// How the linear system for `Δx` was solved; `None` for the initial guess
    pub method: Option<SolveMethod>,
}

impl HistoryEntry {
    pub(crate) fn initial(x: Vec<f64>, residual: Vec<f64>) -> Self {
        Self {
            iteration: 0,
            x,
            residual,
            step_norm: None,
            step: None,
            method: None,
        }
    }

    /// Euclidean norm of the residual.
    pub fn residual_norm(&self) -> f64 {
        super::norm(&self.residual)
    }
}

/// Outcome of a Newton-Raphson solve.
///
/// Non-convergence is reported here through `converged`, not as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Final iterate
    pub solution: Vec<f64>,
    /// Number of Newton updates taken, including the converging one
    pub iterations_performed: usize,
    /// Whether a step fell below the tolerance
    pub converged: bool,
    /// Norm of the last update
    pub last_step_norm: f64,
    /// One entry per iterate, starting with the initial guess; empty unless
    /// history was requested
    pub history: Vec<HistoryEntry>,
}

impl SolveResult {
    /// Render the history as a text table with variables labelled by `names`.
    pub fn history_table<'a>(&'a self, names: &'a [String]) -> HistoryTable<'a> {
        HistoryTable {
            history: &self.history,
            names,
        }
    }
}

/// Tabular view of an iteration history.
///
/// Columns are the iteration index, one per variable, one per residual
/// component (`f1`, `f2`, ...) and the step norm, blank for the initial guess.
pub struct HistoryTable<'a> {
    history: &'a [HistoryEntry],
    names: &'a [String],
}

const CELL_WIDTH: usize = 14;

impl fmt::Display for HistoryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.history.first() else {
            return writeln!(f, "(no history recorded)");
        };

        write!(f, "{:>5}", "iter")?;
        for i in 0..first.x.len() {
            let label = self.names.get(i).cloned().unwrap_or_else(|| format!("x{}", i + 1));
            write!(f, " {:>w$}", label, w = CELL_WIDTH)?;
        }
        for i in 0..first.residual.len() {
            write!(f, " {:>w$}", format!("f{}", i + 1), w = CELL_WIDTH)?;
        }
        writeln!(f, " {:>w$}", "step_norm", w = CELL_WIDTH)?;

        for entry in self.history {
            write!(f, "{:>5}", entry.iteration)?;
            for v in entry.x.iter().chain(&entry.residual) {
                write!(f, " {:>w$.6e}", v, w = CELL_WIDTH)?;
            }
            match entry.step_norm {
                Some(norm) => writeln!(f, " {:>w$.6e}", norm, w = CELL_WIDTH)?,
                None => writeln!(f, " {:>w$}", "", w = CELL_WIDTH)?,
            }
        }
        Ok(())
    }
}
