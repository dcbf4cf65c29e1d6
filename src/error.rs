//! Error types for the Raphson solver.
//!
//! This module provides a unified error type [`RaphsonError`] that covers
//! every failure that can occur while parsing equations, validating inputs
//! and running a solve.
//!
//! A singular Jacobian is not an error (the pseudo-inverse takes over), and
//! neither is non-convergence, which is reported in
//! [`SolveResult::converged`](crate::solver::SolveResult::converged).

use thiserror::Error;

/// Result type alias using [`RaphsonError`].
pub type Result<T> = std::result::Result<T, RaphsonError>;

/// Unified error type for all Raphson operations.
#[derive(Error, Debug)]
pub enum RaphsonError {
    // ============ Equation Parsing Errors ============
    /// Malformed equation string
    #[error("Parse error in '{expression}' at column {position}: {message}")]
    ParseError {
        expression: String,
        position: usize,
        message: String,
    },

    /// Identifier that is neither a declared variable nor a known constant
    #[error("Unknown symbol '{symbol}' in '{expression}'")]
    UnknownSymbol { symbol: String, expression: String },

    /// Variable declared more than once
    #[error("Duplicate variable name '{name}'")]
    DuplicateVariable { name: String },

    /// Variable name that cannot be used as a symbol
    #[error("Invalid variable name '{name}': {message}")]
    InvalidVariable { name: String, message: String },

    // ============ Evaluation Errors ============
    /// Domain failure while evaluating an expression at a point
    #[error("Evaluation of '{expression}' failed: {message}")]
    Evaluation { expression: String, message: String },

    /// NaN or infinity produced by a system during a solve
    #[error("Non-finite {quantity} at iteration {iteration} (index {index})")]
    NonFiniteValue {
        quantity: &'static str,
        iteration: usize,
        index: usize,
    },

    // ============ Input Validation Errors ============
    /// Vector, matrix or equation counts that do not line up
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid solver setting
    #[error("Invalid solver configuration: {message}")]
    InvalidConfig { message: String },

    /// Invalid physical parameter
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // ============ Problem File Errors ============
    /// Malformed problem file
    #[error("Problem file error at line {line}: {message}")]
    ProblemFile { line: usize, message: String },

    /// Error reading a problem file
    #[error("Failed to read problem file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RaphsonError {
    /// Create a parse error
    pub fn parse(expression: impl Into<String>, position: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            expression: expression.into(),
            position,
            message: message.into(),
        }
    }

    /// Create an evaluation error
    pub fn evaluation(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a problem file error
    pub fn problem_file(line: usize, message: impl Into<String>) -> Self {
        Self::ProblemFile {
            line,
            message: message.into(),
        }
    }

    /// Whether this error came from reading equation text rather than solving.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::ParseError { .. } | Self::UnknownSymbol { .. } | Self::ProblemFile { .. }
        )
    }
}
