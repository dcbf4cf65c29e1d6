//! Symbolic expressions for equation strings.
//!
//! Equations are written in a small infix language:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `1`, `2.5`, `1e-12`, `.5` | Numbers |
//! | `x`, `I_1`, `VD` | Declared variables |
//! | `pi`, `e` | Constants (a declared variable with the same name wins) |
//! | `+ - * /` | Arithmetic |
//! | `^` or `**` | Power, right-associative |
//! | `sin(...)`, `exp(...)`, ... | One-argument functions |
//! | `lhs = rhs` | Same as `lhs - (rhs)` |
//!
//! Supported functions: `sin cos tan asin acos atan sinh cosh tanh exp
//! log ln log10 sqrt abs sign`. `log` is the natural logarithm.
//!
//! # Example
//!
//! ```
//! use raphson_core::expr;
//!
//! let vars = vec!["x".to_string(), "y".to_string()];
//! let f = expr::parse_equation("x^2 + y^2 = 4", &vars).unwrap();
//! let df_dx = f.derivative(0);
//!
//! assert_eq!(f.eval(&[2.0, 0.0]).unwrap(), 0.0);
//! assert_eq!(df_dx.eval(&[2.0, 0.0]).unwrap(), 4.0);
//! ```

mod ast;
mod derive;
mod eval;
mod lexer;
mod parser;
mod render;

pub use ast::{BinaryOp, Expr, Function};
pub use eval::DomainError;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, MAX_DEPTH};

use crate::error::Result;

/// Parse one equation string over the given variable names.
pub fn parse_equation(input: &str, variables: &[String]) -> Result<Expr> {
    let mut parser = Parser::new(input, variables)?;
    parser.parse_equation()
}

/// Whether `name` can be declared as a variable.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}
