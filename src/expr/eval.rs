//! Numeric evaluation of expression trees.

use std::fmt;

use super::ast::{BinaryOp, Expr, Function};

/// Domain failure while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainError {
    pub message: String,
}

impl DomainError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DomainError {}

impl Expr {
    /// Evaluate with `x[i]` substituted for variable `i`.
    ///
    /// Fails on division by zero, arguments outside a function's real domain,
    /// and any intermediate that overflows to infinity or NaN. The caller
    /// must supply a value for every variable index in the tree.
    pub fn eval(&self, x: &[f64]) -> Result<f64, DomainError> {
        let value = match self {
            Expr::Const(v) => *v,
            Expr::Var(i) => match x.get(*i) {
                Some(v) => *v,
                None => return Err(DomainError::new(format!("no value for variable #{}", i))),
            },
            Expr::Neg(a) => -a.eval(x)?,
            Expr::Binary { op, lhs, rhs } => {
                let l = lhs.eval(x)?;
                let r = rhs.eval(x)?;
                binary(*op, l, r)?
            }
            Expr::Call { func, arg } => apply(*func, arg.eval(x)?)?,
        };
        check_finite(value)
    }
}

fn binary(op: BinaryOp, l: f64, r: f64) -> Result<f64, DomainError> {
    match op {
        BinaryOp::Add => Ok(l + r),
        BinaryOp::Sub => Ok(l - r),
        BinaryOp::Mul => Ok(l * r),
        BinaryOp::Div => {
            if r == 0.0 {
                Err(DomainError::new("division by zero"))
            } else {
                Ok(l / r)
            }
        }
        BinaryOp::Pow => {
            if l == 0.0 && r < 0.0 {
                Err(DomainError::new("zero raised to a negative power"))
            } else if l < 0.0 && r.fract() != 0.0 {
                Err(DomainError::new(format!(
                    "negative base {} raised to non-integer power {}",
                    l, r
                )))
            } else {
                Ok(l.powf(r))
            }
        }
    }
}

/// Apply a built-in function to a real argument.
pub(crate) fn apply(func: Function, a: f64) -> Result<f64, DomainError> {
    let value = match func {
        Function::Sin => a.sin(),
        Function::Cos => a.cos(),
        Function::Tan => a.tan(),
        Function::Asin | Function::Acos if !(-1.0..=1.0).contains(&a) => {
            return Err(DomainError::new(format!(
                "{} argument {} outside [-1, 1]",
                func.name(),
                a
            )));
        }
        Function::Asin => a.asin(),
        Function::Acos => a.acos(),
        Function::Atan => a.atan(),
        Function::Sinh => a.sinh(),
        Function::Cosh => a.cosh(),
        Function::Tanh => a.tanh(),
        Function::Exp => a.exp(),
        Function::Ln | Function::Log10 if a <= 0.0 => {
            return Err(DomainError::new(format!(
                "logarithm of non-positive value {}",
                a
            )));
        }
        Function::Ln => a.ln(),
        Function::Log10 => a.log10(),
        Function::Sqrt if a < 0.0 => {
            return Err(DomainError::new(format!("square root of negative value {}", a)));
        }
        Function::Sqrt => a.sqrt(),
        Function::Abs => a.abs(),
        Function::Sign => {
            if a > 0.0 {
                1.0
            } else if a < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
    };
    check_finite(value)
}

fn check_finite(value: f64) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::new(format!("non-finite result {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn x() -> Expr {
        Expr::var(0)
    }

    #[test]
    fn test_eval_arithmetic() {
        // (x + 2) * x - x / 4
        let e = Expr::binary(
            BinaryOp::Sub,
            Expr::binary(
                BinaryOp::Mul,
                Expr::binary(BinaryOp::Add, x(), Expr::constant(2.0)),
                x(),
            ),
            Expr::binary(BinaryOp::Div, x(), Expr::constant(4.0)),
        );
        assert_abs_diff_eq!(e.eval(&[2.0]).unwrap(), 7.5, epsilon = 1e-15);
    }

    #[test]
    fn test_eval_functions() {
        let e = Expr::call(Function::Exp, Expr::call(Function::Ln, x()));
        assert_abs_diff_eq!(e.eval(&[3.5]).unwrap(), 3.5, epsilon = 1e-12);
        assert_eq!(Expr::call(Function::Sign, x()).eval(&[-2.0]).unwrap(), -1.0);
    }

    #[test]
    fn test_eval_negative_base_integer_power() {
        let e = Expr::binary(BinaryOp::Pow, x(), Expr::constant(3.0));
        assert_eq!(e.eval(&[-2.0]).unwrap(), -8.0);
    }

    #[test]
    fn test_domain_errors() {
        let div = Expr::binary(BinaryOp::Div, Expr::constant(1.0), x());
        assert!(div.eval(&[0.0]).is_err());

        let log = Expr::call(Function::Ln, x());
        let err = log.eval(&[-1.0]).unwrap_err();
        assert!(err.message.contains("logarithm"));

        assert!(Expr::call(Function::Sqrt, x()).eval(&[-4.0]).is_err());
        assert!(Expr::call(Function::Asin, x()).eval(&[1.5]).is_err());

        let root = Expr::binary(BinaryOp::Pow, x(), Expr::constant(0.5));
        assert!(root.eval(&[-4.0]).is_err());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let e = Expr::call(Function::Exp, x());
        assert!(e.eval(&[1000.0]).is_err());
    }

    #[test]
    fn test_missing_variable() {
        assert!(Expr::var(3).eval(&[1.0]).is_err());
    }
}
