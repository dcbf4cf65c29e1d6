//! Text rendering of expression trees.

use super::ast::{BinaryOp, Expr};

const PREC_UNARY: u8 = 3;
const PREC_ATOM: u8 = 5;

impl Expr {
    /// Render in equation syntax, naming variables from `names`.
    ///
    /// The output parses back to an equivalent tree. Variables without a
    /// name are written as `x<index>`.
    pub fn render(&self, names: &[String]) -> String {
        self.render_prec(names).0
    }

    fn render_prec(&self, names: &[String]) -> (String, u8) {
        match self {
            Expr::Const(v) => {
                let text = format_number(*v);
                let prec = if *v < 0.0 { PREC_UNARY } else { PREC_ATOM };
                (text, prec)
            }
            Expr::Var(i) => {
                let text = names.get(*i).cloned().unwrap_or_else(|| format!("x{}", i));
                (text, PREC_ATOM)
            }
            Expr::Neg(a) => {
                let inner = wrap(a.render_prec(names), PREC_UNARY);
                (format!("-{}", inner), PREC_UNARY)
            }
            Expr::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                let (left_min, right_min) = match op {
                    // Left-associative: the right operand needs strictly tighter binding
                    BinaryOp::Add | BinaryOp::Mul => (prec, prec),
                    BinaryOp::Sub | BinaryOp::Div => (prec, prec + 1),
                    // Right-associative
                    BinaryOp::Pow => (prec + 1, PREC_UNARY),
                };
                let left = wrap(lhs.render_prec(names), left_min);
                let right = wrap(rhs.render_prec(names), right_min);
                (format!("{} {} {}", left, op.symbol(), right), prec)
            }
            Expr::Call { func, arg } => (format!("{}({})", func.name(), arg.render(names)), PREC_ATOM),
        }
    }
}

fn wrap((text, prec): (String, u8), min: u8) -> String {
    if prec < min {
        format!("({})", text)
    } else {
        text
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v)
    } else {
        format!("{:?}", v)
    }
}
