//! Symbolic differentiation.

use std::f64::consts::LN_10;

use super::ast::{BinaryOp, Expr, Function};

impl Expr {
    /// Partial derivative with respect to variable `var`.
    ///
    /// The result is built with the folding operators, so derivatives of
    /// polynomial and exponential terms come out in compact form.
    pub fn derivative(&self, var: usize) -> Expr {
        if !self.depends_on(var) {
            return Expr::Const(0.0);
        }

        match self {
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Var(i) => Expr::Const(if *i == var { 1.0 } else { 0.0 }),
            Expr::Neg(a) => -a.derivative(var),
            Expr::Binary { op, lhs, rhs } => {
                let f = lhs.as_ref();
                let g = rhs.as_ref();
                match op {
                    BinaryOp::Add => f.derivative(var) + g.derivative(var),
                    BinaryOp::Sub => f.derivative(var) - g.derivative(var),
                    BinaryOp::Mul => {
                        f.derivative(var) * g.clone() + f.clone() * g.derivative(var)
                    }
                    BinaryOp::Div => {
                        if !g.depends_on(var) {
                            f.derivative(var) / g.clone()
                        } else {
                            (f.derivative(var) * g.clone() - f.clone() * g.derivative(var))
                                / g.clone().pow(Expr::Const(2.0))
                        }
                    }
                    BinaryOp::Pow => power_rule(f, g, var),
                }
            }
            Expr::Call { func, arg } => {
                chain_rule(*func, arg.as_ref()) * arg.derivative(var)
            }
        }
    }
}

/// d/dv f^g for the three cases of which side depends on v.
fn power_rule(f: &Expr, g: &Expr, var: usize) -> Expr {
    let df = f.derivative(var);
    let dg = g.derivative(var);

    if !g.depends_on(var) {
        // g * f^(g-1) * f'
        g.clone() * f.clone().pow(g.clone() - Expr::Const(1.0)) * df
    } else if !f.depends_on(var) {
        // f^g * ln(f) * g'
        f.clone().pow(g.clone()) * Expr::call(Function::Ln, f.clone()) * dg
    } else {
        // f^g * (g' ln(f) + g f' / f)
        f.clone().pow(g.clone())
            * (dg * Expr::call(Function::Ln, f.clone()) + g.clone() * df / f.clone())
    }
}

/// Outer derivative f'(a) of a built-in function.
fn chain_rule(func: Function, a: &Expr) -> Expr {
    let a = a.clone();
    let one = || Expr::Const(1.0);
    let square = |e: Expr| e.pow(Expr::Const(2.0));

    match func {
        Function::Sin => Expr::call(Function::Cos, a),
        Function::Cos => -Expr::call(Function::Sin, a),
        Function::Tan => one() / square(Expr::call(Function::Cos, a)),
        Function::Asin => one() / Expr::call(Function::Sqrt, one() - square(a)),
        Function::Acos => -(one() / Expr::call(Function::Sqrt, one() - square(a))),
        Function::Atan => one() / (one() + square(a)),
        Function::Sinh => Expr::call(Function::Cosh, a),
        Function::Cosh => Expr::call(Function::Sinh, a),
        Function::Tanh => one() - square(Expr::call(Function::Tanh, a)),
        Function::Exp => Expr::call(Function::Exp, a),
        Function::Ln => one() / a,
        Function::Log10 => one() / (a * Expr::Const(LN_10)),
        Function::Sqrt => one() / (Expr::Const(2.0) * Expr::call(Function::Sqrt, a)),
        Function::Abs => Expr::call(Function::Sign, a),
        // Piecewise constant
        Function::Sign => Expr::Const(0.0),
    }
}
