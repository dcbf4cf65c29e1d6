//! Expression tree.
//!
//! The arithmetic operator impls fold constants and drop identity elements
//! so that derivative trees stay small.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// A parsed or derived expression over indexed variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric constant
    Const(f64),
    /// Variable, by position in the declared variable list
    Var(usize),
    /// Negation
    Neg(Box<Expr>),
    /// Binary operation
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// One-argument function call
    Call { func: Function, arg: Box<Expr> },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    /// Operator symbol as written in equations.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 4,
        }
    }
}

/// Built-in one-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    /// Natural logarithm, spelled `log` or `ln`
    Ln,
    Log10,
    Sqrt,
    Abs,
    Sign,
}

impl Function {
    /// Look up a function by the name used in equation text.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "asin" => Some(Self::Asin),
            "acos" => Some(Self::Acos),
            "atan" => Some(Self::Atan),
            "sinh" => Some(Self::Sinh),
            "cosh" => Some(Self::Cosh),
            "tanh" => Some(Self::Tanh),
            "exp" => Some(Self::Exp),
            "log" | "ln" => Some(Self::Ln),
            "log10" => Some(Self::Log10),
            "sqrt" => Some(Self::Sqrt),
            "abs" => Some(Self::Abs),
            "sign" => Some(Self::Sign),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Exp => "exp",
            Self::Ln => "log",
            Self::Log10 => "log10",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Sign => "sign",
        }
    }
}

impl Expr {
    /// Constant expression.
    pub fn constant(value: f64) -> Self {
        Self::Const(value)
    }

    /// Variable reference.
    pub fn var(index: usize) -> Self {
        Self::Var(index)
    }

    /// Constant value, if this expression is a literal.
    pub fn as_const(&self) -> Option<f64> {
        match self {
            Self::Const(v) => Some(*v),
            _ => None,
        }
    }

    fn is_const(&self, value: f64) -> bool {
        self.as_const() == Some(value)
    }

    /// Whether the expression mentions variable `index`.
    pub fn depends_on(&self, index: usize) -> bool {
        match self {
            Self::Const(_) => false,
            Self::Var(i) => *i == index,
            Self::Neg(a) => a.depends_on(index),
            Self::Binary { lhs, rhs, .. } => lhs.depends_on(index) || rhs.depends_on(index),
            Self::Call { arg, .. } => arg.depends_on(index),
        }
    }

    /// Exponentiation with folding of `x^0`, `x^1` and constant powers.
    pub fn pow(self, exponent: Expr) -> Self {
        if exponent.is_const(0.0) {
            return Self::Const(1.0);
        }
        if exponent.is_const(1.0) {
            return self;
        }
        if let (Some(b), Some(e)) = (self.as_const(), exponent.as_const()) {
            if let Some(v) = finite(b.powf(e)) {
                return Self::Const(v);
            }
        }
        Self::binary(BinaryOp::Pow, self, exponent)
    }

    /// Function call, folded when the argument is constant.
    pub fn call(func: Function, arg: Expr) -> Self {
        if let Some(v) = arg.as_const().and_then(|a| super::eval::apply(func, a).ok()) {
            return Self::Const(v);
        }
        Self::Call {
            func,
            arg: Box::new(arg),
        }
    }

    /// Unsimplified binary node.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        match self {
            Expr::Const(v) => Expr::Const(-v),
            Expr::Neg(inner) => *inner,
            other => Expr::Neg(Box::new(other)),
        }
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        match (self.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => Expr::Const(a + b),
            (Some(a), _) if a == 0.0 => rhs,
            (_, Some(b)) if b == 0.0 => self,
            _ => Expr::binary(BinaryOp::Add, self, rhs),
        }
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        match (self.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => Expr::Const(a - b),
            (Some(a), _) if a == 0.0 => -rhs,
            (_, Some(b)) if b == 0.0 => self,
            _ => Expr::binary(BinaryOp::Sub, self, rhs),
        }
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match (self.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => Expr::Const(a * b),
            (Some(a), _) if a == 0.0 => Expr::Const(0.0),
            (_, Some(b)) if b == 0.0 => Expr::Const(0.0),
            (Some(a), _) if a == 1.0 => rhs,
            (_, Some(b)) if b == 1.0 => self,
            (Some(a), _) if a == -1.0 => -rhs,
            (_, Some(b)) if b == -1.0 => -self,
            _ => Expr::binary(BinaryOp::Mul, self, rhs),
        }
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        match (self.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) if b != 0.0 => Expr::Const(a / b),
            (Some(a), _) if a == 0.0 => Expr::Const(0.0),
            (_, Some(b)) if b == 1.0 => self,
            _ => Expr::binary(BinaryOp::Div, self, rhs),
        }
    }
}
