//! Parser for equation strings.
//!
//! ```text
//! equation = expr [ '=' expr ]
//! expr     = term { ('+' | '-') term }
//! term     = unary { ('*' | '/') unary }
//! unary    = ('+' | '-') unary | power
//! power    = primary [ ('^' | '**') unary ]
//! primary  = number | identifier | function '(' expr ')' | '(' expr ')'
//! ```
//!
//! Power is right-associative and binds tighter than unary minus, so
//! `-x^2` is `-(x^2)` and `2^-1` is `2^(-1)`.
//!
//! Both the parser's own recursion and the height of the tree it builds
//! are capped at [`MAX_DEPTH`]. Evaluation and differentiation walk the
//! tree recursively, so anything deeper is rejected up front.

use std::f64::consts::{E, PI};

use super::ast::{BinaryOp, Expr, Function};
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{RaphsonError, Result};

/// Maximum nesting of parentheses and unary operators, and maximum height
/// of a parsed expression tree.
pub const MAX_DEPTH: usize = 256;

/// An expression together with the height of its tree.
type Node = (Expr, usize);

/// Parser for a single equation over a fixed variable list.
pub struct Parser<'a> {
    tokens: std::vec::IntoIter<Token>,
    input: &'a str,
    variables: &'a [String],
    current: Token,
    nesting: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser for `input`; identifiers resolve against `variables`.
    pub fn new(input: &'a str, variables: &'a [String]) -> Result<Self> {
        let mut tokens = Lexer::new(input).tokenize()?.into_iter();
        let current = tokens
            .next()
            .ok_or_else(|| RaphsonError::parse(input, 1, "empty equation"))?;
        Ok(Self {
            tokens,
            input,
            variables,
            current,
            nesting: 0,
        })
    }

    /// Parse the whole input as an equation.
    ///
    /// `lhs = rhs` is returned as `lhs - (rhs)`.
    pub fn parse_equation(&mut self) -> Result<Expr> {
        if self.current.kind == TokenKind::Eof {
            return Err(self.error("empty equation"));
        }

        let (lhs, lhs_height) = self.parse_expr()?;
        let expr = if self.current.kind == TokenKind::Equals {
            self.advance();
            let (rhs, rhs_height) = self.parse_expr()?;
            self.check_height(lhs_height.max(rhs_height) + 1)?;
            Expr::binary(BinaryOp::Sub, lhs, rhs)
        } else {
            lhs
        };

        if self.current.kind != TokenKind::Eof {
            return Err(self.error(format!("unexpected '{}'", self.current.text)));
        }
        Ok(expr)
    }

    // The token stream always ends with Eof, which is never consumed
    fn advance(&mut self) {
        if let Some(token) = self.tokens.next() {
            self.current = token;
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance();
            Ok(tok)
        } else {
            Err(self.error(format!("expected {}, got {}", what, self.describe_current())))
        }
    }

    fn error(&self, message: impl Into<String>) -> RaphsonError {
        RaphsonError::parse(self.input, self.current.column, message)
    }

    fn too_deep(&self) -> RaphsonError {
        self.error("expression nested too deeply")
    }

    fn check_height(&self, height: usize) -> Result<usize> {
        if height > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(height)
    }

    fn describe_current(&self) -> String {
        match self.current.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.current.text),
        }
    }

    fn binary(&self, op: BinaryOp, (lhs, lh): Node, (rhs, rh): Node) -> Result<Node> {
        let height = self.check_height(lh.max(rh) + 1)?;
        Ok((Expr::binary(op, lhs, rhs), height))
    }

    fn parse_expr(&mut self) -> Result<Node> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    fn parse_term(&mut self) -> Result<Node> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    fn parse_unary(&mut self) -> Result<Node> {
        // Every parenthesis, sign and exponent passes through here
        if self.nesting >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.nesting += 1;
        let node = self.parse_unary_inner();
        self.nesting -= 1;
        node
    }

    fn parse_unary_inner(&mut self) -> Result<Node> {
        match self.current.kind {
            TokenKind::Minus => {
                self.advance();
                let (inner, height) = self.parse_unary()?;
                let height = self.check_height(height + 1)?;
                Ok((Expr::Neg(Box::new(inner)), height))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Node> {
        let base = self.parse_primary()?;
        if self.current.kind == TokenKind::Caret {
            self.advance();
            let exponent = self.parse_unary()?;
            return self.binary(BinaryOp::Pow, base, exponent);
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node> {
        match self.current.kind {
            TokenKind::Number => {
                let text = self.current.text.clone();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| self.error(format!("invalid number '{}'", text)))?;
                self.advance();
                Ok((Expr::Const(value), 1))
            }
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::OpenParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.error(format!("expected a value, got {}", self.describe_current()))),
        }
    }

    fn parse_identifier(&mut self) -> Result<Node> {
        let name = self.current.text.clone();

        // Declared variables shadow constants
        if let Some(index) = self.variables.iter().position(|v| *v == name) {
            self.advance();
            return Ok((Expr::Var(index), 1));
        }

        if let Some(func) = Function::from_name(&name) {
            self.advance();
            if self.current.kind != TokenKind::OpenParen {
                return Err(self.error(format!("function '{}' needs an argument in parentheses", name)));
            }
            self.advance();
            let (arg, height) = self.parse_expr()?;
            self.expect(TokenKind::CloseParen, "')'")?;
            let height = self.check_height(height + 1)?;
            return Ok((
                Expr::Call {
                    func,
                    arg: Box::new(arg),
                },
                height,
            ));
        }

        let constant = match name.as_str() {
            "pi" => Some(PI),
            "e" | "E" => Some(E),
            _ => None,
        };
        if let Some(value) = constant {
            self.advance();
            return Ok((Expr::Const(value), 1));
        }

        Err(RaphsonError::UnknownSymbol {
            symbol: name,
            expression: self.input.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn parse(input: &str, names: &[&str]) -> Result<Expr> {
        let variables = vars(names);
        Parser::new(input, &variables)?.parse_equation()
    }

    #[test]
    fn test_parse_precedence() {
        let e = parse("1 + 2 * 3 ^ 2", &[]).unwrap();
        assert_eq!(e.eval(&[]).unwrap(), 19.0);

        let e = parse("(1 + 2) * 3", &[]).unwrap();
        assert_eq!(e.eval(&[]).unwrap(), 9.0);

        let e = parse("8 / 4 / 2", &[]).unwrap();
        assert_eq!(e.eval(&[]).unwrap(), 1.0);

        let e = parse("10 - 4 - 3", &[]).unwrap();
        assert_eq!(e.eval(&[]).unwrap(), 3.0);
    }

    #[test]
    fn test_parse_power_associativity() {
        // 2^3^2 = 2^9
        let e = parse("2^3^2", &[]).unwrap();
        assert_eq!(e.eval(&[]).unwrap(), 512.0);

        let e = parse("-x**2", &["x"]).unwrap();
        assert_eq!(e.eval(&[3.0]).unwrap(), -9.0);

        let e = parse("2^-1", &[]).unwrap();
        assert_eq!(e.eval(&[]).unwrap(), 0.5);
    }

    #[test]
    fn test_parse_variables_and_functions() {
        let e = parse("x^2 + y^2 - 4", &["x", "y"]).unwrap();
        assert_eq!(e.eval(&[1.0, 1.0]).unwrap(), -2.0);

        let e = parse("exp(VD / Vt) - 1", &["VD", "Vt"]).unwrap();
        assert!((e.eval(&[0.0, 1.0]).unwrap()).abs() < 1e-15);
    }

    #[test]
    fn test_parse_equals_moves_rhs() {
        let e = parse("x^2 = 4", &["x"]).unwrap();
        assert_eq!(e.eval(&[2.0]).unwrap(), 0.0);
        assert_eq!(e.eval(&[3.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_parse_constants_and_shadowing() {
        let e = parse("cos(pi)", &[]).unwrap();
        assert!((e.eval(&[]).unwrap() + 1.0).abs() < 1e-15);

        // A variable named e hides Euler's number
        let e = parse("e + 1", &["e"]).unwrap();
        assert_eq!(e.eval(&[2.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_parse_unknown_symbol() {
        let err = parse("x + z", &["x"]).unwrap_err();
        match err {
            RaphsonError::UnknownSymbol { symbol, expression } => {
                assert_eq!(symbol, "z");
                assert_eq!(expression, "x + z");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_malformed() {
        for input in ["x +", "(x", "x y", "sin x", "", "x = = 1", "* x"] {
            let err = parse(input, &["x", "y"]).unwrap_err();
            match err {
                RaphsonError::ParseError { expression, .. } => assert_eq!(expression, input),
                other => panic!("unexpected error for {input:?}: {other:?}"),
            }
        }
    }

    fn assert_too_deep(input: &str) {
        match parse(input, &["x"]).unwrap_err() {
            RaphsonError::ParseError {
                expression,
                message,
                ..
            } => {
                assert_eq!(expression, input);
                assert_eq!(message, "expression nested too deeply");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_deep_parentheses_rejected() {
        let input = format!("{}x{}", "(".repeat(1000), ")".repeat(1000));
        assert_too_deep(&input);

        let input = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&input, &["x"]).unwrap().eval(&[2.0]).unwrap(), 2.0);
    }

    #[test]
    fn test_long_unary_chain_rejected() {
        assert_too_deep(&format!("{}x", "-".repeat(10_000)));
        assert_too_deep(&format!("{}x", "+".repeat(10_000)));

        let e = parse(&format!("{}x", "-".repeat(100)), &["x"]).unwrap();
        assert_eq!(e.eval(&[3.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_long_flat_chain_rejected() {
        assert_too_deep(&vec!["x"; 10_000].join(" + "));
        assert_too_deep(&vec!["x"; 10_000].join(" * "));
        assert_too_deep(&format!("{}x{}", "sin(".repeat(1000), ")".repeat(1000)));

        let e = parse(&vec!["x"; 200].join(" + "), &["x"]).unwrap();
        assert_eq!(e.eval(&[1.0]).unwrap(), 200.0);
    }

    #[test]
    fn test_depth_limit_boundary() {
        // A sum of MAX_DEPTH terms has height MAX_DEPTH
        assert!(parse(&vec!["x"; MAX_DEPTH].join(" + "), &["x"]).is_ok());
        assert_too_deep(&vec!["x"; MAX_DEPTH + 1].join(" + "));
    }
}
