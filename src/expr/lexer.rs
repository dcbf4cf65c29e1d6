//! Lexer (tokenizer) for equation strings.

use crate::error::{RaphsonError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

/// Token types in equation strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Variable, constant or function name
    Identifier,
    /// Decimal number with optional fraction and exponent
    Number,
    /// '+'
    Plus,
    /// '-'
    Minus,
    /// '*'
    Star,
    /// '/'
    Slash,
    /// '^' or '**'
    Caret,
    /// '('
    OpenParen,
    /// ')'
    CloseParen,
    /// '='
    Equals,
    /// End of input
    Eof,
}

/// Lexer for tokenizing a single equation string.
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let start_column = self.column;
        let ch = match self.chars.peek().copied() {
            Some(ch) => ch,
            None => return Ok(self.token(TokenKind::Eof, String::new(), start_column)),
        };

        let punct = match ch {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '/' => Some(TokenKind::Slash),
            '^' => Some(TokenKind::Caret),
            '(' => Some(TokenKind::OpenParen),
            ')' => Some(TokenKind::CloseParen),
            '=' => Some(TokenKind::Equals),
            _ => None,
        };
        if let Some(kind) = punct {
            self.advance();
            return Ok(self.token(kind, ch.to_string(), start_column));
        }

        match ch {
            '*' => {
                self.advance();
                if self.chars.peek() == Some(&'*') {
                    self.advance();
                    Ok(self.token(TokenKind::Caret, "**".to_string(), start_column))
                } else {
                    Ok(self.token(TokenKind::Star, "*".to_string(), start_column))
                }
            }
            '0'..='9' | '.' => {
                let text = self.read_number();
                if text == "." {
                    return Err(RaphsonError::parse(
                        self.input,
                        start_column,
                        "expected digits around '.'",
                    ));
                }
                Ok(self.token(TokenKind::Number, text, start_column))
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let text = self.read_identifier();
                Ok(self.token(TokenKind::Identifier, text, start_column))
            }
            _ => Err(RaphsonError::parse(
                self.input,
                start_column,
                format!("unexpected character '{}'", ch),
            )),
        }
    }

    /// Tokenize the whole input, ending with an [`TokenKind::Eof`] token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn token(&self, kind: TokenKind, text: String, column: usize) -> Token {
        Token { kind, text, column }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.column += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> String {
        let mut text = String::new();

        // Integer part
        self.read_digits(&mut text);

        // Decimal part
        if self.chars.peek() == Some(&'.') {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        // Exponent part, only when digits follow so "2e" stays a number and a name
        if self.exponent_follows() {
            if let Some(e) = self.advance() {
                text.push(e);
            }
            if let Some(&sign) = self.chars.peek() {
                if sign == '-' || sign == '+' {
                    text.push(sign);
                    self.advance();
                }
            }
            self.read_digits(&mut text);
        }

        text
    }

    fn exponent_follows(&self) -> bool {
        let mut ahead = self.chars.clone();
        if !matches!(ahead.next(), Some('e' | 'E')) {
            return false;
        }
        match ahead.next() {
            Some('+' | '-') => matches!(ahead.next(), Some(c) if c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }
}
