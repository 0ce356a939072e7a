//! Lexical analysis of formula text.

use super::errors::{FormulaError, FormulaResult};
use super::operators::OperatorRegistry;

/// A lexical token of a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Operator(char),
    LeftParen,
    RightParen,
}

/// Splits formula text (without the leading `=`) into tokens.
///
/// Operator symbols are whatever `registry` knows about. Whitespace is
/// skipped; any other unrecognised character is rejected.
pub fn tokenize(input: &str, registry: &OperatorRegistry) -> FormulaResult<Vec<Token>> {
    Lexer::new(input, registry).collect()
}

struct Lexer<'a> {
    input: Vec<char>,
    position: usize,
    registry: &'a OperatorRegistry,
}

impl<'a> Lexer<'a> {
    fn new(input: &str, registry: &'a OperatorRegistry) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            registry,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    /// Reads `\d+(\.\d+)?`. A dot not followed by a digit ends the number.
    fn read_number(&mut self) -> FormulaResult<f64> {
        let start = self.position;
        while self.current().is_some_and(|ch| ch.is_ascii_digit()) {
            self.position += 1;
        }

        if self.current() == Some('.') && self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.position += 1;
            while self.current().is_some_and(|ch| ch.is_ascii_digit()) {
                self.position += 1;
            }
        }

        let literal: String = self.input[start..self.position].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| FormulaError::MalformedExpression(format!("invalid number {literal}")))
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while self.current().is_some_and(|ch| ch.is_ascii_alphanumeric()) {
            self.position += 1;
        }
        self.input[start..self.position].iter().collect()
    }

    fn next_token(&mut self) -> Option<FormulaResult<Token>> {
        self.skip_whitespace();
        let ch = self.current()?;

        let token = match ch {
            '0'..='9' => self.read_number().map(Token::Number),
            'A'..='Z' | 'a'..='z' => Ok(Token::Identifier(self.read_identifier())),
            '(' => {
                self.position += 1;
                Ok(Token::LeftParen)
            }
            ')' => {
                self.position += 1;
                Ok(Token::RightParen)
            }
            _ if self.registry.is_operator(ch) => {
                self.position += 1;
                Ok(Token::Operator(ch))
            }
            _ => {
                let offset = self.position;
                // Stop the iteration after reporting.
                self.position = self.input.len();
                Err(FormulaError::MalformedExpression(format!(
                    "unexpected character '{ch}' at offset {offset}"
                )))
            }
        };

        Some(token)
    }
}

impl Iterator for Lexer<'_> {
    type Item = FormulaResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
