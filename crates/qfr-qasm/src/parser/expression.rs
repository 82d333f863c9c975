//! Parameter expression grammar.
//!
//! `Exp ← [-] Term (('+'|'-') Term)*`, `Term ← Factor (('*'|'/') Factor)*`,
//! `Factor ← Exponentiation ('^' Exponentiation)*`. Constant sub-trees fold
//! immediately through the [`Expr`] smart constructors.

use qfr_ir::expr::{Expr, UnaryFn};

use super::Parser;
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse one expression.
    pub(crate) fn exp(&mut self) -> ParseResult<Expr> {
        let mut x = if self.consume(&Token::Minus) {
            Expr::neg(self.term()?)
        } else {
            self.term()?
        };
        loop {
            if self.consume(&Token::Plus) {
                x = Expr::plus(x, self.term()?);
            } else if self.consume(&Token::Minus) {
                x = Expr::minus(x, self.term()?);
            } else {
                return Ok(x);
            }
        }
    }

    /// Parse a comma-separated expression list.
    pub(crate) fn exp_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.exp()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.exp()?);
        }
        Ok(exprs)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut x = self.factor()?;
        loop {
            if self.consume(&Token::Star) {
                x = Expr::times(x, self.factor()?);
            } else if self.consume(&Token::Slash) {
                x = Expr::div(x, self.factor()?);
            } else {
                return Ok(x);
            }
        }
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut x = self.exponentiation()?;
        while self.consume(&Token::Caret) {
            x = Expr::power(x, self.exponentiation()?);
        }
        Ok(x)
    }

    fn exponentiation(&mut self) -> ParseResult<Expr> {
        if self.consume(&Token::Minus) {
            return Ok(Expr::neg(self.exponentiation()?));
        }

        let unary = match self.peek() {
            Some(Token::Real(v)) => {
                let v = *v;
                self.bump();
                return Ok(Expr::Number(v));
            }
            Some(Token::NnInteger(v)) => {
                let v = *v;
                self.bump();
                return Ok(Expr::Number(v as f64));
            }
            Some(Token::Pi) => {
                self.bump();
                return Ok(Expr::pi());
            }
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.bump();
                return Ok(Expr::id(name));
            }
            Some(Token::LParen) => {
                self.bump();
                let x = self.exp()?;
                self.expect(&Token::RParen)?;
                return Ok(x);
            }
            Some(Token::Sin) => UnaryFn::Sin,
            Some(Token::Cos) => UnaryFn::Cos,
            Some(Token::Tan) => UnaryFn::Tan,
            Some(Token::Exp) => UnaryFn::Exp,
            Some(Token::Ln) => UnaryFn::Ln,
            Some(Token::Sqrt) => UnaryFn::Sqrt,
            other => {
                let (line, col) = self.position();
                return Err(ParseError::InvalidExpression {
                    line,
                    col,
                    message: match other {
                        Some(t) => format!("unexpected token '{t}'"),
                        None => "unexpected end of input".into(),
                    },
                });
            }
        };

        self.bump();
        self.expect(&Token::LParen)?;
        let x = self.exp()?;
        self.expect(&Token::RParen)?;
        Ok(Expr::unary(unary, x))
    }

    fn position(&self) -> (u32, u32) {
        match &self.la {
            Some(t) => (t.line, t.col),
            None => self.last_pos,
        }
    }
}
