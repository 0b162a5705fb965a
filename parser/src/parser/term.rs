//! Term parsing.
//!
//! Precedence, loosest first: `..`, `+ -`, `* / \`, `**` (right associative),
//! unary `-`.

use super::Parser;
use crate::ast::*;
use crate::error::ParseResult;
use crate::lexer::TokenKind;
use metalp_core::Symbol;

impl Parser {
    pub(crate) fn parse_term(&mut self) -> ParseResult<Term> {
        let lower = self.parse_additive()?;
        if self.eat(&TokenKind::Range) {
            let upper = self.parse_additive()?;
            return Ok(Term::Interval(Box::new(lower), Box::new(upper)));
        }
        Ok(lower)
    }

    fn parse_additive(&mut self) -> ParseResult<Term> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Term::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Term> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Backslash => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = Term::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> ParseResult<Term> {
        let base = self.parse_unary()?;
        if self.eat(&TokenKind::Pow) {
            let exponent = self.parse_power()?;
            return Ok(Term::Binary(
                BinaryOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> ParseResult<Term> {
        if self.eat(&TokenKind::Minus) {
            let inner = self.parse_unary()?;
            // Negative literals are numbers, not operator applications.
            if let Term::Symbol(Symbol::Number(n)) = inner {
                if let Some(neg) = n.checked_neg() {
                    return Ok(Term::number(neg));
                }
            }
            return Ok(Term::Unary(UnaryOp::Minus, Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Term> {
        match self.peek().kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Term::number(n))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Term::string(s))
            }
            TokenKind::Inf => {
                self.advance();
                Ok(Term::Symbol(Symbol::Infimum))
            }
            TokenKind::Sup => {
                self.advance();
                Ok(Term::Symbol(Symbol::Supremum))
            }
            TokenKind::Variable(name) => {
                self.advance();
                Ok(Term::Variable(name))
            }
            TokenKind::Anonymous => {
                self.advance();
                Ok(Term::variable("_"))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_arguments()?;
                    if args.is_empty() {
                        return Ok(Term::constant(name));
                    }
                    Ok(Term::function(name, args))
                } else {
                    Ok(Term::constant(name))
                }
            }
            TokenKind::LParen => self.parse_tuple(),
            _ => Err(self.unexpected("term")),
        }
    }

    /// `( t1, ..., tn )` after a function name; `f()` is the constant `f`.
    pub(crate) fn parse_arguments(&mut self) -> ParseResult<Vec<Term>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_term()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    /// `()`, `(t)`, `(t,)` or `(t1, ..., tn)`.
    fn parse_tuple(&mut self) -> ParseResult<Term> {
        self.expect(&TokenKind::LParen)?;
        if self.eat(&TokenKind::RParen) {
            return Ok(Term::function("", Vec::new()));
        }

        let first = self.parse_term()?;
        if self.eat(&TokenKind::RParen) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_term()?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Term::function("", items))
    }

    /// Whether the current token can begin a term.
    pub(crate) fn at_term_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::Inf
                | TokenKind::Sup
                | TokenKind::Variable(_)
                | TokenKind::Anonymous
                | TokenKind::Ident(_)
                | TokenKind::LParen
                | TokenKind::Minus
        )
    }
}
