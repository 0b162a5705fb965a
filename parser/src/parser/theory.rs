//! Theory atom and `#theory` definition parsing.
//!
//! Theory operators are runs of adjacent operator characters (`<?`, `+`,
//! `!=`). Theory terms are kept unparsed: operator precedence is only known
//! once the theory definition is in scope.

use super::Parser;
use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::TokenKind;
use metalp_core::Symbol;

impl Parser {
    // ==================== THEORY ATOMS ====================

    pub(crate) fn parse_theory_atom(&mut self) -> ParseResult<TheoryAtom> {
        self.expect(&TokenKind::Amp)?;
        let name = self.expect_ident()?;
        let name = if self.check(&TokenKind::LParen) {
            let args = self.parse_arguments()?;
            if args.is_empty() {
                Term::constant(name)
            } else {
                Term::function(name, args)
            }
        } else {
            Term::constant(name)
        };

        let mut elements = Vec::new();
        if self.eat(&TokenKind::LBrace) {
            if !self.check(&TokenKind::RBrace) {
                loop {
                    elements.push(self.parse_theory_element()?);
                    if !self.eat(&TokenKind::Semicolon) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RBrace)?;
        }

        let guard = if self.at_operator() {
            let operator = self.parse_operator()?;
            let term = self.parse_theory_term()?;
            Some(TheoryGuard { operator, term })
        } else {
            None
        };

        Ok(TheoryAtom {
            name,
            elements,
            guard,
        })
    }

    fn parse_theory_element(&mut self) -> ParseResult<TheoryElement> {
        let mut terms = Vec::new();
        if !self.check(&TokenKind::Colon) {
            terms.push(self.parse_theory_term()?);
            while self.eat(&TokenKind::Comma) {
                terms.push(self.parse_theory_term()?);
            }
        }
        let condition = if self.eat(&TokenKind::Colon) {
            self.parse_condition()?
        } else {
            Vec::new()
        };
        Ok(TheoryElement { terms, condition })
    }

    // ==================== THEORY TERMS ====================

    pub(crate) fn parse_theory_term(&mut self) -> ParseResult<TheoryTerm> {
        let mut elements = Vec::new();
        loop {
            let mut operators = Vec::new();
            while self.at_operator() {
                operators.push(self.parse_operator()?);
            }
            let term = self.parse_theory_primary()?;
            elements.push(UnparsedElement { operators, term });
            if !self.at_operator() {
                break;
            }
        }

        if elements.len() == 1 && elements[0].operators.is_empty() {
            if let Some(element) = elements.pop() {
                return Ok(element.term);
            }
        }
        Ok(TheoryTerm::Unparsed(elements))
    }

    fn parse_theory_primary(&mut self) -> ParseResult<TheoryTerm> {
        match self.peek().kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(TheoryTerm::Symbol(Symbol::Number(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(TheoryTerm::Symbol(Symbol::String(s)))
            }
            TokenKind::Inf => {
                self.advance();
                Ok(TheoryTerm::Symbol(Symbol::Infimum))
            }
            TokenKind::Sup => {
                self.advance();
                Ok(TheoryTerm::Symbol(Symbol::Supremum))
            }
            TokenKind::Variable(name) => {
                self.advance();
                Ok(TheoryTerm::Variable(name))
            }
            TokenKind::Anonymous => {
                self.advance();
                Ok(TheoryTerm::Variable("_".to_string()))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if !self.check(&TokenKind::LParen) {
                    return Ok(TheoryTerm::Symbol(Symbol::constant(name)));
                }
                let args = self.parse_theory_terms(&TokenKind::LParen, &TokenKind::RParen)?;
                if args.is_empty() {
                    return Ok(TheoryTerm::Symbol(Symbol::constant(name)));
                }
                Ok(TheoryTerm::Function { name, args })
            }
            TokenKind::LParen => {
                self.advance();
                if self.eat(&TokenKind::RParen) {
                    return Ok(TheoryTerm::Sequence {
                        kind: SequenceKind::Tuple,
                        terms: Vec::new(),
                    });
                }
                // `(t)` groups; `(t,)` is a one-element tuple.
                let first = self.parse_theory_term()?;
                if self.eat(&TokenKind::RParen) {
                    return Ok(first);
                }
                let mut terms = vec![first];
                while self.eat(&TokenKind::Comma) {
                    if self.check(&TokenKind::RParen) {
                        break;
                    }
                    terms.push(self.parse_theory_term()?);
                }
                self.expect(&TokenKind::RParen)?;
                Ok(TheoryTerm::Sequence {
                    kind: SequenceKind::Tuple,
                    terms,
                })
            }
            TokenKind::LBracket => {
                let terms =
                    self.parse_theory_terms(&TokenKind::LBracket, &TokenKind::RBracket)?;
                Ok(TheoryTerm::Sequence {
                    kind: SequenceKind::List,
                    terms,
                })
            }
            TokenKind::LBrace => {
                let terms = self.parse_theory_terms(&TokenKind::LBrace, &TokenKind::RBrace)?;
                Ok(TheoryTerm::Sequence {
                    kind: SequenceKind::Set,
                    terms,
                })
            }
            _ => Err(self.unexpected("theory term")),
        }
    }

    /// Comma separated theory terms between `open` and `close`; a trailing comma is allowed.
    fn parse_theory_terms(
        &mut self,
        open: &TokenKind,
        close: &TokenKind,
    ) -> ParseResult<Vec<TheoryTerm>> {
        self.expect(open)?;
        let mut terms = Vec::new();
        while !self.check(close) {
            terms.push(self.parse_theory_term()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(terms)
    }

    // ==================== OPERATORS ====================

    pub(crate) fn at_operator(&self) -> bool {
        self.peek().kind.operator_text().is_some()
    }

    /// A run of adjacent operator tokens, e.g. `<` `?` written as `<?`.
    pub(crate) fn parse_operator(&mut self) -> ParseResult<String> {
        let Some(first) = self.peek().kind.operator_text() else {
            return Err(self.unexpected("operator"));
        };
        let mut operator = first.to_string();
        self.advance();
        while self.is_adjacent() {
            match self.peek().kind.operator_text() {
                Some(text) => {
                    operator.push_str(text);
                    self.advance();
                }
                None => break,
            }
        }
        Ok(operator)
    }

    // ==================== THEORY DEFINITIONS ====================

    pub(crate) fn parse_theory_definition(&mut self) -> ParseResult<TheoryDefinition> {
        let start = self.expect(&TokenKind::Theory)?.span;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;

        let mut terms = Vec::new();
        let mut atoms = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                if self.check(&TokenKind::Amp) {
                    atoms.push(self.parse_theory_atom_definition()?);
                } else {
                    terms.push(self.parse_theory_term_definition()?);
                }
                if !self.eat(&TokenKind::Semicolon) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;
        self.expect(&TokenKind::Dot)?;

        Ok(TheoryDefinition {
            name,
            terms,
            atoms,
            span: self.span_from(start),
        })
    }

    fn parse_theory_term_definition(&mut self) -> ParseResult<TheoryTermDefinition> {
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;
        let mut operators = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                operators.push(self.parse_operator_definition()?);
                if !self.eat(&TokenKind::Semicolon) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(TheoryTermDefinition { name, operators })
    }

    fn parse_operator_definition(&mut self) -> ParseResult<TheoryOperatorDefinition> {
        let operator = self.parse_operator()?;
        self.expect(&TokenKind::Colon)?;
        let start = self.peek().span;
        let priority = u32::try_from(self.expect_number()?)
            .map_err(|_| ParseError::new("operator priority must not be negative", start))?;
        self.expect(&TokenKind::Comma)?;

        let start = self.peek().span;
        let kind = match self.expect_ident()?.as_str() {
            "unary" => OperatorKind::Unary,
            "binary" => {
                self.expect(&TokenKind::Comma)?;
                let start = self.peek().span;
                match self.expect_ident()?.as_str() {
                    "left" => OperatorKind::BinaryLeft,
                    "right" => OperatorKind::BinaryRight,
                    other => {
                        return Err(ParseError::unexpected(start, "left or right", other))
                    }
                }
            }
            other => return Err(ParseError::unexpected(start, "unary or binary", other)),
        };

        Ok(TheoryOperatorDefinition {
            operator,
            priority,
            kind,
        })
    }

    fn parse_theory_atom_definition(&mut self) -> ParseResult<TheoryAtomDefinition> {
        self.expect(&TokenKind::Amp)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Slash)?;
        let start = self.peek().span;
        let arity = usize::try_from(self.expect_number()?)
            .map_err(|_| ParseError::new("arity must not be negative", start))?;
        self.expect(&TokenKind::Colon)?;
        let term = self.expect_ident()?;
        self.expect(&TokenKind::Comma)?;

        let guard = if self.eat(&TokenKind::LBrace) {
            let mut operators = Vec::new();
            if !self.check(&TokenKind::RBrace) {
                loop {
                    operators.push(self.parse_operator()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RBrace)?;
            self.expect(&TokenKind::Comma)?;
            let term = self.expect_ident()?;
            self.expect(&TokenKind::Comma)?;
            Some(TheoryGuardDefinition { operators, term })
        } else {
            None
        };

        let start = self.peek().span;
        let atom_type = match self.expect_ident()?.as_str() {
            "head" => TheoryAtomType::Head,
            "body" => TheoryAtomType::Body,
            "any" => TheoryAtomType::Any,
            "directive" => TheoryAtomType::Directive,
            other => {
                return Err(ParseError::unexpected(
                    start,
                    "head, body, any or directive",
                    other,
                ))
            }
        };

        Ok(TheoryAtomDefinition {
            name,
            arity,
            term,
            guard,
            atom_type,
        })
    }
}
