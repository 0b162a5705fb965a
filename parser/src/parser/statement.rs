//! Statement parsing: rules, literals and directives.

use super::Parser;
use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::TokenKind;
use metalp_core::Signature;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek().kind {
            TokenKind::Show => self.parse_show().map(directive),
            TokenKind::Const => self.parse_const().map(directive),
            TokenKind::Program => self.parse_program_decl().map(directive),
            TokenKind::Defined => self.parse_defined().map(directive),
            TokenKind::External => self.parse_external().map(directive),
            TokenKind::Theory => self.parse_theory_definition().map(Statement::Theory),
            _ => self.parse_rule().map(Statement::Rule),
        }
    }

    // ==================== RULES ====================

    fn parse_rule(&mut self) -> ParseResult<Rule> {
        let start = self.peek().span;

        let head = if self.eat(&TokenKind::If) {
            let body = self.parse_body()?;
            self.expect(&TokenKind::Dot)?;
            return Ok(Rule {
                head: Head::Falsity,
                body,
                span: self.span_from(start),
            });
        } else if self.check(&TokenKind::False)
            && matches!(self.peek_at(1).kind, TokenKind::If | TokenKind::Dot)
        {
            self.advance();
            Head::Falsity
        } else {
            self.parse_head()?
        };

        let body = if self.eat(&TokenKind::If) {
            self.parse_body()?
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Dot)?;

        Ok(Rule {
            head,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_head(&mut self) -> ParseResult<Head> {
        if self.check(&TokenKind::LBrace) {
            return self.parse_choice(None).map(Head::Choice);
        }

        // A term directly followed by `{` is the lower bound of a choice.
        if self.at_term_start() {
            let saved = self.pos;
            if let Ok(lower) = self.parse_term() {
                if self.check(&TokenKind::LBrace) {
                    return self.parse_choice(Some(lower)).map(Head::Choice);
                }
            }
            self.pos = saved;
        }

        let start = self.peek().span;
        let first = self.parse_literal()?;
        if first.sign != Sign::Positive {
            return Err(ParseError::unsupported(start, "negated head literals"));
        }
        if !self.check(&TokenKind::Semicolon) && !self.check(&TokenKind::Pipe) {
            return Ok(Head::Literal(first));
        }

        let mut literals = vec![first];
        while self.eat(&TokenKind::Semicolon) || self.eat(&TokenKind::Pipe) {
            let start = self.peek().span;
            let literal = self.parse_literal()?;
            if literal.sign != Sign::Positive {
                return Err(ParseError::unsupported(start, "negated head literals"));
            }
            literals.push(literal);
        }
        Ok(Head::Disjunction(literals))
    }

    fn parse_choice(&mut self, lower: Option<Term>) -> ParseResult<Choice> {
        self.expect(&TokenKind::LBrace)?;
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let literal = self.parse_literal()?;
                let condition = if self.eat(&TokenKind::Colon) {
                    self.parse_condition()?
                } else {
                    Vec::new()
                };
                elements.push(ChoiceElement { literal, condition });
                if !self.eat(&TokenKind::Semicolon) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;

        let mut choice = Choice {
            lower,
            elements,
            upper: None,
        };
        if self.eat(&TokenKind::Eq) {
            let bound = self.parse_term()?;
            choice.lower = Some(bound.clone());
            choice.upper = Some(bound);
        } else if self.at_term_start() {
            choice.upper = Some(self.parse_term()?);
        }
        Ok(choice)
    }

    /// Literals separated by `,` or `;`, up to the closing `.`.
    ///
    /// A condition after `:` extends over the following `,`, so literals
    /// after a conditional literal must be separated by `;`.
    pub(crate) fn parse_body(&mut self) -> ParseResult<Vec<Literal>> {
        let mut body = Vec::new();
        if self.check(&TokenKind::Dot) {
            return Ok(body);
        }
        loop {
            let start = self.peek().span;
            let literal = self.parse_literal()?;
            if self.eat(&TokenKind::Colon) {
                if matches!(literal.atom, Atom::Aggregate(_)) {
                    return Err(ParseError::unsupported(start, "conditional aggregates"));
                }
                let condition = self.parse_condition()?;
                body.push(Literal::positive(Atom::Conditional(ConditionalLiteral {
                    literal: Box::new(literal),
                    condition,
                })));
            } else {
                body.push(literal);
            }
            if !self.eat(&TokenKind::Comma) && !self.eat(&TokenKind::Semicolon) {
                break;
            }
        }
        Ok(body)
    }

    /// Literals separated by `,`, as in conditions of elements.
    pub(crate) fn parse_condition(&mut self) -> ParseResult<Vec<Literal>> {
        let mut condition = vec![self.parse_literal()?];
        while self.eat(&TokenKind::Comma) {
            condition.push(self.parse_literal()?);
        }
        Ok(condition)
    }

    // ==================== LITERALS ====================

    pub(crate) fn parse_literal(&mut self) -> ParseResult<Literal> {
        let sign = if self.eat(&TokenKind::Not) {
            if self.eat(&TokenKind::Not) {
                Sign::DoubleNegative
            } else {
                Sign::Negative
            }
        } else {
            Sign::Positive
        };
        let atom = self.parse_atom()?;
        Ok(Literal { sign, atom })
    }

    fn parse_atom(&mut self) -> ParseResult<Atom> {
        match self.peek().kind {
            TokenKind::True => {
                self.advance();
                return Ok(Atom::Boolean(true));
            }
            TokenKind::False => {
                self.advance();
                return Ok(Atom::Boolean(false));
            }
            TokenKind::Amp => return self.parse_theory_atom().map(Atom::Theory),
            TokenKind::Aggregate(function) => {
                self.advance();
                return self.parse_aggregate(function, None).map(Atom::Aggregate);
            }
            _ => {}
        }

        let start = self.peek().span;
        let left = self.parse_term()?;

        if let Some(op) = self.comparison_op() {
            self.advance();
            if let TokenKind::Aggregate(function) = self.peek().kind {
                self.advance();
                let guard = AggregateGuard { op, term: left };
                return self
                    .parse_aggregate(function, Some(guard))
                    .map(Atom::Aggregate);
            }
            let right = self.parse_term()?;
            return Ok(Atom::Comparison(Comparison { op, left, right }));
        }

        left.to_atom().map(Atom::Symbolic).ok_or_else(|| {
            ParseError::new("expected atom", self.span_from(start))
                .with_found(format!("term {}", left))
        })
    }

    fn comparison_op(&self) -> Option<ComparisonOp> {
        match self.peek().kind {
            TokenKind::Eq | TokenKind::EqEq => Some(ComparisonOp::Eq),
            TokenKind::NotEq => Some(ComparisonOp::NotEq),
            TokenKind::Lt => Some(ComparisonOp::Lt),
            TokenKind::LtEq => Some(ComparisonOp::LtEq),
            TokenKind::Gt => Some(ComparisonOp::Gt),
            TokenKind::GtEq => Some(ComparisonOp::GtEq),
            _ => None,
        }
    }

    /// Elements and right guard of an aggregate whose function token has
    /// been consumed.
    fn parse_aggregate(
        &mut self,
        function: AggregateFunction,
        left: Option<AggregateGuard>,
    ) -> ParseResult<Aggregate> {
        self.expect(&TokenKind::LBrace)?;
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let mut terms = Vec::new();
                if !self.check(&TokenKind::Colon) {
                    terms.push(self.parse_term()?);
                    while self.eat(&TokenKind::Comma) {
                        terms.push(self.parse_term()?);
                    }
                }
                let condition = if self.eat(&TokenKind::Colon) {
                    self.parse_condition()?
                } else {
                    Vec::new()
                };
                elements.push(AggregateElement { terms, condition });
                if !self.eat(&TokenKind::Semicolon) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;

        let right = match self.comparison_op() {
            Some(op) => {
                self.advance();
                Some(AggregateGuard {
                    op,
                    term: self.parse_term()?,
                })
            }
            None => None,
        };
        Ok(Aggregate {
            function,
            elements,
            left,
            right,
        })
    }

    fn parse_symbolic_atom(&mut self) -> ParseResult<SymbolicAtom> {
        let start = self.peek().span;
        let term = self.parse_term()?;
        term.to_atom().ok_or_else(|| {
            ParseError::new("expected atom", self.span_from(start))
                .with_found(format!("term {}", term))
        })
    }

    // ==================== DIRECTIVES ====================

    fn parse_show(&mut self) -> ParseResult<Directive> {
        let start = self.expect(&TokenKind::Show)?.span;

        let kind = if self.eat(&TokenKind::Dot) {
            ShowKind::Nothing
        } else if self.at_signature() {
            let signature = self.parse_signature()?;
            self.expect(&TokenKind::Dot)?;
            ShowKind::Signature(signature)
        } else {
            let term = self.parse_term()?;
            let body = if self.eat(&TokenKind::Colon) {
                self.parse_body()?
            } else {
                Vec::new()
            };
            self.expect(&TokenKind::Dot)?;
            ShowKind::Term { term, body }
        };

        Ok(Directive::Show(Show {
            kind,
            span: self.span_from(start),
        }))
    }

    fn at_signature(&self) -> bool {
        let offset = usize::from(self.check(&TokenKind::Minus));
        matches!(self.peek_at(offset).kind, TokenKind::Ident(_))
            && matches!(self.peek_at(offset + 1).kind, TokenKind::Slash)
            && matches!(self.peek_at(offset + 2).kind, TokenKind::Number(_))
    }

    fn parse_signature(&mut self) -> ParseResult<Signature> {
        let positive = !self.eat(&TokenKind::Minus);
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Slash)?;
        let start = self.peek().span;
        let arity = self.expect_number()?;
        let arity = usize::try_from(arity)
            .map_err(|_| ParseError::new("arity must not be negative", start))?;
        Ok(Signature::new(name, arity, positive))
    }

    fn parse_const(&mut self) -> ParseResult<Directive> {
        let start = self.expect(&TokenKind::Const)?.span;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_term()?;
        self.expect(&TokenKind::Dot)?;

        let kind = if self.eat(&TokenKind::LBracket) {
            let kind = match self.expect_ident()?.as_str() {
                "default" => ConstKind::Default,
                "override" => ConstKind::Override,
                other => {
                    return Err(ParseError::unexpected(
                        self.span_from(start),
                        "default or override",
                        other,
                    ))
                }
            };
            self.expect(&TokenKind::RBracket)?;
            kind
        } else {
            ConstKind::Default
        };

        Ok(Directive::Const(ConstDef {
            name,
            value,
            kind,
            span: self.span_from(start),
        }))
    }

    fn parse_program_decl(&mut self) -> ParseResult<Directive> {
        let start = self.expect(&TokenKind::Program)?.span;
        let name = self.expect_ident()?;
        let mut params = Vec::new();
        if self.eat(&TokenKind::LParen) {
            if !self.check(&TokenKind::RParen) {
                loop {
                    params.push(self.expect_ident()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RParen)?;
        }
        self.expect(&TokenKind::Dot)?;
        Ok(Directive::Program(ProgramDecl {
            name,
            params,
            span: self.span_from(start),
        }))
    }

    fn parse_defined(&mut self) -> ParseResult<Directive> {
        let start = self.expect(&TokenKind::Defined)?.span;
        let signature = self.parse_signature()?;
        self.expect(&TokenKind::Dot)?;
        Ok(Directive::Defined(DefinedDecl {
            signature,
            span: self.span_from(start),
        }))
    }

    fn parse_external(&mut self) -> ParseResult<Directive> {
        let start = self.expect(&TokenKind::External)?.span;
        let atom = self.parse_symbolic_atom()?;
        let body = if self.eat(&TokenKind::Colon) {
            self.parse_body()?
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Dot)?;

        let value = if self.eat(&TokenKind::LBracket) {
            let value = self.parse_term()?;
            self.expect(&TokenKind::RBracket)?;
            Some(value)
        } else {
            None
        };

        Ok(Directive::External(ExternalDecl {
            atom,
            body,
            value,
            span: self.span_from(start),
        }))
    }
}

fn directive(d: Directive) -> Statement {
    Statement::Directive(d)
}
