//! Parser for logic program text.
//!
//! This module is organized into submodules by parsing category:
//! - `term`: Terms (arithmetic, functions, tuples, intervals)
//! - `statement`: Rules, literals and directives
//! - `theory`: Theory atoms, theory terms and `#theory` definitions

mod statement;
mod term;
mod theory;

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token, TokenKind};

// ==================== PARSER STATE ====================

/// Parser state.
///
/// Comments are split off the token stream on construction and remembered
/// with the index of the token that follows them.
pub struct Parser {
    tokens: Vec<Token>,
    comments: Vec<(usize, Comment)>,
    eof: Token,
    pos: usize,
}

impl Parser {
    /// Create a new parser from source text.
    pub fn new(input: &str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        let mut comments = Vec::new();
        for token in Lexer::new(input).tokenize()? {
            match token.kind {
                TokenKind::Comment { text, block } => comments.push((
                    tokens.len(),
                    Comment {
                        text,
                        block,
                        span: token.span,
                    },
                )),
                _ => tokens.push(token),
            }
        }
        let eof = tokens
            .last()
            .cloned()
            .unwrap_or_else(|| Token::eof(input.len(), 1, 1));
        Ok(Self {
            tokens,
            comments,
            eof,
            pos: 0,
        })
    }
}

// ==================== TOKEN HELPERS ====================

impl Parser {
    pub(crate) fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&self.eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.name()))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn expect_number(&mut self) -> ParseResult<i64> {
        match self.peek().kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("number")),
        }
    }

    /// Error for the current token not being `expected`.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::unexpected(token.span, expected, token.kind.name())
    }

    pub(crate) fn span_from(&self, start: Span) -> Span {
        let end_token = if self.pos > 0 {
            &self.tokens[self.pos - 1]
        } else {
            self.peek()
        };
        Span::new(start.start, end_token.span.end, start.line, start.column)
    }

    /// Whether the current token directly follows the previous one.
    pub(crate) fn is_adjacent(&self) -> bool {
        self.pos > 0 && self.tokens[self.pos - 1].span.end == self.peek().span.start
    }
}

// ==================== PROGRAMS ====================

impl Parser {
    /// Parse statements until end of input.
    ///
    /// Comments between statements become statements of their own; a comment
    /// inside a statement is emitted right before that statement.
    pub fn parse_program(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        let mut next_comment = 0;

        loop {
            while next_comment < self.comments.len() && self.comments[next_comment].0 <= self.pos
            {
                statements.push(Statement::Comment(self.comments[next_comment].1.clone()));
                next_comment += 1;
            }
            if self.check(&TokenKind::Eof) {
                break;
            }

            let statement = self.parse_statement()?;
            while next_comment < self.comments.len() && self.comments[next_comment].0 < self.pos {
                statements.push(Statement::Comment(self.comments[next_comment].1.clone()));
                next_comment += 1;
            }
            statements.push(statement);
        }

        Ok(statements)
    }
}

// ==================== PUBLIC API ====================

/// Parse a whole program.
pub fn parse_program(input: &str) -> ParseResult<Vec<Statement>> {
    Parser::new(input)?.parse_program()
}

/// Parse a single term, e.g. the value of a constant definition.
pub fn parse_term(input: &str) -> ParseResult<Term> {
    let mut parser = Parser::new(input)?;
    let term = parser.parse_term()?;
    if !parser.check(&TokenKind::Eof) {
        return Err(parser.unexpected("end of input"));
    }
    Ok(term)
}

// ==================== TESTS ====================
