//! Lexer (tokenizer) for logic program text.
//!
//! Comments are tokens: the parser keeps them as statements so that the
//! rewriting passes can read annotations written in them.

use crate::{AggregateFunction, ParseError, ParseResult, Span};

/// Token types.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Not,

    // Directives and special constants
    Show,
    Const,
    Program,
    Defined,
    External,
    Theory,
    True,
    False,
    Inf,
    Sup,
    Aggregate(AggregateFunction),

    // Literals
    Ident(String),
    Variable(String),
    Anonymous,
    Number(i64),
    String(String),
    Comment { text: String, block: bool },

    // Symbols
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    If,        // :-
    Dot,       // .
    Range,     // ..
    Eq,        // =
    EqEq,      // ==
    NotEq,     // !=
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    Plus,      // +
    Minus,     // -
    Star,      // *
    Pow,       // **
    Slash,     // /
    Backslash, // \
    Pipe,      // |
    Amp,       // &
    Question,  // ?
    At,        // @
    Tilde,     // ~
    Caret,     // ^
    Bang,      // !

    // End of file
    Eof,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Not => "not",
            TokenKind::Show => "#show",
            TokenKind::Const => "#const",
            TokenKind::Program => "#program",
            TokenKind::Defined => "#defined",
            TokenKind::External => "#external",
            TokenKind::Theory => "#theory",
            TokenKind::True => "#true",
            TokenKind::False => "#false",
            TokenKind::Inf => "#inf",
            TokenKind::Sup => "#sup",
            TokenKind::Aggregate(function) => function.name(),
            TokenKind::Ident(_) => "identifier",
            TokenKind::Variable(_) => "variable",
            TokenKind::Anonymous => "_",
            TokenKind::Number(_) => "number",
            TokenKind::String(_) => "string",
            TokenKind::Comment { .. } => "comment",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::If => ":-",
            TokenKind::Dot => ".",
            TokenKind::Range => "..",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Pow => "**",
            TokenKind::Slash => "/",
            TokenKind::Backslash => "\\",
            TokenKind::Pipe => "|",
            TokenKind::Amp => "&",
            TokenKind::Question => "?",
            TokenKind::At => "@",
            TokenKind::Tilde => "~",
            TokenKind::Caret => "^",
            TokenKind::Bang => "!",
            TokenKind::Eof => "end of input",
        }
    }

    /// Text of a token that may be part of a theory operator.
    pub fn operator_text(&self) -> Option<&'static str> {
        match self {
            TokenKind::Eq
            | TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::LtEq
            | TokenKind::Gt
            | TokenKind::GtEq
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Pow
            | TokenKind::Slash
            | TokenKind::Backslash
            | TokenKind::Pipe
            | TokenKind::Amp
            | TokenKind::Question
            | TokenKind::At
            | TokenKind::Tilde
            | TokenKind::Caret
            | TokenKind::Bang => Some(self.name()),
            _ => None,
        }
    }
}

/// A token with its span.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(pos: usize, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
        }
    }
}

/// Lexer state.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize all input into a vector of tokens.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn current_span(&self) -> Span {
        Span::new(self.pos, self.pos, self.line, self.column)
    }

    fn span_from(&self, start: usize, start_line: usize, start_col: usize) -> Span {
        Span::new(start, self.pos, start_line, start_col)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn next_char(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.pos = pos + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.next_char();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();

        let start = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let Some(c) = self.next_char() else {
            return Ok(Token::eof(self.pos, self.line, self.column));
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => {
                if self.eat('-') {
                    TokenKind::If
                } else {
                    TokenKind::Colon
                }
            }
            '.' => {
                if self.eat('.') {
                    TokenKind::Range
                } else {
                    TokenKind::Dot
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '*' => {
                if self.eat('*') {
                    TokenKind::Pow
                } else {
                    TokenKind::Star
                }
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '/' => TokenKind::Slash,
            '\\' => TokenKind::Backslash,
            '|' => TokenKind::Pipe,
            '&' => TokenKind::Amp,
            '?' => TokenKind::Question,
            '@' => TokenKind::At,
            '~' => TokenKind::Tilde,
            '^' => TokenKind::Caret,
            '%' => self.scan_comment(start, start_line, start_col)?,
            '#' => self.scan_directive(start, start_line, start_col)?,
            '"' => self.scan_string(start, start_line, start_col)?,
            '_' | 'a'..='z' | 'A'..='Z' => self.scan_name(c),
            '0'..='9' => self.scan_number(c, start, start_line, start_col)?,
            _ => {
                return Err(ParseError::new(
                    format!("unexpected character '{}'", c),
                    self.span_from(start, start_line, start_col),
                ));
            }
        };

        Ok(Token::new(
            kind,
            self.span_from(start, start_line, start_col),
        ))
    }

    fn scan_comment(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<TokenKind> {
        let mut text = String::from("%");

        if self.eat('*') {
            text.push('*');
            loop {
                match self.next_char() {
                    None => {
                        return Err(ParseError::new(
                            "unterminated block comment",
                            self.span_from(start, start_line, start_col),
                        ));
                    }
                    Some('*') if self.peek_char() == Some('%') => {
                        self.next_char();
                        text.push_str("*%");
                        break;
                    }
                    Some(c) => text.push(c),
                }
            }
            return Ok(TokenKind::Comment { text, block: true });
        }

        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.next_char();
        }
        // Keep CRLF input from leaking a carriage return into the comment.
        if text.ends_with('\r') {
            text.pop();
        }
        Ok(TokenKind::Comment { text, block: false })
    }

    fn scan_directive(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<TokenKind> {
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        let kind = match name.as_str() {
            "show" => TokenKind::Show,
            "const" => TokenKind::Const,
            "program" => TokenKind::Program,
            "defined" => TokenKind::Defined,
            "external" => TokenKind::External,
            "theory" => TokenKind::Theory,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "inf" | "infimum" => TokenKind::Inf,
            "sup" | "supremum" => TokenKind::Sup,
            "count" => TokenKind::Aggregate(AggregateFunction::Count),
            "sum" if self.peek_char() == Some('+') => {
                self.next_char();
                TokenKind::Aggregate(AggregateFunction::SumPlus)
            }
            "sum" => TokenKind::Aggregate(AggregateFunction::Sum),
            "min" => TokenKind::Aggregate(AggregateFunction::Min),
            "max" => TokenKind::Aggregate(AggregateFunction::Max),
            "" => {
                return Err(ParseError::new(
                    "expected directive name after '#'",
                    self.span_from(start, start_line, start_col),
                ));
            }
            other => {
                return Err(ParseError::new(
                    format!("unsupported directive '#{}'", other),
                    self.span_from(start, start_line, start_col),
                )
                .with_found(format!("#{}", other)));
            }
        };
        Ok(kind)
    }

    fn scan_string(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<TokenKind> {
        let mut value = String::new();

        loop {
            match self.next_char() {
                None | Some('\n') => {
                    return Err(ParseError::new(
                        "unterminated string literal",
                        self.span_from(start, start_line, start_col),
                    ));
                }
                Some('"') => break,
                Some('\\') => {
                    let escaped = match self.next_char() {
                        Some('n') => '\n',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => {
                            return Err(ParseError::new(
                                format!("invalid escape sequence '\\{}'", c),
                                self.current_span(),
                            ));
                        }
                        None => {
                            return Err(ParseError::new(
                                "unterminated escape sequence",
                                self.current_span(),
                            ));
                        }
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }

        Ok(TokenKind::String(value))
    }

    fn scan_name(&mut self, first: char) -> TokenKind {
        let mut name = String::new();
        name.push(first);

        // Leading underscores decide nothing; the first letter after them does.
        let mut initial = first;
        while initial == '_' {
            match self.peek_char() {
                Some(c @ '_') => {
                    name.push(c);
                    self.next_char();
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    initial = c;
                }
                _ => return TokenKind::Anonymous,
            }
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '\'' {
                name.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        if initial.is_ascii_uppercase() {
            TokenKind::Variable(name)
        } else if name == "not" {
            TokenKind::Not
        } else {
            TokenKind::Ident(name)
        }
    }

    fn scan_number(
        &mut self,
        first: char,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<TokenKind> {
        let mut digits = String::new();
        digits.push(first);
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        digits.parse::<i64>().map(TokenKind::Number).map_err(|_| {
            ParseError::new(
                format!("integer literal out of range: {}", digits),
                self.span_from(start, start_line, start_col),
            )
        })
    }
}
