use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::core::diag::{Position, Span, SpannedError};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Identifiers and literals
    Ident(String),
    IntLit(i64),
    FloatLit(String),
    StrLit(String),

    // Keywords
    KwDef,
    KwClass,
    KwReturn,
    KwIf,
    KwElif,
    KwElse,
    KwFor,
    KwWhile,
    KwIn,
    KwTry,
    KwExcept,
    KwFinally,
    KwRaise,
    KwAssert,
    KwPass,
    KwBreak,
    KwContinue,
    KwImport,
    KwFrom,
    KwAs,
    KwWith,
    KwLambda,
    KwYield,
    KwNot,
    KwAnd,
    KwOr,
    KwIs,
    KwNone,
    KwTrue,
    KwFalse,

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Arrow,
    Colon,
    Semicolon,
    Comma,
    Dot,
    At,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use TokenKind::*;
        match self {
            Ident(name) => write!(f, "Ident({name})"),
            IntLit(value) => write!(f, "IntLit({value})"),
            FloatLit(value) => write!(f, "FloatLit({value})"),
            StrLit(value) => write!(f, "StrLit({value:?})"),
            KwDef => write!(f, "def"),
            KwClass => write!(f, "class"),
            KwReturn => write!(f, "return"),
            KwIf => write!(f, "if"),
            KwElif => write!(f, "elif"),
            KwElse => write!(f, "else"),
            KwFor => write!(f, "for"),
            KwWhile => write!(f, "while"),
            KwIn => write!(f, "in"),
            KwTry => write!(f, "try"),
            KwExcept => write!(f, "except"),
            KwFinally => write!(f, "finally"),
            KwRaise => write!(f, "raise"),
            KwAssert => write!(f, "assert"),
            KwPass => write!(f, "pass"),
            KwBreak => write!(f, "break"),
            KwContinue => write!(f, "continue"),
            KwImport => write!(f, "import"),
            KwFrom => write!(f, "from"),
            KwAs => write!(f, "as"),
            KwWith => write!(f, "with"),
            KwLambda => write!(f, "lambda"),
            KwYield => write!(f, "yield"),
            KwNot => write!(f, "not"),
            KwAnd => write!(f, "and"),
            KwOr => write!(f, "or"),
            KwIs => write!(f, "is"),
            KwNone => write!(f, "None"),
            KwTrue => write!(f, "True"),
            KwFalse => write!(f, "False"),
            Plus => write!(f, "+"),
            Minus => write!(f, "-"),
            Star => write!(f, "*"),
            DoubleStar => write!(f, "**"),
            Slash => write!(f, "/"),
            DoubleSlash => write!(f, "//"),
            Percent => write!(f, "%"),
            Assign => write!(f, "="),
            PlusAssign => write!(f, "+="),
            MinusAssign => write!(f, "-="),
            StarAssign => write!(f, "*="),
            SlashAssign => write!(f, "/="),
            EqEq => write!(f, "=="),
            NotEq => write!(f, "!="),
            Lt => write!(f, "<"),
            LtEq => write!(f, "<="),
            Gt => write!(f, ">"),
            GtEq => write!(f, ">="),
            Arrow => write!(f, "->"),
            Colon => write!(f, ":"),
            Semicolon => write!(f, ";"),
            Comma => write!(f, ","),
            Dot => write!(f, "."),
            At => write!(f, "@"),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            LBracket => write!(f, "["),
            RBracket => write!(f, "]"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            Newline => write!(f, "<newline>"),
            Indent => write!(f, "<indent>"),
            Dedent => write!(f, "<dedent>"),
            Eof => write!(f, "<eof>"),
        }
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match ident {
        "def" => KwDef,
        "class" => KwClass,
        "return" => KwReturn,
        "if" => KwIf,
        "elif" => KwElif,
        "else" => KwElse,
        "for" => KwFor,
        "while" => KwWhile,
        "in" => KwIn,
        "try" => KwTry,
        "except" => KwExcept,
        "finally" => KwFinally,
        "raise" => KwRaise,
        "assert" => KwAssert,
        "pass" => KwPass,
        "break" => KwBreak,
        "continue" => KwContinue,
        "import" => KwImport,
        "from" => KwFrom,
        "as" => KwAs,
        "with" => KwWith,
        "lambda" => KwLambda,
        "yield" => KwYield,
        "not" => KwNot,
        "and" => KwAnd,
        "or" => KwOr,
        "is" => KwIs,
        "None" => KwNone,
        "True" => KwTrue,
        "False" => KwFalse,
        _ => return None,
    };
    Some(kind)
}

#[derive(Debug, Clone, Error)]
pub enum LexErrorKind {
    #[error("Unexpected character: {0:?}")]
    UnexpectedChar(char),

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Inconsistent indentation (width {0} matches no enclosing block)")]
    InconsistentIndent(usize),
}

pub type LexError = SpannedError<LexErrorKind>;

impl LexErrorKind {
    pub fn at(self, span: Span) -> LexError {
        LexError::new(self, span)
    }
}

pub struct Lexer<'a> {
    source: Peekable<Chars<'a>>,
    pos: Position,
    indent_stack: Vec<usize>,
    pending: VecDeque<Token>,
    paren_depth: usize,
    at_line_start: bool,
    emitted_eof: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source: source.chars().peekable(),
            pos: Position::start(),
            indent_stack: vec![0],
            pending: VecDeque::new(),
            paren_depth: 0,
            at_line_start: true,
            emitted_eof: false,
        }
    }

    pub fn tokenize(self) -> impl Iterator<Item = Result<Token, LexError>> + 'a {
        self
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.next()?;
        self.pos.offset += ch.len_utf8();
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.source.peek().copied()
    }

    fn token(&self, kind: TokenKind, start: Position) -> Token {
        Token {
            kind,
            span: Span::new(start, self.pos),
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Measures leading whitespace of the current line and queues the
    /// Indent/Dedent tokens it implies. Blank and comment-only lines produce
    /// no layout tokens at all.
    fn handle_line_start(&mut self) -> Result<(), LexError> {
        loop {
            let mut width = 0usize;
            loop {
                match self.peek() {
                    Some(' ') => {
                        width += 1;
                        self.advance();
                    }
                    Some('\t') => {
                        // Tabs advance to the next multiple of 8, as CPython does.
                        width = (width / 8 + 1) * 8;
                        self.advance();
                    }
                    _ => break,
                }
            }

            match self.peek() {
                // Blank line: swallow it and measure the next one.
                Some('\n') => {
                    self.advance();
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                None => {
                    self.at_line_start = false;
                    return Ok(());
                }
                Some(_) => {
                    self.at_line_start = false;
                    let current = *self.indent_stack.last().unwrap_or(&0);
                    if width > current {
                        self.indent_stack.push(width);
                        let tok = self.token(TokenKind::Indent, self.pos);
                        self.pending.push_back(tok);
                    } else if width < current {
                        while *self.indent_stack.last().unwrap_or(&0) > width {
                            self.indent_stack.pop();
                            let tok = self.token(TokenKind::Dedent, self.pos);
                            self.pending.push_back(tok);
                        }
                        if *self.indent_stack.last().unwrap_or(&0) != width {
                            return Err(LexErrorKind::InconsistentIndent(width)
                                .at(Span::new(self.pos, self.pos)));
                        }
                    }
                    return Ok(());
                }
            }
        }
    }

    fn lex_string(&mut self, quote: char, start: Position) -> Result<Token, LexError> {
        // Opening quote already peeked, not consumed.
        self.advance();
        let triple = {
            let mut probe = self.source.clone();
            probe.next() == Some(quote) && probe.next() == Some(quote)
        };
        if triple {
            self.advance();
            self.advance();
        }

        let mut content = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(LexErrorKind::UnterminatedString.at(Span::new(start, self.pos)));
            };
            if ch == '\\' {
                self.advance();
                if let Some(escaped) = self.advance() {
                    content.push('\\');
                    content.push(escaped);
                }
                continue;
            }
            if ch == quote {
                if !triple {
                    self.advance();
                    break;
                }
                let mut probe = self.source.clone();
                probe.next();
                if probe.next() == Some(quote) && probe.next() == Some(quote) {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
                content.push(ch);
                self.advance();
                continue;
            }
            if ch == '\n' && !triple {
                return Err(LexErrorKind::UnterminatedString.at(Span::new(start, self.pos)));
            }
            content.push(ch);
            self.advance();
        }
        Ok(self.token(TokenKind::StrLit(content), start))
    }

    fn lex_number(&mut self, start: Position) -> Result<Token, LexError> {
        let mut text = String::new();
        let mut is_float = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                if ch != '_' {
                    text.push(ch);
                }
                self.advance();
            } else if ch == '.' {
                // A second dot ends the number (e.g. a range-like slice).
                if is_float {
                    break;
                }
                let mut probe = self.source.clone();
                probe.next();
                if probe.next().map(|c| c.is_ascii_digit()) != Some(true) {
                    break;
                }
                is_float = true;
                text.push(ch);
                self.advance();
            } else if ch == 'e' || ch == 'E' {
                let mut probe = self.source.clone();
                probe.next();
                let next = probe.next();
                let exp_follows = match next {
                    Some(c) if c.is_ascii_digit() => true,
                    Some('+') | Some('-') => true,
                    _ => false,
                };
                if !exp_follows {
                    break;
                }
                is_float = true;
                text.push(ch);
                self.advance();
                if let Some(sign) = self.peek() {
                    if sign == '+' || sign == '-' {
                        text.push(sign);
                        self.advance();
                    }
                }
            } else {
                break;
            }
        }

        if is_float {
            Ok(self.token(TokenKind::FloatLit(text), start))
        } else {
            let value = text
                .parse::<i64>()
                .map_err(|_| LexErrorKind::InvalidNumber(text.clone()).at(Span::new(start, self.pos)))?;
            Ok(self.token(TokenKind::IntLit(value), start))
        }
    }

    fn lex_ident(&mut self, start: Position) -> Result<Token, LexError> {
        let mut ident = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // String prefixes (r"", f"", b"", rb"") lex as plain strings.
        if ident.len() <= 2
            && ident.chars().all(|c| matches!(c, 'r' | 'b' | 'f' | 'u' | 'R' | 'B' | 'F' | 'U'))
        {
            if let Some(quote) = self.peek() {
                if quote == '"' || quote == '\'' {
                    return self.lex_string(quote, start);
                }
            }
        }

        let kind = keyword(&ident).unwrap_or(TokenKind::Ident(ident));
        Ok(self.token(kind, start))
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(tok) = self.pending.pop_front() {
            return Ok(tok);
        }

        if self.at_line_start && self.paren_depth == 0 {
            self.handle_line_start()?;
            if let Some(tok) = self.pending.pop_front() {
                return Ok(tok);
            }
        }

        // Skip intra-line whitespace and comments.
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('#') => {
                    self.skip_comment();
                }
                Some('\\') => {
                    // Explicit line continuation.
                    let mut probe = self.source.clone();
                    probe.next();
                    match probe.next() {
                        Some('\n') => {
                            self.advance();
                            self.advance();
                        }
                        Some('\r') => {
                            self.advance();
                            self.advance();
                            if self.peek() == Some('\n') {
                                self.advance();
                            }
                        }
                        _ => break,
                    }
                }
                Some('\n') if self.paren_depth > 0 => {
                    self.advance();
                }
                _ => break,
            }
        }

        let start = self.pos;
        let Some(ch) = self.peek() else {
            // Close any open blocks before the final Eof.
            while self.indent_stack.len() > 1 {
                self.indent_stack.pop();
                let tok = self.token(TokenKind::Dedent, start);
                self.pending.push_back(tok);
            }
            self.pending.push_back(self.token(TokenKind::Eof, start));
            return Ok(self.pending.pop_front().unwrap());
        };

        if ch == '\n' {
            self.advance();
            self.at_line_start = true;
            return Ok(self.token(TokenKind::Newline, start));
        }
        if ch.is_alphabetic() || ch == '_' {
            return self.lex_ident(start);
        }
        if ch.is_ascii_digit() {
            return self.lex_number(start);
        }
        if ch == '"' || ch == '\'' {
            return self.lex_string(ch, start);
        }

        self.advance();
        let kind = match ch {
            '+' => self.take_eq(TokenKind::PlusAssign, TokenKind::Plus),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.take_eq(TokenKind::MinusAssign, TokenKind::Minus)
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    TokenKind::DoubleStar
                } else {
                    self.take_eq(TokenKind::StarAssign, TokenKind::Star)
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    TokenKind::DoubleSlash
                } else {
                    self.take_eq(TokenKind::SlashAssign, TokenKind::Slash)
                }
            }
            '%' => TokenKind::Percent,
            '=' => self.take_eq(TokenKind::EqEq, TokenKind::Assign),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(LexErrorKind::UnexpectedChar('!').at(Span::new(start, self.pos)));
                }
            }
            '<' => self.take_eq(TokenKind::LtEq, TokenKind::Lt),
            '>' => self.take_eq(TokenKind::GtEq, TokenKind::Gt),
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '@' => TokenKind::At,
            '(' => {
                self.paren_depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RParen
            }
            '[' => {
                self.paren_depth += 1;
                TokenKind::LBracket
            }
            ']' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RBracket
            }
            '{' => {
                self.paren_depth += 1;
                TokenKind::LBrace
            }
            '}' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RBrace
            }
            other => {
                return Err(LexErrorKind::UnexpectedChar(other).at(Span::new(start, self.pos)));
            }
        };
        Ok(self.token(kind, start))
    }

    fn take_eq(&mut self, with_eq: TokenKind, without: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            with_eq
        } else {
            without
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted_eof {
            return None;
        }
        let result = self.next_token();
        if let Ok(tok) = &result {
            if tok.kind == TokenKind::Eof {
                self.emitted_eof = true;
            }
        }
        Some(result)
    }
}

#[cfg(test)]
#[path = "../tests/t_lexer.rs"]
mod tests;
