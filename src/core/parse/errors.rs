use thiserror::Error;

use crate::core::diag::{Span, SpannedError};
use crate::core::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Error)]
pub enum ParseErrorKind {
    #[error("Expected a `def` or `class` definition, found: {0}")]
    ExpectedUnitDef(Token),

    #[error("Expected {0}, found: {1}")]
    ExpectedToken(TokenKind, Token),

    #[error("Expected identifier, found: {0}")]
    ExpectedIdent(Token),

    #[error("Expected parameter, found: {0}")]
    ExpectedParam(Token),

    #[error("Expected indented block, found: {0}")]
    ExpectedBlock(Token),

    #[error("Expected primary expression, found: {0}")]
    ExpectedPrimary(Token),

    #[error("Expected statement, found: {0}")]
    ExpectedStmt(Token),

    #[error("Invalid assignment target")]
    InvalidAssignTarget,
}

pub type ParseError = SpannedError<ParseErrorKind>;

impl ParseErrorKind {
    pub fn at(self, span: Span) -> ParseError {
        ParseError::new(self, span)
    }
}
