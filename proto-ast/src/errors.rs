//! Lex and parse failures (spec §4.1/§4.2), reported through
//! [`proto_diagnostics::Reporter`] rather than aborting outright.

use proto_diagnostics::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character {found:?}")]
    UnexpectedChar { found: char },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated block comment")]
    UnterminatedBlockComment,

    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),

    #[error("invalid numeric literal: {0}")]
    InvalidNumber(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("field numbers must be between 1 and 536870911 (excluding 19000-19999): {0}")]
    FieldNumberOutOfRange(i64),

    #[error("duplicate syntax statement")]
    DuplicateSyntax,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedLexError {
    pub span: Span,
    pub error: LexError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedParseError {
    pub span: Span,
    pub error: ParseError,
}
