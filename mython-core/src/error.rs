use thiserror::Error;

use crate::token::Token;

#[derive(Debug, Error, PartialEq, Clone)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("malformed number '{literal}' at column {column}")]
    MalformedNumber {
        literal: String,
        line: usize,
        column: usize,
    },

    #[error("unterminated string")]
    UnterminatedString { line: usize },

    #[error("unexpected character {ch:?} at column {column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },

    #[error("non-ASCII character {ch:?} at column {column}, only ASCII sources are supported")]
    NonAsciiCharacter { ch: char, line: usize, column: usize },

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: Token,
        line: usize,
    },
}

impl Error {
    pub fn line(&self) -> usize {
        match self {
            Error::MalformedNumber { line, .. } => *line,
            Error::UnterminatedString { line } => *line,
            Error::UnexpectedCharacter { line, .. } => *line,
            Error::NonAsciiCharacter { line, .. } => *line,
            Error::UnexpectedToken { line, .. } => *line,
        }
    }
}
