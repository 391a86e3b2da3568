use std::io;

use mython_core::Error as CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("[line {line}] lexical error: {source}")]
    LexicalError { line: usize, source: CoreError },

    #[error("[line {line}] parse error: {msg}")]
    ParseError { line: usize, msg: String },

    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("expected a class instance, found {found}")]
    ExpectedInstance { found: &'static str },

    #[error("method '{method}' with {arity} argument(s) not found in class '{class}'")]
    MethodNotFound {
        class: String,
        method: String,
        arity: usize,
    },


    #[error("unsupported operand types for {op}: {lhs} and {rhs}")]
    UnsupportedOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {op}")]
    IntegerOverflow { op: &'static str },

    #[error("cannot compare {lhs} and {rhs} for {relation}")]
    Incomparable {
        relation: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("condition must be a Bool, found {found}")]
    NonBooleanCondition { found: &'static str },

    #[error("stack overflow: method calls nested deeper than {limit}")]
    StackOverflow { limit: usize },

    #[error("'return' outside of a method body")]
    UnexpectedReturn,

    #[error("failed to write output: {0}")]
    OutputError(#[from] io::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Error {
        Error::ParseError {
            line,
            msg: msg.into(),
        }
    }
}

impl From<CoreError> for Error {
    fn from(value: CoreError) -> Self {
        match value {
            // The lexer cursor only reports these while the parser is driving it
            CoreError::UnexpectedToken { line, .. } => Error::parse(line, value.to_string()),
            _ => Error::LexicalError {
                line: value.line(),
                source: value,
            },
        }
    }
}

pub type InterpreterResult<T> = Result<T, Error>;
