use std::io::Write;

use mython_core::Lexer;
use tracing::{debug, instrument};

use crate::env::Environment;
use crate::interpreter::Interpreter;
use crate::parser::Parser;

pub use error::{Error, InterpreterResult};

mod ast;
mod callable;
mod compare;
mod env;
mod error;
mod interpreter;
mod parser;
pub mod selftest;
mod stack;
mod value;

/// Lexes, parses and runs a whole Mython program, writing everything it prints to `stdout`.
///
/// Nothing is executed unless the entire source lexes and parses. Output produced before a
/// runtime error stays in `stdout`.
#[instrument(level = "debug", skip_all)]
pub fn run(src: &str, stdout: &mut dyn Write) -> InterpreterResult<()> {
    let mut lexer = Lexer::new(src)?;
    debug!(tokens = lexer.tokens().len(), "source tokenized");
    let program = Parser::new(&mut lexer).parse()?;

    let mut globals = Environment::new();
    let mut interpreter = Interpreter::new(stdout);
    interpreter.interpret(&program, &mut globals)?;

    debug!(globals = globals.len(), "program finished");
    Ok(())
}
