use std::rc::Rc;

use ahash::AHashMap;
use mython_core::{Lexer, Token};
use tracing::debug;

use crate::ast::{ArithmeticOp, Comparator, Stmt};
use crate::callable::{Class, Method};
use crate::error::Error;
use crate::stack::ensure_sufficient_stack;

const SELF_PARAM: &str = "self";
const STR_FUNCTION: &str = "str";

/// Recursive descent parser driving a [`Lexer`] cursor.
///
/// Classes are resolved while parsing: `Name(args)` only becomes an instantiation when `Name`
/// was declared earlier in the program, and the same goes for base classes.
pub(crate) struct Parser<'a> {
    lexer: &'a mut Lexer,
    classes: AHashMap<String, Rc<Class>>,
}

// Helper alias for shorter return types
type StmtResult = Result<Stmt, Error>;
type ArgsResult = Result<Vec<Stmt>, Error>;

impl<'a> Parser<'a> {
    pub(crate) fn new(lexer: &'a mut Lexer) -> Self {
        Parser {
            lexer,
            classes: AHashMap::new(),
        }
    }

    /// Parses the whole program into a single `Stmt::Compound`.
    pub(crate) fn parse(mut self) -> StmtResult {
        let mut statements = Vec::new();
        while !self.check(&Token::Eof) {
            statements.push(self.statement()?);
        }

        debug!(statements = statements.len(), classes = self.classes.len(), "program parsed");
        Ok(Stmt::compound(statements))
    }

    fn statement(&mut self) -> StmtResult {
        if self.check(&Token::Class) {
            self.class_definition()
        } else if self.match_one(&Token::If) {
            self.if_statement()
        } else {
            let stmt = self.simple_statement()?;
            self.consume(&Token::Newline)?;
            Ok(stmt)
        }
    }

    fn class_definition(&mut self) -> StmtResult {
        let name = self.lexer.expect_next_identifier()?.to_string();
        self.advance();

        let parent = if self.match_char('(') {
            let parent = self.consume_identifier()?;
            self.consume_char(')')?;
            match self.classes.get(&parent) {
                Some(class) => Some(Rc::clone(class)),
                None => return Err(self.error(format!("unknown base class '{}'", parent))),
            }
        } else {
            None
        };

        self.consume_char(':')?;
        self.consume(&Token::Newline)?;
        self.consume(&Token::Indent)?;

        let mut methods = Vec::new();
        while !self.check(&Token::Dedent) && !self.check(&Token::Eof) {
            methods.push(self.method()?);
        }
        self.consume(&Token::Dedent)?;

        debug!(class = %name, methods = methods.len(), "class declared");
        let class = Class::new(&name, methods, parent);
        self.classes.insert(name, Rc::clone(&class));
        Ok(Stmt::class_definition(class))
    }

    fn method(&mut self) -> Result<Method, Error> {
        self.consume(&Token::Def)?;
        let name = self.consume_identifier()?;

        self.consume_char('(')?;
        let mut params = Vec::new();
        if !self.check_char(')') {
            loop {
                params.push(self.consume_identifier()?);
                if !self.match_char(',') {
                    break;
                }
            }
        }
        self.consume_char(')')?;
        self.consume_char(':')?;

        // `self` is bound implicitly on every call
        if params.first().map(String::as_str) == Some(SELF_PARAM) {
            params.remove(0);
        }

        let body = self.suite()?;
        Ok(Method::new(&name, params, Stmt::method_body(body)))
    }

    fn if_statement(&mut self) -> StmtResult {
        let condition = self.test()?;
        self.consume_char(':')?;
        let if_body = self.suite()?;

        let else_body = if self.match_one(&Token::Else) {
            self.consume_char(':')?;
            Some(self.suite()?)
        } else {
            None
        };

        Ok(Stmt::if_else(condition, if_body, else_body))
    }

    fn suite(&mut self) -> StmtResult {
        self.consume(&Token::Newline)?;
        self.consume(&Token::Indent)?;

        let mut statements = Vec::new();
        while !self.check(&Token::Dedent) && !self.check(&Token::Eof) {
            statements.push(self.statement()?);
        }
        self.consume(&Token::Dedent)?;

        Ok(Stmt::compound(statements))
    }

    fn simple_statement(&mut self) -> StmtResult {
        if self.match_one(&Token::Return) {
            let value = if self.check(&Token::Newline) {
                Stmt::none()
            } else {
                self.test()?
            };
            Ok(Stmt::return_(value))
        } else if self.match_one(&Token::Print) {
            let mut args = Vec::new();
            if !self.check(&Token::Newline) {
                loop {
                    args.push(self.test()?);
                    if !self.match_char(',') {
                        break;
                    }
                }
            }
            Ok(Stmt::print(args))
        } else {
            self.assignment()
        }
    }

    fn assignment(&mut self) -> StmtResult {
        let target = self.test()?;
        if !self.match_char('=') {
            return Ok(target);
        }

        let value = self.test()?;
        match target {
            Stmt::VariableValue { mut path } => match path.pop() {
                Some(name) if path.is_empty() => Ok(Stmt::assignment(&name, value)),
                Some(field) => Ok(Stmt::field_assignment(
                    Stmt::variable(&path),
                    &field,
                    value,
                )),
                None => Err(self.error("invalid assignment target")),
            },
            _ => Err(self.error("invalid assignment target")),
        }
    }

    fn test(&mut self) -> StmtResult {
        // Parenthesized expressions and call arguments recurse back into here
        ensure_sufficient_stack(|| self.or_test())
    }

    fn or_test(&mut self) -> StmtResult {
        let mut expr = self.and_test()?;
        while self.match_one(&Token::Or) {
            let rhs = self.and_test()?;
            expr = Stmt::or(expr, rhs);
        }
        Ok(expr)
    }

    fn and_test(&mut self) -> StmtResult {
        let mut expr = self.not_test()?;
        while self.match_one(&Token::And) {
            let rhs = self.not_test()?;
            expr = Stmt::and(expr, rhs);
        }
        Ok(expr)
    }

    fn not_test(&mut self) -> StmtResult {
        if self.match_one(&Token::Not) {
            Ok(Stmt::not(self.not_test()?))
        } else {
            self.comparison()
        }
    }

    fn comparison(&mut self) -> StmtResult {
        let lhs = self.expr()?;
        let comparator = match self.lexer.current_token() {
            Token::Eq => Comparator::Equal,
            Token::NotEq => Comparator::NotEqual,
            Token::LessOrEq => Comparator::LessOrEqual,
            Token::GreaterOrEq => Comparator::GreaterOrEqual,
            Token::Char('<') => Comparator::Less,
            Token::Char('>') => Comparator::Greater,
            _ => return Ok(lhs),
        };

        self.advance();
        let rhs = self.expr()?;
        Ok(Stmt::comparison(comparator, lhs, rhs))
    }

    fn expr(&mut self) -> StmtResult {
        let mut expr = self.term()?;
        loop {
            let op = if self.match_char('+') {
                ArithmeticOp::Add
            } else if self.match_char('-') {
                ArithmeticOp::Sub
            } else {
                break;
            };
            let rhs = self.term()?;
            expr = Stmt::arithmetic(op, expr, rhs);
        }
        Ok(expr)
    }

    fn term(&mut self) -> StmtResult {
        let mut expr = self.unary()?;
        loop {
            let op = if self.match_char('*') {
                ArithmeticOp::Mult
            } else if self.match_char('/') {
                ArithmeticOp::Div
            } else {
                break;
            };
            let rhs = self.unary()?;
            expr = Stmt::arithmetic(op, expr, rhs);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> StmtResult {
        if self.match_char('-') {
            let argument = self.unary()?;
            Ok(Stmt::arithmetic(ArithmeticOp::Sub, Stmt::constant(0), argument))
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> StmtResult {
        // Cloning is cheap enough here, tokens hold at most one short string
        let token = self.lexer.current_token().clone();
        match token {
            Token::Number(value) => {
                self.advance();
                Ok(Stmt::constant(value))
            }
            Token::Str(value) => {
                self.advance();
                Ok(Stmt::constant(value))
            }
            Token::None => {
                self.advance();
                Ok(Stmt::none())
            }
            Token::True => {
                self.advance();
                Ok(Stmt::constant(true))
            }
            Token::False => {
                self.advance();
                Ok(Stmt::constant(false))
            }
            Token::Char('(') => {
                self.advance();
                let expr = self.test()?;
                self.consume_char(')')?;
                Ok(expr)
            }
            Token::Identifier(_) => self.call_or_variable(),
            other => Err(self.error(format!("expected expression, found {}", other))),
        }
    }

    fn call_or_variable(&mut self) -> StmtResult {
        let mut path = vec![self.consume_identifier()?];
        while self.match_char('.') {
            path.push(self.consume_identifier()?);
        }

        if !self.check_char('(') {
            return Ok(Stmt::variable(&path));
        }

        let args = self.arguments()?;
        let mut expr = if path.len() == 1 {
            self.call(&path[0], args)?
        } else {
            let method = path.pop().unwrap_or_default();
            Stmt::method_call(Stmt::variable(&path), &method, args)
        };

        // Chained calls on the result, `a.b().c()`
        while self.match_char('.') {
            let method = self.consume_identifier()?;
            if !self.check_char('(') {
                return Err(self.error(format!(
                    "expected '(' after '{}', fields can only be read through variables",
                    method
                )));
            }
            let args = self.arguments()?;
            expr = Stmt::method_call(expr, &method, args);
        }

        Ok(expr)
    }

    fn call(&self, name: &str, mut args: Vec<Stmt>) -> StmtResult {
        if let Some(class) = self.classes.get(name) {
            return Ok(Stmt::new_instance(Rc::clone(class), args));
        }

        match (name, args.pop()) {
            (STR_FUNCTION, Some(argument)) if args.is_empty() => Ok(Stmt::stringify(argument)),
            (STR_FUNCTION, _) => Err(self.error("str() takes exactly one argument")),
            _ => Err(self.error(format!("'{}' is not a declared class", name))),
        }
    }

    fn arguments(&mut self) -> ArgsResult {
        self.consume_char('(')?;
        let mut args = Vec::new();
        if !self.check_char(')') {
            loop {
                args.push(self.test()?);
                if !self.match_char(',') {
                    break;
                }
            }
        }
        self.consume_char(')')?;
        Ok(args)
    }

    fn error(&self, msg: impl Into<String>) -> Error {
        Error::parse(self.lexer.line(), msg)
    }

    fn advance(&mut self) {
        self.lexer.next_token();
    }

    fn check(&self, token: &Token) -> bool {
        self.lexer.current_token() == token
    }

    fn check_char(&self, ch: char) -> bool {
        self.lexer.current_token().is_char(ch)
    }

    fn consume(&mut self, token: &Token) -> Result<(), Error> {
        self.lexer.expect(token)?;
        self.advance();
        Ok(())
    }

    fn consume_char(&mut self, ch: char) -> Result<(), Error> {
        self.consume(&Token::Char(ch))
    }

    fn consume_identifier(&mut self) -> Result<String, Error> {
        let name = self.lexer.expect_identifier()?.to_string();
        self.advance();
        Ok(name)
    }

    fn match_one(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_char(&mut self, ch: char) -> bool {
        self.match_one(&Token::Char(ch))
    }
}
