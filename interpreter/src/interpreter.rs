use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use tracing::trace;

use crate::ast::{ArithmeticOp, Comparator, Stmt};
use crate::callable::{Class, Instance, ADD_METHOD, INIT_METHOD, STR_METHOD};
use crate::compare;
use crate::env::Environment;
use crate::error::{Error, InterpreterResult};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Deepest nesting of method calls, `__init__` and `__str__` included, before a program is
/// stopped with [`Error::StackOverflow`].
pub(crate) const MAX_CALL_DEPTH: usize = 512;

/// Result of evaluating one node.
///
/// `Return` carries the value of a `return` statement up to the nearest `Stmt::MethodBody`,
/// which is the only node that turns it back into a plain value. Errors stay in the `Err` side
/// of [`InterpreterResult`] and never mix with this.
#[derive(Debug, PartialEq)]
pub(crate) enum Flow {
    Value(Value),
    Return(Value),
}

// Evaluates an operand to a plain value. A pending return is handed straight back to the caller
// of the enclosing function.
macro_rules! eval {
    ($interpreter:expr, $stmt:expr, $env:expr) => {
        match $interpreter.evaluate($stmt, $env)? {
            Flow::Value(value) => value,
            flow @ Flow::Return(_) => return Ok(flow),
        }
    };
}

macro_rules! eval_all {
    ($interpreter:expr, $stmts:expr, $env:expr) => {{
        let mut values = Vec::with_capacity($stmts.len());
        for stmt in $stmts {
            values.push(eval!($interpreter, stmt, $env));
        }
        values
    }};
}

/// Evaluation context. Owns the output sink every `print` writes to and the current method call
/// depth; scopes are passed in by the caller so that method calls can bring their own.
pub(crate) struct Interpreter<'a> {
    stdout: &'a mut dyn Write,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(stdout: &'a mut dyn Write) -> Self {
        Interpreter { stdout, depth: 0 }
    }

    pub(crate) fn interpret(
        &mut self,
        program: &Stmt,
        env: &mut Environment,
    ) -> InterpreterResult<()> {
        match self.evaluate(program, env)? {
            Flow::Value(_) => Ok(()),
            Flow::Return(_) => Err(Error::UnexpectedReturn),
        }
    }

    /// Marks the start of a method call, failing once calls nest deeper than [`MAX_CALL_DEPTH`].
    /// Every successful call must be paired with [`Interpreter::exit_call`].
    pub(crate) fn enter_call(&mut self) -> InterpreterResult<()> {
        if self.depth == MAX_CALL_DEPTH {
            return Err(Error::StackOverflow {
                limit: MAX_CALL_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.depth -= 1;
    }

    pub(crate) fn evaluate(
        &mut self,
        stmt: &Stmt,
        env: &mut Environment,
    ) -> InterpreterResult<Flow> {
        ensure_sufficient_stack(|| self.evaluate_node(stmt, env))
    }

    // Multi-operand arms live in their own functions to keep this frame small
    fn evaluate_node(&mut self, stmt: &Stmt, env: &mut Environment) -> InterpreterResult<Flow> {
        let value = match stmt {
            Stmt::Const { value } => value.clone(),
            Stmt::Assignment { name, value } => {
                let value = eval!(self, value, env);
                env.define(name, value.clone());
                value
            }
            Stmt::VariableValue { path } => self.lookup(path, env)?,
            Stmt::Print { args } => return self.print(args, env),
            Stmt::Stringify { argument } => {
                let value = eval!(self, argument, env);
                Value::from(self.render(&value)?)
            }
            Stmt::MethodCall {
                object,
                method,
                args,
            } => return self.method_call(object, method, args, env),
            Stmt::Arithmetic { op, lhs, rhs } => return self.arithmetic(*op, lhs, rhs, env),
            Stmt::Compound { statements } => {
                for statement in statements {
                    eval!(self, statement, env);
                }
                Value::None
            }
            Stmt::Return { value } => {
                let value = eval!(self, value, env);
                return Ok(Flow::Return(value));
            }
            Stmt::MethodBody { body } => match self.evaluate(body, env)? {
                Flow::Value(value) | Flow::Return(value) => value,
            },
            Stmt::ClassDefinition { class } => {
                env.define(class.name(), Value::Class(Rc::clone(class)));
                Value::None
            }
            Stmt::FieldAssignment {
                object,
                field,
                value,
            } => return self.field_assignment(object, field, value, env),
            Stmt::IfElse {
                condition,
                if_body,
                else_body,
            } => return self.if_else(condition, if_body, else_body.as_deref(), env),
            Stmt::Or { lhs, rhs } => return self.logical(true, lhs, rhs, env),
            Stmt::And { lhs, rhs } => return self.logical(false, lhs, rhs, env),
            Stmt::Not { argument } => {
                let argument = eval!(self, argument, env);
                Value::Bool(!self.equals_true(&argument)?)
            }
            Stmt::Comparison {
                comparator,
                lhs,
                rhs,
            } => return self.comparison(*comparator, lhs, rhs, env),
            Stmt::NewInstance { class, args } => return self.new_instance(class, args, env),
        };

        Ok(Flow::Value(value))
    }

    fn print(&mut self, args: &[Stmt], env: &mut Environment) -> InterpreterResult<Flow> {
        for (idx, arg) in args.iter().enumerate() {
            // The separator goes out before the next argument runs, so output printed while
            // evaluating it lands after the previous argument
            if idx > 0 {
                write!(self.stdout, " ")?;
            }
            let value = eval!(self, arg, env);
            let text = self.render(&value)?;
            write!(self.stdout, "{}", text)?;
        }
        writeln!(self.stdout)?;
        Ok(Flow::Value(Value::None))
    }

    fn method_call(
        &mut self,
        object: &Stmt,
        method: &str,
        args: &[Stmt],
        env: &mut Environment,
    ) -> InterpreterResult<Flow> {
        let object = eval!(self, object, env);
        let object = expect_instance(object)?;
        let args = eval_all!(self, args, env);
        Ok(Flow::Value(Instance::call(&object, method, args, self)?))
    }

    fn field_assignment(
        &mut self,
        object: &Stmt,
        field: &str,
        value: &Stmt,
        env: &mut Environment,
    ) -> InterpreterResult<Flow> {
        let object = eval!(self, object, env);
        let object = expect_instance(object)?;
        let value = eval!(self, value, env);
        object.borrow_mut().fields_mut().define(field, value.clone());
        Ok(Flow::Value(value))
    }

    fn if_else(
        &mut self,
        condition: &Stmt,
        if_body: &Stmt,
        else_body: Option<&Stmt>,
        env: &mut Environment,
    ) -> InterpreterResult<Flow> {
        match eval!(self, condition, env) {
            Value::Bool(true) => self.evaluate(if_body, env),
            Value::Bool(false) => match else_body {
                Some(else_body) => self.evaluate(else_body, env),
                None => Ok(Flow::Value(Value::None)),
            },
            other => Err(Error::NonBooleanCondition { found: other.kind() }),
        }
    }

    // `or` when `short_circuit` is true, `and` when it is false. Operands are tested with
    // "equals True" rather than truthiness, so they must be comparable with a Bool.
    fn logical(
        &mut self,
        short_circuit: bool,
        lhs: &Stmt,
        rhs: &Stmt,
        env: &mut Environment,
    ) -> InterpreterResult<Flow> {
        let lhs = eval!(self, lhs, env);
        if self.equals_true(&lhs)? == short_circuit {
            return Ok(Flow::Value(Value::Bool(short_circuit)));
        }
        let rhs = eval!(self, rhs, env);
        Ok(Flow::Value(Value::Bool(self.equals_true(&rhs)?)))
    }

    fn comparison(
        &mut self,
        comparator: Comparator,
        lhs: &Stmt,
        rhs: &Stmt,
        env: &mut Environment,
    ) -> InterpreterResult<Flow> {
        let lhs = eval!(self, lhs, env);
        let rhs = eval!(self, rhs, env);
        Ok(Flow::Value(Value::Bool(comparator.apply(&lhs, &rhs, self)?)))
    }

    fn new_instance(
        &mut self,
        class: &Rc<Class>,
        args: &[Stmt],
        env: &mut Environment,
    ) -> InterpreterResult<Flow> {
        let args = eval_all!(self, args, env);
        trace!(class = class.name(), arity = args.len(), "new instance");

        let instance = Instance::new(Rc::clone(class));
        if class.find_method(INIT_METHOD, args.len()).is_some() {
            Instance::call(&instance, INIT_METHOD, args, self)?;
        }
        Ok(Flow::Value(Value::Instance(instance)))
    }

    fn arithmetic(
        &mut self,
        op: ArithmeticOp,
        lhs: &Stmt,
        rhs: &Stmt,
        env: &mut Environment,
    ) -> InterpreterResult<Flow> {
        let lhs = eval!(self, lhs, env);
        let rhs = eval!(self, rhs, env);
        Ok(Flow::Value(self.apply_arithmetic(op, lhs, rhs)?))
    }

    /// Text `print` and `str` produce for `value`. Instances with a zero-argument `__str__` are
    /// rendered through it, and so is whatever that returns.
    pub(crate) fn render(&mut self, value: &Value) -> InterpreterResult<String> {
        let mut value = value.clone();
        for _ in 0..MAX_CALL_DEPTH {
            let instance = match &value {
                Value::Instance(instance)
                    if RefCell::borrow(instance).has_method(STR_METHOD, 0) =>
                {
                    Rc::clone(instance)
                }
                _ => return Ok(value.to_string()),
            };
            value = Instance::call(&instance, STR_METHOD, Vec::new(), self)?;
        }

        Err(Error::StackOverflow {
            limit: MAX_CALL_DEPTH,
        })
    }

    fn lookup(&self, path: &[String], env: &Environment) -> InterpreterResult<Value> {
        let (first, rest) = match path.split_first() {
            Some(split) => split,
            None => {
                return Err(Error::UndefinedVariable {
                    name: String::new(),
                })
            }
        };

        let mut value = env.get(first).ok_or_else(|| Error::UndefinedVariable {
            name: first.clone(),
        })?;

        for (idx, segment) in rest.iter().enumerate() {
            let field = match &value {
                Value::Instance(instance) => RefCell::borrow(instance).fields().get(segment),
                other => return Err(Error::ExpectedInstance { found: other.kind() }),
            };
            value = field.ok_or_else(|| Error::UndefinedVariable {
                name: path[..idx + 2].join("."),
            })?;
        }

        Ok(value)
    }

    fn equals_true(&mut self, value: &Value) -> InterpreterResult<bool> {
        compare::equal(value, &Value::Bool(true), self)
    }

    fn apply_arithmetic(
        &mut self,
        op: ArithmeticOp,
        lhs: Value,
        rhs: Value,
    ) -> InterpreterResult<Value> {
        match (op, &lhs, &rhs) {
            (_, Value::Number(lhs), Value::Number(rhs)) => numeric(op, *lhs, *rhs),
            (ArithmeticOp::Add, Value::Str(lhs), Value::Str(rhs)) => {
                Ok(Value::from(format!("{}{}", lhs, rhs)))
            }
            (ArithmeticOp::Add, Value::Instance(instance), _)
                if RefCell::borrow(instance).has_method(ADD_METHOD, 1) =>
            {
                Instance::call(instance, ADD_METHOD, vec![rhs.clone()], self)
            }
            _ => Err(Error::UnsupportedOperands {
                op: op.symbol(),
                lhs: lhs.kind(),
                rhs: rhs.kind(),
            }),
        }
    }
}

fn expect_instance(value: Value) -> InterpreterResult<Rc<RefCell<Instance>>> {
    match value {
        Value::Instance(instance) => Ok(instance),
        other => Err(Error::ExpectedInstance { found: other.kind() }),
    }
}

fn numeric(op: ArithmeticOp, lhs: i64, rhs: i64) -> InterpreterResult<Value> {
    let result = match op {
        ArithmeticOp::Add => lhs.checked_add(rhs),
        ArithmeticOp::Sub => lhs.checked_sub(rhs),
        ArithmeticOp::Mult => lhs.checked_mul(rhs),
        ArithmeticOp::Div => {
            if rhs == 0 {
                return Err(Error::DivisionByZero);
            }
            lhs.checked_div(rhs)
        }
    };

    result
        .map(Value::Number)
        .ok_or(Error::IntegerOverflow { op: op.symbol() })
}

#[cfg(test)]
mod tests {
    use crate::ast::Stmt;
    use crate::env::Environment;
    use crate::error::Error;
    use crate::interpreter::{Flow, Interpreter, MAX_CALL_DEPTH};
    use crate::value::Value;

    fn run(src: &str) -> (String, Result<(), Error>) {
        let mut output = Vec::new();
        let result = crate::run(src, &mut output);
        (String::from_utf8(output).unwrap(), result)
    }

    fn evaluate(stmt: &Stmt) -> (String, Flow) {
        let mut output = Vec::new();
        let mut env = Environment::new();
        let flow = {
            let mut interpreter = Interpreter::new(&mut output);
            interpreter.evaluate(stmt, &mut env).unwrap()
        };
        (String::from_utf8(output).unwrap(), flow)
    }

    #[test]
    fn test_programs() {
        let tests = [
            ("print 1 + 2, 'a' + 'b'\n", "3 ab\n"),
            ("print 10 / 3, 2 - 5, 2 * -3\n", "3 -3 -6\n"),
            ("x = 5\ny = x\nx = 6\nprint x, y\n", "6 5\n"),
            ("print\nprint None\n", "\nNone\n"),
            (
                "print not True, not False, True and False, False or True\n",
                "False True False True\n",
            ),
            ("print 1 == 1, 1 != 1, 'a' < 'b', 2 >= 3\n", "True False True False\n"),
            ("if 1 < 2:\n  print 'yes'\nelse:\n  print 'no'\n", "yes\n"),
            ("if 1 > 2:\n  print 'yes'\n", ""),
            ("s = str(1) + str(False)\nprint s\n", "1False\n"),
            ("class A:\n  def f(self):\n    return 1\nprint A\n", "Class A\n"),
            (
                "\
class A:
  def __init__(self, x):
    self.v = x

  def __str__(self):
    return str(self.v)

print A(5)
",
                "5\n",
            ),
            (
                "\
class A:
  def pick(self):
    if True:
      return 1
    else:
      return 2

print A().pick()
",
                "1\n",
            ),
            // methods without a return statement yield None
            ("class A:\n  def g(self):\n    x = 1\nprint A().g()\n", "None\n"),
            // arguments are dropped when no __init__ takes them
            ("class A:\n  def f(self):\n    return 1\na = A(1, 2)\nprint a.f()\n", "1\n"),
            // every instantiation creates a fresh object
            (
                "\
class C:
  def set(self, v):
    self.v = v

class F:
  def make(self):
    return C()

f = F()
a = f.make()
b = f.make()
a.set(1)
b.set(2)
print a.v, b.v
",
                "1 2\n",
            ),
            // assignment aliases instances
            (
                "\
class C:
  def __init__(self):
    self.v = 0

a = C()
b = a
b.v = 7
print a.v
",
                "7\n",
            ),
        ];

        for (src, expected) in tests {
            let (output, result) = run(src);
            assert!(result.is_ok(), "{}: {:?}", src, result);
            assert_eq!(output, expected, "{}", src);
        }
    }

    #[test]
    fn test_return_unwinds_nested_blocks() {
        let src = "\
class A:
  def f(self, n):
    if n > 0:
      if n > 10:
        return 'big'
      print 'small'
      return 'positive'
    return 'other'

a = A()
print a.f(50)
print a.f(5)
print a.f(0)
";
        let (output, result) = run(src);
        result.unwrap();
        assert_eq!(output, "big\nsmall\npositive\nother\n");
    }

    #[test]
    fn test_method_body_catches_return() {
        let body = Stmt::method_body(Stmt::compound(vec![
            Stmt::return_(Stmt::constant(1)),
            Stmt::print(vec![Stmt::constant("unreachable")]),
        ]));

        let (output, flow) = evaluate(&body);
        assert_eq!(flow, Flow::Value(Value::from(1)));
        assert!(output.is_empty());

        let (_, flow) = evaluate(&Stmt::compound(vec![Stmt::return_(Stmt::constant(2))]));
        assert_eq!(flow, Flow::Return(Value::from(2)));
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        // A right operand that prints would fail to compare with True, so any evaluation of it
        // shows up either as output or as an error
        let side_effect = || Stmt::print(vec![Stmt::constant("evaluated")]);

        let (output, flow) = evaluate(&Stmt::or(Stmt::constant(true), side_effect()));
        assert_eq!(flow, Flow::Value(Value::from(true)));
        assert!(output.is_empty());

        let (output, flow) = evaluate(&Stmt::and(Stmt::constant(false), side_effect()));
        assert_eq!(flow, Flow::Value(Value::from(false)));
        assert!(output.is_empty());

        let (output, result) = run("print True or undefined, False and undefined\n");
        result.unwrap();
        assert_eq!(output, "True False\n");
    }

    #[test]
    fn test_print_writes_separator_before_each_argument() {
        let src = "\
class Noisy:
  def say(self):
    print 'inner'
    return 'outer'

n = Noisy()
print 'first', n.say()
";
        let (output, result) = run(src);
        result.unwrap();
        assert_eq!(output, "first inner\nouter\n");
    }

    #[test]
    fn test_return_outside_method() {
        let (output, result) = run("print 1\nreturn 2\nprint 3\n");
        assert_eq!(output, "1\n");
        assert!(matches!(result, Err(Error::UnexpectedReturn)));
    }

    #[test]
    fn test_runtime_errors() {
        let tests = [
            ("print x\n", "undefined variable 'x'"),
            ("print 1 / 0\n", "division by zero"),
            ("print 9223372036854775807 + 1\n", "integer overflow in +"),
            ("print 1 + 'a'\n", "unsupported operand types for +: Number and String"),
            ("print 'a' - 'b'\n", "unsupported operand types for -: String and String"),
            ("print 1 < 'a'\n", "cannot compare Number and String for ordering"),
            ("print 1 or True\n", "cannot compare Number and Bool for equality"),
            ("if 1:\n  print 1\n", "condition must be a Bool, found Number"),
            ("x = 1\nprint x.y\n", "expected a class instance, found Number"),
            ("x = 'a'\nx.f()\n", "expected a class instance, found String"),
            (
                "class A:\n  def g(self):\n    return 1\nA().f()\n",
                "method 'f' with 0 argument(s) not found in class 'A'",
            ),
            (
                "class A:\n  def f(self, x):\n    return x\nA().f()\n",
                "method 'f' with 0 argument(s) not found in class 'A'",
            ),
            (
                "class A:\n  def f(self):\n    return 1\na = A()\nprint a.missing\n",
                "undefined variable 'a.missing'",
            ),
            (
                "class A:\n  def f(self):\n    return self.f()\nA().f()\n",
                "stack overflow: method calls nested deeper than 512",
            ),
            (
                "class A:\n  def __str__(self):\n    return self\nprint A()\n",
                "stack overflow: method calls nested deeper than 512",
            ),
        ];

        for (src, expected) in tests {
            match run(src) {
                (_, Err(err)) => assert_eq!(err.to_string(), expected, "{}", src),
                (output, Ok(())) => panic!("{} should fail, printed {:?}", src, output),
            }
        }
    }

    #[test]
    fn test_recursion_up_to_the_call_limit() {
        let src = "\
class Counter:
  def down(self, n):
    if n == 0:
      return 0
    return 1 + self.down(n - 1)

c = Counter()
print c.down(DEPTH)
";
        // The outermost call is already one level deep
        let (output, result) = run(&src.replace("DEPTH", &(MAX_CALL_DEPTH - 1).to_string()));
        result.unwrap();
        assert_eq!(output, format!("{}\n", MAX_CALL_DEPTH - 1));

        let (output, result) = run(&src.replace("DEPTH", &MAX_CALL_DEPTH.to_string()));
        assert!(output.is_empty());
        assert!(matches!(
            result,
            Err(Error::StackOverflow {
                limit: MAX_CALL_DEPTH
            })
        ));
    }

    #[test]
    fn test_error_raised_deep_in_recursion_propagates() {
        let src = "\
class Walker:
  def walk(self, n):
    print n
    if n == 0:
      return missing
    return self.walk(n - 1)

Walker().walk(300)
";
        let (output, result) = run(src);
        assert!(output.starts_with("300\n299\n"));
        assert!(output.ends_with("1\n0\n"));
        assert!(matches!(result, Err(Error::UndefinedVariable { name }) if name == "missing"));
    }
}
