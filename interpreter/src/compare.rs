use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Comparator;
use crate::callable::{Instance, EQ_METHOD, LT_METHOD};
use crate::error::{Error, InterpreterResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

// Calls a one-argument comparison method on `lhs` if its class has one, returning `None`
// when it doesn't.
fn dispatch(
    lhs: &Rc<RefCell<Instance>>,
    method: &str,
    rhs: &Value,
    interpreter: &mut Interpreter,
) -> InterpreterResult<Option<bool>> {
    if !RefCell::borrow(lhs).has_method(method, 1) {
        return Ok(None);
    }

    let result = Instance::call(lhs, method, vec![rhs.clone()], interpreter)?;
    Ok(Some(result.is_true()))
}

pub(crate) fn equal(
    lhs: &Value,
    rhs: &Value,
    interpreter: &mut Interpreter,
) -> InterpreterResult<bool> {
    let result = match (lhs, rhs) {
        (Value::Str(lhs), Value::Str(rhs)) => Some(lhs == rhs),
        (Value::Number(lhs), Value::Number(rhs)) => Some(lhs == rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => Some(lhs == rhs),
        (Value::Instance(instance), Value::Instance(_)) => {
            dispatch(instance, EQ_METHOD, rhs, interpreter)?
        }
        (Value::None, Value::None) => Some(true),
        _ => None,
    };

    result.ok_or(Error::Incomparable {
        relation: "equality",
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    })
}

pub(crate) fn less(
    lhs: &Value,
    rhs: &Value,
    interpreter: &mut Interpreter,
) -> InterpreterResult<bool> {
    let result = match (lhs, rhs) {
        (Value::Str(lhs), Value::Str(rhs)) => Some(lhs < rhs),
        (Value::Number(lhs), Value::Number(rhs)) => Some(lhs < rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => Some(lhs < rhs),
        (Value::Instance(instance), Value::Instance(_)) => {
            dispatch(instance, LT_METHOD, rhs, interpreter)?
        }
        _ => None,
    };

    result.ok_or(Error::Incomparable {
        relation: "ordering",
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    })
}

// The remaining relations are derived from `equal` and `less` only, which keeps them consistent
// with each other for user classes that define nothing but `__eq__` and `__lt__`.

pub(crate) fn not_equal(
    lhs: &Value,
    rhs: &Value,
    interpreter: &mut Interpreter,
) -> InterpreterResult<bool> {
    Ok(!equal(lhs, rhs, interpreter)?)
}

pub(crate) fn greater(
    lhs: &Value,
    rhs: &Value,
    interpreter: &mut Interpreter,
) -> InterpreterResult<bool> {
    Ok(!less(lhs, rhs, interpreter)? && not_equal(lhs, rhs, interpreter)?)
}

pub(crate) fn less_or_equal(
    lhs: &Value,
    rhs: &Value,
    interpreter: &mut Interpreter,
) -> InterpreterResult<bool> {
    Ok(!greater(lhs, rhs, interpreter)?)
}

pub(crate) fn greater_or_equal(
    lhs: &Value,
    rhs: &Value,
    interpreter: &mut Interpreter,
) -> InterpreterResult<bool> {
    Ok(!less(lhs, rhs, interpreter)?)
}

impl Comparator {
    pub(crate) fn apply(
        self,
        lhs: &Value,
        rhs: &Value,
        interpreter: &mut Interpreter,
    ) -> InterpreterResult<bool> {
        match self {
            Comparator::Equal => equal(lhs, rhs, interpreter),
            Comparator::NotEqual => not_equal(lhs, rhs, interpreter),
            Comparator::Less => less(lhs, rhs, interpreter),
            Comparator::Greater => greater(lhs, rhs, interpreter),
            Comparator::LessOrEqual => less_or_equal(lhs, rhs, interpreter),
            Comparator::GreaterOrEqual => greater_or_equal(lhs, rhs, interpreter),
        }
    }
}
