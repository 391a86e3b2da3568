use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::callable::{Class, Instance};

/// Handle to a runtime value.
///
/// `None` is the empty handle. Cloning a handle never copies an instance: both clones point at
/// the same `RefCell<Instance>`, so field writes through one alias are visible through the
/// other. The remaining kinds are immutable, so sharing and copying them is indistinguishable.
#[derive(Debug, Clone, Default)]
pub(crate) enum Value {
    #[default]
    None,
    Number(i64),
    Str(Rc<String>),
    Bool(bool),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    pub(crate) fn is_true(&self) -> bool {
        match self {
            Value::Str(val) => !val.is_empty(),
            Value::Number(val) => *val != 0,
            Value::Bool(val) => *val,
            Value::None | Value::Class(_) | Value::Instance(_) => false,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Number(_) => "Number",
            Value::Str(_) => "String",
            Value::Bool(_) => "Bool",
            Value::Class(_) => "Class",
            Value::Instance(_) => "ClassInstance",
        }
    }
}

// Identity comparison for classes and instances, value comparison for everything else. This is
// only used by tests and lookups; language-level equality lives in `compare`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Number(lhs), Value::Number(rhs)) => lhs == rhs,
            (Value::Str(lhs), Value::Str(rhs)) => lhs == rhs,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Class(lhs), Value::Class(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Instance(lhs), Value::Instance(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::new(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::new(String::from(value)))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value)
    }
}

// Instances are rendered by identity here. Printing goes through `Interpreter::render`, which
// dispatches to `__str__` first.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Number(val) => write!(f, "{}", val),
            Value::Str(val) => write!(f, "{}", val),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Class(class) => write!(f, "Class {}", class.name()),
            Value::Instance(instance) => write!(f, "{}", RefCell::borrow(instance)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::callable::{Class, Instance};
    use crate::value::Value;

    #[test]
    fn test_truthiness() {
        let class = Class::new("A", Vec::new(), None);
        let tests = [
            (Value::from(""), false),
            (Value::from("x"), true),
            (Value::from(0), false),
            (Value::from(-3), true),
            (Value::from(true), true),
            (Value::from(false), false),
            (Value::None, false),
            (Value::Class(Rc::clone(&class)), false),
            (Value::Instance(Instance::new(class)), false),
        ];

        for (value, expected) in tests {
            assert_eq!(value.is_true(), expected, "value: {:?}", value);
        }
    }

    #[test]
    fn test_display() {
        let class = Class::new("Rect", Vec::new(), None);
        let tests = [
            (Value::None, "None"),
            (Value::from(42), "42"),
            (Value::from(-7), "-7"),
            (Value::from("hello"), "hello"),
            (Value::from(true), "True"),
            (Value::from(false), "False"),
            (Value::Class(Rc::clone(&class)), "Class Rect"),
        ];

        for (value, expected) in tests {
            assert_eq!(value.to_string(), expected);
        }

        let instance = Value::Instance(Instance::new(class));
        assert!(instance.to_string().starts_with("<Rect object at "));
    }

    #[test]
    fn test_clones_alias_instances() {
        let instance = Value::Instance(Instance::new(Class::new("A", Vec::new(), None)));
        let alias = instance.clone();
        assert_eq!(instance, alias);

        if let Value::Instance(object) = &alias {
            object.borrow_mut().fields_mut().define("x", Value::from(1));
        }
        if let Value::Instance(object) = &instance {
            assert_eq!(object.borrow().fields().get("x"), Some(Value::from(1)));
        }

        let other = Value::Instance(Instance::new(Class::new("A", Vec::new(), None)));
        assert_ne!(instance, other);
    }
}
