use std::rc::Rc;

use crate::callable::Class;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithmeticOp {
    Add,
    Sub,
    Mult,
    Div,
}

impl ArithmeticOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mult => "*",
            ArithmeticOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

/// Executable node of a program. Expressions and statements share one type because every node
/// evaluates to a value (possibly `None`) in the same way.
#[derive(Debug, PartialEq)]
pub(crate) enum Stmt {
    Const {
        value: Value,
    },
    Assignment {
        name: String,
        value: Box<Stmt>,
    },
    VariableValue {
        path: Vec<String>,
    },
    Print {
        args: Vec<Stmt>,
    },
    Stringify {
        argument: Box<Stmt>,
    },
    MethodCall {
        object: Box<Stmt>,
        method: String,
        args: Vec<Stmt>,
    },
    Arithmetic {
        op: ArithmeticOp,
        lhs: Box<Stmt>,
        rhs: Box<Stmt>,
    },
    Compound {
        statements: Vec<Stmt>,
    },
    Return {
        value: Box<Stmt>,
    },
    MethodBody {
        body: Box<Stmt>,
    },
    ClassDefinition {
        class: Rc<Class>,
    },
    FieldAssignment {
        object: Box<Stmt>,
        field: String,
        value: Box<Stmt>,
    },
    IfElse {
        condition: Box<Stmt>,
        if_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    Or {
        lhs: Box<Stmt>,
        rhs: Box<Stmt>,
    },
    And {
        lhs: Box<Stmt>,
        rhs: Box<Stmt>,
    },
    Not {
        argument: Box<Stmt>,
    },
    Comparison {
        comparator: Comparator,
        lhs: Box<Stmt>,
        rhs: Box<Stmt>,
    },
    NewInstance {
        class: Rc<Class>,
        args: Vec<Stmt>,
    },
}

// Creator methods, shared by the parser and the tests
impl Stmt {
    pub(crate) fn constant<T>(value: T) -> Self
    where
        Value: From<T>,
    {
        Stmt::Const {
            value: Value::from(value),
        }
    }

    pub(crate) fn none() -> Self {
        Stmt::Const { value: Value::None }
    }

    pub(crate) fn assignment(name: &str, value: Stmt) -> Self {
        Stmt::Assignment {
            name: String::from(name),
            value: Box::new(value),
        }
    }

    pub(crate) fn variable<S: AsRef<str>>(path: &[S]) -> Self {
        Stmt::VariableValue {
            path: path.iter().map(|id| String::from(id.as_ref())).collect(),
        }
    }

    pub(crate) fn print(args: Vec<Stmt>) -> Self {
        Stmt::Print { args }
    }

    pub(crate) fn stringify(argument: Stmt) -> Self {
        Stmt::Stringify {
            argument: Box::new(argument),
        }
    }

    pub(crate) fn method_call(object: Stmt, method: &str, args: Vec<Stmt>) -> Self {
        Stmt::MethodCall {
            object: Box::new(object),
            method: String::from(method),
            args,
        }
    }

    pub(crate) fn arithmetic(op: ArithmeticOp, lhs: Stmt, rhs: Stmt) -> Self {
        Stmt::Arithmetic {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub(crate) fn compound(statements: Vec<Stmt>) -> Self {
        Stmt::Compound { statements }
    }

    pub(crate) fn return_(value: Stmt) -> Self {
        Stmt::Return {
            value: Box::new(value),
        }
    }

    pub(crate) fn method_body(body: Stmt) -> Self {
        Stmt::MethodBody {
            body: Box::new(body),
        }
    }

    pub(crate) fn class_definition(class: Rc<Class>) -> Self {
        Stmt::ClassDefinition { class }
    }

    pub(crate) fn field_assignment(object: Stmt, field: &str, value: Stmt) -> Self {
        Stmt::FieldAssignment {
            object: Box::new(object),
            field: String::from(field),
            value: Box::new(value),
        }
    }

    pub(crate) fn if_else(condition: Stmt, if_body: Stmt, else_body: Option<Stmt>) -> Self {
        Stmt::IfElse {
            condition: Box::new(condition),
            if_body: Box::new(if_body),
            else_body: else_body.map(Box::new),
        }
    }

    pub(crate) fn or(lhs: Stmt, rhs: Stmt) -> Self {
        Stmt::Or {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub(crate) fn and(lhs: Stmt, rhs: Stmt) -> Self {
        Stmt::And {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub(crate) fn not(argument: Stmt) -> Self {
        Stmt::Not {
            argument: Box::new(argument),
        }
    }

    pub(crate) fn comparison(comparator: Comparator, lhs: Stmt, rhs: Stmt) -> Self {
        Stmt::Comparison {
            comparator,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub(crate) fn new_instance(class: Rc<Class>, args: Vec<Stmt>) -> Self {
        Stmt::NewInstance { class, args }
    }
}
