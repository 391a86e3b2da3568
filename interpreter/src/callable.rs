use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use tracing::trace;

use crate::ast::Stmt;
use crate::env::Environment;
use crate::error::{Error, InterpreterResult};
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

pub(crate) const INIT_METHOD: &str = "__init__";
pub(crate) const STR_METHOD: &str = "__str__";
pub(crate) const EQ_METHOD: &str = "__eq__";
pub(crate) const LT_METHOD: &str = "__lt__";
pub(crate) const ADD_METHOD: &str = "__add__";

const SELF_NAME: &str = "self";

#[derive(Debug, PartialEq)]
pub(crate) struct Method {
    pub(crate) name: String,
    pub(crate) params: Vec<String>,
    pub(crate) body: Stmt,
}

impl Method {
    pub(crate) fn new(name: &str, params: Vec<String>, body: Stmt) -> Self {
        Method {
            name: String::from(name),
            params,
            body,
        }
    }

    pub(crate) fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct Class {
    name: String,
    methods: Vec<Method>,
    parent: Option<Rc<Class>>,
}

impl Class {
    pub(crate) fn new(name: &str, methods: Vec<Method>, parent: Option<Rc<Class>>) -> Rc<Self> {
        Rc::new(Class {
            name: String::from(name),
            methods,
            parent,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Method called `name` taking exactly `arity` arguments, searching this class before its
    /// ancestors. A subclass method with a different arity doesn't hide the parent's one.
    pub(crate) fn find_method(&self, name: &str, arity: usize) -> Option<&Method> {
        let own = self
            .methods
            .iter()
            .find(|method| method.name == name && method.arity() == arity);

        match own {
            Some(method) => Some(method),
            None => self
                .parent
                .as_ref()
                .and_then(|parent| parent.find_method(name, arity)),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Instance {
    class: Rc<Class>,
    fields: Environment,
}

impl Instance {
    pub(crate) fn new(class: Rc<Class>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Instance {
            class,
            fields: Environment::new(),
        }))
    }

    pub(crate) fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub(crate) fn fields(&self) -> &Environment {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Environment {
        &mut self.fields
    }

    pub(crate) fn has_method(&self, name: &str, arity: usize) -> bool {
        self.class.find_method(name, arity).is_some()
    }

    /// Runs `method` with `self` bound to `instance`.
    ///
    /// The method gets a fresh scope holding its parameters and `self`; `self` is another handle
    /// to the same instance, never a copy. No borrow of the instance is held while the body
    /// runs, so the body is free to read and write its own fields.
    pub(crate) fn call(
        instance: &Rc<RefCell<Self>>,
        method: &str,
        args: Vec<Value>,
        interpreter: &mut Interpreter,
    ) -> InterpreterResult<Value> {
        let class = Rc::clone(RefCell::borrow(instance).class());
        let function = match class.find_method(method, args.len()) {
            Some(function) => function,
            None => {
                return Err(Error::MethodNotFound {
                    class: class.name().to_string(),
                    method: method.to_string(),
                    arity: args.len(),
                })
            }
        };

        trace!(class = class.name(), method, arity = args.len(), "calling method");

        let mut env = Environment::new();
        for (param, arg) in function.params.iter().zip(args) {
            env.define(param, arg);
        }
        env.define(SELF_NAME, Value::Instance(Rc::clone(instance)));

        interpreter.enter_call()?;
        let result = interpreter.evaluate(&function.body, &mut env);
        interpreter.exit_call();

        match result? {
            Flow::Value(value) => Ok(value),
            // Method bodies are wrapped in `Stmt::MethodBody`, so this only happens for bodies
            // that weren't built by the parser
            Flow::Return(_) => Err(Error::UnexpectedReturn),
        }
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} object at {:p}>", self.class.name(), self)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::ast::Stmt;
    use crate::callable::{Class, Instance, Method};
    use crate::error::Error;
    use crate::interpreter::{Interpreter, MAX_CALL_DEPTH};
    use crate::value::Value;

    fn method(name: &str, params: &[&str]) -> Method {
        let params = params.iter().map(|param| param.to_string()).collect();
        Method::new(name, params, Stmt::method_body(Stmt::compound(Vec::new())))
    }

    #[test]
    fn test_method_lookup_walks_parents() {
        let base = Class::new("Base", vec![method("f", &[]), method("g", &["x"])], None);
        let derived = Class::new("Derived", vec![method("f", &["a", "b"])], Some(base));

        assert_eq!(derived.find_method("f", 0).map(Method::arity), Some(0));
        assert_eq!(derived.find_method("f", 2).map(Method::arity), Some(2));
        assert_eq!(derived.find_method("g", 1).map(Method::arity), Some(1));
        assert!(derived.find_method("f", 1).is_none());
        assert!(derived.find_method("h", 0).is_none());
    }

    #[test]
    fn test_has_method() {
        let class = Class::new("A", vec![method("__eq__", &["other"])], None);
        let instance = Instance::new(class);

        assert!(instance.borrow().has_method("__eq__", 1));
        assert!(!instance.borrow().has_method("__eq__", 0));
        assert!(!instance.borrow().has_method("__lt__", 1));
    }

    #[test]
    fn test_call_binds_params_and_self() {
        // def set(v): self.value = v
        let body = Stmt::method_body(Stmt::field_assignment(
            Stmt::variable(&["self"]),
            "value",
            Stmt::variable(&["v"]),
        ));
        let class = Class::new("Box", vec![Method::new("set", vec!["v".to_string()], body)], None);
        let instance = Instance::new(Rc::clone(&class));

        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);
        let result = Instance::call(&instance, "set", vec![Value::from(7)], &mut interpreter);

        assert_eq!(result.unwrap(), Value::from(7));
        assert_eq!(instance.borrow().fields().get("value"), Some(Value::from(7)));
    }

    #[test]
    fn test_call_missing_method() {
        let instance = Instance::new(Class::new("A", vec![method("f", &[])], None));
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);

        // (name, arity) is the whole key, so a wrong argument count is a missing method
        let tests = [("f", 1), ("g", 0)];
        for (name, arity) in tests {
            let args = vec![Value::None; arity];
            let result = Instance::call(&instance, name, args, &mut interpreter);
            match result {
                Err(Error::MethodNotFound {
                    class,
                    method,
                    arity: found,
                }) => {
                    assert_eq!(class, "A");
                    assert_eq!(method, name);
                    assert_eq!(found, arity);
                }
                other => panic!("expected MethodNotFound, found {:?}", other),
            }
        }
    }

    #[test]
    fn test_call_depth_is_limited_and_restored() {
        // def down(): return self.down()
        let body = Stmt::method_body(Stmt::return_(Stmt::method_call(
            Stmt::variable(&["self"]),
            "down",
            Vec::new(),
        )));
        let methods = vec![Method::new("down", Vec::new(), body), method("f", &[])];
        let class = Class::new("C", methods, None);
        let instance = Instance::new(class);

        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);

        let result = Instance::call(&instance, "down", Vec::new(), &mut interpreter);
        assert!(matches!(
            result,
            Err(Error::StackOverflow {
                limit: MAX_CALL_DEPTH
            })
        ));

        // Depth unwinds with the error, so later calls start from the top again
        let result = Instance::call(&instance, "f", Vec::new(), &mut interpreter);
        assert_eq!(result.unwrap(), Value::None);
    }
}
