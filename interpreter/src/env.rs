use ahash::AHashMap;

use crate::value::Value;

/// Name to value mapping. Serves both as a method activation record and as the field table of
/// an instance. There is no enclosing scope: a method body only sees its parameters and `self`.
#[derive(Debug, Default)]
pub(crate) struct Environment {
    values: AHashMap<String, Value>,
}

impl Environment {
    pub(crate) fn new() -> Self {
        Environment {
            values: AHashMap::new(),
        }
    }

    pub(crate) fn define(&mut self, key: &str, value: Value) {
        self.values.insert(String::from(key), value);
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}
