// ABOUTME: Environment module for managing variable bindings and lexical scopes

use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment enclosed by `parent`.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope (doesn't walk parent chain). Lets
    /// a later `var` re-declare a name already bound in the same scope.
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up a name in this scope and parent scopes recursively.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Looks up `name`, raising `RuntimeError::UndefinedVariable` if absent
    /// anywhere in the chain.
    pub fn get_or_err(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        self.get(name).ok_or_else(|| RuntimeError::UndefinedVariable {
            name: name.to_string(),
            line,
        })
    }

    /// Assigns to an EXISTING binding, walking the parent chain. Unlike
    /// `define`, this never creates a new binding.
    pub fn assign(&self, name: &str, value: Value, line: usize) -> Result<(), RuntimeError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        if let Some(ref parent) = self.parent {
            return parent.assign(name, value, line);
        }
        Err(RuntimeError::UndefinedVariable {
            name: name.to_string(),
            line,
        })
    }

    /// Walks `distance` enclosing links up from `self`. Scaffolding for a
    /// resolver-driven lookup; unused while the interpreter resolves
    /// variables dynamically (see DESIGN.md).
    #[allow(dead_code)]
    pub fn ancestor(self: &Rc<Self>, distance: usize) -> Rc<Environment> {
        let mut env = Rc::clone(self);
        for _ in 0..distance {
            env = Rc::clone(env.parent.as_ref().expect("ancestor distance exceeds chain length"));
        }
        env
    }

    #[allow(dead_code)]
    pub fn get_at(self: &Rc<Self>, distance: usize, name: &str) -> Option<Value> {
        self.ancestor(distance).bindings.borrow().get(name).cloned()
    }

    #[allow(dead_code)]
    pub fn assign_at(self: &Rc<Self>, distance: usize, name: &str, value: Value) {
        self.ancestor(distance)
            .bindings
            .borrow_mut()
            .insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Number(42.0));
        match env.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("expected Number(42.0)"),
        }
    }

    #[test]
    fn undefined_name_is_none() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn get_or_err_reports_undefined_variable() {
        let env = Environment::new();
        let err = env.get_or_err("missing", 3).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UndefinedVariable {
                name: "missing".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn child_scope_shadows_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(42.0));
        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Number(100.0));
        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 100.0),
            _ => panic!("expected Number(100.0)"),
        }
    }

    #[test]
    fn child_scope_sees_parent_bindings() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(42.0));
        let child = Environment::with_parent(parent);
        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("expected Number(42.0)"),
        }
    }

    #[test]
    fn assign_updates_the_defining_scope_not_a_new_one() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(1.0));
        let child = Environment::with_parent(Rc::clone(&parent));
        child.assign("x", Value::Number(2.0), 1).unwrap();
        match parent.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 2.0),
            _ => panic!("expected Number(2.0)"),
        }
    }

    #[test]
    fn assign_to_undefined_name_errors() {
        let env = Environment::new();
        let err = env.assign("nope", Value::Nil, 7).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UndefinedVariable {
                name: "nope".to_string(),
                line: 7
            }
        );
    }

    #[test]
    fn multiple_nested_scopes_resolve_through_the_whole_chain() {
        let grandparent = Environment::new();
        grandparent.define("a".to_string(), Value::Number(1.0));
        let parent = Environment::with_parent(grandparent);
        parent.define("b".to_string(), Value::Number(2.0));
        let child = Environment::with_parent(parent);
        child.define("c".to_string(), Value::Number(3.0));

        assert!(matches!(child.get("a"), Some(Value::Number(n)) if n == 1.0));
        assert!(matches!(child.get("b"), Some(Value::Number(n)) if n == 2.0));
        assert!(matches!(child.get("c"), Some(Value::Number(n)) if n == 3.0));
    }
}
