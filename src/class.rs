// ABOUTME: Class and instance types implementing single inheritance and method dispatch

use crate::callable::{Arity, Callable, UserFunction};
use crate::error::{Flow, RuntimeError};
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<UserFunction>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<UserFunction>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Looks up a method by name, falling through to the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<UserFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }
}

impl Class {
    /// A class's call arity is its `init` method's arity, or zero if it
    /// declares none. Classes are not `Rc<dyn Callable>` trait objects —
    /// `Value::Class` carries `Rc<Class>` directly and `Interpreter::call_value`
    /// dispatches on it to reach `instantiate`, since construction needs the
    /// `Rc<Class>` itself (to stash on the new `Instance`), not just a
    /// `&dyn Callable` reference.
    pub fn arity(&self) -> Arity {
        match self.find_method("init") {
            Some(initializer) => Arity::Fixed(initializer.declaration.params.len()),
            None => Arity::Fixed(0),
        }
    }

    /// Creates a new instance and runs `init` (if defined) with `arguments`.
    pub fn instantiate(
        self_rc: &Rc<Class>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, Flow> {
        let instance = Rc::new(Instance {
            class: Rc::clone(self_rc),
            fields: RefCell::new(HashMap::new()),
        });

        if let Some(initializer) = self_rc.find_method("init") {
            let bound = initializer.bind(Value::Instance(Rc::clone(&instance)));
            bound.call(interpreter, arguments, line)?;
        } else if !arguments.is_empty() {
            return Err(RuntimeError::ArityMismatch {
                expected: 0,
                got: arguments.len(),
                line,
            }
            .into());
        }

        Ok(Value::Instance(instance))
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn get(self_rc: &Rc<Instance>, name: &str, line: usize) -> Result<Value, RuntimeError> {
        if let Some(value) = self_rc.fields.borrow().get(name) {
            return Ok(value.clone());
        }
        if let Some(method) = self_rc.class.find_method(name) {
            let bound = method.bind(Value::Instance(Rc::clone(self_rc)));
            return Ok(Value::Callable(Rc::new(bound)));
        }
        Err(RuntimeError::UndefinedProperty {
            name: name.to_string(),
            line,
        })
    }

    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
