// ABOUTME: Callable values: user-defined functions/methods plus the two native functions

use crate::ast::FunctionDecl;
use crate::env::Environment;
use crate::error::Flow;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A callable's declared arity. Native variadic functions (only `print`)
/// bypass arity checking entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Any,
}

pub trait Callable: fmt::Debug {
    fn arity(&self) -> Arity;
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>, line: usize) -> Result<Value, Flow>;
    fn name(&self) -> &str;
}

/// A function or method declared in source, closing over the environment in
/// which it was declared.
#[derive(Debug)]
pub struct UserFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<Environment>,
    pub is_initializer: bool,
}

impl UserFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<Environment>, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Returns a copy of this function bound to `instance` via a fresh
    /// enclosing scope holding only `this`.
    pub fn bind(&self, instance: Value) -> UserFunction {
        let env = Environment::with_parent(Rc::clone(&self.closure));
        env.define("this".to_string(), instance);
        UserFunction {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for UserFunction {
    fn arity(&self) -> Arity {
        Arity::Fixed(self.declaration.params.len())
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>, _line: usize) -> Result<Value, Flow> {
        let call_env = Environment::with_parent(Rc::clone(&self.closure));
        for (param, arg) in self.declaration.params.iter().zip(arguments.into_iter()) {
            call_env.define(param.lexeme.clone(), arg);
        }

        let result = interpreter.execute_block(&self.declaration.body, call_env);

        let return_value = match result {
            Ok(()) => Value::Nil,
            Err(Flow::Return(value)) => value,
            Err(err @ Flow::Error(_)) => return Err(err),
        };

        if self.is_initializer {
            return Ok(self
                .closure
                .get("this")
                .expect("initializer closure always binds `this`"));
        }

        Ok(return_value)
    }

    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

/// `clock()` — returns seconds since the Unix epoch as a float.
#[derive(Debug)]
pub struct ClockFn;

impl Callable for ClockFn {
    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }

    fn call(&self, _interpreter: &mut Interpreter, _arguments: Vec<Value>, _line: usize) -> Result<Value, Flow> {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_secs_f64();
        Ok(Value::Number(seconds))
    }

    fn name(&self) -> &str {
        "clock"
    }
}

/// `print(...)` — variadic native, distinct from the `print` statement.
/// Writes each argument stringified and space-separated, followed by a
/// newline. Arity checking is bypassed for this function.
#[derive(Debug)]
pub struct PrintFn;

impl Callable for PrintFn {
    fn arity(&self) -> Arity {
        Arity::Any
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>, _line: usize) -> Result<Value, Flow> {
        let rendered = arguments
            .iter()
            .map(crate::value::stringify)
            .collect::<Vec<_>>()
            .join(" ");
        interpreter.write_line(&rendered);
        Ok(Value::Nil)
    }

    fn name(&self) -> &str {
        "print"
    }
}

#[allow(dead_code)]
pub type SharedWriter = Rc<RefCell<dyn std::io::Write>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use std::io::Write;

    fn capturing_interpreter() -> (Interpreter, Rc<RefCell<Vec<u8>>>) {
        let output = Rc::new(RefCell::new(Vec::new()));
        let interpreter = Interpreter::with_writer(Rc::clone(&output) as Rc<RefCell<dyn Write>>);
        (interpreter, output)
    }

    #[test]
    fn print_fn_is_variadic_and_bypasses_arity_checking() {
        assert_eq!(PrintFn.arity(), Arity::Any);
    }

    #[test]
    fn print_fn_joins_stringified_arguments_with_a_space() {
        let (mut interpreter, output) = capturing_interpreter();
        let args = vec![Value::Number(1.0), Value::Str("two".to_string()), Value::Bool(true)];
        let result = PrintFn.call(&mut interpreter, args, 1).unwrap();
        assert!(matches!(result, Value::Nil));
        assert_eq!(String::from_utf8(output.borrow().clone()).unwrap(), "1 two true\n");
    }

    #[test]
    fn clock_fn_returns_a_nonnegative_number() {
        let (mut interpreter, _output) = capturing_interpreter();
        let result = ClockFn.call(&mut interpreter, vec![], 1).unwrap();
        match result {
            Value::Number(n) => assert!(n >= 0.0),
            other => panic!("expected a number, got {other:?}"),
        }
    }
}
