// ABOUTME: Tree-walking evaluator executing the AST against the environment chain

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::callable::{Arity, Callable, ClockFn, PrintFn, UserFunction};
use crate::class::{Class, Instance};
use crate::env::Environment;
use crate::error::{Flow, RuntimeError};
use crate::lexer::TokenKind;
use crate::value::{stringify, values_equal, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

pub struct Interpreter {
    pub globals: Rc<Environment>,
    environment: Rc<Environment>,
    output: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_writer(Rc::new(RefCell::new(std::io::stdout())))
    }

    /// Builds an interpreter writing `print` output to `output` instead of
    /// stdout — used by tests to capture output deterministically.
    pub fn with_writer(output: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Environment::new();
        globals.define("clock".to_string(), Value::Callable(Rc::new(ClockFn)));
        globals.define("print".to_string(), Value::Callable(Rc::new(PrintFn)));
        Self {
            environment: Rc::clone(&globals),
            globals,
            output,
        }
    }

    pub fn write_line(&mut self, text: &str) {
        let mut out = self.output.borrow_mut();
        let _ = writeln!(out, "{}", text);
    }

    /// Runs a top-level program (a script or one REPL line). A `return`
    /// that escapes every function call and reaches here ends execution
    /// successfully rather than erroring (see DESIGN.md).
    pub fn run(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(Flow::Error(err)) => return Err(err),
                Err(Flow::Return(_)) => return Ok(()),
            }
        }
        Ok(())
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<(), Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.write_line(&stringify(&value));
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block(statements) => self.execute_block(statements, Environment::with_parent(Rc::clone(&self.environment))),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
            Stmt::Function(decl) => {
                let function = UserFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .define(decl.name.lexeme.clone(), Value::Callable(Rc::new(function)));
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let result = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Flow::Return(result))
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class_decl(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class_decl(
        &mut self,
        name: &crate::lexer::Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::ast::FunctionDecl>],
    ) -> Result<(), Flow> {
        let superclass_value = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(RuntimeError::SuperclassMustBeClass { line: name.line }.into());
                }
            },
            None => None,
        };

        self.environment.define(name.lexeme.clone(), Value::Nil);

        let methods_closure = match &superclass_value {
            Some(superclass) => {
                let scope = Environment::with_parent(Rc::clone(&self.environment));
                scope.define("super".to_string(), Value::Class(Rc::clone(superclass)));
                scope
            }
            None => Rc::clone(&self.environment),
        };

        let mut method_map = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function = Rc::new(UserFunction::new(
                Rc::clone(method),
                Rc::clone(&methods_closure),
                is_initializer,
            ));
            method_map.insert(method.name.lexeme.clone(), function);
        }

        let class = Value::Class(Rc::new(Class::new(name.lexeme.clone(), superclass_value, method_map)));
        self.environment
            .assign(&name.lexeme, class, name.line)
            .map_err(Flow::from)
    }

    /// Executes `statements` against a fresh scope, restoring the prior
    /// environment on every exit path (normal, error, or return).
    pub fn execute_block(&mut self, statements: &[Stmt], scope: Rc<Environment>) -> Result<(), Flow> {
        let previous = std::mem::replace(&mut self.environment, scope);
        let result = (|| {
            for stmt in statements {
                self.execute(stmt)?;
            }
            Ok(())
        })();
        self.environment = previous;
        result
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(literal_to_value(value)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Variable(name) => self.environment.get_or_err(&name.lexeme, name.line),
            Expr::This(keyword) => self.environment.get_or_err(&keyword.lexeme, keyword.line),
            Expr::Assign { name, value } => {
                let evaluated = self.evaluate(value)?;
                self.environment
                    .assign(&name.lexeme, evaluated.clone(), name.line)?;
                Ok(evaluated)
            }
            Expr::Unary { operator, right } => {
                let value = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Minus => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::OperandMustBeNumber { line: operator.line }),
                    },
                    TokenKind::Bang => Ok(Value::Bool(!value.is_truthy())),
                    _ => unreachable!("parser never emits a unary operator besides - and !"),
                }
            }
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Logical { left, operator, right } => {
                let left_value = self.evaluate(left)?;
                match operator.kind {
                    TokenKind::Or => {
                        if left_value.is_truthy() {
                            Ok(left_value)
                        } else {
                            self.evaluate(right)
                        }
                    }
                    TokenKind::And => {
                        if !left_value.is_truthy() {
                            Ok(left_value)
                        } else {
                            self.evaluate(right)
                        }
                    }
                    _ => unreachable!("parser never emits a logical operator besides and/or"),
                }
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value = self.evaluate(callee)?;
                let mut evaluated_args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    evaluated_args.push(self.evaluate(argument)?);
                }
                self.call_value(callee_value, evaluated_args, paren.line)
            }
            Expr::Get { object, name } => {
                let object_value = self.evaluate(object)?;
                match object_value {
                    Value::Instance(instance) => Instance::get(&instance, &name.lexeme, name.line),
                    _ => Err(RuntimeError::NotAnInstance { line: name.line }),
                }
            }
            Expr::Set { object, name, value } => {
                let object_value = self.evaluate(object)?;
                match object_value {
                    Value::Instance(instance) => {
                        let evaluated = self.evaluate(value)?;
                        instance.set(&name.lexeme, evaluated.clone());
                        Ok(evaluated)
                    }
                    _ => Err(RuntimeError::NotAnInstance { line: name.line }),
                }
            }
            Expr::Super { keyword, method } => self.evaluate_super(keyword, method),
        }
    }

    fn evaluate_super(&mut self, keyword: &crate::lexer::Token, method: &crate::lexer::Token) -> Result<Value, RuntimeError> {
        let superclass = match self.environment.get_or_err("super", keyword.line)? {
            Value::Class(class) => class,
            _ => unreachable!("the `super` binding is always a class"),
        };
        let instance = match self.environment.get_or_err("this", keyword.line)? {
            Value::Instance(instance) => instance,
            _ => unreachable!("`this` is always bound wherever `super` is reachable"),
        };
        let bound_method = superclass
            .find_method(&method.lexeme)
            .ok_or_else(|| RuntimeError::UndefinedProperty {
                name: method.lexeme.clone(),
                line: method.line,
            })?;
        let bound = bound_method.bind(Value::Instance(instance));
        Ok(Value::Callable(Rc::new(bound)))
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &crate::lexer::Token, right: &Expr) -> Result<Value, RuntimeError> {
        let left_value = self.evaluate(left)?;
        let right_value = self.evaluate(right)?;
        let line = operator.line;

        match operator.kind {
            TokenKind::Plus => match (&left_value, &right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
                _ => Err(RuntimeError::OperandsMustBeNumbersOrStrings { line }),
            },
            TokenKind::Minus => numeric_binary(&left_value, &right_value, line, |a, b| a - b),
            TokenKind::Star => numeric_binary(&left_value, &right_value, line, |a, b| a * b),
            TokenKind::Slash => numeric_binary(&left_value, &right_value, line, |a, b| a / b),
            TokenKind::Greater => numeric_comparison(&left_value, &right_value, line, |a, b| a > b),
            TokenKind::GreaterEqual => numeric_comparison(&left_value, &right_value, line, |a, b| a >= b),
            TokenKind::Less => numeric_comparison(&left_value, &right_value, line, |a, b| a < b),
            TokenKind::LessEqual => numeric_comparison(&left_value, &right_value, line, |a, b| a <= b),
            TokenKind::EqualEqual => Ok(Value::Bool(values_equal(&left_value, &right_value))),
            TokenKind::BangEqual => Ok(Value::Bool(!values_equal(&left_value, &right_value))),
            _ => unreachable!("parser never emits a non-binary operator kind here"),
        }
    }

    fn call_value(&mut self, callee: Value, arguments: Vec<Value>, line: usize) -> Result<Value, RuntimeError> {
        match callee {
            Value::Callable(callable) => {
                check_arity(callable.arity(), arguments.len(), line)?;
                flow_to_result(callable.call(self, arguments, line))
            }
            Value::Class(class) => {
                check_arity(class.arity(), arguments.len(), line)?;
                flow_to_result(Class::instantiate(&class, self, arguments, line))
            }
            _ => Err(RuntimeError::NotCallable { line }),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn check_arity(arity: Arity, got: usize, line: usize) -> Result<(), RuntimeError> {
    match arity {
        Arity::Any => Ok(()),
        Arity::Fixed(expected) if expected == got => Ok(()),
        Arity::Fixed(expected) => Err(RuntimeError::ArityMismatch { expected, got, line }),
    }
}

/// `Flow::Return` escaping a direct call means the callee already consumed
/// its own return signal (see `UserFunction::call`); treat it as the
/// produced value rather than propagating it further.
fn flow_to_result(result: Result<Value, Flow>) -> Result<Value, RuntimeError> {
    match result {
        Ok(value) => Ok(value),
        Err(Flow::Error(err)) => Err(err),
        Err(Flow::Return(value)) => Ok(value),
    }
}

fn literal_to_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::Str(s.clone()),
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Nil => Value::Nil,
    }
}

fn numeric_binary(
    left: &Value,
    right: &Value,
    line: usize,
    op: impl Fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op(*a, *b))),
        _ => Err(RuntimeError::OperandsMustBeNumbers { line }),
    }
}

fn numeric_comparison(
    left: &Value,
    right: &Value,
    line: usize,
    op: impl Fn(f64, f64) -> bool,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(op(*a, *b))),
        _ => Err(RuntimeError::OperandsMustBeNumbers { line }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::scan;
    use crate::parser::Parser;

    fn run_source(source: &str) -> String {
        let output = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::with_writer(Rc::clone(&output) as Rc<RefCell<dyn Write>>);
        let tokens = scan(source).expect("lex should succeed");
        let statements = Parser::new(tokens).parse().expect("parse should succeed");
        interpreter.run(&statements).expect("run should succeed");
        String::from_utf8(output.borrow().clone()).unwrap()
    }

    #[test]
    fn arithmetic_and_print() {
        assert_eq!(run_source("print 1 + 2;"), "3\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run_source(r#"var a = "hi"; print a + " there";"#), "hi there\n");
    }

    #[test]
    fn recursive_fibonacci() {
        assert_eq!(
            run_source("def f(n){ if (n<2) return n; return f(n-1)+f(n-2); } print f(10);"),
            "55\n"
        );
    }

    #[test]
    fn block_scoping_shadows_then_restores() {
        assert_eq!(run_source("var x=1; { var x=2; print x; } print x;"), "2\n1\n");
    }

    #[test]
    fn method_call_on_instance() {
        assert_eq!(
            run_source(r#"class A{ greet(){ print "hi"; } } A().greet();"#),
            "hi\n"
        );
    }

    #[test]
    fn inheritance_and_this_binding() {
        assert_eq!(
            run_source("class A{ init(n){ this.n=n; } } class B<A{ show(){ print this.n; } } B(7).show();"),
            "7\n"
        );
    }

    #[test]
    fn closures_capture_distinct_state_per_call() {
        assert_eq!(
            run_source("def make(){ var c=0; def inc(){ c = c+1; return c; } return inc; } var i=make(); print i(); print i();"),
            "1\n2\n"
        );
    }

    #[test]
    fn short_circuit_and_or_skip_the_right_operand() {
        assert_eq!(
            run_source("def bomb(){ print \"boom\"; return true; } print false and bomb(); print true or bomb();"),
            "false\ntrue\n"
        );
    }

    #[test]
    fn truthiness_matches_spec() {
        assert_eq!(run_source("print !!0; print !!\"\"; print !!nil; print !!false;"), "true\ntrue\nfalse\nfalse\n");
    }

    #[test]
    fn whole_number_prints_without_decimal() {
        assert_eq!(run_source("var x = 3; print x;"), "3\n");
    }

    #[test]
    fn method_shadowing_by_field() {
        assert_eq!(
            run_source("class A{ name(){ return \"method\"; } } var a = A(); a.name = \"field\"; print a.name;"),
            "field\n"
        );
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let output = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::with_writer(Rc::clone(&output) as Rc<RefCell<dyn Write>>);
        let tokens = scan("print missing;").unwrap();
        let statements = Parser::new(tokens).parse().unwrap();
        let err = interpreter.run(&statements).unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable { .. }));
    }
}
