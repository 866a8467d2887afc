// ABOUTME: Error types for every stage of the pipeline: lexing, parsing, and evaluation

use crate::value::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("[line {line}] Error: Unexpected character '{character}'.")]
    UnexpectedCharacter { character: char, line: usize },

    #[error("[line {line}] Error: Unterminated string.")]
    UnterminatedString { line: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("[line {line}] Error at end: {message}")]
    AtEnd { line: usize, message: String },

    #[error("[line {line}] Error at '{lexeme}': {message}")]
    AtToken {
        line: usize,
        lexeme: String,
        message: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("[line {line}] Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    #[error("[line {line}] Undefined property '{name}'.")]
    UndefinedProperty { name: String, line: usize },

    #[error("[line {line}] Operand must be a number.")]
    OperandMustBeNumber { line: usize },

    #[error("[line {line}] Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings { line: usize },

    #[error("[line {line}] Operands must be numbers.")]
    OperandsMustBeNumbers { line: usize },

    #[error("[line {line}] Can only call functions and classes.")]
    NotCallable { line: usize },

    #[error("[line {line}] Expected {expected} arguments but got {got}.")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("[line {line}] Only instances have properties.")]
    NotAnInstance { line: usize },

    #[error("[line {line}] Superclass must be a class.")]
    SuperclassMustBeClass { line: usize },
}

/// Carries either a genuine runtime failure or an in-flight `return` value
/// unwinding the call stack. Statement execution threads this via `?`;
/// expression evaluation only ever produces `RuntimeError`.
#[derive(Debug, Clone)]
pub enum Flow {
    Error(RuntimeError),
    Return(Value),
}

impl From<RuntimeError> for Flow {
    fn from(err: RuntimeError) -> Self {
        Flow::Error(err)
    }
}

pub type ExprResult<T> = Result<T, RuntimeError>;
pub type StmtResult<T> = Result<T, Flow>;
