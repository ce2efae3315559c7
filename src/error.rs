use crate::ast::BinaryOperator;
use crate::value::ValueKind;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("[line {line}] syntax error: {message}")]
    Syntax { line: usize, message: String },

    #[error("[line {line}] runtime error: {source}")]
    Runtime { line: usize, source: RuntimeError },

    #[error("[line {line}] arithmetic error: {source}")]
    Arithmetic {
        line: usize,
        source: ArithmeticError,
    },

    #[error("failed to read source: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn runtime(line: usize, source: RuntimeError) -> Self {
        Error::Runtime { line, source }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Syntax { line, .. }
            | Error::Runtime { line, .. }
            | Error::Arithmetic { line, .. } => Some(*line),
            Error::Io(_) => None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("invalid lvalue")]
    InvalidLvalue,

    #[error("'{0}' is already defined in this scope")]
    AlreadyDefined(String),

    #[error("operator '{operator}' expects integer operands, found {left} and {right}")]
    TypeMismatch {
        operator: BinaryOperator,
        left: ValueKind,
        right: ValueKind,
    },

    #[error("cannot repeat a string {0} times")]
    NegativeRepeat(i32),

    #[error("a value of type {0} is not callable")]
    NotCallable(ValueKind),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivideByZero,

    #[error("integer overflow")]
    Overflow,
}

/// A failure raised by a value operation, before it is tied to a source line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl Fault {
    pub fn at(self, line: usize) -> Error {
        match self {
            Fault::Runtime(source) => Error::Runtime { line, source },
            Fault::Arithmetic(source) => Error::Arithmetic { line, source },
        }
    }
}
