pub mod ast;
pub mod callable;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod scope;
pub mod token;
pub mod value;

pub use crate::ast::{AstPrinter, Node};
pub use crate::callable::{Callable, NativeFunction, UserFunction};
pub use crate::error::{ArithmeticError, Error, Fault, Result, RuntimeError};
pub use crate::interpreter::{Evaluator, Interpreter};
pub use crate::parser::Parser;
pub use crate::scanner::Scanner;
pub use crate::scope::Scope;
pub use crate::token::{Token, TokenStream, TokenType};
pub use crate::value::{Value, ValueKind};
