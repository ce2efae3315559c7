use crate::ast::{BinaryOperator, Node, Visitor};
use crate::callable::{NativeFunction, UserFunction};
use crate::error::{Error, Result, RuntimeError};
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::scope::Scope;
use crate::token::TokenStream;
use crate::value::Value;
use std::rc::Rc;
use tracing::debug;

/// Evaluates nodes against one scope.
pub struct Evaluator<'s> {
    scope: &'s Scope,
}

impl<'s> Evaluator<'s> {
    pub fn new(scope: &'s Scope) -> Evaluator<'s> {
        Evaluator { scope }
    }

    pub fn evaluate(&mut self, node: &Node) -> Result<Value> {
        node.accept(self)
    }

    /// Evaluates statements in order, yielding the last value or `Void`.
    pub fn evaluate_sequence(&mut self, statements: &[Node]) -> Result<Value> {
        let mut result = Value::Void;
        for statement in statements {
            result = self.evaluate(statement)?;
        }
        Ok(result)
    }

    fn binary(
        &mut self,
        operator: BinaryOperator,
        left: &Node,
        right: &Node,
        line: usize,
    ) -> Result<Value> {
        if operator == BinaryOperator::Assign {
            return match left {
                Node::Variable { name, .. } => {
                    let value = self.evaluate(right)?;
                    self.scope.assign(name, value.clone());
                    Ok(value)
                }
                _ => Err(Error::runtime(line, RuntimeError::InvalidLvalue)),
            };
        }
        // Both sides are evaluated before the operator sees them, `&&` and
        // `||` included.
        let lhs = self.evaluate(left)?;
        let rhs = self.evaluate(right)?;
        lhs.apply(operator, &rhs).map_err(|fault| fault.at(line))
    }
}

impl Visitor<Node, Result<Value>> for Evaluator<'_> {
    fn visit(&mut self, node: &Node) -> Result<Value> {
        match node {
            Node::Integer(x) => Ok(Value::Integer(*x)),
            Node::String(x) => Ok(Value::String(x.clone())),
            Node::Boolean(x) => Ok(Value::Boolean(*x)),
            Node::Void => Ok(Value::Void),
            Node::Variable { name, line } => self
                .scope
                .get(name)
                .map_err(|e| Error::runtime(*line, e)),
            Node::Binary {
                operator,
                left,
                right,
                line,
            } => self.binary(*operator, left, right, *line),
            Node::Block(block) => {
                let scope = self.scope.child();
                Evaluator::new(&scope).evaluate_sequence(&block.statements)
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.to_boolean() {
                    self.evaluate(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.evaluate(else_branch)
                } else {
                    Ok(Value::Void)
                }
            }
            Node::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                let scope = self.scope.child();
                let mut inner = Evaluator::new(&scope);
                if let Some(initializer) = initializer {
                    inner.evaluate(initializer)?;
                }
                let mut result = Value::Void;
                loop {
                    if let Some(condition) = condition {
                        if !inner.evaluate(condition)?.to_boolean() {
                            break;
                        }
                    }
                    result = inner.evaluate(body)?;
                    if let Some(increment) = increment {
                        inner.evaluate(increment)?;
                    }
                }
                Ok(result)
            }
            Node::While { condition, body } => {
                let mut result = Value::Void;
                while self.evaluate(condition)?.to_boolean() {
                    result = self.evaluate(body)?;
                }
                Ok(result)
            }
            Node::DefineVariable {
                name,
                initializer,
                line,
            } => {
                let value = match initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Void,
                };
                self.scope
                    .define_new(name, value.clone())
                    .map_err(|e| Error::runtime(*line, e))?;
                Ok(value)
            }
            Node::DefineFunction(definition) => {
                let function = Value::Function(Rc::new(UserFunction::new(definition)));
                self.scope
                    .define_new(&definition.name, function.clone())
                    .map_err(|e| Error::runtime(definition.line, e))?;
                Ok(function)
            }
            Node::Call {
                callee,
                arguments,
                line,
            } => match self.evaluate(callee)? {
                Value::Function(function) => function.call(self.scope, arguments),
                other => Err(Error::runtime(
                    *line,
                    RuntimeError::NotCallable(other.kind()),
                )),
            },
        }
    }
}

/// Owns the program's root scope and runs top-level statements against it.
#[derive(Debug, Default)]
pub struct Interpreter {
    globals: Scope,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter {
            globals: Scope::new(),
        }
    }

    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    pub fn define_native<F>(
        &self,
        name: &str,
        function: F,
    ) -> std::result::Result<(), RuntimeError>
    where
        F: Fn(&[Value]) -> Option<Value> + 'static,
    {
        let native = NativeFunction::new(name, function);
        self.globals.define_new(name, Value::Function(Rc::new(native)))
    }

    pub fn execute(&self, node: &Node) -> Result<Value> {
        let value = Evaluator::new(&self.globals).evaluate(node)?;
        debug!(value = ?value, "evaluated top-level statement");
        Ok(value)
    }

    /// Parses and evaluates one top-level statement at a time until the
    /// stream runs out, handing every result to `observe`.
    ///
    /// Returns the value of the last statement, or `Void` for an empty
    /// program. The first error stops the run.
    pub fn run<S, F>(&self, parser: &mut Parser<S>, mut observe: F) -> Result<Value>
    where
        S: TokenStream,
        F: FnMut(&Value),
    {
        let mut last = Value::Void;
        while let Some(statement) = parser.read()? {
            let value = self.execute(&statement)?;
            observe(&value);
            last = value;
        }
        Ok(last)
    }

    pub fn run_source(&self, source: &str) -> Result<Value> {
        let mut parser = Parser::new(Scanner::from_source(source));
        self.run(&mut parser, |_| {})
    }
}
