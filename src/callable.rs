use crate::ast::{Block, FunctionDefinition, Node};
use crate::error::Result;
use crate::interpreter::Evaluator;
use crate::scope::Scope;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

pub trait Callable {
    fn name(&self) -> &str;

    /// Declared parameter names, when the function has any to declare.
    fn params(&self) -> Option<&[String]> {
        None
    }

    /// Invokes the function from `scope`, the caller's current scope.
    fn call(&self, scope: &Scope, arguments: &[Node]) -> Result<Value>;
}

impl fmt::Debug for dyn Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params() {
            Some(params) => write!(f, "<fn {}({})>", self.name(), params.join(", ")),
            None => write!(f, "<native fn {}>", self.name()),
        }
    }
}

#[derive(Debug)]
pub struct UserFunction {
    name: String,
    params: Vec<String>,
    body: Rc<Block>,
}

impl UserFunction {
    pub fn new(definition: &FunctionDefinition) -> UserFunction {
        UserFunction {
            name: definition.name.clone(),
            params: definition.params.clone(),
            body: Rc::clone(&definition.body),
        }
    }
}

impl Callable for UserFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> Option<&[String]> {
        Some(&self.params)
    }

    // The call scope hangs off the caller's scope, not the one the function
    // was defined in.
    fn call(&self, scope: &Scope, arguments: &[Node]) -> Result<Value> {
        trace!(
            function = %self.name,
            arguments = arguments.len(),
            depth = scope.depth(),
            "calling function"
        );
        let environment = scope.child();
        let mut caller = Evaluator::new(scope);
        // Parameter names are unique and the call scope starts empty, so
        // binding never shadows anything local.
        for (idx, param) in self.params.iter().enumerate() {
            let value = match arguments.get(idx) {
                Some(argument) => caller.evaluate(argument)?,
                None => Value::Void,
            };
            environment.bind(param, value);
        }
        Evaluator::new(&environment).evaluate_sequence(&self.body.statements)
    }
}

pub type NativeFn = Box<dyn Fn(&[Value]) -> Option<Value>>;

/// A function supplied by the host.
pub struct NativeFunction {
    name: String,
    function: NativeFn,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, function: F) -> NativeFunction
    where
        F: Fn(&[Value]) -> Option<Value> + 'static,
    {
        NativeFunction {
            name: name.into(),
            function: Box::new(function),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, scope: &Scope, arguments: &[Node]) -> Result<Value> {
        trace!(function = %self.name, arguments = arguments.len(), "calling native function");
        let mut caller = Evaluator::new(scope);
        let values = arguments
            .iter()
            .map(|argument| caller.evaluate(argument))
            .collect::<Result<Vec<Value>>>()?;
        Ok((self.function)(&values).unwrap_or(Value::Void))
    }
}

#[cfg(test)]
mod callable_tests {
    use super::*;
    use crate::ast::BinaryOperator;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn variable(name: &str) -> Node {
        Node::Variable {
            name: name.to_string(),
            line: 1,
        }
    }

    fn sum_function() -> UserFunction {
        let body = Block {
            statements: vec![Node::Binary {
                operator: BinaryOperator::Add,
                left: Box::new(variable("a")),
                right: Box::new(variable("b")),
                line: 1,
            }],
        };
        let definition = FunctionDefinition::new(
            "sum".to_string(),
            vec!["a".to_string(), "b".to_string()],
            body,
            1,
        )
        .unwrap();
        UserFunction::new(&definition)
    }

    #[test]
    fn arguments_are_bound_in_order() {
        let scope = Scope::new();
        let result = sum_function()
            .call(&scope, &[Node::Integer(2), Node::Integer(3)])
            .unwrap();
        assert_eq!(result, Value::Integer(5));
    }

    #[test]
    fn missing_arguments_are_void_and_extras_are_ignored() {
        let scope = Scope::new();
        let result = sum_function().call(&scope, &[Node::String("x".to_string())]).unwrap();
        assert_eq!(result, Value::from("xvoid"));

        // The third argument would fail if it were evaluated.
        let result = sum_function()
            .call(
                &scope,
                &[Node::Integer(1), Node::Integer(1), variable("undefined")],
            )
            .unwrap();
        assert_eq!(result, Value::Integer(2));
    }

    #[test]
    fn parameters_shadow_the_callers_bindings() {
        let scope = Scope::new();
        scope.define_new("a", Value::Integer(100)).unwrap();
        let result = sum_function()
            .call(&scope, &[Node::Integer(1), variable("a")])
            .unwrap();
        assert_eq!(result, Value::Integer(101));
        assert_eq!(scope.get("a"), Ok(Value::Integer(100)));
    }

    #[test]
    fn each_call_binds_its_own_parameters() {
        let scope = Scope::new();
        let function = sum_function();
        let first = function
            .call(&scope, &[Node::Integer(1), Node::Integer(2)])
            .unwrap();
        let second = function
            .call(&scope, &[Node::Integer(10), Node::Integer(20)])
            .unwrap();
        assert_eq!(first, Value::Integer(3));
        assert_eq!(second, Value::Integer(30));
        assert!(scope.get("a").is_err());
    }

    #[test]
    fn native_functions_see_evaluated_arguments() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let native = NativeFunction::new("record", move |args: &[Value]| {
            sink.borrow_mut().extend(args.iter().cloned());
            None
        });
        let scope = Scope::new();
        scope.define_new("x", Value::Boolean(true)).unwrap();
        let result = native
            .call(&scope, &[variable("x"), Node::Integer(4)])
            .unwrap();
        assert_eq!(result, Value::Void);
        assert_eq!(*seen.borrow(), vec![Value::Boolean(true), Value::Integer(4)]);
    }

    #[test]
    fn debug_shows_the_signature() {
        let function: Rc<dyn Callable> = Rc::new(sum_function());
        assert_eq!(format!("{:?}", function), "<fn sum(a, b)>");
        let native: Rc<dyn Callable> = Rc::new(NativeFunction::new("print", |_| None));
        assert_eq!(format!("{:?}", native), "<native fn print>");
    }
}
