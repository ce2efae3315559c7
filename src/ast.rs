use crate::error::{Error, Result};
use crate::token::Operator;
use num_enum::IntoPrimitive;
use std::collections::BTreeSet;
use std::rc::Rc;
use strum_macros::Display;

/// Binding strength of a binary operator; a higher number binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(i8)]
pub enum Precedence {
    Assignment = -3,
    LogicalOr = -2,
    LogicalAnd = -1,
    Equality = 0,
    Relational = 1,
    Additive = 2,
    Multiplicative = 3,
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOperator {
    #[strum(serialize = "*")]  Multiply,
    #[strum(serialize = "/")]  Divide,
    #[strum(serialize = "%")]  Modulus,
    #[strum(serialize = "+")]  Add,
    #[strum(serialize = "-")]  Subtract,
    #[strum(serialize = "<")]  Less,
    #[strum(serialize = ">")]  Greater,
    #[strum(serialize = "<=")] LessEqual,
    #[strum(serialize = ">=")] GreaterEqual,
    #[strum(serialize = "==")] Equal,
    #[strum(serialize = "!=")] NotEqual,
    #[strum(serialize = "&&")] And,
    #[strum(serialize = "||")] Or,
    #[strum(serialize = "=")]  Assign,
}

impl BinaryOperator {
    pub fn from_operator(operator: Operator) -> Option<BinaryOperator> {
        match operator {
            Operator::Star => Some(BinaryOperator::Multiply),
            Operator::Slash => Some(BinaryOperator::Divide),
            Operator::Percent => Some(BinaryOperator::Modulus),
            Operator::Plus => Some(BinaryOperator::Add),
            Operator::Minus => Some(BinaryOperator::Subtract),
            Operator::Less => Some(BinaryOperator::Less),
            Operator::Greater => Some(BinaryOperator::Greater),
            Operator::LessEqual => Some(BinaryOperator::LessEqual),
            Operator::GreaterEqual => Some(BinaryOperator::GreaterEqual),
            Operator::EqualEqual => Some(BinaryOperator::Equal),
            Operator::BangEqual => Some(BinaryOperator::NotEqual),
            Operator::AndAnd => Some(BinaryOperator::And),
            Operator::OrOr => Some(BinaryOperator::Or),
            Operator::Assign => Some(BinaryOperator::Assign),
            _ => None,
        }
    }

    pub fn precedence(self) -> Precedence {
        match self {
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulus => {
                Precedence::Multiplicative
            }
            BinaryOperator::Add | BinaryOperator::Subtract => Precedence::Additive,
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual => Precedence::Relational,
            BinaryOperator::Equal | BinaryOperator::NotEqual => Precedence::Equality,
            BinaryOperator::And => Precedence::LogicalAnd,
            BinaryOperator::Or => Precedence::LogicalOr,
            BinaryOperator::Assign => Precedence::Assignment,
        }
    }

    pub fn is_left_associative(self) -> bool {
        self != BinaryOperator::Assign
    }

    /// Whether this operator takes the operand to its left away from an
    /// operator of the given precedence.
    pub fn binds_tighter_than(self, precedence: Precedence) -> bool {
        let (outer, inner) = (i8::from(precedence), i8::from(self.precedence()));
        if self.is_left_associative() {
            outer < inner
        } else {
            outer <= inner
        }
    }
}

#[derive(Debug, Default)]
pub struct Block {
    pub statements: Vec<Node>,
}

#[derive(Debug)]
pub struct FunctionDefinition {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Block>,
    pub line: usize,
}

impl FunctionDefinition {
    pub fn new(
        name: String,
        params: Vec<String>,
        body: Block,
        line: usize,
    ) -> Result<FunctionDefinition> {
        let mut seen = BTreeSet::new();
        for param in &params {
            if !seen.insert(param.as_str()) {
                return Err(Error::syntax(
                    line,
                    format!("duplicate parameter '{}' in function '{}'", param, name),
                ));
            }
        }
        Ok(FunctionDefinition {
            name,
            params,
            body: Rc::new(body),
            line,
        })
    }
}

#[derive(Debug)]
pub enum Node {
    Integer(i32),
    String(String),
    Boolean(bool),
    Void,
    Variable {
        name: String,
        line: usize,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
        line: usize,
    },
    Block(Block),
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    For {
        initializer: Option<Box<Node>>,
        condition: Option<Box<Node>>,
        increment: Option<Box<Node>>,
        body: Box<Node>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    DefineVariable {
        name: String,
        initializer: Option<Box<Node>>,
        line: usize,
    },
    DefineFunction(FunctionDefinition),
    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
        line: usize,
    },
}

pub trait Visitor<T, Output> {
    fn visit(&mut self, n: &T) -> Output;
}

impl Node {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Node, T>) -> T {
        v.visit(self)
    }
}

/// Renders a tree as an s-expression.
pub struct AstPrinter {}

impl AstPrinter {
    pub fn print(node: &Node) -> String {
        node.accept(&mut AstPrinter {})
    }

    fn parenthesize(&mut self, name: &str, args: Vec<&Node>) -> String {
        let mut x = String::from("(");
        x.push_str(name);
        for arg in args {
            x.push(' ');
            x.push_str(arg.accept(self).as_str());
        }
        x.push(')');
        x
    }

    fn optional(&mut self, node: &Option<Box<Node>>) -> String {
        match node {
            Some(node) => node.accept(self),
            None => String::from("_"),
        }
    }
}

impl Visitor<Node, String> for AstPrinter {
    fn visit(&mut self, n: &Node) -> String {
        match n {
            Node::Integer(x) => x.to_string(),
            Node::String(x) => format!("\"{}\"", x),
            Node::Boolean(x) => x.to_string(),
            Node::Void => String::from("void"),
            Node::Variable { name, .. } => name.clone(),
            Node::Binary {
                operator,
                left,
                right,
                ..
            } => self.parenthesize(&operator.to_string(), vec![&**left, &**right]),
            Node::Block(block) => self.parenthesize("block", block.statements.iter().collect()),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut args = vec![&**condition, &**then_branch];
                if let Some(x) = else_branch {
                    args.push(x);
                }
                self.parenthesize("if", args)
            }
            Node::For {
                initializer,
                condition,
                increment,
                body,
            } => format!(
                "(for {} {} {} {})",
                self.optional(initializer),
                self.optional(condition),
                self.optional(increment),
                body.accept(self)
            ),
            Node::While { condition, body } => self.parenthesize("while", vec![&**condition, &**body]),
            Node::DefineVariable {
                name, initializer, ..
            } => match initializer {
                Some(x) => format!("(var {} {})", name, x.accept(self)),
                None => format!("(var {})", name),
            },
            Node::DefineFunction(definition) => {
                let body = definition.body.statements.iter().collect();
                format!(
                    "(function {} ({}) {})",
                    definition.name,
                    definition.params.join(" "),
                    self.parenthesize("block", body)
                )
            }
            Node::Call {
                callee, arguments, ..
            } => {
                let mut args = vec![&**callee];
                args.extend(arguments.iter());
                self.parenthesize("call", args)
            }
        }
    }
}

#[cfg(test)]
mod ast_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn basic_ast_test() {
        let expression = Node::Binary {
            operator: BinaryOperator::Multiply,
            left: Box::new(Node::Integer(-123)),
            right: Box::new(Node::Binary {
                operator: BinaryOperator::Add,
                left: Box::new(Node::Variable {
                    name: "x".to_string(),
                    line: 1,
                }),
                right: Box::new(Node::String("s".to_string())),
                line: 1,
            }),
            line: 1,
        };
        assert_eq!(AstPrinter::print(&expression), "(* -123 (+ x \"s\"))");
    }

    #[test]
    fn precedence_table() {
        assert_eq!(i8::from(BinaryOperator::Modulus.precedence()), 3);
        assert_eq!(i8::from(BinaryOperator::Subtract.precedence()), 2);
        assert_eq!(i8::from(BinaryOperator::GreaterEqual.precedence()), 1);
        assert_eq!(i8::from(BinaryOperator::NotEqual.precedence()), 0);
        assert_eq!(i8::from(BinaryOperator::And.precedence()), -1);
        assert_eq!(i8::from(BinaryOperator::Or.precedence()), -2);
        assert_eq!(i8::from(BinaryOperator::Assign.precedence()), -3);
    }

    #[test]
    fn associativity_decides_ties() {
        assert!(!BinaryOperator::Add.binds_tighter_than(Precedence::Additive));
        assert!(BinaryOperator::Multiply.binds_tighter_than(Precedence::Additive));
        assert!(BinaryOperator::Assign.binds_tighter_than(Precedence::Assignment));
        assert!(!BinaryOperator::Assign.binds_tighter_than(Precedence::LogicalOr));
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let params = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        match FunctionDefinition::new("f".to_string(), params, Block::default(), 4) {
            Err(Error::Syntax { line, message }) => {
                assert_eq!(line, 4);
                assert_eq!(message, "duplicate parameter 'a' in function 'f'");
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }
}
