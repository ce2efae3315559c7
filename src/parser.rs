use crate::ast::{BinaryOperator, Block, FunctionDefinition, Node, Precedence};
use crate::error::{Error, Result};
use crate::token::{Keyword, Operator, Token, TokenStream, TokenType};
use tracing::trace;

/// Builds syntax trees from a token stream, one top-level statement at a
/// time.
pub struct Parser<S> {
    tokens: S,
}

impl<S: TokenStream> Parser<S> {
    pub fn new(tokens: S) -> Parser<S> {
        Parser { tokens }
    }

    /// Parses the next top-level statement, or returns `None` once the
    /// stream is exhausted.
    pub fn read(&mut self) -> Result<Option<Node>> {
        let token = self.peek()?;
        if token.is_eof() {
            return Ok(None);
        }
        trace!(line = token.line, "parsing statement");
        self.statement().map(Some)
    }

    pub fn parse(&mut self) -> Result<Vec<Node>> {
        let mut statements = Vec::new();
        while let Some(statement) = self.read()? {
            statements.push(statement);
        }
        Ok(statements)
    }

    /// Discards the rest of a statement that failed to parse.
    ///
    /// Skips up to and including the next `;` or `}`, or up to the next
    /// keyword that starts a statement. Lines the scanner rejects are
    /// skipped too; I/O errors are returned.
    pub fn synchronize(&mut self) -> Result<()> {
        loop {
            let token = match self.tokens.peek(0) {
                Ok(token) => token,
                Err(e) if e.is_syntax() => continue,
                Err(e) => return Err(e),
            };
            if token.is_eof() || starts_statement(token) {
                return Ok(());
            }
            let token = self.advance()?;
            if token.is_operator(Operator::Semicolon) || token.is_operator(Operator::RightBrace) {
                return Ok(());
            }
        }
    }

    fn statement(&mut self) -> Result<Node> {
        match self.peek()?.keyword() {
            Some(Keyword::Var) => {
                let node = self.var_expression()?;
                self.consume(Operator::Semicolon, "after variable declaration")?;
                Ok(node)
            }
            Some(Keyword::If) => self.if_statement(),
            Some(Keyword::For) => self.for_statement(),
            Some(Keyword::While) => self.while_statement(),
            Some(Keyword::Function) => self.function_statement(),
            _ => {
                if self.check(Operator::LeftBrace)? {
                    return Ok(Node::Block(self.block()?));
                }
                self.simple_statement()
            }
        }
    }

    fn var_expression(&mut self) -> Result<Node> {
        let line = self.advance()?.line;
        let name = self.identifier("variable")?;
        let initializer = if self.matches(Operator::Assign)? {
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        Ok(Node::DefineVariable {
            name,
            initializer,
            line,
        })
    }

    fn if_statement(&mut self) -> Result<Node> {
        self.advance()?;
        self.consume(Operator::LeftParen, "after 'if'")?;
        let condition = self.expression()?;
        self.consume(Operator::RightParen, "after if condition")?;
        let then_branch = self.statement()?;
        let else_branch = if self.peek()?.keyword() == Some(Keyword::Else) {
            self.advance()?;
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Node::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn for_statement(&mut self) -> Result<Node> {
        self.advance()?;
        self.consume(Operator::LeftParen, "after 'for'")?;
        let initializer = if self.check(Operator::Semicolon)? {
            None
        } else if self.peek()?.keyword() == Some(Keyword::Var) {
            Some(Box::new(self.var_expression()?))
        } else {
            Some(Box::new(self.expression()?))
        };
        self.consume(Operator::Semicolon, "after for loop initializer")?;
        let condition = if self.check(Operator::Semicolon)? {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.consume(Operator::Semicolon, "after for loop condition")?;
        let increment = if self.check(Operator::RightParen)? {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.consume(Operator::RightParen, "after for loop clauses")?;
        let body = self.statement()?;
        Ok(Node::For {
            initializer,
            condition,
            increment,
            body: Box::new(body),
        })
    }

    fn while_statement(&mut self) -> Result<Node> {
        self.advance()?;
        self.consume(Operator::LeftParen, "after 'while'")?;
        let condition = self.expression()?;
        self.consume(Operator::RightParen, "after while condition")?;
        let body = self.statement()?;
        Ok(Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    fn function_statement(&mut self) -> Result<Node> {
        let line = self.advance()?.line;
        let name = self.identifier("function")?;
        self.consume(Operator::LeftParen, "after function name")?;
        let mut params = Vec::new();
        if !self.check(Operator::RightParen)? {
            loop {
                params.push(self.identifier("parameter")?);
                if !self.matches(Operator::Comma)? {
                    break;
                }
            }
        }
        self.consume(Operator::RightParen, "after parameters")?;
        if !self.check(Operator::LeftBrace)? {
            return Err(self.unexpected("'{' before function body"));
        }
        let body = self.block()?;
        let definition = FunctionDefinition::new(name, params, body, line)?;
        Ok(Node::DefineFunction(definition))
    }

    fn block(&mut self) -> Result<Block> {
        self.consume(Operator::LeftBrace, "to open a block")?;
        let mut statements = Vec::new();
        while !self.check(Operator::RightBrace)? && !self.peek()?.is_eof() {
            statements.push(self.statement()?);
        }
        self.consume(Operator::RightBrace, "after block")?;
        Ok(Block { statements })
    }

    fn simple_statement(&mut self) -> Result<Node> {
        if self.matches(Operator::Semicolon)? {
            return Ok(Node::Void);
        }
        let expression = self.expression()?;
        self.consume(Operator::Semicolon, "after expression")?;
        Ok(expression)
    }

    fn expression(&mut self) -> Result<Node> {
        let left = self.factor()?;
        self.fold_operand(left, None)
    }

    // Folds operators into `left` for as long as they bind tighter than the
    // operator waiting on the left, if there is one.
    fn fold_operand(&mut self, mut left: Node, outer: Option<Precedence>) -> Result<Node> {
        while let Some(operator) = self.binary_operator()? {
            if let Some(outer) = outer {
                if !operator.binds_tighter_than(outer) {
                    break;
                }
            }
            let line = self.advance()?.line;
            let mut right = self.factor()?;
            while let Some(next) = self.binary_operator()? {
                if !next.binds_tighter_than(operator.precedence()) {
                    break;
                }
                right = self.fold_operand(right, Some(operator.precedence()))?;
            }
            left = Node::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn binary_operator(&mut self) -> Result<Option<BinaryOperator>> {
        match self.peek()?.tokentype {
            TokenType::Operator(operator) => Ok(BinaryOperator::from_operator(operator)),
            _ => Ok(None),
        }
    }

    fn factor(&mut self) -> Result<Node> {
        let token = self.peek()?.clone();
        match token.tokentype {
            TokenType::Integer(x) => {
                self.advance()?;
                Ok(Node::Integer(x))
            }
            TokenType::String(x) => {
                self.advance()?;
                Ok(Node::String(x))
            }
            TokenType::Identifier(ref name) => {
                let node = match token.keyword() {
                    Some(Keyword::True) => Node::Boolean(true),
                    Some(Keyword::False) => Node::Boolean(false),
                    Some(Keyword::Void) => Node::Void,
                    Some(keyword) => {
                        return Err(Error::syntax(
                            token.line,
                            format!("unexpected keyword '{}' in expression", keyword),
                        ))
                    }
                    None => {
                        self.advance()?;
                        let variable = Node::Variable {
                            name: name.clone(),
                            line: token.line,
                        };
                        return self.call_suffix(variable);
                    }
                };
                self.advance()?;
                Ok(node)
            }
            TokenType::Operator(Operator::Minus) => {
                self.advance()?;
                self.negative_integer()
            }
            TokenType::Operator(Operator::LeftParen) => {
                self.advance()?;
                let expression = self.expression()?;
                self.consume(Operator::RightParen, "after expression")?;
                self.call_suffix(expression)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn negative_integer(&mut self) -> Result<Node> {
        let token = self.peek()?;
        let line = token.line;
        let value = match token.tokentype {
            TokenType::Integer(x) => x,
            _ => {
                return Err(Error::syntax(
                    line,
                    format!(
                        "'-' must be followed by an integer literal, found {}",
                        token.tokentype
                    ),
                ))
            }
        };
        self.advance()?;
        match value.checked_neg() {
            Some(x) => Ok(Node::Integer(x)),
            None => Err(Error::syntax(line, format!("cannot negate {}", value))),
        }
    }

    // At most one argument list may follow a callee.
    fn call_suffix(&mut self, callee: Node) -> Result<Node> {
        if !self.check(Operator::LeftParen)? {
            return Ok(callee);
        }
        let line = self.advance()?.line;
        let mut arguments = Vec::new();
        if !self.check(Operator::RightParen)? {
            loop {
                arguments.push(self.expression()?);
                if !self.matches(Operator::Comma)? {
                    break;
                }
            }
        }
        self.consume(Operator::RightParen, "after arguments")?;
        if self.check(Operator::LeftParen)? {
            let line = self.peek()?.line;
            return Err(Error::syntax(
                line,
                "a call result cannot be called directly",
            ));
        }
        Ok(Node::Call {
            callee: Box::new(callee),
            arguments,
            line,
        })
    }

    fn identifier(&mut self, what: &str) -> Result<String> {
        let token = self.peek()?;
        let line = token.line;
        match (&token.tokentype, token.keyword()) {
            (TokenType::Identifier(name), None) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            (_, Some(keyword)) => Err(Error::syntax(
                line,
                format!("'{}' is a keyword and cannot name a {}", keyword, what),
            )),
            _ => Err(self.unexpected(&format!("{} name", what))),
        }
    }

    fn peek(&mut self) -> Result<&Token> {
        self.tokens.peek(0)
    }

    fn advance(&mut self) -> Result<Token> {
        self.tokens.read()
    }

    fn check(&mut self, operator: Operator) -> Result<bool> {
        Ok(self.peek()?.is_operator(operator))
    }

    fn matches(&mut self, operator: Operator) -> Result<bool> {
        if self.check(operator)? {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn consume(&mut self, operator: Operator, context: &str) -> Result<Token> {
        if self.check(operator)? {
            return self.advance();
        }
        Err(self.unexpected(&format!("'{}' {}", operator, context)))
    }

    fn unexpected(&mut self, expected: &str) -> Error {
        match self.peek() {
            Ok(token) => Error::syntax(
                token.line,
                format!("expected {}, found {}", expected, token.tokentype),
            ),
            Err(e) => e,
        }
    }
}

fn starts_statement(token: &Token) -> bool {
    match token.keyword() {
        Some(Keyword::Var)
        | Some(Keyword::If)
        | Some(Keyword::For)
        | Some(Keyword::While)
        | Some(Keyword::Function) => true,
        _ => false,
    }
}

impl<S: TokenStream> Iterator for Parser<S> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Result<Node>> {
        self.read().transpose()
    }
}
