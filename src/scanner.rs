use crate::error::{Error, Result};
use crate::token::{Operator, Token, TokenStream, TokenType};
use std::collections::VecDeque;
use std::io::{BufRead, Lines};
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::trace;

/// Lazily tokenizes a source, one line at a time.
pub struct Scanner<R> {
    lines: Lines<R>,
    pending: VecDeque<Token>,
    line: usize,
    exhausted: bool,
    eof: Token,
}

impl<'a> Scanner<&'a [u8]> {
    pub fn from_source(source: &'a str) -> Self {
        Scanner::new(source.as_bytes())
    }
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Scanner {
            lines: reader.lines(),
            pending: VecDeque::new(),
            line: 0,
            exhausted: false,
            eof: Token::new(TokenType::Eof, 1),
        }
    }

    // Reads lines until `count` tokens are buffered or the input runs out.
    fn fill(&mut self, count: usize) -> Result<()> {
        while self.pending.len() < count && !self.exhausted {
            match self.lines.next() {
                None => {
                    self.exhausted = true;
                    self.eof.line = self.line.max(1);
                }
                Some(text) => {
                    let text = text?;
                    self.line += 1;
                    trace!(line = self.line, "scanning source line");
                    let tokens = LineScanner::new(&text, self.line).scan()?;
                    self.pending.extend(tokens);
                }
            }
        }
        Ok(())
    }
}

impl<R: BufRead> TokenStream for Scanner<R> {
    fn read(&mut self) -> Result<Token> {
        self.fill(1)?;
        match self.pending.pop_front() {
            Some(token) => Ok(token),
            None => Ok(self.eof.clone()),
        }
    }

    fn peek(&mut self, index: usize) -> Result<&Token> {
        self.fill(index + 1)?;
        Ok(self.pending.get(index).unwrap_or(&self.eof))
    }
}

struct LineScanner<'a> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
    start: usize,
    line: usize,
}

impl<'a> LineScanner<'a> {
    fn new(source: &'a str, line: usize) -> LineScanner<'a> {
        LineScanner {
            source,
            iter: source.char_indices().peekable(),
            start: 0,
            line,
        }
    }

    fn scan(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(&(idx, _)) = self.iter.peek() {
            self.start = idx;
            if let Some(token) = self.scan_token()? {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }

    fn scan_token(&mut self) -> Result<Option<Token>> {
        let c = match self.iter.next() {
            Some((_, c)) => c,
            None => return Ok(None),
        };
        match c {
            ' ' | '\t' | '\r' => Ok(None),
            '/' if self.next_if('/') => {
                // Comment runs to the end of the line.
                while self.iter.next().is_some() {}
                Ok(None)
            }
            '"' => self.string().map(Some),
            '0'..='9' => self.integer().map(Some),
            'a'..='z' | 'A'..='Z' | '_' => Ok(Some(self.identifier())),
            _ => self.operator(c).map(Some),
        }
    }

    fn current(&mut self) -> usize {
        match self.iter.peek() {
            None => self.source.len(),
            Some((idx, _)) => *idx,
        }
    }

    fn token(&self, tokentype: TokenType) -> Token {
        Token::new(tokentype, self.line)
    }

    fn next_if(&mut self, expected: char) -> bool {
        if let Some(&(_, c)) = self.iter.peek() {
            if c == expected {
                self.iter.next();
                return true;
            }
        }
        false
    }

    fn operator(&mut self, c: char) -> Result<Token> {
        let single_end = self.start + c.len_utf8();
        if let Some(&(_, next)) = self.iter.peek() {
            let pair = &self.source[self.start..single_end + next.len_utf8()];
            if let Ok(operator) = pair.parse::<Operator>() {
                self.iter.next();
                return Ok(self.token(TokenType::Operator(operator)));
            }
        }
        match self.source[self.start..single_end].parse::<Operator>() {
            Ok(operator) => Ok(self.token(TokenType::Operator(operator))),
            Err(_) => Err(Error::syntax(
                self.line,
                format!("unexpected character '{}'", c),
            )),
        }
    }

    fn string(&mut self) -> Result<Token> {
        loop {
            match self.iter.next() {
                Some((idx, '"')) => {
                    let text = &self.source[self.start + 1..idx];
                    return Ok(self.token(TokenType::String(text.to_string())));
                }
                Some(_) => {}
                None => return Err(Error::syntax(self.line, "unterminated string")),
            }
        }
    }

    fn integer(&mut self) -> Result<Token> {
        while let Some(&(_, c)) = self.iter.peek() {
            if c.is_ascii_digit() {
                self.iter.next();
            } else {
                break;
            }
        }
        let current = self.current();
        let lexeme = &self.source[self.start..current];
        match lexeme.parse::<i32>() {
            Ok(value) => Ok(self.token(TokenType::Integer(value))),
            Err(_) => Err(Error::syntax(
                self.line,
                format!("integer literal {} is out of range", lexeme),
            )),
        }
    }

    fn identifier(&mut self) -> Token {
        while let Some(&(_, c)) = self.iter.peek() {
            match c {
                '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' => {
                    self.iter.next();
                }
                _ => break,
            }
        }
        let current = self.current();
        let name = self.source[self.start..current].to_string();
        self.token(TokenType::Identifier(name))
    }
}
