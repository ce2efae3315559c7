use crate::error::Result;
use phf::phf_map;
use std::fmt;
use strum_macros::{Display, EnumString};

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Operator {
    #[strum(serialize = ";")]  Semicolon,
    #[strum(serialize = ",")]  Comma,
    #[strum(serialize = "(")]  LeftParen,
    #[strum(serialize = ")")]  RightParen,
    #[strum(serialize = "{")]  LeftBrace,
    #[strum(serialize = "}")]  RightBrace,
    #[strum(serialize = "=")]  Assign,
    #[strum(serialize = "+")]  Plus,
    #[strum(serialize = "-")]  Minus,
    #[strum(serialize = "*")]  Star,
    #[strum(serialize = "/")]  Slash,
    #[strum(serialize = "%")]  Percent,
    #[strum(serialize = "==")] EqualEqual,
    #[strum(serialize = "!=")] BangEqual,
    #[strum(serialize = "<")]  Less,
    #[strum(serialize = ">")]  Greater,
    #[strum(serialize = "<=")] LessEqual,
    #[strum(serialize = ">=")] GreaterEqual,
    #[strum(serialize = "&&")] AndAnd,
    #[strum(serialize = "||")] OrOr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Integer(i32),
    String(String),
    // Keywords are identifiers too, see `KEYWORDS`.
    Identifier(String),
    Operator(Operator),
    Eof,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Integer(x) => write!(f, "integer {}", x),
            TokenType::String(x) => write!(f, "string \"{}\"", x),
            TokenType::Identifier(x) => write!(f, "'{}'", x),
            TokenType::Operator(x) => write!(f, "'{}'", x),
            TokenType::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    Var,
    If,
    Else,
    For,
    While,
    Function,
    True,
    False,
    Void,
}

pub static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "var" => Keyword::Var,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "for" => Keyword::For,
    "while" => Keyword::While,
    "function" => Keyword::Function,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "void" => Keyword::Void,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tokentype: TokenType,
    pub line: usize,
}

impl Token {
    pub fn new(tokentype: TokenType, line: usize) -> Token {
        Token { tokentype, line }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match &self.tokentype {
            TokenType::Identifier(name) => KEYWORDS.get(name.as_str()).copied(),
            _ => None,
        }
    }

    pub fn is_operator(&self, operator: Operator) -> bool {
        self.tokentype == TokenType::Operator(operator)
    }

    pub fn is_eof(&self) -> bool {
        self.tokentype == TokenType::Eof
    }
}

/// A pull-based source of tokens.
///
/// Once the input is exhausted both methods keep returning an `Eof` token.
pub trait TokenStream {
    /// Consumes and returns the next token.
    fn read(&mut self) -> Result<Token>;

    /// Looks `index` tokens ahead without consuming anything.
    fn peek(&mut self, index: usize) -> Result<&Token>;
}
