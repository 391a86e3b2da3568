use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(i64),
    Identifier(String),
    // Single punctuation or operator character that isn't folded into a marker
    Char(char),
    Str(String),

    Class,
    Return,
    If,
    Else,
    Def,
    Newline,
    Print,
    Indent,
    Dedent,
    And,
    Or,
    Not,
    Eq,
    NotEq,
    LessOrEq,
    GreaterOrEq,
    None,
    True,
    False,

    Eof,
}

impl Token {
    pub fn is_char(&self, ch: char) -> bool {
        matches!(self, Token::Char(c) if *c == ch)
    }
}

impl From<char> for Token {
    fn from(value: char) -> Self {
        Token::Char(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::Identifier(String::from(value))
    }
}

impl From<i64> for Token {
    fn from(value: i64) -> Self {
        Token::Number(value)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(val) => write!(f, "Number{{{}}}", val),
            Token::Identifier(val) => write!(f, "Id{{{}}}", val),
            Token::Char(val) => write!(f, "Char{{{}}}", val),
            Token::Str(val) => write!(f, "String{{{}}}", val),
            Token::Class => write!(f, "Class"),
            Token::Return => write!(f, "Return"),
            Token::If => write!(f, "If"),
            Token::Else => write!(f, "Else"),
            Token::Def => write!(f, "Def"),
            Token::Newline => write!(f, "Newline"),
            Token::Print => write!(f, "Print"),
            Token::Indent => write!(f, "Indent"),
            Token::Dedent => write!(f, "Dedent"),
            Token::And => write!(f, "And"),
            Token::Or => write!(f, "Or"),
            Token::Not => write!(f, "Not"),
            Token::Eq => write!(f, "Eq"),
            Token::NotEq => write!(f, "NotEq"),
            Token::LessOrEq => write!(f, "LessOrEq"),
            Token::GreaterOrEq => write!(f, "GreaterOrEq"),
            Token::None => write!(f, "None"),
            Token::True => write!(f, "True"),
            Token::False => write!(f, "False"),
            Token::Eof => write!(f, "Eof"),
        }
    }
}
