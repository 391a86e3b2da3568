use std::mem;

use phf::{phf_map, Map};
use tracing::{debug, trace};

use crate::error::Error;
use crate::token::Token;

static KEYWORDS: Map<&'static str, Token> = phf_map! {
    "class" => Token::Class,
    "return" => Token::Return,
    "if" => Token::If,
    "else" => Token::Else,
    "def" => Token::Def,
    "print" => Token::Print,
    "and" => Token::And,
    "or" => Token::Or,
    "not" => Token::Not,
    "None" => Token::None,
    "True" => Token::True,
    "False" => Token::False,
};

// Characters that accumulate into the pending operator buffer
const OPERATORS: [char; 8] = ['+', '-', '*', '/', '=', '<', '>', '!'];

// Characters that end the pending word/operator. Whitespace is dropped, the rest become
// `Token::Char`.
const SEPARATORS: [char; 9] = [' ', '\t', '\r', ',', ':', '.', '(', ')', '\\'];

// Each indentation level is this many spaces
const INDENT_WIDTH: usize = 2;

/// Token sequence of a whole source text, with a cursor for the parser.
///
/// The source is tokenized eagerly when the lexer is built, so lexical errors surface before
/// any parsing starts. The sequence always ends with [`Token::Eof`] and the cursor never moves
/// past it.
#[derive(Debug)]
pub struct Lexer {
    tokens: Vec<Token>,
    // 1-based source line of every token, parallel to `tokens`
    lines: Vec<usize>,
    current: usize,
}

impl Lexer {
    pub fn new(src: &str) -> Result<Self, Error> {
        let mut scanner = Scanner::default();
        for (idx, text) in src.split('\n').enumerate() {
            scanner.scan_line(text, idx + 1)?;
        }
        Ok(scanner.finish())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn current_token(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub fn next_token(&mut self) -> &Token {
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
        self.current_token()
    }

    /// Source line of the token under the cursor.
    pub fn line(&self) -> usize {
        self.lines[self.current]
    }

    pub fn expect(&self, expected: &Token) -> Result<(), Error> {
        if self.current_token() == expected {
            Ok(())
        } else {
            Err(self.unexpected(expected.to_string()))
        }
    }

    pub fn expect_identifier(&self) -> Result<&str, Error> {
        match self.current_token() {
            Token::Identifier(name) => Ok(name),
            _ => Err(self.unexpected(String::from("identifier"))),
        }
    }

    pub fn expect_next(&mut self, expected: &Token) -> Result<(), Error> {
        self.next_token();
        self.expect(expected)
    }

    pub fn expect_next_identifier(&mut self) -> Result<&str, Error> {
        self.next_token();
        self.expect_identifier()
    }

    fn unexpected(&self, expected: String) -> Error {
        Error::UnexpectedToken {
            expected,
            found: self.current_token().clone(),
            line: self.line(),
        }
    }
}

// Line-by-line tokenizer state. Indentation is only resolved when a line produces its first
// token, so blank, whitespace-only and comment-only lines never affect block structure.
#[derive(Default)]
struct Scanner {
    tokens: Vec<Token>,
    lines: Vec<usize>,
    line: usize,

    word: String,
    word_column: usize,
    operator: String,
    string: String,

    // At most one kind of quote can be open
    quote: Option<char>,
    comment: bool,
    escaped: bool,

    indent: usize,
    prev_indent: usize,
    // Spaces seen towards the next indentation level
    spaces: usize,
    at_line_start: bool,
    line_has_tokens: bool,
}

impl Scanner {
    fn scan_line(&mut self, text: &str, line: usize) -> Result<(), Error> {
        self.line = line;
        self.indent = 0;
        self.spaces = 0;
        self.comment = false;
        self.at_line_start = true;
        self.line_has_tokens = false;

        for (idx, ch) in text.chars().enumerate() {
            let column = idx + 1;

            if ch == '\0' {
                continue;
            }

            if self.comment {
                break;
            }

            if self.at_line_start {
                if ch == ' ' {
                    self.spaces += 1;
                    if self.spaces == INDENT_WIDTH {
                        self.spaces = 0;
                        self.indent += 1;
                    }
                    continue;
                }
                self.at_line_start = false;
            }

            if let Some(quote) = self.quote {
                self.scan_string(ch, quote);
                continue;
            }

            match ch {
                '\'' | '"' => {
                    self.flush()?;
                    self.quote = Some(ch);
                }
                '#' => {
                    self.flush()?;
                    self.comment = true;
                }
                c if OPERATORS.contains(&c) => self.scan_operator(c)?,
                c if SEPARATORS.contains(&c) => {
                    self.flush()?;
                    if !c.is_ascii_whitespace() {
                        self.push(Token::Char(c));
                    }
                }
                c if c.is_ascii_alphanumeric() || c == '_' => {
                    self.flush_operator();
                    if self.word.is_empty() {
                        self.word_column = column;
                    }
                    self.word.push(c);
                }
                c if !c.is_ascii() => {
                    return Err(Error::NonAsciiCharacter {
                        ch: c,
                        line,
                        column,
                    })
                }
                c => {
                    return Err(Error::UnexpectedCharacter {
                        ch: c,
                        line,
                        column,
                    })
                }
            }
        }

        if self.quote.is_some() {
            return Err(Error::UnterminatedString { line });
        }

        self.flush()?;
        if self.line_has_tokens {
            self.push(Token::Newline);
            self.prev_indent = self.indent;
        }

        Ok(())
    }

    fn scan_string(&mut self, ch: char, quote: char) {
        if self.escaped {
            self.escaped = false;
            match ch {
                'n' => self.string.push('\n'),
                't' => self.string.push('\t'),
                '\'' | '"' => self.string.push(ch),
                _ => {
                    self.string.push('\\');
                    self.string.push(ch);
                }
            }
        } else if ch == '\\' {
            self.escaped = true;
        } else if ch == quote {
            self.quote = None;
            let text = mem::take(&mut self.string);
            self.push(Token::Str(text));
        } else {
            self.string.push(ch);
        }
    }

    fn scan_operator(&mut self, ch: char) -> Result<(), Error> {
        self.flush_word()?;
        self.operator.push(ch);
        if self.operator.len() < 2 {
            return Ok(());
        }

        let operator = mem::take(&mut self.operator);
        match operator.as_str() {
            "==" => self.push(Token::Eq),
            "!=" => self.push(Token::NotEq),
            "<=" => self.push(Token::LessOrEq),
            ">=" => self.push(Token::GreaterOrEq),
            _ => {
                for c in operator.chars() {
                    self.push(Token::Char(c));
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.flush_word()?;
        self.flush_operator();
        Ok(())
    }

    fn flush_word(&mut self) -> Result<(), Error> {
        if self.word.is_empty() {
            return Ok(());
        }

        let word = mem::take(&mut self.word);
        let token = if word.starts_with(|c: char| c.is_ascii_digit()) {
            match word.parse::<i64>() {
                Ok(number) if word.chars().all(|c| c.is_ascii_digit()) => Token::Number(number),
                _ => {
                    return Err(Error::MalformedNumber {
                        literal: word,
                        line: self.line,
                        column: self.word_column,
                    })
                }
            }
        } else {
            match KEYWORDS.get(word.as_str()) {
                Some(keyword) => keyword.clone(),
                None => Token::Identifier(word),
            }
        };

        self.push(token);
        Ok(())
    }

    fn flush_operator(&mut self) {
        // Two-character operators are emitted as soon as they are complete, so anything left
        // here is a single character
        let operator = mem::take(&mut self.operator);
        for c in operator.chars() {
            self.push(Token::Char(c));
        }
    }

    fn push(&mut self, token: Token) {
        if !self.line_has_tokens {
            self.line_has_tokens = true;
            self.close_indentation();
        }
        self.emit(token);
    }

    fn close_indentation(&mut self) {
        if self.indent > self.prev_indent {
            for _ in self.prev_indent..self.indent {
                self.emit(Token::Indent);
            }
        } else {
            for _ in self.indent..self.prev_indent {
                self.emit(Token::Dedent);
            }
        }
    }

    fn emit(&mut self, token: Token) {
        trace!(line = self.line, %token, "token");
        self.tokens.push(token);
        self.lines.push(self.line);
    }

    fn finish(mut self) -> Lexer {
        for _ in 0..self.prev_indent {
            self.emit(Token::Dedent);
        }
        self.emit(Token::Eof);

        debug!(tokens = self.tokens.len(), lines = self.line, "tokenized source");
        Lexer {
            tokens: self.tokens,
            lines: self.lines,
            current: 0,
        }
    }
}
