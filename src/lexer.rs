//! Tokeniser for a single logical source line.
//!
//! Indentation never reaches the lexer: the translator strips it and owns
//! block structure, so the token stream of a line always ends in `EOF`.

use std::{iter::Peekable, str::CharIndices};

use crate::token::{Span, Token, TokenKind};

mod error;

pub use error::{LexError, LexResult};

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    eof_reached: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `input`, reporting spans on source line `line`.
    pub fn new(input: &'a str, line: usize) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line,
            column: 0,
            eof_reached: false,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_whitespace();

        let Some(&(start_idx, ch)) = self.chars.peek() else {
            self.eof_reached = true;
            return Ok(self.eof_token());
        };
        let start_column = self.column;

        match ch {
            // Inline comment: the rest of the line is ignored.
            '#' => {
                while self.advance_char().is_some() {}
                self.eof_reached = true;
                Ok(self.eof_token())
            }
            '\'' | '"' => self.read_string(ch, start_idx, start_column),
            c if c.is_alphabetic() || c == '_' => {
                Ok(self.read_identifier(start_idx, start_column))
            }
            c if c.is_ascii_digit() => self.read_number(start_idx, start_column),
            _ => self.read_operator(ch, start_idx, start_column),
        }
    }

    fn read_operator(&mut self, ch: char, start: usize, column: usize) -> LexResult<Token<'a>> {
        self.advance_char();
        let kind = match ch {
            '=' if self.eat('=') => TokenKind::EqualEqual,
            '=' => TokenKind::Equal,
            '!' if self.eat('=') => TokenKind::NotEqual,
            '<' if self.eat('=') => TokenKind::LessEqual,
            '<' => TokenKind::Less,
            '>' if self.eat('=') => TokenKind::GreaterEqual,
            '>' => TokenKind::Greater,
            '+' if self.eat('=') => TokenKind::PlusEqual,
            '+' => TokenKind::Plus,
            '-' if self.eat('=') => TokenKind::MinusEqual,
            '-' => TokenKind::Minus,
            '*' if self.eat('=') => TokenKind::StarEqual,
            '*' => TokenKind::Star,
            '/' if self.eat('/') => {
                if self.eat('=') {
                    TokenKind::DoubleSlashEqual
                } else {
                    TokenKind::DoubleSlash
                }
            }
            '/' if self.eat('=') => TokenKind::SlashEqual,
            '/' => TokenKind::Slash,
            '%' if self.eat('=') => TokenKind::PercentEqual,
            '%' => TokenKind::Percent,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    character: ch,
                    column,
                });
            }
        };
        Ok(Token::new(kind, self.span_from(start, column)))
    }

    fn read_identifier(&mut self, start: usize, column: usize) -> Token<'a> {
        self.advance_char(); // Consume first char
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let input = self.input;
        let ident = &input[start..self.current_index()];
        let kind = match ident {
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "pass" => TokenKind::Pass,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            _ => TokenKind::Identifier(ident),
        };
        Token::new(kind, self.span_from(start, column))
    }

    fn read_number(&mut self, start: usize, column: usize) -> LexResult<Token<'a>> {
        self.consume_digits();

        let mut is_float = false;
        let mut lookahead = self.chars.clone();
        if let Some((_, '.')) = lookahead.next()
            && lookahead.next().is_some_and(|(_, c)| c.is_ascii_digit())
        {
            is_float = true;
            self.advance_char(); // Consume '.'
            self.consume_digits();
        }

        let input = self.input;
        let literal = &input[start..self.current_index()];
        let invalid = || LexError::InvalidNumberLiteral {
            literal: literal.to_string(),
            column,
        };
        let kind = if is_float {
            TokenKind::Float(literal.parse::<f64>().map_err(|_| invalid())?)
        } else {
            TokenKind::Integer(literal.parse::<i64>().map_err(|_| invalid())?)
        };
        Ok(Token::new(kind, self.span_from(start, column)))
    }

    fn read_string(&mut self, quote: char, start: usize, column: usize) -> LexResult<Token<'a>> {
        self.advance_char(); // Consume opening quote
        let mut value = String::new();
        while let Some((_, c)) = self.advance_char() {
            match c {
                c if c == quote => {
                    return Ok(Token::new(
                        TokenKind::String(value),
                        self.span_from(start, column),
                    ));
                }
                '\\' => match self.advance_char() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, '\'')) => value.push('\''),
                    Some((_, '"')) => value.push('"'),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                c => value.push(c),
            }
        }
        Err(LexError::UnterminatedString { column })
    }

    fn consume_digits(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek().is_some_and(|&(_, c)| c == expected) {
            self.advance_char();
            true
        } else {
            false
        }
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if next.is_some() {
            self.column += 1;
        }
        next
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }

    fn span_from(&mut self, start: usize, column: usize) -> Span {
        Span {
            start,
            end: self.current_index(),
            line: self.line,
            column,
        }
    }

    fn eof_token(&mut self) -> Token<'a> {
        let index = self.current_index();
        Token::new(
            TokenKind::EOF,
            Span {
                start: index,
                end: index,
                line: self.line,
                column: self.column,
            },
        )
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_reached {
            return None;
        }
        Some(self.next_token())
    }
}

/// Tokenises one line of source, always ending with an `EOF` token.
pub fn tokenize(input: &str, line: usize) -> LexResult<Vec<Token<'_>>> {
    Lexer::new(input, line).collect()
}
