//! Recursive-descent parser for one source line.
//!
//! A line is either a simple statement or a block header. Headers carry no
//! body here; the translator attaches bodies using indentation.

use thiserror::Error;

use crate::ast::{
    BinaryOperator, CompareOperator, Expression, LogicalOperator, Statement, UnaryOperator,
};
use crate::lexer::{self, LexError};
use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Expected {expected}, got {found}")]
    Unexpected {
        expected: String,
        found: String,
        column: usize,
    },
    #[error("Cannot assign to {target}")]
    InvalidAssignmentTarget { target: String },
    #[error("Expression nested more than {limit} levels deep")]
    TooDeeplyNested { limit: usize },
}

impl ParseError {
    /// Zero-based column in the trimmed line where the error was found.
    pub fn column(&self) -> Option<usize> {
        match self {
            ParseError::Lex(
                LexError::UnexpectedCharacter { column, .. }
                | LexError::InvalidNumberLiteral { column, .. }
                | LexError::UnterminatedString { column },
            ) => Some(*column),
            ParseError::Unexpected { column, .. } => Some(*column),
            ParseError::InvalidAssignmentTarget { .. } | ParseError::TooDeeplyNested { .. } => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum BlockHeader {
    For { target: String, iterable: Expression },
    While { condition: Expression },
    If { condition: Expression },
    Elif { condition: Expression },
    Else,
}

impl BlockHeader {
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockHeader::For { .. } => "for",
            BlockHeader::While { .. } => "while",
            BlockHeader::If { .. } => "if",
            BlockHeader::Elif { .. } => "elif",
            BlockHeader::Else => "else",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Line {
    Simple(Statement),
    Header(BlockHeader),
}

static END_OF_LINE: TokenKind<'static> = TokenKind::EOF;

/// Deepest expression tree a line may produce. Evaluation recurses once per
/// level, so this also bounds the interpreter's stack use.
pub const MAX_NESTING_DEPTH: usize = 100;

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Counts one more level of nesting. Callers reset `depth` when they
    /// return normally; after an error the parser is discarded.
    fn nest(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeeplyNested {
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    pub fn parse_line(mut self) -> Result<Line, ParseError> {
        let line = match self.current() {
            TokenKind::For => self.parse_for_header()?,
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expression()?;
                Line::Header(BlockHeader::While { condition })
            }
            TokenKind::If => {
                self.advance();
                let condition = self.parse_expression()?;
                Line::Header(BlockHeader::If { condition })
            }
            TokenKind::Elif => {
                self.advance();
                let condition = self.parse_expression()?;
                Line::Header(BlockHeader::Elif { condition })
            }
            TokenKind::Else => {
                self.advance();
                Line::Header(BlockHeader::Else)
            }
            _ => Line::Simple(self.parse_simple_statement()?),
        };

        if let Line::Header(_) = line {
            self.expect(TokenKind::Colon, "':'")?;
        }
        self.expect(TokenKind::EOF, "end of line")?;
        Ok(line)
    }

    fn parse_for_header(&mut self) -> Result<Line, ParseError> {
        self.advance(); // Consume 'for'
        let target = self.expect_identifier()?;
        self.expect(TokenKind::In, "'in'")?;
        let iterable = self.parse_expression()?;
        Ok(Line::Header(BlockHeader::For { target, iterable }))
    }

    fn parse_simple_statement(&mut self) -> Result<Statement, ParseError> {
        match self.current() {
            TokenKind::Pass => {
                self.advance();
                return Ok(Statement::Pass);
            }
            TokenKind::Break => {
                self.advance();
                return Ok(Statement::Break);
            }
            TokenKind::Continue => {
                self.advance();
                return Ok(Statement::Continue);
            }
            _ => {}
        }

        if let TokenKind::Identifier(name) = self.current() {
            let name = name.to_string();
            if matches!(self.peek(), TokenKind::Equal) {
                self.advance();
                self.advance();
                let value = self.parse_expression()?;
                return Ok(Statement::Assign { name, value });
            }
            if let Some(op) = augmented_operator(self.peek()) {
                self.advance();
                self.advance();
                let value = self.parse_expression()?;
                return Ok(Statement::AugAssign { name, op, value });
            }
        }

        let expr = self.parse_expression()?;
        if matches!(self.current(), TokenKind::Equal) || augmented_operator(self.current()).is_some()
        {
            return Err(ParseError::InvalidAssignmentTarget {
                target: describe_target(&expr).to_string(),
            });
        }
        Ok(Statement::Expr(expr))
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let depth = self.depth;
        self.nest()?;
        let expr = self.parse_or()?;
        self.depth = depth;
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let depth = self.depth;
        let mut expr = self.parse_and()?;
        while matches!(self.current(), TokenKind::Or) {
            self.nest()?;
            self.advance();
            let right = self.parse_and()?;
            expr = Expression::Logical {
                left: Box::new(expr),
                op: LogicalOperator::Or,
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let depth = self.depth;
        let mut expr = self.parse_not()?;
        while matches!(self.current(), TokenKind::And) {
            self.nest()?;
            self.advance();
            let right = self.parse_not()?;
            expr = Expression::Logical {
                left: Box::new(expr),
                op: LogicalOperator::And,
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expression, ParseError> {
        if matches!(self.current(), TokenKind::Not) {
            let depth = self.depth;
            self.nest()?;
            self.advance();
            let operand = self.parse_not()?;
            self.depth = depth;
            return Ok(Expression::Unary {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_sum()?;
        let mut comparisons = Vec::new();
        while let Some(op) = self.comparison_operator() {
            let right = self.parse_sum()?;
            comparisons.push((op, right));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        Ok(Expression::Compare {
            left: Box::new(left),
            comparisons,
        })
    }

    /// Consumes a comparison operator if one is next, including `not in`.
    fn comparison_operator(&mut self) -> Option<CompareOperator> {
        let op = match self.current() {
            TokenKind::EqualEqual => CompareOperator::Equal,
            TokenKind::NotEqual => CompareOperator::NotEqual,
            TokenKind::Less => CompareOperator::Less,
            TokenKind::LessEqual => CompareOperator::LessEqual,
            TokenKind::Greater => CompareOperator::Greater,
            TokenKind::GreaterEqual => CompareOperator::GreaterEqual,
            TokenKind::In => CompareOperator::In,
            TokenKind::Not if matches!(self.peek(), TokenKind::In) => {
                self.advance();
                CompareOperator::NotIn
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_sum(&mut self) -> Result<Expression, ParseError> {
        let depth = self.depth;
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.current() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.nest()?;
            self.advance();
            let right = self.parse_term()?;
            expr = Expression::BinaryOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expression, ParseError> {
        let depth = self.depth;
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.current() {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::DoubleSlash => BinaryOperator::FloorDiv,
                TokenKind::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.nest()?;
            self.advance();
            let right = self.parse_unary()?;
            expr = Expression::BinaryOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let op = match self.current() {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Plus => UnaryOperator::Plus,
            _ => return self.parse_postfix(),
        };
        let depth = self.depth;
        self.nest()?;
        self.advance();
        let operand = self.parse_unary()?;
        self.depth = depth;
        Ok(Expression::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let depth = self.depth;
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(
                self.current(),
                TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot
            ) {
                self.nest()?;
            }
            match self.current() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_comma_separated(TokenKind::RParen, "')'")?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    expr = Expression::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    expr = Expression::Attribute {
                        object: Box::new(expr),
                        name,
                    };
                }
                _ => {
                    self.depth = depth;
                    return Ok(expr);
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let expr = match self.current() {
            TokenKind::Integer(value) => Expression::Integer(*value),
            TokenKind::Float(value) => Expression::Float(*value),
            TokenKind::String(value) => Expression::String(value.clone()),
            TokenKind::True => Expression::Boolean(true),
            TokenKind::False => Expression::Boolean(false),
            TokenKind::None => Expression::None,
            TokenKind::Identifier(name) => Expression::Identifier(name.to_string()),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(expr);
            }
            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_comma_separated(TokenKind::RBracket, "']'")?;
                return Ok(Expression::List(elements));
            }
            _ => return Err(self.error("expression")),
        };
        self.advance();
        Ok(expr)
    }

    /// Parses `a, b, c` up to and including `close`. A trailing comma is allowed.
    fn parse_comma_separated(
        &mut self,
        close: TokenKind<'static>,
        close_name: &str,
    ) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        while *self.current() != close {
            items.push(self.parse_expression()?);
            if matches!(self.current(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(close, close_name)?;
        Ok(items)
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Identifier(name) = self.current() {
            let name = name.to_string();
            self.advance();
            Ok(name)
        } else {
            Err(self.error("identifier"))
        }
    }

    fn expect(&mut self, kind: TokenKind<'static>, expected: &str) -> Result<(), ParseError> {
        if *self.current() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn current(&self) -> &TokenKind<'a> {
        self.kind_at(self.position)
    }

    fn peek(&self) -> &TokenKind<'a> {
        self.kind_at(self.position + 1)
    }

    fn kind_at(&self, position: usize) -> &TokenKind<'a> {
        // The lexer always terminates the stream with EOF.
        self.tokens
            .get(position)
            .or_else(|| self.tokens.last())
            .map_or(&END_OF_LINE, |token| &token.kind)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        let column = self
            .tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map_or(0, |token| token.span.column);
        ParseError::Unexpected {
            expected: expected.to_string(),
            found: self.current().describe(),
            column,
        }
    }
}

fn augmented_operator(kind: &TokenKind<'_>) -> Option<BinaryOperator> {
    match kind {
        TokenKind::PlusEqual => Some(BinaryOperator::Add),
        TokenKind::MinusEqual => Some(BinaryOperator::Sub),
        TokenKind::StarEqual => Some(BinaryOperator::Mul),
        TokenKind::SlashEqual => Some(BinaryOperator::Div),
        TokenKind::DoubleSlashEqual => Some(BinaryOperator::FloorDiv),
        TokenKind::PercentEqual => Some(BinaryOperator::Mod),
        _ => None,
    }
}

fn describe_target(expr: &Expression) -> &'static str {
    match expr {
        Expression::Call { .. } => "function call",
        Expression::Index { .. } => "subscript",
        Expression::Attribute { .. } => "attribute",
        Expression::Integer(_)
        | Expression::Float(_)
        | Expression::String(_)
        | Expression::Boolean(_)
        | Expression::None
        | Expression::List(_) => "literal",
        _ => "expression",
    }
}

/// Tokenises and parses the trimmed text of source line `line`.
pub fn parse_line(text: &str, line: usize) -> Result<Line, ParseError> {
    let tokens = lexer::tokenize(text, line)?;
    Parser::new(tokens).parse_line()
}
