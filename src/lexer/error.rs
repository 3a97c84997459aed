use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at column {column}")]
    UnexpectedCharacter { character: char, column: usize },
    #[error("Invalid number literal '{literal}' at column {column}")]
    InvalidNumberLiteral { literal: String, column: usize },
    #[error("Unterminated string literal at column {column}")]
    UnterminatedString { column: usize },
}

pub type LexResult<T> = Result<T, LexError>;
