use thiserror::Error;

use crate::interpreter::InterpreterError;
use crate::translator::TranslateError;
use crate::validator::SyntaxDefect;

/// Failure from any stage of a run. The message is the stage's own message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxDefect),
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Runtime(#[from] InterpreterError),
}

impl Error {
    /// Source line the error points at, for the two static stages.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Syntax(defect) => Some(defect.line),
            Error::Translate(error) => Some(error.line()),
            Error::Runtime(_) => None,
        }
    }

    /// Zero-based column within the trimmed line, for parse errors.
    pub fn column(&self) -> Option<usize> {
        match self {
            Error::Translate(error) => error.column(),
            Error::Syntax(_) | Error::Runtime(_) => None,
        }
    }
}
