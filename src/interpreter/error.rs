use thiserror::Error;

use crate::builtins::RangeError;

/// Typed errors produced while executing a translated program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Unsupported operand types for {op}: '{left}' and '{right}'")]
    UnsupportedOperand {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Bad operand type for unary {op}: '{operand}'")]
    UnsupportedUnaryOperand {
        op: &'static str,
        operand: &'static str,
    },
    #[error("'{op}' not supported between '{left}' and '{right}'")]
    UnsupportedComparison {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer overflow in '{op}'")]
    IntegerOverflow { op: &'static str },
    #[error("Expected integer, got {got}")]
    ExpectedIntegerType { got: &'static str },
    #[error("Object of type {type_name} is not iterable")]
    NotIterable { type_name: &'static str },
    #[error("Object of type {type_name} is not subscriptable")]
    NotSubscriptable { type_name: &'static str },
    #[error("Index {index} out of range for {type_name} of length {len}")]
    IndexOutOfRange {
        index: i64,
        len: usize,
        type_name: &'static str,
    },
    #[error("Unknown attribute '{attribute}' for type {type_name}")]
    UnknownAttribute {
        attribute: String,
        type_name: &'static str,
    },
    #[error("Object of type {type_name} is not callable")]
    ObjectNotCallable { type_name: &'static str },
    #[error("Method '{method}' expected {expected} arguments, got {found}")]
    MethodArityMismatch {
        method: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Sequence of length {len} exceeds limit {limit}")]
    SequenceTooLong { len: u128, limit: usize },
    #[error("Sequence of length {len} cannot be allocated")]
    SequenceAllocation { len: u128 },
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("Step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },
    #[error("'{keyword}' outside loop")]
    LoopControlOutsideLoop { keyword: &'static str },
}
