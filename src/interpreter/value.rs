use std::cmp::Ordering;

use crate::ast::{BinaryOperator, CompareOperator};
use crate::builtins::BuiltinFunction;

use super::InterpreterError;

type ValueResult = Result<Value, InterpreterError>;

/// Methods available on `str` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StringMethod {
    Strip,
    LStrip,
    RStrip,
    Upper,
    Lower,
}

impl StringMethod {
    pub(super) fn from_name(name: &str) -> Option<Self> {
        match name {
            "strip" => Some(Self::Strip),
            "lstrip" => Some(Self::LStrip),
            "rstrip" => Some(Self::RStrip),
            "upper" => Some(Self::Upper),
            "lower" => Some(Self::Lower),
            _ => None,
        }
    }

    pub(super) fn name(self) -> &'static str {
        match self {
            Self::Strip => "strip",
            Self::LStrip => "lstrip",
            Self::RStrip => "rstrip",
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }

    pub(super) fn apply(self, receiver: &str) -> String {
        match self {
            Self::Strip => receiver.trim().to_string(),
            Self::LStrip => receiver.trim_start().to_string(),
            Self::RStrip => receiver.trim_end().to_string(),
            Self::Upper => receiver.to_uppercase(),
            Self::Lower => receiver.to_lowercase(),
        }
    }
}

/// Runtime value model used by the tree-walking interpreter.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    List(Vec<Value>),
    BuiltinFunction(BuiltinFunction),
    BoundMethod {
        receiver: String,
        method: StringMethod,
    },
    None,
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }
}

impl Value {
    pub(super) fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Boolean(_) => "bool",
            Value::String(_) => "str",
            Value::List(_) => "list",
            Value::BuiltinFunction(_) => "builtin_function_or_method",
            Value::BoundMethod { .. } => "method",
            Value::None => "NoneType",
        }
    }

    /// Text written to the output log by `print`.
    pub(super) fn to_output(&self) -> String {
        match self {
            Value::Integer(value) => value.to_string(),
            Value::Float(value) => format_float(*value),
            Value::Boolean(value) => {
                if *value {
                    "True".to_string()
                } else {
                    "False".to_string()
                }
            }
            Value::String(value) => value.clone(),
            Value::List(items) => {
                let rendered = items
                    .iter()
                    .map(Value::repr)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{rendered}]")
            }
            Value::BuiltinFunction(builtin) => format!("<built-in function {}>", builtin.name()),
            Value::BoundMethod { method, .. } => {
                format!("<built-in method {} of str object>", method.name())
            }
            Value::None => "None".to_string(),
        }
    }

    /// Text used for a value nested inside a list.
    fn repr(&self) -> String {
        match self {
            Value::String(value) => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_output(),
        }
    }

    pub(super) fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::Boolean(value) => *value,
            Value::String(value) => !value.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::BuiltinFunction(_) | Value::BoundMethod { .. } => true,
            Value::None => false,
        }
    }

    pub(super) fn as_int(&self) -> Result<i64, InterpreterError> {
        match self {
            Value::Integer(value) => Ok(*value),
            Value::Boolean(value) => Ok(i64::from(*value)),
            other => Err(InterpreterError::ExpectedIntegerType {
                got: other.type_name(),
            }),
        }
    }

    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Integer(value) => Some(Number::Int(*value)),
            Value::Boolean(value) => Some(Number::Int(i64::from(*value))),
            Value::Float(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    /// Elements produced when the value drives a `for` loop.
    pub(super) fn iterate(self) -> Result<Vec<Value>, InterpreterError> {
        match self {
            Value::List(items) => Ok(items),
            Value::String(value) => Ok(value
                .chars()
                .map(|c| Value::String(c.to_string()))
                .collect()),
            other => Err(InterpreterError::NotIterable {
                type_name: other.type_name(),
            }),
        }
    }

    pub(super) fn index(&self, index: &Value) -> ValueResult {
        let raw_index = index.as_int()?;
        match self {
            Value::String(value) => {
                let chars = value.chars().collect::<Vec<_>>();
                let position = resolve_index(raw_index, chars.len(), self.type_name())?;
                Ok(Value::String(chars[position].to_string()))
            }
            Value::List(items) => {
                let position = resolve_index(raw_index, items.len(), self.type_name())?;
                Ok(items[position].clone())
            }
            other => Err(InterpreterError::NotSubscriptable {
                type_name: other.type_name(),
            }),
        }
    }

    pub(super) fn negate(&self) -> ValueResult {
        match self.as_number() {
            Some(Number::Int(value)) => value
                .checked_neg()
                .map(Value::Integer)
                .ok_or(InterpreterError::IntegerOverflow { op: "-" }),
            Some(Number::Float(value)) => Ok(Value::Float(-value)),
            None => Err(InterpreterError::UnsupportedUnaryOperand {
                op: "-",
                operand: self.type_name(),
            }),
        }
    }

    pub(super) fn unary_plus(&self) -> ValueResult {
        match self.as_number() {
            Some(Number::Int(value)) => Ok(Value::Integer(value)),
            Some(Number::Float(value)) => Ok(Value::Float(value)),
            None => Err(InterpreterError::UnsupportedUnaryOperand {
                op: "+",
                operand: self.type_name(),
            }),
        }
    }

    /// Applies `op`. Concatenation and repetition results longer than
    /// `sequence_limit` are rejected before anything is allocated.
    pub(super) fn binary(
        &self,
        op: BinaryOperator,
        right: &Value,
        sequence_limit: Option<usize>,
    ) -> ValueResult {
        if let (Some(left), Some(right)) = (self.as_number(), right.as_number()) {
            return numeric_binary(op, left, right);
        }

        match (op, self, right) {
            (BinaryOperator::Add, Value::String(left), Value::String(right)) => {
                let len = (left.chars().count() + right.chars().count()) as u128;
                check_sequence_len(len, sequence_limit)?;
                Ok(Value::String(format!("{left}{right}")))
            }
            (BinaryOperator::Add, Value::List(left), Value::List(right)) => {
                check_sequence_len((left.len() + right.len()) as u128, sequence_limit)?;
                Ok(Value::List(left.iter().chain(right).cloned().collect()))
            }
            (BinaryOperator::Mul, Value::String(text), count)
            | (BinaryOperator::Mul, count, Value::String(text))
                if count.as_number().is_some_and(|n| matches!(n, Number::Int(_))) =>
            {
                repeat_text(text, count.as_int()?, sequence_limit)
            }
            (BinaryOperator::Mul, Value::List(items), count)
            | (BinaryOperator::Mul, count, Value::List(items))
                if count.as_number().is_some_and(|n| matches!(n, Number::Int(_))) =>
            {
                repeat_items(items, count.as_int()?, sequence_limit)
            }
            _ => Err(InterpreterError::UnsupportedOperand {
                op: op.symbol(),
                left: self.type_name(),
                right: right.type_name(),
            }),
        }
    }

    pub(super) fn compare(&self, op: CompareOperator, right: &Value) -> Result<bool, InterpreterError> {
        match op {
            CompareOperator::Equal => Ok(self.loosely_equals(right)),
            CompareOperator::NotEqual => Ok(!self.loosely_equals(right)),
            CompareOperator::In => right.contains(self),
            CompareOperator::NotIn => right.contains(self).map(|found| !found),
            CompareOperator::Less
            | CompareOperator::LessEqual
            | CompareOperator::Greater
            | CompareOperator::GreaterEqual => {
                let ordering = self.ordering(right).ok_or(InterpreterError::UnsupportedComparison {
                    op: op.symbol(),
                    left: self.type_name(),
                    right: right.type_name(),
                })?;
                Ok(match op {
                    CompareOperator::Less => ordering == Ordering::Less,
                    CompareOperator::LessEqual => ordering != Ordering::Greater,
                    CompareOperator::Greater => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                })
            }
        }
    }

    /// Equality where numbers compare by value across int, float and bool.
    fn loosely_equals(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(Number::Int(left)), Some(Number::Int(right))) => left == right,
            (Some(left), Some(right)) => left.as_f64() == right.as_f64(),
            _ => match (self, other) {
                (Value::List(left), Value::List(right)) => {
                    left.len() == right.len()
                        && left.iter().zip(right).all(|(l, r)| l.loosely_equals(r))
                }
                _ => self == other,
            },
        }
    }

    fn ordering(&self, other: &Value) -> Option<Ordering> {
        match (self.as_number(), other.as_number()) {
            (Some(Number::Int(left)), Some(Number::Int(right))) => Some(left.cmp(&right)),
            (Some(left), Some(right)) => left.as_f64().partial_cmp(&right.as_f64()),
            _ => match (self, other) {
                (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
                _ => None,
            },
        }
    }

    fn contains(&self, needle: &Value) -> Result<bool, InterpreterError> {
        match (self, needle) {
            (Value::String(haystack), Value::String(needle)) => Ok(haystack.contains(needle.as_str())),
            (Value::String(_), other) => Err(InterpreterError::UnsupportedOperand {
                op: "in",
                left: other.type_name(),
                right: "str",
            }),
            (Value::List(items), needle) => Ok(items.iter().any(|item| item.loosely_equals(needle))),
            (other, _) => Err(InterpreterError::NotIterable {
                type_name: other.type_name(),
            }),
        }
    }
}

fn numeric_binary(op: BinaryOperator, left: Number, right: Number) -> ValueResult {
    if let (Number::Int(left), Number::Int(right)) = (left, right) {
        return int_binary(op, left, right);
    }
    let (left, right) = (left.as_f64(), right.as_f64());
    let value = match op {
        BinaryOperator::Add => left + right,
        BinaryOperator::Sub => left - right,
        BinaryOperator::Mul => left * right,
        BinaryOperator::Div | BinaryOperator::FloorDiv | BinaryOperator::Mod if right == 0.0 => {
            return Err(InterpreterError::DivisionByZero);
        }
        BinaryOperator::Div => left / right,
        BinaryOperator::FloorDiv => (left / right).floor(),
        BinaryOperator::Mod => left - right * (left / right).floor(),
    };
    Ok(Value::Float(value))
}

fn int_binary(op: BinaryOperator, left: i64, right: i64) -> ValueResult {
    let overflow = InterpreterError::IntegerOverflow { op: op.symbol() };
    let value = match op {
        BinaryOperator::Add => left.checked_add(right).ok_or(overflow)?,
        BinaryOperator::Sub => left.checked_sub(right).ok_or(overflow)?,
        BinaryOperator::Mul => left.checked_mul(right).ok_or(overflow)?,
        BinaryOperator::Div => {
            if right == 0 {
                return Err(InterpreterError::DivisionByZero);
            }
            return Ok(Value::Float(left as f64 / right as f64));
        }
        BinaryOperator::FloorDiv | BinaryOperator::Mod if right == 0 => {
            return Err(InterpreterError::DivisionByZero);
        }
        BinaryOperator::FloorDiv => floor_div(left, right).ok_or(overflow)?,
        BinaryOperator::Mod => {
            let quotient = floor_div(left, right).ok_or(overflow.clone())?;
            left.checked_sub(quotient.checked_mul(right).ok_or(overflow.clone())?)
                .ok_or(overflow)?
        }
    };
    Ok(Value::Integer(value))
}

/// Rejects a concatenation or repetition result over the configured limit.
fn check_sequence_len(len: u128, limit: Option<usize>) -> Result<(), InterpreterError> {
    match limit {
        Some(limit) if len > limit as u128 => Err(InterpreterError::SequenceTooLong { len, limit }),
        _ => Ok(()),
    }
}

/// A reservation size that does not fit in `usize` cannot be allocated.
fn reserve_size(len: u128, size: u128) -> Result<usize, InterpreterError> {
    usize::try_from(size).map_err(|_| InterpreterError::SequenceAllocation { len })
}

/// `text * count`; a count of zero or less gives the empty string.
fn repeat_text(text: &str, count: i64, limit: Option<usize>) -> ValueResult {
    let count = u128::try_from(count).unwrap_or(0);
    if text.is_empty() || count == 0 {
        return Ok(Value::String(String::new()));
    }
    let len = text.chars().count() as u128 * count;
    check_sequence_len(len, limit)?;

    let mut repeated = String::new();
    repeated
        .try_reserve_exact(reserve_size(len, text.len() as u128 * count)?)
        .map_err(|_| InterpreterError::SequenceAllocation { len })?;
    for _ in 0..count {
        repeated.push_str(text);
    }
    Ok(Value::String(repeated))
}

/// `items * count`; a count of zero or less gives the empty list.
fn repeat_items(items: &[Value], count: i64, limit: Option<usize>) -> ValueResult {
    let count = u128::try_from(count).unwrap_or(0);
    if items.is_empty() || count == 0 {
        return Ok(Value::List(Vec::new()));
    }
    let len = items.len() as u128 * count;
    check_sequence_len(len, limit)?;

    let mut repeated = Vec::new();
    repeated
        .try_reserve_exact(reserve_size(len, len)?)
        .map_err(|_| InterpreterError::SequenceAllocation { len })?;
    for _ in 0..count {
        repeated.extend_from_slice(items);
    }
    Ok(Value::List(repeated))
}

/// Integer division rounding toward negative infinity.
fn floor_div(left: i64, right: i64) -> Option<i64> {
    let quotient = left.checked_div(right)?;
    if left % right != 0 && ((left < 0) != (right < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

/// Maps a possibly negative index onto `0..len`.
fn resolve_index(index: i64, len: usize, type_name: &'static str) -> Result<usize, InterpreterError> {
    let out_of_range = InterpreterError::IndexOutOfRange {
        index,
        len,
        type_name,
    };
    let len_i64 = i64::try_from(len).map_err(|_| out_of_range.clone())?;
    let position = if index < 0 { index + len_i64 } else { index };
    if (0..len_i64).contains(&position) {
        usize::try_from(position).map_err(|_| out_of_range)
    } else {
        Err(out_of_range)
    }
}

/// Formats a float the way Python prints it: the shortest round-tripping
/// digits, positional with a `.0` for integral values, and scientific with a
/// signed two-digit exponent below `1e-4` or from `1e16` up.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        return text.to_string();
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .and_then(|(mantissa, exponent)| Some((mantissa, exponent.parse::<i32>().ok()?)))
        .unwrap_or((scientific.as_str(), 0));
    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs());
    }

    let positional = value.to_string();
    if positional.contains('.') {
        positional
    } else {
        format!("{positional}.0")
    }
}
