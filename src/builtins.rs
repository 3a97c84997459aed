use thiserror::Error;

/// The only names executed code can call without defining them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Print,
    Range,
}

impl BuiltinFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Self::Print),
            "range" => Some(Self::Range),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Range => "range",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("range expected 1 to 3 arguments, got {found}")]
    ArgumentCount { found: usize },
    #[error("range() with step 0 from {start} never reaches {stop}")]
    ZeroStep { start: i64, stop: i64 },
    #[error("range() of length {len} exceeds limit {limit}")]
    TooLong { len: u128, limit: usize },
    #[error("range() of length {len} cannot be allocated")]
    Allocation { len: u128 },
}

/// Materialises `range(stop)`, `range(start, stop)` or
/// `range(start, stop, step)`.
///
/// A positive step counts up while `i < stop`; a zero or negative step
/// counts down while `i > stop`. Step 0 is therefore empty when
/// `start <= stop` and an error otherwise, since it would never terminate.
///
/// The length is computed before allocating so `limit` is enforced without
/// building the sequence, and a length the allocator refuses is an error
/// rather than an abort.
pub fn range(args: &[i64], limit: Option<usize>) -> Result<Vec<i64>, RangeError> {
    let (start, stop, step) = match *args {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => return Err(RangeError::ArgumentCount { found: args.len() }),
    };
    if step == 0 {
        if start > stop {
            return Err(RangeError::ZeroStep { start, stop });
        }
        return Ok(Vec::new());
    }

    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let len = if step > 0 && start < stop {
        (stop - start + step - 1) / step
    } else if step < 0 && start > stop {
        (start - stop - step - 1) / -step
    } else {
        0
    };
    // Non-negative by construction.
    let len = len.unsigned_abs();

    if let Some(limit) = limit
        && len > limit as u128
    {
        return Err(RangeError::TooLong { len, limit });
    }

    let count = usize::try_from(len).map_err(|_| RangeError::Allocation { len })?;
    let mut values = Vec::new();
    values
        .try_reserve_exact(count)
        .map_err(|_| RangeError::Allocation { len })?;
    // Every produced value lies between start and stop, so it fits in i64.
    values.extend((0..count).map(|offset| (start + offset as i128 * step) as i64));
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_argument_counts_from_zero() {
        assert_eq!(range(&[3], None), Ok(vec![0, 1, 2]));
        assert_eq!(range(&[0], None), Ok(vec![]));
        assert_eq!(range(&[-2], None), Ok(vec![]));
    }

    #[test]
    fn two_arguments_use_unit_step() {
        assert_eq!(range(&[2, 5], None), Ok(vec![2, 3, 4]));
        assert_eq!(range(&[5, 2], None), Ok(vec![]));
    }

    #[test]
    fn positive_step_skips_values() {
        assert_eq!(range(&[0, 10, 3], None), Ok(vec![0, 3, 6, 9]));
        assert_eq!(range(&[1, 10, 3], None), Ok(vec![1, 4, 7]));
    }

    #[test]
    fn negative_step_counts_down_exclusive_of_stop() {
        assert_eq!(range(&[5, 0, -1], None), Ok(vec![5, 4, 3, 2, 1]));
        assert_eq!(range(&[10, 0, -3], None), Ok(vec![10, 7, 4, 1]));
        assert_eq!(range(&[0, 5, -1], None), Ok(vec![]));
    }

    #[test]
    fn handles_extreme_bounds_without_overflow() {
        assert_eq!(
            range(&[i64::MAX - 1, i64::MAX], None),
            Ok(vec![i64::MAX - 1])
        );
        assert_eq!(
            range(&[i64::MIN + 2, i64::MIN, -1], None),
            Ok(vec![i64::MIN + 2, i64::MIN + 1])
        );
    }

    #[test]
    fn zero_step_is_empty_unless_it_would_never_stop() {
        assert_eq!(range(&[0, 5, 0], None), Ok(vec![]));
        assert_eq!(range(&[3, 3, 0], None), Ok(vec![]));
        assert_eq!(
            range(&[5, 0, 0], None),
            Err(RangeError::ZeroStep { start: 5, stop: 0 })
        );
    }

    #[test]
    fn rejects_bad_arity() {
        assert_eq!(
            range(&[], None),
            Err(RangeError::ArgumentCount { found: 0 })
        );
        assert_eq!(
            range(&[1, 2, 3, 4], None),
            Err(RangeError::ArgumentCount { found: 4 })
        );
    }

    #[test]
    fn enforces_length_limit_before_allocating() {
        assert_eq!(range(&[10], Some(10)).map(|v| v.len()), Ok(10));
        assert_eq!(
            range(&[i64::MAX], Some(1_000)),
            Err(RangeError::TooLong {
                len: i64::MAX as u128,
                limit: 1_000
            })
        );
    }

    #[test]
    fn unallocatable_length_is_an_error_without_limit() {
        assert_eq!(
            range(&[i64::MAX], None),
            Err(RangeError::Allocation {
                len: i64::MAX as u128
            })
        );
        assert_eq!(
            range(&[i64::MIN, i64::MAX], None),
            Err(RangeError::Allocation {
                len: u64::MAX as u128
            })
        );
    }

    #[test]
    fn resolves_builtin_names() {
        assert_eq!(BuiltinFunction::from_name("print"), Some(BuiltinFunction::Print));
        assert_eq!(BuiltinFunction::from_name("range"), Some(BuiltinFunction::Range));
        assert_eq!(BuiltinFunction::from_name("len"), None);
    }
}
